//! Entity labels and the categorized output record.

use serde::{Deserialize, Serialize};

/// The closed set of labels the model is asked to tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityLabel {
    Skill,
    Responsibility,
    Degree,
    Experience,
}

impl EntityLabel {
    /// All labels, in prompt and output order.
    pub const ALL: [EntityLabel; 4] = [
        EntityLabel::Skill,
        EntityLabel::Responsibility,
        EntityLabel::Degree,
        EntityLabel::Experience,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityLabel::Skill => "skill",
            EntityLabel::Responsibility => "responsibility",
            EntityLabel::Degree => "degree",
            EntityLabel::Experience => "experience",
        }
    }

    /// Upper-cased key some providers use in JSON replies.
    pub fn upper(self) -> &'static str {
        match self {
            EntityLabel::Skill => "SKILL",
            EntityLabel::Responsibility => "RESPONSIBILITY",
            EntityLabel::Degree => "DEGREE",
            EntityLabel::Experience => "EXPERIENCE",
        }
    }

    pub fn definition(self) -> &'static str {
        match self {
            EntityLabel::Skill => {
                "Any mention of a skill or ability or tool or proficiency that is relevant to a job or task."
            }
            EntityLabel::Responsibility => {
                "Any mention of a responsibility or duty or task that have been done that is relevant to a job or task."
            }
            EntityLabel::Degree => {
                "Any mention of a degree or qualification or certification that is relevant to a job or task."
            }
            EntityLabel::Experience => {
                "Any mention of job experience or job position with or without the job title that is relevant to a job or task."
            }
        }
    }

    /// Case-insensitive lookup. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        EntityLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Extracted spans grouped by label, in the order the model emitted them.
///
/// Every label is a field, so the serialized map always carries all four keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedEntities {
    pub skill: Vec<String>,
    pub responsibility: Vec<String>,
    pub degree: Vec<String>,
    pub experience: Vec<String>,
}

impl CategorizedEntities {
    pub fn get(&self, label: EntityLabel) -> &[String] {
        match label {
            EntityLabel::Skill => &self.skill,
            EntityLabel::Responsibility => &self.responsibility,
            EntityLabel::Degree => &self.degree,
            EntityLabel::Experience => &self.experience,
        }
    }

    fn get_mut(&mut self, label: EntityLabel) -> &mut Vec<String> {
        match label {
            EntityLabel::Skill => &mut self.skill,
            EntityLabel::Responsibility => &mut self.responsibility,
            EntityLabel::Degree => &mut self.degree,
            EntityLabel::Experience => &mut self.experience,
        }
    }

    pub fn push(&mut self, label: EntityLabel, text: impl Into<String>) {
        self.get_mut(label).push(text.into());
    }

    pub fn extend<I>(&mut self, label: EntityLabel, texts: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.get_mut(label).extend(texts);
    }

    pub fn total(&self) -> usize {
        EntityLabel::ALL.iter().map(|l| self.get(*l).len()).sum()
    }

    /// Joins each label's spans with a space, then joins the four label strings.
    pub fn combined_text(&self) -> String {
        EntityLabel::ALL
            .iter()
            .map(|label| self.get(*label).join(" "))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
