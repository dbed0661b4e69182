// Prompt templates for entity extraction.
// The system prompt is assembled from the label table; few-shot exchanges come from a fixture file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::labels::EntityLabel;
use crate::entities::parser::ReplyFormat;
use crate::llm_client::ChatMessage;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("few-shot fixture {path} could not be read: {source}")]
    Missing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("few-shot fixture {path} is not a JSON array of {{input, output}}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One demonstration exchange shown to the model before the real input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub input: String,
    pub output: String,
}

/// Reads the few-shot fixture: a JSON array of `{"input": ..., "output": ...}`.
pub fn load_few_shot_examples(path: impl AsRef<Path>) -> Result<Vec<FewShotExample>, FixtureError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Missing {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| FixtureError::Invalid {
        path: display,
        source,
    })
}

const NER_PREAMBLE: &str = "\
You are an expert Named Entity Recognition (NER) system.
Your task is to accept Text as input and extract named entities.
Entities could be a word or a span must have one of the following labels: {labels}.

Below are definitions of each label to help aid you in what kinds of named entities to extract for each label.
Assume these definitions are written by an expert and follow them closely.

{definitions}
";

const PIPE_FORMAT_INSTRUCTIONS: &str = "
Your answer must follow the output format below.

Here is an example of the output format for a paragraph using different labels than this task requires.
The output format should be as follows: `text | label | explanation`.
Only use this output format but use the labels provided above instead of the ones defined in the example below.

Important: Do not output anything besides entities in the specified output format. Do not include any introductory text, conclusions, or additional commentary.
Output entities in the order they occur in the input paragraph regardless of label.

Q: Given the paragraph below, identify a list of entities, and for each entry explain why it is or is not an entity:

Paragraph: Sriracha sauce goes really well with hoisin stir fry, but you should add it after you use the wok.
Answer:
1. Sriracha sauce | INGREDIENT | is an ingredient to add to a stir fry
2. hoisin stir fry | DISH | is a dish with stir fry vegetables and hoisin sauce
3. wok | EQUIPMENT | is a piece of cooking equipment used to stir fry ingredients

Make sure the entities you extract are only one of the following labels: {labels}.
";

const JSON_OBJECT_INSTRUCTIONS: &str = "
The output should be a JSON object where each key is a label from one of the following labels: {labels}. The value associated with each label is a list of objects.
Each object within the list must only have one key: entity (a string representing the extracted entity from the input sentence). Do not include any other keys in the object.
The value of the entity key should not contain any single or double quotes.
Only use this output format but use the labels provided above.

Important: Do not output anything besides the JSON object. Do not include any introductory text, conclusions, or additional commentary.
";

const RECORDS_INSTRUCTIONS: &str = "
The output should be a JSON array. Each element is an object with exactly two keys:
label (one of the following labels: {labels}) and text (the extracted entity, copied from the input).
Output entities in the order they occur in the input regardless of label.

Important: Do not output anything besides the JSON array. Do not include any introductory text, conclusions, or additional commentary. Do not use markdown code fences.
";

/// Builds the system prompt for a reply format from the fixed label table.
pub fn system_prompt(format: ReplyFormat) -> String {
    let labels = EntityLabel::ALL
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let definitions = EntityLabel::ALL
        .iter()
        .map(|l| format!("{}: {}", l.as_str(), l.definition()))
        .collect::<Vec<_>>()
        .join("\n");

    let instructions = match format {
        ReplyFormat::Pipe => PIPE_FORMAT_INSTRUCTIONS,
        ReplyFormat::Records => RECORDS_INSTRUCTIONS,
        ReplyFormat::RepairedJson => JSON_OBJECT_INSTRUCTIONS,
    };

    format!("{NER_PREAMBLE}{instructions}")
        .replace("{labels}", &labels)
        .replace("{definitions}", &definitions)
}

/// A reusable chat prompt: system instructions, few-shot exchanges, then one `input` slot.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    format: ReplyFormat,
    system: String,
    examples: Vec<FewShotExample>,
}

impl PromptTemplate {
    pub fn build(format: ReplyFormat, examples: Vec<FewShotExample>) -> Self {
        Self {
            format,
            system: system_prompt(format),
            examples,
        }
    }

    /// Loads the fixture and builds the template in one step.
    pub fn from_fixture(format: ReplyFormat, path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Ok(Self::build(format, load_few_shot_examples(path)?))
    }

    pub fn format(&self) -> ReplyFormat {
        self.format
    }

    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    /// Fills the input slot and returns the full message list.
    pub fn render(&self, input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.examples.len() * 2 + 2);
        messages.push(ChatMessage::system(&self.system));
        for example in &self.examples {
            messages.push(ChatMessage::user(&example.input));
            messages.push(ChatMessage::assistant(&example.output));
        }
        messages.push(ChatMessage::user(input));
        messages
    }
}
