// Entity extraction: label table, prompt construction, reply parsing and the
// retrying inference client. All provider traffic goes through llm_client.

pub mod inference;
pub mod labels;
pub mod parser;
pub mod prompts;
