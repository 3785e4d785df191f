// Natural-language → GraphQL translation.
// Prompting, extraction and normalization live here; the model call goes
// through llm_client and execution through graphql.

pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
