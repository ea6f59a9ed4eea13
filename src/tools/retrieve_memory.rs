use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveMemoryParams {
    #[schemars(required, description = "Search query")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[schemars(description = "Number of results to return. Defaults to 5.")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_results: Option<usize>,
}
