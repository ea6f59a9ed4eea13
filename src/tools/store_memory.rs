use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMemoryParams {
    #[schemars(required, description = "The content to store")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[schemars(
        description = "Optional metadata object. 'tags' may be a list of strings or a comma-separated string; 'timestamp' (RFC 3339) is filled in when absent."
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
