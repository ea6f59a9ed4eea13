use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteByTagParams {
    #[schemars(required, description = "Delete every memory carrying this tag")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
