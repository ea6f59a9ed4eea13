use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteMemoryParams {
    #[schemars(required, description = "ID of the memory to delete")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
}
