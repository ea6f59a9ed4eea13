//! Parameters shared by `recall_memory` and `dashboard_recall_memory`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallMemoryParams {
    /// Free text, optionally containing a time phrase.
    #[schemars(
        required,
        description = "Natural language query. A time phrase (today, yesterday, this week, this month, last week, last month, last 3 months) restricts results to that period."
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[schemars(description = "Number of results to return. Defaults to 5.")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_results: Option<usize>,
}
