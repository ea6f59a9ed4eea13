//! The operation surface: argument types, the tool registry, and the dispatcher.
//!
//! Transport-independent. The MCP server and the CLI both call
//! [`Dispatcher::dispatch`] with an operation name and a JSON argument object.

pub mod delete_by_tag;
pub mod delete_memory;
pub mod dispatch;
pub mod recall_memory;
pub mod registry;
pub mod retrieve_memory;
pub mod search_by_tag;
pub mod store_memory;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use dispatch::Dispatcher;
pub use registry::{catalog, ToolDescriptor};

/// Argument type for operations that take none.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Every operation the dispatcher knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StoreMemory,
    RetrieveMemory,
    SearchByTag,
    RecallMemory,
    DashboardRecallMemory,
    DeleteMemory,
    DeleteByTag,
    CheckDatabaseHealth,
    DashboardCheckHealth,
    GetStats,
    OptimizeDb,
    CreateBackup,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Self::StoreMemory,
        Self::RetrieveMemory,
        Self::SearchByTag,
        Self::RecallMemory,
        Self::DashboardRecallMemory,
        Self::DeleteMemory,
        Self::DeleteByTag,
        Self::CheckDatabaseHealth,
        Self::DashboardCheckHealth,
        Self::GetStats,
        Self::OptimizeDb,
        Self::CreateBackup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoreMemory => "store_memory",
            Self::RetrieveMemory => "retrieve_memory",
            Self::SearchByTag => "search_by_tag",
            Self::RecallMemory => "recall_memory",
            Self::DashboardRecallMemory => "dashboard_recall_memory",
            Self::DeleteMemory => "delete_memory",
            Self::DeleteByTag => "delete_by_tag",
            Self::CheckDatabaseHealth => "check_database_health",
            Self::DashboardCheckHealth => "dashboard_check_health",
            Self::GetStats => "get_stats",
            Self::OptimizeDb => "optimize_db",
            Self::CreateBackup => "create_backup",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::StoreMemory => "Store new information with optional tags",
            Self::RetrieveMemory => "Perform semantic search for relevant memories",
            Self::SearchByTag => "Retrieve memories by specific tags",
            Self::RecallMemory => {
                "Recall memories using natural language time expressions and/or semantic search"
            }
            Self::DashboardRecallMemory => {
                "Recall memories for the dashboard; errors are reported in the response"
            }
            Self::DeleteMemory => "Delete a specific memory by its ID",
            Self::DeleteByTag => "Delete all memories with a specific tag",
            Self::CheckDatabaseHealth => "Retrieve database health metrics",
            Self::DashboardCheckHealth => "Retrieve database health metrics for the dashboard",
            Self::GetStats => "Get total memory count and number of unique tags",
            Self::OptimizeDb => "Optimize the database (not implemented)",
            Self::CreateBackup => "Create a compressed backup of the memory store",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}
