//! MCP tool handler. Each tool forwards its arguments to the shared [`Dispatcher`].

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;

use memdash::tools::delete_by_tag::DeleteByTagParams;
use memdash::tools::delete_memory::DeleteMemoryParams;
use memdash::tools::recall_memory::RecallMemoryParams;
use memdash::tools::retrieve_memory::RetrieveMemoryParams;
use memdash::tools::search_by_tag::SearchByTagParams;
use memdash::tools::store_memory::StoreMemoryParams;
use memdash::tools::{Dispatcher, NoParams, Operation};

#[derive(Clone)]
pub struct MemoryTools {
    tool_router: ToolRouter<Self>,
    dispatcher: Arc<Dispatcher>,
}

#[tool_router]
impl MemoryTools {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            dispatcher,
        }
    }

    /// Serialize typed params back to an argument object and dispatch off the runtime.
    async fn forward<P: Serialize>(&self, op: Operation, params: P) -> Result<String, String> {
        let args = match serde_json::to_value(params) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => return Err(format!("invalid arguments: {e}")),
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::task::spawn_blocking(move || dispatcher.dispatch(op.as_str(), args))
            .await
            .map_err(|e| format!("{op} task failed: {e}"))?
            .map_err(|e| e.to_string())
    }

    #[tool(description = "Store new information with optional tags")]
    async fn store_memory(
        &self,
        Parameters(params): Parameters<StoreMemoryParams>,
    ) -> Result<String, String> {
        self.forward(Operation::StoreMemory, params).await
    }

    #[tool(description = "Perform semantic search for relevant memories")]
    async fn retrieve_memory(
        &self,
        Parameters(params): Parameters<RetrieveMemoryParams>,
    ) -> Result<String, String> {
        self.forward(Operation::RetrieveMemory, params).await
    }

    #[tool(description = "Retrieve memories by specific tags")]
    async fn search_by_tag(
        &self,
        Parameters(params): Parameters<SearchByTagParams>,
    ) -> Result<String, String> {
        self.forward(Operation::SearchByTag, params).await
    }

    #[tool(
        description = "Recall memories using natural language time expressions and/or semantic search"
    )]
    async fn recall_memory(
        &self,
        Parameters(params): Parameters<RecallMemoryParams>,
    ) -> Result<String, String> {
        self.forward(Operation::RecallMemory, params).await
    }

    #[tool(description = "Recall memories for the dashboard; errors are reported in the response")]
    async fn dashboard_recall_memory(
        &self,
        Parameters(params): Parameters<RecallMemoryParams>,
    ) -> Result<String, String> {
        self.forward(Operation::DashboardRecallMemory, params).await
    }

    #[tool(description = "Delete a specific memory by its ID")]
    async fn delete_memory(
        &self,
        Parameters(params): Parameters<DeleteMemoryParams>,
    ) -> Result<String, String> {
        self.forward(Operation::DeleteMemory, params).await
    }

    #[tool(description = "Delete all memories with a specific tag")]
    async fn delete_by_tag(
        &self,
        Parameters(params): Parameters<DeleteByTagParams>,
    ) -> Result<String, String> {
        self.forward(Operation::DeleteByTag, params).await
    }

    #[tool(description = "Retrieve database health metrics")]
    async fn check_database_health(
        &self,
        Parameters(params): Parameters<NoParams>,
    ) -> Result<String, String> {
        self.forward(Operation::CheckDatabaseHealth, params).await
    }

    #[tool(description = "Retrieve database health metrics for the dashboard")]
    async fn dashboard_check_health(
        &self,
        Parameters(params): Parameters<NoParams>,
    ) -> Result<String, String> {
        self.forward(Operation::DashboardCheckHealth, params).await
    }

    #[tool(description = "Get total memory count and number of unique tags")]
    async fn get_stats(
        &self,
        Parameters(params): Parameters<NoParams>,
    ) -> Result<String, String> {
        self.forward(Operation::GetStats, params).await
    }

    #[tool(description = "Optimize the database (not implemented)")]
    async fn optimize_db(
        &self,
        Parameters(params): Parameters<NoParams>,
    ) -> Result<String, String> {
        self.forward(Operation::OptimizeDb, params).await
    }

    #[tool(description = "Create a compressed backup of the memory store")]
    async fn create_backup(
        &self,
        Parameters(params): Parameters<NoParams>,
    ) -> Result<String, String> {
        self.forward(Operation::CreateBackup, params).await
    }
}

#[tool_handler]
impl ServerHandler for MemoryTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "memdash stores and recalls memories. Use store_memory to save, \
                 retrieve_memory or recall_memory to search, and search_by_tag to filter."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memdash::tools::catalog;

    #[test]
    fn router_matches_catalog() {
        let tools = MemoryTools::tool_router().list_all();
        assert_eq!(tools.len(), catalog().len());
        for descriptor in catalog() {
            let tool = tools
                .iter()
                .find(|t| t.name == descriptor.name)
                .unwrap_or_else(|| panic!("{} not routed", descriptor.name));
            assert_eq!(tool.description.as_deref(), Some(descriptor.description));
        }
    }

    fn tools(tmp: &tempfile::TempDir) -> MemoryTools {
        use memdash::embedding::hashed::HashedEmbeddingProvider;
        use memdash::memory::backup::BackupManager;
        use memdash::memory::latency::LatencyTracker;
        use memdash::memory::store::SqliteVecStore;

        let store = SqliteVecStore::in_memory(Arc::new(HashedEmbeddingProvider)).unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(store),
            Arc::new(LatencyTracker::new()),
            BackupManager::new(tmp.path().join("store"), tmp.path().join("backups")),
        );
        MemoryTools::new(Arc::new(dispatcher))
    }

    #[tokio::test]
    async fn absent_required_field_is_a_tool_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = tools(&tmp);

        // An empty argument object must still deserialize so the dispatcher can name the field.
        let params: StoreMemoryParams = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = tools.store_memory(Parameters(params)).await.unwrap_err();
        assert!(err.contains("'content'"), "{err}");

        let params: DeleteByTagParams = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = tools.delete_by_tag(Parameters(params)).await.unwrap_err();
        assert!(err.contains("'tag'"), "{err}");

        let params: SearchByTagParams = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = tools.search_by_tag(Parameters(params)).await.unwrap_err();
        assert!(err.contains("'tags'"), "{err}");
    }

    #[tokio::test]
    async fn present_fields_round_trip_through_the_dispatcher() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = tools(&tmp);

        let params: StoreMemoryParams =
            serde_json::from_value(serde_json::json!({"content": "ship it", "metadata": {"tags": ["release"]}}))
                .unwrap();
        let body = tools.store_memory(Parameters(params)).await.unwrap();
        let stored: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(stored["status"], "success");

        let params: SearchByTagParams =
            serde_json::from_value(serde_json::json!({"tags": ["release"]})).unwrap();
        let body = tools.search_by_tag(Parameters(params)).await.unwrap();
        let found: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(found["memories"][0]["id"], stored["id"]);
    }
}
