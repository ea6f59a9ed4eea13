//! Static catalog of operations with their generated argument schemas.

use std::sync::OnceLock;

use schemars::JsonSchema;
use serde_json::Value;

use super::delete_by_tag::DeleteByTagParams;
use super::delete_memory::DeleteMemoryParams;
use super::recall_memory::RecallMemoryParams;
use super::retrieve_memory::RetrieveMemoryParams;
use super::search_by_tag::SearchByTagParams;
use super::store_memory::StoreMemoryParams;
use super::{NoParams, Operation};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    /// Top-level fields the schema marks as required.
    #[serde(skip)]
    pub required: Vec<String>,
}

static CATALOG: OnceLock<Vec<ToolDescriptor>> = OnceLock::new();

/// All operations, in [`Operation::ALL`] order. Built once, never mutated.
pub fn catalog() -> &'static [ToolDescriptor] {
    CATALOG.get_or_init(|| Operation::ALL.iter().map(|op| describe(*op)).collect())
}

pub fn descriptor(op: Operation) -> &'static ToolDescriptor {
    let index = Operation::ALL
        .iter()
        .position(|o| *o == op)
        .unwrap_or_default();
    &catalog()[index]
}

fn describe(op: Operation) -> ToolDescriptor {
    let input_schema = match op {
        Operation::StoreMemory => schema::<StoreMemoryParams>(),
        Operation::RetrieveMemory => schema::<RetrieveMemoryParams>(),
        Operation::SearchByTag => schema::<SearchByTagParams>(),
        Operation::RecallMemory | Operation::DashboardRecallMemory => {
            schema::<RecallMemoryParams>()
        }
        Operation::DeleteMemory => schema::<DeleteMemoryParams>(),
        Operation::DeleteByTag => schema::<DeleteByTagParams>(),
        Operation::CheckDatabaseHealth
        | Operation::DashboardCheckHealth
        | Operation::GetStats
        | Operation::OptimizeDb
        | Operation::CreateBackup => schema::<NoParams>(),
    };
    let required = input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    ToolDescriptor {
        name: op.as_str(),
        description: op.description(),
        input_schema,
        required,
    }
}

fn schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_operation_once() {
        let names: Vec<&str> = catalog().iter().map(|d| d.name).collect();
        assert_eq!(names.len(), Operation::ALL.len());
        for op in Operation::ALL {
            assert_eq!(names.iter().filter(|n| **n == op.as_str()).count(), 1);
            assert_eq!(descriptor(op).name, op.as_str());
        }
    }

    #[test]
    fn required_fields_come_from_schema() {
        assert_eq!(descriptor(Operation::StoreMemory).required, vec!["content"]);
        assert_eq!(descriptor(Operation::RetrieveMemory).required, vec!["query"]);
        assert_eq!(descriptor(Operation::SearchByTag).required, vec!["tags"]);
        assert_eq!(descriptor(Operation::DeleteMemory).required, vec!["memory_id"]);
        assert_eq!(descriptor(Operation::DeleteByTag).required, vec!["tag"]);
        assert!(descriptor(Operation::GetStats).required.is_empty());
    }

    #[test]
    fn schemas_are_objects_with_properties() {
        let schema = &descriptor(Operation::RetrieveMemory).input_schema;
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["n_results"].is_object());
    }
}
