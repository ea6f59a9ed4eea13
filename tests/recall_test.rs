mod helpers;

use chrono::{Duration, SecondsFormat, Utc};
use helpers::TestEnv;
use serde_json::json;

fn rfc3339(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn yesterday_filters_by_timestamp_and_strips_phrase() {
    let env = TestEnv::new();
    let now = Utc::now();
    env.call(
        "store_memory",
        json!({"content": "budget review with finance", "metadata": {"timestamp": rfc3339(now - Duration::days(5))}}),
    );
    let recent = env.call(
        "store_memory",
        json!({"content": "budget review follow-up", "metadata": {"timestamp": rfc3339(now)}}),
    );

    let out = env.call("recall_memory", json!({"query": "yesterday budget review"}));
    assert_eq!(out["query"], "budget review");
    assert_eq!(out["time_filter"], "yesterday");
    let memories = out["memories"].as_array().unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0]["id"], recent["id"]);
}

#[test]
fn time_filter_respects_n_results() {
    let env = TestEnv::new();
    for i in 0..4 {
        env.call("store_memory", json!({"content": format!("standup note {i}")}));
    }
    let out = env.call("recall_memory", json!({"query": "What did we say TODAY?", "n_results": 2}));
    assert_eq!(out["time_filter"], "today");
    assert_eq!(out["query"], "What did we say ?");
    assert_eq!(out["memories"].as_array().unwrap().len(), 2);
}

#[test]
fn plain_query_falls_back_to_similarity() {
    let env = TestEnv::new();
    let stored = env.call("store_memory", json!({"content": "rotate the signing keys"}));
    env.call("store_memory", json!({"content": "book flights to Lisbon"}));

    let out = env.call("recall_memory", json!({"query": "rotate the signing keys", "n_results": 1}));
    assert_eq!(out["time_filter"], serde_json::Value::Null);
    assert_eq!(out["query"], "rotate the signing keys");
    let memories = out["memories"].as_array().unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0]["id"], stored["id"]);
    assert!(memories[0]["similarity"].as_f64().is_some());
    assert_eq!(env.dispatcher.latency().len(), 1);
}

#[test]
fn dashboard_recall_has_the_same_shape() {
    let env = TestEnv::new();
    env.call("store_memory", json!({"content": "deploy checklist"}));
    let out = env.call("dashboard_recall_memory", json!({"query": "this week deploy"}));
    assert_eq!(out["time_filter"], "this week");
    assert_eq!(out["query"], "deploy");
    assert_eq!(out["memories"].as_array().unwrap().len(), 1);
    assert!(out.get("error").is_none());
}
