use memchat_core::{ChatMessage, MemoryItem};
use serde::Serialize;
use serde_json::Value;

/// Body of `POST /v2/memories/search/`
#[derive(Serialize, Debug)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
    pub filters: SearchFilters<'a>,
}

#[derive(Serialize, Debug)]
pub(crate) struct SearchFilters<'a> {
    pub user_id: &'a str,
}

/// Body of `POST /v1/memories/`
#[derive(Serialize, Debug)]
pub(crate) struct AddRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub user_id: &'a str,
}

/// Locates the result list in a search response.
///
/// The endpoint answers with either a bare array or `{"results": [...]}`.
pub(crate) fn result_list(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Reads one search result. Only the `memory` text is required; other fields are best effort.
pub(crate) fn memory_item(value: &Value) -> Option<MemoryItem> {
    let memory = value.get("memory").and_then(Value::as_str)?;
    let id = value.get("id").and_then(|id| match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Some(MemoryItem {
        id,
        memory: Some(memory.to_string()),
        score: value.get("score").and_then(Value::as_f64),
    })
}
