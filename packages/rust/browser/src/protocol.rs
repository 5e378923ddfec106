//! Wire-level helpers for the DevTools message protocol.
//!
//! Outbound commands carry `{id, method, params, sessionId?}`. Inbound
//! frames are either correlated responses `{id, result|error}` or
//! unsolicited events `{method, params, sessionId?}`.

use serde_json::{Value, json};

/// Outcome of a bounded wait for a page event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The event arrived within the bound.
    Signaled,
    /// The bound elapsed; the caller proceeds with whatever loaded.
    TimedOut,
}

/// Build an outbound command frame.
pub(crate) fn build_command(
    id: u64,
    method: &str,
    params: Value,
    session_id: Option<&str>,
) -> Value {
    let mut msg = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    if let Some(session) = session_id {
        msg["sessionId"] = Value::String(session.to_string());
    }
    msg
}

/// Match an inbound frame against an outstanding request id.
///
/// Returns `None` for events and responses to other requests,
/// `Some(Err(detail))` for responses carrying an error field, and
/// `Some(Ok(result))` otherwise (an absent result becomes an empty object).
pub(crate) fn match_response(obj: &Value, id: u64) -> Option<Result<Value, String>> {
    if obj["id"].as_u64() != Some(id) {
        return None;
    }
    if let Some(error) = obj.get("error") {
        return Some(Err(error.to_string()));
    }
    Some(Ok(obj.get("result").cloned().unwrap_or_else(|| json!({}))))
}

/// Match an inbound frame against an awaited event.
///
/// With a session id given, the frame must be scoped to that session.
pub(crate) fn match_event(obj: &Value, event: &str, session_id: Option<&str>) -> bool {
    if obj["method"].as_str() != Some(event) {
        return false;
    }
    match session_id {
        Some(session) => obj["sessionId"].as_str() == Some(session),
        None => true,
    }
}
