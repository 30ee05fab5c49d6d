//! One JSON object per line in each direction.
//!
//! A request line is a tagged [`Request`] plus an optional `"id"`; the
//! response line echoes that id next to the status and body.

use serde::Serialize;
use serde_json::Value;
use shared::{Request, Response};

#[derive(Debug, Serialize)]
struct ResponseLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    status: u16,
    body: &'a Value,
}

/// Split a line into its correlation id and decoded request
pub fn decode_line(line: &str) -> (Option<Value>, Result<Request, String>) {
    let mut value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return (None, Err(format!("invalid JSON: {}", e))),
    };

    let id = value.as_object_mut().and_then(|object| object.remove("id"));
    let request = serde_json::from_value(value).map_err(|e| format!("invalid request: {}", e));
    (id, request)
}

pub fn encode_response(id: Option<Value>, response: &Response) -> String {
    let line = ResponseLine {
        id,
        status: response.status,
        body: &response.body,
    };
    serde_json::to_string(&line).unwrap_or_else(|e| {
        format!(r#"{{"status":500,"body":{{"error":"failed to encode response: {}"}}}}"#, e)
    })
}
