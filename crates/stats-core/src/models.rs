use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::time_utils::parse_timestamp_value;

/// Sender recorded when a message carries no `from` field.
pub const UNKNOWN_SENDER: &str = "UNKNOWN";

/// Priority recorded when a message carries no `priority` field.
pub const DEFAULT_PRIORITY: &str = "NORMAL";

/// Recipient value addressing every agent at once.
pub const BROADCAST_RECIPIENT: &str = "ALL_AGENTS";

/// One entry of a message's `replied_by` list.
///
/// Entries that are not JSON objects still produce a `Reply` (with neither
/// field set) so reply counts match the length of the stored list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Name of the replying agent.
    pub ai: Option<String>,
    /// When the reply was written; `None` if absent or unparseable.
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Reply {
    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            ai: obj.get("ai").and_then(Value::as_str).map(str::to_string),
            timestamp: obj.get("timestamp").and_then(parse_timestamp_value),
        }
    }
}

/// A single message loaded from the store, with lenient field defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    /// Opaque identifier; duplicates are allowed.
    pub id: String,
    /// Sending agent.
    pub from: String,
    /// Recipients, always as a list even when stored as a single string.
    pub to: Vec<String>,
    /// Priority label such as `NORMAL`, `HIGH` or `CRITICAL`.
    pub priority: String,
    /// Send time in the record's declared offset; `None` if unusable.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Replies in stored order.
    pub replies: Vec<Reply>,
}

impl MessageRecord {
    /// Project a raw JSON document onto a [`MessageRecord`].
    ///
    /// Returns `None` when the document is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let id = obj
            .get("id")
            .or_else(|| obj.get("msg_id"))
            .map(scalar_to_string)
            .unwrap_or_default();

        let to = match obj.get("to") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let replies = obj
            .get("replied_by")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Reply::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            id,
            from: string_or(obj.get("from"), UNKNOWN_SENDER),
            to,
            priority: string_or(obj.get("priority"), DEFAULT_PRIORITY),
            timestamp: obj.get("timestamp").and_then(parse_timestamp_value),
            replies,
        })
    }

    /// Normalised recipient list.
    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    /// `true` when `agent` is a recipient, directly or via broadcast.
    pub fn is_addressed_to(&self, agent: &str) -> bool {
        self.to
            .iter()
            .any(|r| r == agent || r == BROADCAST_RECIPIENT)
    }

    /// `true` when at least one reply was written by `agent`.
    pub fn replied_by_agent(&self, agent: &str) -> bool {
        self.replies
            .iter()
            .any(|reply| reply.ai.as_deref() == Some(agent))
    }

    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// Read a string field, substituting `default` when it is absent or null.
/// Other scalar types are kept in their JSON text form.
fn string_or(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(v) => scalar_to_string(v),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_record() {
        let record = MessageRecord::from_value(&json!({
            "id": "msg_001",
            "from": "ATLAS",
            "to": ["FORGE", "CLIO"],
            "priority": "HIGH",
            "timestamp": "2026-01-18T10:00:00Z",
            "replied_by": [{"ai": "FORGE", "timestamp": "2026-01-18T10:05:00Z"}],
        }))
        .unwrap();

        assert_eq!(record.id, "msg_001");
        assert_eq!(record.from, "ATLAS");
        assert_eq!(record.to, vec!["FORGE", "CLIO"]);
        assert_eq!(record.priority, "HIGH");
        assert!(record.timestamp.is_some());
        assert_eq!(record.replies.len(), 1);
        assert_eq!(record.replies[0].ai.as_deref(), Some("FORGE"));
        assert!(record.replies[0].timestamp.is_some());
    }

    #[test]
    fn test_from_value_defaults() {
        let record = MessageRecord::from_value(&json!({})).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.from, UNKNOWN_SENDER);
        assert_eq!(record.priority, DEFAULT_PRIORITY);
        assert!(record.to.is_empty());
        assert!(record.timestamp.is_none());
        assert!(!record.has_replies());
    }

    #[test]
    fn test_from_value_null_fields_take_defaults() {
        let record =
            MessageRecord::from_value(&json!({"from": null, "priority": null})).unwrap();
        assert_eq!(record.from, UNKNOWN_SENDER);
        assert_eq!(record.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_from_value_msg_id_fallback() {
        let record = MessageRecord::from_value(&json!({"msg_id": "legacy_7"})).unwrap();
        assert_eq!(record.id, "legacy_7");
    }

    #[test]
    fn test_from_value_single_recipient_string() {
        let record = MessageRecord::from_value(&json!({"to": "FORGE"})).unwrap();
        assert_eq!(record.recipients(), ["FORGE".to_string()]);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(MessageRecord::from_value(&json!([1, 2, 3])).is_none());
        assert!(MessageRecord::from_value(&json!("text")).is_none());
    }

    #[test]
    fn test_malformed_timestamp_is_none() {
        let record =
            MessageRecord::from_value(&json!({"timestamp": "last tuesday"})).unwrap();
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_non_object_replies_still_counted() {
        let record = MessageRecord::from_value(&json!({
            "replied_by": ["FORGE", {"ai": "CLIO", "timestamp": "bogus"}],
        }))
        .unwrap();
        assert_eq!(record.replies.len(), 2);
        assert_eq!(record.replies[0], Reply::default());
        assert_eq!(record.replies[1].ai.as_deref(), Some("CLIO"));
        assert!(record.replies[1].timestamp.is_none());
    }

    #[test]
    fn test_is_addressed_to_direct_and_broadcast() {
        let direct = MessageRecord::from_value(&json!({"to": ["ATLAS"]})).unwrap();
        let broadcast = MessageRecord::from_value(&json!({"to": "ALL_AGENTS"})).unwrap();
        let other = MessageRecord::from_value(&json!({"to": ["FORGE"]})).unwrap();

        assert!(direct.is_addressed_to("ATLAS"));
        assert!(broadcast.is_addressed_to("ATLAS"));
        assert!(!other.is_addressed_to("ATLAS"));
    }

    #[test]
    fn test_replied_by_agent_is_case_sensitive() {
        let record = MessageRecord::from_value(&json!({
            "replied_by": [{"ai": "ATLAS"}],
        }))
        .unwrap();
        assert!(record.replied_by_agent("ATLAS"));
        assert!(!record.replied_by_agent("atlas"));
    }
}
