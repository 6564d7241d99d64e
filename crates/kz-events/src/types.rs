use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub seq: i64,
    pub at: DateTime<Utc>,
    pub correlation_id: Option<String>,
    pub source: EventSource,
    pub body: Value,
}

impl EventRecord {
    pub fn new(seq: i64, source: EventSource, correlation_id: Option<String>, body: Value) -> Self {
        Self {
            id: format!("evt_{}", Ulid::new()),
            seq,
            at: Utc::now(),
            correlation_id,
            source,
            body,
        }
    }

    /// The `type` tag of the serialized body, if it has one.
    pub fn kind(&self) -> Option<&str> {
        self.body.get("type").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventSource {
    Cli,
    Api,
    Ui,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_ids_are_prefixed_and_unique() {
        let a = EventRecord::new(1, EventSource::Ui, None, json!({}));
        let b = EventRecord::new(2, EventSource::Ui, None, json!({}));
        assert!(a.id.starts_with("evt_"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_reads_body_tag() {
        let record = EventRecord::new(
            1,
            EventSource::Api,
            Some("corr-1".to_string()),
            json!({ "type": "ReviewApproved", "payload": {} }),
        );
        assert_eq!(record.kind(), Some("ReviewApproved"));

        let untagged = EventRecord::new(2, EventSource::Api, None, json!([1, 2]));
        assert_eq!(untagged.kind(), None);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = EventRecord::new(7, EventSource::Cli, Some("c".to_string()), json!({}));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["correlationId"], "c");
        assert_eq!(value["source"], "Cli");
    }
}
