use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::trace::{MemoryTrace, parse_timestamp};
use crate::types::{CompletionStatus, TraceType, Visibility};

/// Fields every trace must carry unless the validator is loosened.
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "type", "timestamp", "content", "task_id"];

/// Checks raw trace records against the data model.
///
/// Rules run in a fixed order and stop at the first failure:
/// required fields, `type`, `timestamp`, `importance`, `collaborators`,
/// `completion_status`, `visibility`, `linked_event_uid`, `embedding`, then
/// the record must deserialize into [`MemoryTrace`].
#[derive(Debug, Clone)]
pub struct TraceValidator {
    required_fields: Vec<String>,
}

impl Default for TraceValidator {
    fn default() -> Self {
        Self::with_required_fields(REQUIRED_FIELDS)
    }
}

impl TraceValidator {
    pub fn with_required_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn validate(&self, record: &Value) -> Result<MemoryTrace, ValidationError> {
        let Value::Object(map) = record else {
            return Err(ValidationError::NotAnObject);
        };

        for field in &self.required_fields {
            if present(map, field).is_none() {
                return Err(ValidationError::MissingField(field.clone()));
            }
        }

        if let Some(kind) = present(map, "type") {
            if !kind.as_str().is_some_and(|s| s.parse::<TraceType>().is_ok()) {
                return Err(ValidationError::InvalidType(describe(kind)));
            }
        }

        if let Some(timestamp) = present(map, "timestamp") {
            if timestamp.as_str().and_then(parse_timestamp).is_none() {
                return Err(ValidationError::InvalidTimestamp(describe(timestamp)));
            }
        }

        if let Some(importance) = present(map, "importance") {
            let value = importance
                .as_f64()
                .ok_or_else(|| ValidationError::ImportanceNotNumeric(describe(importance)))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ImportanceOutOfRange(value));
            }
        }

        if present(map, "collaborators").is_some_and(|v| !v.is_array()) {
            return Err(ValidationError::CollaboratorsNotList);
        }

        if let Some(status) = present(map, "completion_status") {
            if !status
                .as_str()
                .is_some_and(|s| s.parse::<CompletionStatus>().is_ok())
            {
                return Err(ValidationError::InvalidCompletionStatus(describe(status)));
            }
        }

        if let Some(visibility) = present(map, "visibility") {
            if !visibility
                .as_str()
                .is_some_and(|s| s.parse::<Visibility>().is_ok())
            {
                return Err(ValidationError::InvalidVisibility(describe(visibility)));
            }
        }

        if present(map, "linked_event_uid").is_some_and(|v| !v.is_string()) {
            return Err(ValidationError::LinkedEventUidNotText);
        }

        if present(map, "embedding").is_some_and(|v| !v.is_array()) {
            return Err(ValidationError::EmbeddingNotList);
        }

        serde_json::from_value(record.clone())
            .map_err(|error| ValidationError::Malformed(error.to_string()))
    }
}

/// Validate with the default required-field set.
pub fn validate(record: &Value) -> Result<MemoryTrace, ValidationError> {
    TraceValidator::default().validate(record)
}

// JSON null counts as absent.
fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "id": "t1",
            "type": "observation",
            "timestamp": "2024-04-07T09:00:00Z",
            "content": "Temperature drifted above target.",
            "task_id": "lab_ops"
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut record = minimal();
        record[field] = value;
        record
    }

    fn without(field: &str) -> Value {
        let mut record = minimal();
        record.as_object_mut().unwrap().remove(field);
        record
    }

    #[test]
    fn test_accepts_only_required_fields() {
        let trace = validate(&minimal()).unwrap();
        assert_eq!(trace.id.as_deref(), Some("t1"));
        assert_eq!(trace.trace_type, Some(TraceType::Observation));
        assert_eq!(trace.task_id.as_deref(), Some("lab_ops"));
        assert!(trace.timestamp.is_some());
    }

    #[test]
    fn test_rejects_missing_task_id() {
        let err = validate(&without("task_id")).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("task_id".into()));
    }

    #[test]
    fn test_each_required_field_is_checked() {
        for field in REQUIRED_FIELDS {
            let err = validate(&without(field)).unwrap_err();
            assert_eq!(err, ValidationError::MissingField(field.to_string()));
        }
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let err = validate(&with("content", Value::Null)).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("content".into()));
    }

    #[test]
    fn test_missing_field_reported_before_invalid_type() {
        let mut record = without("task_id");
        record["type"] = json!("meeting");
        let err = validate(&record).unwrap_err();
        assert_eq!(err.rule(), "required_fields");
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = validate(&with("type", json!("meeting"))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidType("meeting".into()));
    }

    #[test]
    fn test_rejects_non_text_type() {
        let err = validate(&with("type", json!(3))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidType("3".into()));
    }

    #[test]
    fn test_rejects_unparseable_timestamp() {
        let err = validate(&with("timestamp", json!("next tuesday"))).unwrap_err();
        assert_eq!(err.rule(), "timestamp");
        assert!(err.to_string().contains("next tuesday"));
    }

    #[test]
    fn test_type_checked_before_timestamp() {
        let mut record = with("type", json!("meeting"));
        record["timestamp"] = json!("garbage");
        assert_eq!(validate(&record).unwrap_err().rule(), "type");
    }

    #[test]
    fn test_importance_bounds() {
        assert!(validate(&with("importance", json!(0.0))).is_ok());
        assert!(validate(&with("importance", json!(1))).is_ok());
        assert_eq!(
            validate(&with("importance", json!(1.2))).unwrap_err(),
            ValidationError::ImportanceOutOfRange(1.2)
        );
        assert_eq!(
            validate(&with("importance", json!(-0.1))).unwrap_err(),
            ValidationError::ImportanceOutOfRange(-0.1)
        );
    }

    #[test]
    fn test_importance_must_be_numeric() {
        let err = validate(&with("importance", json!("high"))).unwrap_err();
        assert_eq!(err, ValidationError::ImportanceNotNumeric("high".into()));
    }

    #[test]
    fn test_collaborators_must_be_list() {
        let err = validate(&with("collaborators", json!("alice"))).unwrap_err();
        assert_eq!(err, ValidationError::CollaboratorsNotList);

        let trace = validate(&with("collaborators", json!(["alice", "bob"]))).unwrap();
        assert_eq!(
            trace.collaborators,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
    }

    #[test]
    fn test_completion_status_membership() {
        assert!(validate(&with("completion_status", json!("done"))).is_ok());
        let err = validate(&with("completion_status", json!("finished"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCompletionStatus("finished".into())
        );
    }

    #[test]
    fn test_visibility_membership() {
        assert!(validate(&with("visibility", json!("public"))).is_ok());
        let err = validate(&with("visibility", json!("team"))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidVisibility("team".into()));
    }

    #[test]
    fn test_completion_status_checked_before_visibility() {
        let mut record = with("completion_status", json!("finished"));
        record["visibility"] = json!("team");
        assert_eq!(validate(&record).unwrap_err().rule(), "completion_status");
    }

    #[test]
    fn test_linked_event_uid_must_be_text() {
        let err = validate(&with("linked_event_uid", json!(42))).unwrap_err();
        assert_eq!(err, ValidationError::LinkedEventUidNotText);
    }

    #[test]
    fn test_embedding_must_be_list() {
        let err = validate(&with("embedding", json!("0.1,0.2"))).unwrap_err();
        assert_eq!(err, ValidationError::EmbeddingNotList);
        assert_eq!(err.rule(), "embedding");

        let trace = validate(&with("embedding", json!([0.1, 0.2]))).unwrap();
        assert_eq!(trace.extra.get("embedding"), Some(&json!([0.1, 0.2])));
    }

    #[test]
    fn test_linked_event_uid_checked_before_embedding() {
        let mut record = with("linked_event_uid", json!(42));
        record["embedding"] = json!({});
        assert_eq!(validate(&record).unwrap_err().rule(), "linked_event_uid");
    }

    #[test]
    fn test_non_text_content_is_malformed() {
        let err = validate(&with("content", json!(17))).unwrap_err();
        assert_eq!(err.rule(), "shape");
    }

    #[test]
    fn test_rejects_non_object() {
        assert_eq!(
            validate(&json!(["t1"])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_loosened_required_fields() {
        let validator = TraceValidator::with_required_fields(["id", "type", "task_id"]);
        let trace = validator.validate(&without("content")).unwrap();
        assert!(trace.content.is_none());
        assert_eq!(validator.required_fields().len(), 3);
    }
}
