//! Request shapes and validation rules for the log endpoints.
//!
//! Rules are declared with `validator` derives. [`validate`] runs them and
//! flattens any nested failures into [`FieldError`]s with dotted paths such
//! as `entries[2].message`.

use livemon_types::{LogDraft, LogLevel};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{ApiError, FieldError};

/// Default page size for `GET /api/logs`.
pub const DEFAULT_LIMIT: u32 = 50;

/// `nodeId` given to submitted entries that omit it.
pub const DEFAULT_NODE_ID: &str = "external";

/// Query parameters for `GET /api/logs`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LogsQuery {
    /// Page size, 1..=100 (default 50).
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// Records to skip from the newest (default 0).
    pub offset: Option<u64>,
}

impl LogsQuery {
    /// Effective page size.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Effective offset.
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// Body of `POST /api/logs`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitLogsRequest {
    /// Entries to append, 1..=100.
    #[validate(length(min = 1, max = 100), nested)]
    pub entries: Vec<LogSubmission>,
}

/// One submitted log entry.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogSubmission {
    /// Severity.
    pub level: LogLevel,
    /// Message text, 1..=1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
    /// Epoch milliseconds; the server time is used when absent.
    #[validate(range(min = 0))]
    pub timestamp: Option<i64>,
    /// Emitting node.
    #[validate(length(min = 1, max = 128))]
    pub node_id: Option<String>,
    /// Session id; a fresh one is generated when absent.
    #[validate(length(min = 1, max = 128))]
    pub session_id: Option<String>,
    /// Structured context.
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

impl LogSubmission {
    /// Fill defaults and produce a draft ready for the event log.
    pub fn into_draft(self, now: i64) -> LogDraft {
        LogDraft {
            level: self.level,
            message: self.message,
            timestamp: self.timestamp.unwrap_or(now),
            node_id: self.node_id.unwrap_or_else(|| DEFAULT_NODE_ID.to_owned()),
            session_id: self
                .session_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            context: self.context.unwrap_or_default(),
        }
    }
}

/// Run `input`'s validation rules.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] listing every failed rule.
pub fn validate<T: Validate>(input: &T) -> Result<(), ApiError> {
    input.validate().map_err(|errors| {
        let mut details = Vec::new();
        flatten("", &errors, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(details)
    })
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| FieldError {
                    field: path.clone(),
                    message: describe(e),
                }));
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let min = error.params.get("min");
    let max = error.params.get("max");
    match (&*error.code, min, max) {
        ("length", Some(min), Some(max)) => format!("length must be between {min} and {max}"),
        ("range", Some(min), Some(max)) => format!("must be between {min} and {max}"),
        ("range", Some(min), None) => format!("must be at least {min}"),
        (code, _, _) => format!("failed {code} check"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(message: &str) -> serde_json::Value {
        serde_json::json!({ "level": "INFO", "message": message })
    }

    fn details(err: ApiError) -> Vec<FieldError> {
        match err {
            ApiError::Validation(details) => details,
            other => vec![FieldError {
                field: String::from("<unexpected>"),
                message: other.to_string(),
            }],
        }
    }

    #[test]
    fn query_defaults() {
        let query = LogsQuery::default();
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);
        assert!(validate(&query).is_ok());
    }

    #[test]
    fn query_limit_out_of_range() {
        for limit in [0, 101] {
            let query = LogsQuery {
                limit: Some(limit),
                offset: None,
            };
            let details = details(validate(&query).unwrap_err());
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].field, "limit");
            assert!(details[0].message.contains("100"));
        }
    }

    #[test]
    fn valid_submission_passes() {
        let req: SubmitLogsRequest =
            serde_json::from_value(serde_json::json!({ "entries": [entry("ok")] })).unwrap();
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn empty_entries_rejected() {
        let req: SubmitLogsRequest =
            serde_json::from_value(serde_json::json!({ "entries": [] })).unwrap();
        let details = details(validate(&req).unwrap_err());
        assert_eq!(details[0].field, "entries");
    }

    #[test]
    fn too_many_entries_rejected() {
        let entries: Vec<_> = (0..101).map(|_| entry("x")).collect();
        let req: SubmitLogsRequest =
            serde_json::from_value(serde_json::json!({ "entries": entries })).unwrap();
        let details = details(validate(&req).unwrap_err());
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "entries");
        assert!(details[0].message.contains("100"));
    }

    #[test]
    fn batch_length_bounds_are_inclusive() {
        for count in [1, 100] {
            let entries: Vec<_> = (0..count).map(|_| entry("x")).collect();
            let req: SubmitLogsRequest =
                serde_json::from_value(serde_json::json!({ "entries": entries })).unwrap();
            assert!(validate(&req).is_ok(), "{count} entries should pass");
        }
    }

    #[test]
    fn nested_message_errors_carry_index() {
        let long = "a".repeat(1001);
        let req: SubmitLogsRequest = serde_json::from_value(serde_json::json!({
            "entries": [entry("fine"), entry(""), entry(&long)]
        }))
        .unwrap();
        let details = details(validate(&req).unwrap_err());
        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["entries[1].message", "entries[2].message"]);
        assert!(details[0].message.starts_with("length must be between"));
    }

    #[test]
    fn message_length_counts_characters() {
        let exactly = "é".repeat(1000);
        let req: SubmitLogsRequest =
            serde_json::from_value(serde_json::json!({ "entries": [entry(&exactly)] })).unwrap();
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn into_draft_fills_defaults() {
        let submission: LogSubmission = serde_json::from_value(entry("hello")).unwrap();
        let draft = submission.into_draft(77);
        assert_eq!(draft.timestamp, 77);
        assert_eq!(draft.node_id, DEFAULT_NODE_ID);
        assert!(!draft.session_id.is_empty());
        assert!(draft.context.is_empty());
    }

    #[test]
    fn into_draft_keeps_supplied_fields() {
        let submission: LogSubmission = serde_json::from_value(serde_json::json!({
            "level": "ERROR",
            "message": "boom",
            "timestamp": 5,
            "nodeId": "n1",
            "sessionId": "s1",
            "context": { "k": "v" }
        }))
        .unwrap();
        let draft = submission.into_draft(77);
        assert_eq!(draft.level, LogLevel::Error);
        assert_eq!(draft.timestamp, 5);
        assert_eq!(draft.node_id, "n1");
        assert_eq!(draft.session_id, "s1");
        assert_eq!(draft.context["k"], "v");
    }
}
