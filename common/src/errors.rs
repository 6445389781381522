// Error handling framework

use std::fmt;
use thiserror::Error;

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Row decoding failed: {0}")]
    DecodeFailed(String),
}

/// Machine-readable status carried by every service error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: u32,
    pub message: &'static str,
}

impl Status {
    pub const REQUEST_PARAMS_NOT_VALID_ERROR: Status = Status {
        code: 10001,
        message: "request parameter {0} is not valid",
    };
    pub const QUERY_RULE_LIST_PAGING_ERROR: Status = Status {
        code: 1200001,
        message: "query rule list paging error",
    };
    pub const QUERY_RULE_LIST_ERROR: Status = Status {
        code: 1200002,
        message: "query rule list error",
    };
    pub const QUERY_RULE_INPUT_ENTRY_LIST_ERROR: Status = Status {
        code: 1200003,
        message: "query rule input entry list error",
    };
    pub const GET_DATASOURCE_OPTIONS_ERROR: Status = Status {
        code: 1200005,
        message: "get datasource options error",
    };
    pub const GET_RULE_FORM_CREATE_JSON_ERROR: Status = Status {
        code: 1200006,
        message: "get rule form create json error",
    };

    /// Render the message, substituting `{0}` with `arg`
    pub fn format(&self, arg: &str) -> String {
        self.message.replace("{0}", arg)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Operation that was running when a persistence failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DqOperation {
    BuildFormDescriptor,
    ListDatasourceOptions,
    ListAllRules,
    ListRulesPaged,
}

impl DqOperation {
    /// Metric label
    pub fn as_str(self) -> &'static str {
        match self {
            DqOperation::BuildFormDescriptor => "build_form_descriptor",
            DqOperation::ListDatasourceOptions => "list_datasource_options",
            DqOperation::ListAllRules => "list_all_rules",
            DqOperation::ListRulesPaged => "list_rules_paged",
        }
    }

    fn status(self) -> Status {
        match self {
            DqOperation::BuildFormDescriptor => Status::GET_RULE_FORM_CREATE_JSON_ERROR,
            DqOperation::ListDatasourceOptions => Status::GET_DATASOURCE_OPTIONS_ERROR,
            DqOperation::ListAllRules => Status::QUERY_RULE_LIST_ERROR,
            DqOperation::ListRulesPaged => Status::QUERY_RULE_LIST_PAGING_ERROR,
        }
    }
}

/// Data-quality rule service errors
#[derive(Error, Debug)]
pub enum DqRuleError {
    /// Caller input is malformed; the payload names the offending parameters
    #[error("request parameter {0} is not valid")]
    InvalidParams(String),

    #[error("no input entries found for rule {rule_id}")]
    InputEntriesNotFound { rule_id: i32 },

    #[error("{operation:?} failed: {source}")]
    Database {
        operation: DqOperation,
        #[source]
        source: DatabaseError,
    },
}

impl DqRuleError {
    pub fn invalid_params(params: impl Into<String>) -> Self {
        DqRuleError::InvalidParams(params.into())
    }

    pub fn database(operation: DqOperation, source: DatabaseError) -> Self {
        DqRuleError::Database { operation, source }
    }

    pub fn status(&self) -> Status {
        match self {
            DqRuleError::InvalidParams(_) => Status::REQUEST_PARAMS_NOT_VALID_ERROR,
            DqRuleError::InputEntriesNotFound { .. } => Status::QUERY_RULE_INPUT_ENTRY_LIST_ERROR,
            DqRuleError::Database { operation, .. } => operation.status(),
        }
    }

    /// Human-readable message for API responses
    pub fn user_message(&self) -> String {
        match self {
            DqRuleError::InvalidParams(params) => self.status().format(params),
            _ => self.status().message.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DqRuleError::InvalidParams(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DqRuleError::InputEntriesNotFound { .. })
    }
}

/// API response error type for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ApiError {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&DqRuleError> for ApiError {
    fn from(err: &DqRuleError) -> Self {
        let api_error = ApiError::new(err.status().code, err.user_message());
        match err {
            DqRuleError::InvalidParams(params) => api_error.with_details(serde_json::json!({
                "params": params.split(',').map(str::trim).collect::<Vec<_>>(),
            })),
            DqRuleError::InputEntriesNotFound { rule_id } => {
                api_error.with_details(serde_json::json!({ "ruleId": rule_id }))
            }
            DqRuleError::Database { .. } => api_error,
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::DecodeFailed(err.to_string())
            }
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_params_names_fields() {
        let err = DqRuleError::invalid_params("startTime,endTime");
        assert_eq!(err.status().code, 10001);
        assert_eq!(
            err.user_message(),
            "request parameter startTime,endTime is not valid"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_input_entries_not_found_status() {
        let err = DqRuleError::InputEntriesNotFound { rule_id: 7 };
        assert_eq!(err.status(), Status::QUERY_RULE_INPUT_ENTRY_LIST_ERROR);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("rule 7"));
    }

    #[test]
    fn test_database_error_status_follows_operation() {
        let err = DqRuleError::database(
            DqOperation::ListRulesPaged,
            DatabaseError::QueryFailed("boom".into()),
        );
        assert_eq!(err.status(), Status::QUERY_RULE_LIST_PAGING_ERROR);
        assert_eq!(err.user_message(), "query rule list paging error");
    }

    #[test]
    fn test_api_error_from_service_error() {
        let err = DqRuleError::invalid_params("pageNo");
        let api_err = ApiError::from(&err);
        assert_eq!(api_err.code, 10001);
        assert!(api_err.message.contains("pageNo"));
        assert_eq!(api_err.details, Some(serde_json::json!({"params": ["pageNo"]})));

        let window = ApiError::from(&DqRuleError::invalid_params("startTime,endTime"));
        assert_eq!(
            window.details,
            Some(serde_json::json!({"params": ["startTime", "endTime"]}))
        );

        let missing = ApiError::from(&DqRuleError::InputEntriesNotFound { rule_id: 4 });
        assert_eq!(missing.details, Some(serde_json::json!({"ruleId": 4})));

        let db = DqRuleError::database(
            DqOperation::ListAllRules,
            DatabaseError::QueryFailed("boom".into()),
        );
        assert!(ApiError::from(&db).details.is_none());
    }
}
