use search_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("malformed catalog record {record}: {message}")]
    Catalog { record: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_pass_through_unchanged() {
        let err: AppError = CommonError::RedisUnavailable.into();
        assert!(matches!(err, AppError::Common(CommonError::RedisUnavailable)));
        assert_eq!(err.to_string(), CommonError::RedisUnavailable.to_string());
    }
}
