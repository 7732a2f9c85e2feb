use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Invalid threshold: {0}")] InvalidThreshold(String),

    #[error("Not found: {0}")] NotFound(String),

    #[error("Scrape error: {0}")] Scrape(String),

    #[error("Scrape timed out after {0}s")] ScrapeTimeout(u64),

    #[error("Notification error: {0}")] Notification(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Scrape(e.to_string())
    }
}

impl From<teloxide::RequestError> for AppError {
    fn from(e: teloxide::RequestError) -> Self {
        AppError::Notification(e.to_string())
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Failures worth retrying on the next cycle. Anything else points at a
    /// bug or a broken deployment.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Scrape(_) | AppError::ScrapeTimeout(_) | AppError::Notification(_))
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field) = match self {
            AppError::Database(e) => ("DATABASE_ERROR", e.to_string(), None),
            AppError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None),
            AppError::InvalidThreshold(msg) =>
                ("INVALID_THRESHOLD", msg.clone(), Some("threshold".to_string())),
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Scrape(msg) => ("SCRAPE_ERROR", msg.clone(), None),
            AppError::ScrapeTimeout(_) => ("SCRAPE_TIMEOUT", self.to_string(), None),
            AppError::Notification(msg) => ("NOTIFICATION_ERROR", msg.clone(), None),
            AppError::Config(msg) => ("CONFIG_ERROR", msg.clone(), None),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::InvalidThreshold(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::Scrape(_) | AppError::ScrapeTimeout(_) => axum::http::StatusCode::BAD_GATEWAY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        let response = AppError::InvalidThreshold("must be positive".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::InvalidInput("bad url".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scrape_errors_map_to_bad_gateway() {
        assert_eq!(AppError::ScrapeTimeout(30).into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::NotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_threshold_error_names_field() {
        let body = AppError::InvalidThreshold("must be positive".into()).to_error_response();
        assert_eq!(body.error.code, "INVALID_THRESHOLD");
        assert_eq!(body.error.field.as_deref(), Some("threshold"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(AppError::ScrapeTimeout(5).is_transient());
        assert!(AppError::Notification("blocked".into()).is_transient());
        assert!(!AppError::InvalidThreshold("0".into()).is_transient());
        assert!(!AppError::Database(sea_orm::DbErr::Custom("relation missing".into())).is_transient());
    }
}
