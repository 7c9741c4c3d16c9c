//! HTTP error mapping.
//!
//! Body shape is `{ "error": string }`, plus `raw` for unparseable
//! provider output. Upstream bodies and transport details are logged and
//! replaced with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use warmbound_research::ResearchError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body could not be read as JSON.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Research(#[from] ResearchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Research(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Research(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, raw) = match &self {
            ApiError::BadRequest(msg) => (msg.clone(), None),
            ApiError::Research(e) => match e {
                ResearchError::Validation(msg) | ResearchError::Configuration(msg) => {
                    (msg.clone(), None)
                }
                ResearchError::Upstream { status, body } => {
                    log::error!("Upstream error {}: {}", status, body);
                    (format!("Research provider returned {}", status), None)
                }
                ResearchError::Parse { reason, raw } => {
                    log::error!("Unparseable research payload: {}", reason);
                    (
                        "Failed to parse research response".to_string(),
                        Some(raw.clone()),
                    )
                }
                ResearchError::Transport(err) => {
                    log::error!("Transport error: {}", err);
                    ("Research provider unreachable".to_string(), None)
                }
                ResearchError::Cache(_) | ResearchError::Serialization(_) => {
                    log::error!("Internal error: {}", e);
                    ("Internal error".to_string(), None)
                }
            },
        };

        let body = match raw {
            Some(raw) => json!({ "error": message, "raw": raw }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request() {
        let err = ApiError::from(ResearchError::Validation("Domain is required".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_is_internal() {
        let errors = [
            ResearchError::Configuration("RESEARCH_API_KEY is not set".into()),
            ResearchError::Upstream {
                status: 429,
                body: "rate limited".into(),
            },
            ResearchError::Parse {
                reason: "eof".into(),
                raw: "{".into(),
            },
            ResearchError::Cache("disk full".into()),
        ];
        for e in errors {
            assert_eq!(ApiError::from(e).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
