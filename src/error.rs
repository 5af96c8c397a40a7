use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kube::core::admission::SerializePatchError;

/// Errors raised while handling a single admission review.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The request body is not a decodable admission review
    #[error("{0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The admission review carried no request section
    #[error("admission review does not contain a request")]
    MissingRequest,

    /// The embedded object could not be parsed
    #[error("could not unmarshal raw object: {0}")]
    MalformedObject(#[source] serde_json::Error),

    /// The JSON patch could not be attached to the response
    #[error("could not encode patch: {0}")]
    Patch(#[from] SerializePatchError),

    /// The response envelope could not be serialized
    #[error("could not encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("empty body")]
    EmptyBody,

    #[error("Content-Type={0}, expect application/json")]
    InvalidContentType(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::EmptyBody => (StatusCode::BAD_REQUEST, "empty body".to_string()),
            WebhookError::InvalidContentType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "invalid Content-Type, expect `application/json`".to_string(),
            ),
            // Review-level errors are folded into the review body, so only
            // encoding failures end up here.
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_status() {
        let test_cases = vec![
            ("empty body", WebhookError::EmptyBody, StatusCode::BAD_REQUEST),
            (
                "content type",
                WebhookError::InvalidContentType("text/plain".to_string()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                "encode",
                WebhookError::Encode(serde_json::from_str::<u8>("x").unwrap_err()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                "review level error",
                WebhookError::MissingRequest,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (name, err, expected) in test_cases {
            assert_eq!(err.into_response().status(), expected, "Failed test case: {}", name);
        }
    }
}
