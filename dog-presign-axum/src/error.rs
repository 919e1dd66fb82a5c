use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dog_presign::{ErrorClass, TransferError};
use tracing::error;

/// Request-shape problems caught before anything reaches the orchestrator
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Missing '{0}' field")]
    MissingField(&'static str),

    #[error("Failed to read multipart body: {0}")]
    Multipart(String),

    #[error("Failed to parse the request body as JSON: {0}")]
    Json(String),
}

impl RequestError {
    fn to_json(&self) -> serde_json::Value {
        class_json(ErrorClass::BadRequest, self.to_string())
    }
}

/// Turn a multipart failure into the matching domain error.
///
/// A body over the server limit is reported the same way as an oversized
/// file; anything else is a malformed request.
pub(crate) fn multipart_error(err: MultipartError, max_file_bytes: u64) -> anyhow::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return TransferError::FileTooLarge {
            max_bytes: max_file_bytes,
        }
        .into();
    }
    RequestError::Multipart(err.body_text()).into()
}

#[derive(Debug)]
pub struct PresignAxumError(pub anyhow::Error);

impl<E> From<E> for PresignAxumError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for PresignAxumError {
    fn into_response(self) -> Response {
        // Transfer errors keep their kind and status, even under anyhow contexts
        if let Some(err) = self.0.chain().find_map(|e| e.downcast_ref::<TransferError>()) {
            if !err.is_client_error() {
                error!(error = ?self.0, "Transfer failed");
            }
            return respond(err.status_code(), err.to_json());
        }

        if let Some(err) = self.0.chain().find_map(|e| e.downcast_ref::<RequestError>()) {
            return respond(400, err.to_json());
        }

        error!(error = ?self.0, "Unhandled error");
        respond(500, class_json(ErrorClass::GeneralError, self.0.to_string()))
    }
}

fn class_json(class: ErrorClass, message: String) -> serde_json::Value {
    serde_json::json!({
        "name": class.name(),
        "message": message,
        "code": class.status_code(),
        "className": class.class_name(),
    })
}

fn respond(status: u16, body: serde_json::Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
