//! Error type shared by the pipeline and the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// Request carried neither an `image` file nor `image_data`
    #[error("No image provided")]
    MissingImage,

    /// Uploaded part was not declared as an image
    #[error("Only image files are allowed, got '{0}'")]
    NotAnImage(String),

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to process image: {0}")]
    Decode(#[from] image::ImageError),

    /// Malformed multipart or JSON body
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Prediction failed: {0}")]
    Inference(String),

    #[error("Prediction failed: {0}")]
    Ort(#[from] ort::Error),

    #[error("Failed to resize image: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingImage
            | Error::NotAnImage(_)
            | Error::Base64(_)
            | Error::Decode(_)
            | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(%status, "{}", message);
        } else {
            tracing::warn!(%status, "{}", message);
        }
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
