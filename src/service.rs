use axum::{
    async_trait,
    extract::{multipart::MultipartError, DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};
use crate::preprocess::{decode_base64, decode_image};
use crate::report::Diagnosis;
use crate::state::SharedState;

/// Builds the HTTP application.
pub fn router(state: SharedState) -> Router {
    let max_upload = state.settings.max_upload_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// GET /health
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.model_loaded(),
    })
}

/// Image and optional plant hint of a prediction request, read from either
/// a multipart upload or a JSON body.
#[derive(Debug)]
pub struct PredictInput {
    pub image: Vec<u8>,
    pub plant_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonPredict {
    image_data: Option<String>,
    plant_name: Option<String>,
}

fn rejection(status: StatusCode, text: String) -> Error {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(text)
    } else {
        Error::BadRequest(text)
    }
}

fn multipart_error(e: MultipartError) -> Error {
    rejection(e.status(), e.body_text())
}

async fn read_multipart(mut multipart: Multipart) -> Result<PredictInput> {
    let mut image = None;
    let mut plant_name = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
                        return Err(Error::NotAnImage(content_type.to_string()));
                    }
                }
                image = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            Some("plant_name") => {
                plant_name = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let image = image.filter(|bytes| !bytes.is_empty()).ok_or(Error::MissingImage)?;
    Ok(PredictInput { image, plant_name })
}

#[async_trait]
impl<S> FromRequest<S> for PredictInput
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            read_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<JsonPredict>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            let data = body
                .image_data
                .filter(|d| !d.trim().is_empty())
                .ok_or(Error::MissingImage)?;
            Ok(PredictInput {
                image: decode_base64(&data)?,
                plant_name: body.plant_name,
            })
        } else {
            Err(Error::MissingImage)
        }
    }
}

/// POST /predict
pub async fn predict(
    State(state): State<SharedState>,
    input: std::result::Result<PredictInput, Error>,
) -> Result<Json<Diagnosis>> {
    if !state.model_loaded() {
        return Err(Error::ModelNotLoaded);
    }
    let input = input?;

    let worker = state.clone();
    let diagnosis = tokio::task::spawn_blocking(move || {
        let image = decode_image(&input.image)?;
        worker.diagnose(&image, input.plant_name.as_deref())
    })
    .await
    .map_err(|e| Error::Inference(e.to_string()))??;

    info!(
        class = %diagnosis.prediction.full_class,
        confidence = diagnosis.prediction.confidence,
        filtered = diagnosis.prediction.plant_filter.applied,
        "prediction served"
    );
    Ok(Json(diagnosis))
}
