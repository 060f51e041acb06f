use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use domains::{DomainError, EventPayload};

use super::{ApiError, AppState};

const PAYLOAD_FIELD: &str = "payload";
const THUMB_FIELD: &str = "thumb";
const IMAGE_SUFFIX: &str = ".jpg";

/// `POST /` - one Plex webhook delivery.
pub(super) async fn ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut payload: Option<String> = None;
    let mut thumb: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            PAYLOAD_FIELD => payload = Some(field.text().await?),
            THUMB_FIELD => thumb = Some(field.bytes().await?),
            _ => {}
        }
    }

    let payload = match parse_payload(payload.as_deref()) {
        Ok(payload) => payload,
        Err(e) => {
            state.metrics.reject();
            return Err(e.into());
        }
    };

    match state.playback.ingest(&payload, thumb).await {
        Ok(outcome) => {
            state.metrics.observe(&outcome);
            Ok((StatusCode::OK, "OK").into_response())
        }
        Err(e) => {
            state.metrics.reject();
            Err(e.into())
        }
    }
}

fn parse_payload(raw: Option<&str>) -> Result<EventPayload, DomainError> {
    let raw = raw.ok_or_else(|| DomainError::validation("missing payload field"))?;
    serde_json::from_str(raw)
        .map_err(|e| DomainError::validation(format!("payload is not valid JSON: {e}")))
}

/// `GET /images/{key}.jpg`
pub(super) async fn image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let key = image_key(&file).ok_or_else(|| DomainError::NotFound(file.clone()))?;
    let jpeg = state.images.fetch_jpeg(key).await?;
    Ok((
        [(header::CONTENT_TYPE, mime::IMAGE_JPEG.as_ref())],
        jpeg,
    )
        .into_response())
}

fn image_key(file: &str) -> Option<&str> {
    file.strip_suffix(IMAGE_SUFFIX).filter(|key| !key.is_empty())
}

pub(super) async fn health() -> &'static str {
    "ok"
}

pub(super) async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| DomainError::Internal(format!("failed to encode metrics: {e}")))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response())
}

pub(super) async fn not_found() -> ApiError {
    ApiError::Domain(DomainError::NotFound("route".into()))
}
