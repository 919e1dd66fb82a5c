use std::collections::HashMap;

use axum::{
    extract::rejection::JsonRejection,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dog_presign::{DownloadedObject, ObjectKey, TransferCtx};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::multipart::UploadForm;
use crate::{PresignAxumError, PresignState};

const REQUEST_ID_HEADER: &str = "x-request-id";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub presigned_url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub key: ObjectKey,
    pub message: String,
}

impl UploadResponse {
    fn created(key: ObjectKey) -> Response {
        let message = format!("File {} uploaded successfully", key);
        (StatusCode::CREATED, Json(Self { key, message })).into_response()
    }
}

fn ctx_from_headers(headers: &HeaderMap) -> TransferCtx {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|id| TransferCtx::new().with_request_id(id))
        .unwrap_or_default()
}

fn map_json_rejection(rejection: JsonRejection) -> PresignAxumError {
    RequestError::Json(rejection.body_text()).into()
}

fn file_response(object: DownloadedObject) -> Response {
    let content_type = object
        .content_type
        .clone()
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    let disposition = object.content_disposition();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        object.bytes,
    )
        .into_response()
}

pub fn router(state: PresignState) -> Router<()> {
    Router::new()
        .route("/grants/upload", post(upload_grant))
        .route("/grants/download", get(download_grant))
        .route("/uploads", post(complete_upload))
        .route("/downloads", post(complete_download))
        .route("/files", post(upload_file))
        .route("/files/{*key}", get(download_file))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn upload_grant(
    State(state): State<PresignState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let form = UploadForm::from_multipart(multipart, state.max_file_bytes()).await?;

    let grant = state.transfers.request_upload_grant(&ctx, form.file()?).await?;
    Ok(Json(grant).into_response())
}

async fn complete_upload(
    State(state): State<PresignState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let form = UploadForm::from_multipart(multipart, state.max_file_bytes()).await?;

    let key = state
        .transfers
        .complete_upload(&ctx, form.file()?, form.presigned_url()?)
        .await?;
    Ok(UploadResponse::created(key))
}

async fn upload_file(
    State(state): State<PresignState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let form = UploadForm::from_multipart(multipart, state.max_file_bytes()).await?;

    let key = state.transfers.upload(&ctx, form.file()?).await?;
    Ok(UploadResponse::created(key))
}

async fn download_grant(
    State(state): State<PresignState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let key = query.get("key").ok_or(RequestError::MissingField("key"))?;

    let grant = state.transfers.request_download_grant(&ctx, key).await?;
    Ok(Json(grant).into_response())
}

async fn complete_download(
    State(state): State<PresignState>,
    headers: HeaderMap,
    data: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let Json(request) = data.map_err(map_json_rejection)?;

    let object = state
        .transfers
        .complete_download(&ctx, request.presigned_url.trim())
        .await?;
    Ok(file_response(object))
}

async fn download_file(
    State(state): State<PresignState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Response, PresignAxumError> {
    let ctx = ctx_from_headers(&headers);
    let object = state.transfers.download(&ctx, &key).await?;
    Ok(file_response(object))
}
