use axum::extract::Multipart;
use dog_presign::FileBlob;
use tracing::debug;

use crate::error::{multipart_error, RequestError};

pub const FILE_FIELD: &str = "file";
pub const PRESIGNED_URL_FIELD: &str = "presignedUrl";

/// Fields of an upload form: the file part and, for completions, the URL
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<FileBlob>,
    pub presigned_url: Option<String>,
}

impl UploadForm {
    /// Read every part of the form, buffering the file in memory.
    ///
    /// Unknown fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart, max_file_bytes: u64) -> anyhow::Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_file_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                FILE_FIELD => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, max_file_bytes))?;

                    let mut blob = FileBlob::new(bytes);
                    if let Some(file_name) = file_name {
                        blob = blob.with_file_name(file_name);
                    }
                    if let Some(content_type) = content_type {
                        blob = blob.with_content_type(content_type);
                    }
                    form.file = Some(blob);
                }
                PRESIGNED_URL_FIELD => {
                    let url = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_file_bytes))?;
                    form.presigned_url = Some(url.trim().to_string());
                }
                other => debug!(field = %other, "Ignoring multipart field"),
            }
        }

        Ok(form)
    }

    pub fn file(&self) -> Result<&FileBlob, RequestError> {
        self.file.as_ref().ok_or(RequestError::MissingField(FILE_FIELD))
    }

    pub fn presigned_url(&self) -> Result<&str, RequestError> {
        self.presigned_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(RequestError::MissingField(PRESIGNED_URL_FIELD))
    }
}
