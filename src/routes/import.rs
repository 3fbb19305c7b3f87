use crate::common::{ApiError, ApiResult};
use crate::models::ImportFile;
use axum::extract::Multipart;
use axum::http::header;
use axum::response::IntoResponse;

const FILE_FIELD: &str = "file";

/// Pulls the `file` part out of an import upload, bytes untouched.
pub(super) async fn read_import_file(mut multipart: Multipart) -> ApiResult<ImportFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("import.csv").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(ImportFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::Validation(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

pub(super) fn template(file_name: &str, content: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        content,
    )
}
