use actix_web::{get, web::{Data, Path}, HttpResponse};
use logger_libs::{info_logger, warning_logger};
use uuid::Uuid;

use crate::{error::PostError, AppState};

use super::storage::{content_type_for, UploadStorage};

#[get("/uploads/{filename}")]
pub async fn serve_upload(
    path: Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let handler_name = "serve_upload";
    let log_id = format!("{}.{}", handler_name, Uuid::new_v4());
    let filename = path.into_inner();

    if !UploadStorage::is_safe_name(&filename) {
        warning_logger(&log_id, handler_name, "validate_name", &filename);
        return Err(PostError::InvalidInput("Invalid file name".to_string()));
    }

    let bytes = app_state
        .uploads
        .read(&filename)
        .await
        .map_err(|error| PostError::internal("Failed to read upload", error))?
        .ok_or_else(|| PostError::NotFound("File not found".to_string()))?;

    info_logger(&log_id, handler_name, "read_file");
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&filename))
        .body(bytes))
}
