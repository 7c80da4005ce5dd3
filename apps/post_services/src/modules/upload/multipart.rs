use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, CONTENT_DISPOSITION};
use futures::TryStreamExt;

use crate::error::PostError;

use super::storage::UploadedFile;

pub const CONTENT_FIELD: &str = "content";
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub struct CreatePostForm {
    pub content: Option<String>,
    pub image: Option<UploadedFile>,
}

fn disposition(field: &Field) -> Option<ContentDisposition> {
    field
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| ContentDisposition::from_raw(value).ok())
}

async fn read_field(field: &mut Field, budget: &mut usize) -> Result<Vec<u8>, PostError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|error| PostError::InvalidInput(format!("Malformed form data: {}", error)))?
    {
        if chunk.len() > *budget {
            return Err(PostError::InvalidInput("Upload is too large".to_string()));
        }
        *budget -= chunk.len();
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Buffers the create-post form. Nothing touches disk here, so a form that
/// later fails validation leaves no file behind.
pub async fn read_create_form(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<CreatePostForm, PostError> {
    let mut form = CreatePostForm::default();
    let mut budget = max_bytes;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|error| PostError::InvalidInput(format!("Malformed form data: {}", error)))?
    {
        let Some(disposition) = disposition(&field) else {
            read_field(&mut field, &mut budget).await?;
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        match (name.as_str(), filename) {
            (IMAGE_FIELD, Some(filename)) => {
                if form.image.is_some() {
                    return Err(PostError::InvalidInput(
                        "Only one image can be attached".to_string(),
                    ));
                }
                let bytes = read_field(&mut field, &mut budget).await?;
                // browsers send an empty part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.image = Some(UploadedFile { filename, bytes });
            }
            (CONTENT_FIELD, None) => {
                let bytes = read_field(&mut field, &mut budget).await?;
                let content = String::from_utf8(bytes).map_err(|_| {
                    PostError::InvalidInput("Post content must be valid UTF-8".to_string())
                })?;
                form.content = Some(content);
            }
            _ => {
                read_field(&mut field, &mut budget).await?;
            }
        }
    }

    Ok(form)
}
