use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    Router,
};

use crate::{services::extraction::ImageUpload, AppState};

mod book;
mod quiz;

/// Room for a 10 MiB image plus the rest of the editor form.
const EXTRACT_BODY_LIMIT: usize = 12 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(quiz::routes())
        .merge(book::routes())
}

pub(crate) fn extract_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(EXTRACT_BODY_LIMIT)
}

/// An editor form posted as multipart, with the optional page photo.
pub(crate) struct EditorUpload {
    pub fields: Vec<(String, String)>,
    pub image: Option<ImageUpload>,
}

pub(crate) async fn read_editor_upload(
    mut multipart: Multipart,
) -> Result<EditorUpload, MultipartError> {
    let mut fields = Vec::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                image = Some(ImageUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            fields.push((name, field.text().await?));
        }
    }

    Ok(EditorUpload { fields, image })
}
