//! Buffered multipart/form-data reader for admin forms.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::error::{AppError, AppResult};
use crate::file::{IncomingFile, MAX_FILE_SIZE};

/// Text fields and uploaded files from one multipart request.
///
/// Text fields keep every submitted value in order, so repeated fields
/// (e.g. several `tags`) are not lost.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, IncomingFile>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::bad_request(err.body_text())
    }
}

impl FormData {
    /// Drain the request body.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    if data.len() > MAX_FILE_SIZE {
                        return Err(AppError::PayloadTooLarge(format!(
                            "File too large ({} bytes). Maximum size is {MAX_FILE_SIZE} bytes",
                            data.len()
                        )));
                    }
                    // Browsers send an empty part for an untouched file input.
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        IncomingFile {
                            filename,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }

        Ok(form)
    }

    /// First value of a text field, if it was submitted.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(|v| v.first()).cloned()
    }

    /// Every value of a text field, if it was submitted at all.
    pub fn texts(&self, name: &str) -> Option<Vec<String>> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<IncomingFile> {
        self.files.remove(name)
    }
}
