//! Electrolyte test utilities.
//!
//! Helpers for integration testing: request body builders, sample file
//! bytes, and fixtures for the content API.

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Admin secret used by the in-process test application.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Leading bytes of a PNG file (signature plus IHDR chunk header).
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x02\x00\x00\x00";

/// Leading bytes of a PDF document.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";

/// Leading bytes of a Windows executable.
pub const EXE_BYTES: &[u8] = b"MZ\x90\x00\x03\x00\x00\x00\x04\x00\x00\x00\xff\xff\x00\x00";

/// Builder for a `multipart/form-data` request body.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("----electrolyte-{}", Uuid::now_v7().simple()),
            buf: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Add a PNG file field.
    pub fn png(self, name: &str, filename: &str) -> Self {
        self.file(name, filename, "image/png", PNG_BYTES)
    }

    /// `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the body and return `(content_type, bytes)`.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = self.content_type();
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.buf)
    }
}

/// A complete contact form payload.
pub fn contact_payload(first_name: &str, message: &str) -> JsonValue {
    json!({
        "firstName": first_name,
        "lastName": "Tester",
        "email": format!("{}@example.com", first_name.to_lowercase()),
        "phone": "+1 555 0100",
        "company": "Acme Controls",
        "subject": "Repair quote",
        "message": message,
    })
}
