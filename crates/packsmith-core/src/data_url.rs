//! `data:` URL helpers for base64-encoded images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Decode a base64 data URL. Returns `None` for anything else.
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        let mime_type = if mime.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime.split(';').next().unwrap_or(mime).to_string()
        };
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self { mime_type, bytes })
    }

    /// Base64 payload without the header.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &str {
        extension_for_mime(&self.mime_type)
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.base64())
    }
}

/// Build a data URL from raw bytes.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Build a data URL from an already base64-encoded payload.
pub fn from_base64(mime_type: &str, payload: &str) -> String {
    format!("data:{mime_type};base64,{payload}")
}

pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// File extension for common mime types, `bin` otherwise.
pub fn extension_for_mime(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "model/gltf-binary" => "glb",
        "video/mp4" => "mp4",
        other => match other.split_once('/') {
            Some(("image", sub)) if !sub.is_empty() => sub,
            _ => "bin",
        },
    }
}
