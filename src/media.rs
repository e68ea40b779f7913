//! Content encodings and media types
//!
//! Registries backing `contentEncoding` and `contentMediaType`. Decoding is
//! only attempted when content assertion is enabled in [`Options`].
//!
//! [`Options`]: crate::options::Options

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use thiserror::Error;

/// Failure to decode string content
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Invalid encoded content: {0}")]
    Encoding(String),

    #[error("Content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid JSON content: {0}")]
    Json(#[from] serde_json::Error),
}

/// A `contentEncoding` such as `base64`
pub trait ContentEncodingType: Send + Sync {
    fn identifier(&self) -> &str;

    fn decode(&self, encoded: &str) -> Result<Vec<u8>, ContentError>;
}

pub trait ContentEncodingLocator: Send + Sync {
    fn locate_content_encoding(&self, id: &str) -> Option<Arc<dyn ContentEncodingType>>;
}

/// A `contentMediaType` such as `application/json`
pub trait ContentMediaTypeType: Send + Sync {
    fn identifier(&self) -> &str;

    /// Parse decoded content into a value `contentSchema` can validate
    fn decode(&self, content: &[u8]) -> Result<Value, ContentError>;
}

pub trait ContentMediaTypeLocator: Send + Sync {
    fn locate_content_media_type(&self, id: &str) -> Option<Arc<dyn ContentMediaTypeType>>;
}

// =============================================================================
// Built-ins
// =============================================================================

/// RFC 4648 base64 with padding
pub struct Base64Encoding;

impl ContentEncodingType for Base64Encoding {
    fn identifier(&self) -> &str {
        "base64"
    }

    fn decode(&self, encoded: &str) -> Result<Vec<u8>, ContentError> {
        STANDARD
            .decode(encoded)
            .map_err(|error| ContentError::Encoding(error.to_string()))
    }
}

pub struct JsonMediaType;

impl ContentMediaTypeType for JsonMediaType {
    fn identifier(&self) -> &str {
        "application/json"
    }

    fn decode(&self, content: &[u8]) -> Result<Value, ContentError> {
        let text = std::str::from_utf8(content)?;
        Ok(serde_json::from_str(text)?)
    }
}

// =============================================================================
// Registries
// =============================================================================

pub struct ContentEncodingTypes {
    encodings: RwLock<HashMap<String, Arc<dyn ContentEncodingType>>>,
}

impl ContentEncodingTypes {
    pub fn empty() -> Self {
        Self {
            encodings: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, encoding: Arc<dyn ContentEncodingType>) {
        self.encodings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(encoding.identifier().to_string(), encoding);
    }
}

impl Default for ContentEncodingTypes {
    fn default() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(Base64Encoding));
        registry
    }
}

impl ContentEncodingLocator for ContentEncodingTypes {
    fn locate_content_encoding(&self, id: &str) -> Option<Arc<dyn ContentEncodingType>> {
        self.encodings.read().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }
}

pub struct ContentMediaTypeTypes {
    media_types: RwLock<HashMap<String, Arc<dyn ContentMediaTypeType>>>,
}

impl ContentMediaTypeTypes {
    pub fn empty() -> Self {
        Self {
            media_types: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, media_type: Arc<dyn ContentMediaTypeType>) {
        self.media_types
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(media_type.identifier().to_string(), media_type);
    }
}

impl Default for ContentMediaTypeTypes {
    fn default() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(JsonMediaType));
        registry
    }
}

impl ContentMediaTypeLocator for ContentMediaTypeTypes {
    fn locate_content_media_type(&self, id: &str) -> Option<Arc<dyn ContentMediaTypeType>> {
        self.media_types.read().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base64_then_json() {
        let encoding = ContentEncodingTypes::default().locate_content_encoding("base64").unwrap();
        let bytes = encoding.decode("eyJmb28iOiAiYmFyIn0=").unwrap();
        let media_type = ContentMediaTypeTypes::default()
            .locate_content_media_type("application/json")
            .unwrap();
        assert_eq!(media_type.decode(&bytes).unwrap(), json!({"foo": "bar"}));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(Base64Encoding.decode("not base64!"), Err(ContentError::Encoding(_))));
        assert!(matches!(JsonMediaType.decode(b"{"), Err(ContentError::Json(_))));
        assert!(matches!(JsonMediaType.decode(&[0xff, 0xfe]), Err(ContentError::Utf8(_))));
    }
}
