//! Content keywords: `contentEncoding`, `contentMediaType`, `contentSchema`
//!
//! All three annotate by default. With `assert_content` enabled, encoded
//! strings are decoded, parsed by the media type and validated against
//! `contentSchema`.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::behavior::{AnnotationBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::media::ContentError;
use crate::schema::{NodeIndex, SchemaDocument, SubSchema};
use crate::validator::Context;

#[derive(Debug, Clone)]
pub struct ContentEncoding {
    pub encoding: String,
}

impl ContentEncoding {
    pub(crate) fn annotate(&self, instance: &Value, ctx: &mut Context<'_>) -> Validation {
        let annotation = Validation::Annotation(Value::String(self.encoding.clone()));
        let Value::String(text) = instance else {
            return annotation;
        };
        if !ctx.options().assert_content {
            return annotation;
        }
        match ctx.options().content_encoding_locator.locate_content_encoding(&self.encoding) {
            Some(encoding) => match encoding.decode(text) {
                Ok(_) => annotation,
                Err(error) => Validation::invalid(format!("Must be encoded as '{}': {}", self.encoding, error)),
            },
            None => {
                warn!(encoding = %self.encoding, "unknown content encoding, not asserted");
                annotation
            }
        }
    }
}

pub fn build_content_encoding(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Some(encoding) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    Ok(Some(KeywordBehavior::Annotation(AnnotationBehavior::ContentEncoding(
        ContentEncoding {
            encoding: encoding.to_string(),
        },
    ))))
}

#[derive(Debug, Clone)]
pub struct ContentMediaType {
    pub media_type: String,
}

impl ContentMediaType {
    /// Decode and parse a string instance; `None` when the media type or the
    /// node's encoding is unknown
    fn decode(&self, text: &str, ctx: &Context<'_>, node: &SubSchema) -> Option<std::result::Result<Value, ContentError>> {
        let media_type = ctx
            .options()
            .content_media_type_locator
            .locate_content_media_type(&self.media_type)?;

        let bytes = match node.behavior(&Keyword::CONTENT_ENCODING) {
            Some(KeywordBehavior::Annotation(AnnotationBehavior::ContentEncoding(content))) => {
                let encoding = ctx
                    .options()
                    .content_encoding_locator
                    .locate_content_encoding(&content.encoding)?;
                match encoding.decode(text) {
                    Ok(bytes) => bytes,
                    Err(error) => return Some(Err(error)),
                }
            }
            _ => text.as_bytes().to_vec(),
        };
        Some(media_type.decode(&bytes))
    }

    pub(crate) fn annotate(&self, instance: &Value, ctx: &mut Context<'_>, node: &SubSchema) -> Validation {
        let annotation = Validation::Annotation(Value::String(self.media_type.clone()));
        let Value::String(text) = instance else {
            return annotation;
        };
        if !ctx.options().assert_content {
            return annotation;
        }
        match self.decode(text, ctx, node) {
            Some(Ok(_)) => annotation,
            // Encoding failures are reported by `contentEncoding`.
            Some(Err(ContentError::Encoding(_))) => annotation,
            Some(Err(error)) => {
                Validation::invalid(format!("Must be content of type '{}': {}", self.media_type, error))
            }
            None => {
                warn!(media_type = %self.media_type, "unknown content media type, not asserted");
                annotation
            }
        }
    }
}

pub fn build_content_media_type(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Some(media_type) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    Ok(Some(KeywordBehavior::Annotation(AnnotationBehavior::ContentMediaType(
        ContentMediaType {
            media_type: media_type.to_string(),
        },
    ))))
}

/// `contentSchema`; annotates the raw sub-schema value
#[derive(Debug, Clone)]
pub struct ContentSchema {
    pub schema: NodeIndex,
}

impl ContentSchema {
    pub(crate) fn annotate(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        let annotation = Validation::Annotation(doc.node(self.schema).instance().clone());
        let Value::String(text) = instance else {
            return annotation;
        };
        if !ctx.options().assert_content {
            return annotation;
        }
        let Some(KeywordBehavior::Annotation(AnnotationBehavior::ContentMediaType(media_type))) =
            node.behavior(&Keyword::CONTENT_MEDIA_TYPE)
        else {
            return annotation;
        };
        let content = match media_type.decode(text, ctx, node) {
            Some(Ok(content)) => content,
            _ => return annotation,
        };
        if ctx.validate_isolated(doc, self.schema, &content, None, None).is_valid() {
            annotation
        } else {
            Validation::invalid("Content must match 'contentSchema'")
        }
    }
}

pub fn build_content_schema(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Annotation(AnnotationBehavior::ContentSchema(
        ContentSchema { schema },
    ))))
}

#[cfg(test)]
mod tests {
    use crate::options::Options;
    use crate::schema::Schema;
    use crate::validator::OutputFormat;
    use serde_json::{json, Value};

    fn schema() -> Schema {
        Schema::compile(&json!({
            "contentEncoding": "base64",
            "contentMediaType": "application/json",
            "contentSchema": {"required": ["foo"], "properties": {"foo": {"type": "string"}}}
        }))
        .unwrap()
    }

    fn asserting(schema: &Schema, instance: Value) -> bool {
        let options = Options::default().with_assert_content(true);
        schema.validate(&instance, OutputFormat::Flag, &options).is_valid()
    }

    #[test]
    fn test_content_is_annotation_only_by_default() {
        let schema = schema();
        assert!(schema.is_valid(&json!("not base64!")));
        assert!(schema.is_valid(&json!("eyJib28iOiAyMH0=")));
    }

    #[test]
    fn test_content_assertion() {
        let schema = schema();
        // {"foo": "bar"}
        assert!(asserting(&schema, json!("eyJmb28iOiAiYmFyIn0=")));
        // {"boo": 20}
        assert!(!asserting(&schema, json!("eyJib28iOiAyMH0=")));
        assert!(!asserting(&schema, json!("not base64!")));
        // {:}
        assert!(!asserting(&schema, json!("ezp9Cg==")));
        assert!(asserting(&schema, json!(42)));
    }

    #[test]
    fn test_media_type_without_encoding() {
        let schema = Schema::compile(&json!({"contentMediaType": "application/json"})).unwrap();
        assert!(asserting(&schema, json!("{\"a\": 1}")));
        assert!(!asserting(&schema, json!("{")));
    }
}
