//! Build and validation options

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::formats::{FormatTypeLocator, FormatTypes};
use crate::locator::{MetaSchemaLocator, SchemaLocator, VocabularyLocator};
use crate::media::{ContentEncodingLocator, ContentEncodingTypes, ContentMediaTypeLocator, ContentMediaTypeTypes};
use crate::vocabulary::{draft2020_12, MetaSchema};

/// Default limit on nested evaluation scopes
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Handling of keywords the effective meta-schema does not define
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeywords {
    /// Skip them entirely
    Ignore,
    /// Compile them into annotations carrying their literal value
    #[default]
    Annotate,
    /// Fail the build
    Error,
}

/// Whether annotation values are reported in detailed and verbose output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectAnnotations {
    #[default]
    None,
    All,
}

/// How `format` is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Assert only when the meta-schema enables the format-assertion vocabulary
    #[default]
    Annotate,
    /// Always assert known formats
    Assert,
}

/// Options shared by the builder and the validator
#[derive(Clone)]
pub struct Options {
    /// Meta-schema used when a schema has no `$schema`
    pub default_schema: Arc<MetaSchema>,
    pub unknown_keywords: UnknownKeywords,
    /// Resolves `$ref` targets outside the schema being validated
    pub schema_locator: Option<Arc<dyn SchemaLocator>>,
    pub meta_schema_locator: Option<Arc<dyn MetaSchemaLocator>>,
    pub vocabulary_locator: Option<Arc<dyn VocabularyLocator>>,
    pub format_type_locator: Arc<dyn FormatTypeLocator>,
    pub content_media_type_locator: Arc<dyn ContentMediaTypeLocator>,
    pub content_encoding_locator: Arc<dyn ContentEncodingLocator>,
    pub collect_annotations: CollectAnnotations,
    pub format_mode: FormatMode,
    /// Validate `contentEncoding`, `contentMediaType` and `contentSchema`
    pub assert_content: bool,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_schema: draft2020_12::meta_schema(),
            unknown_keywords: UnknownKeywords::default(),
            schema_locator: None,
            meta_schema_locator: None,
            vocabulary_locator: None,
            format_type_locator: Arc::new(FormatTypes::default()),
            content_media_type_locator: Arc::new(ContentMediaTypeTypes::default()),
            content_encoding_locator: Arc::new(ContentEncodingTypes::default()),
            collect_annotations: CollectAnnotations::default(),
            format_mode: FormatMode::default(),
            assert_content: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn with_default_schema(mut self, meta_schema: Arc<MetaSchema>) -> Self {
        self.default_schema = meta_schema;
        self
    }

    pub fn with_unknown_keywords(mut self, policy: UnknownKeywords) -> Self {
        self.unknown_keywords = policy;
        self
    }

    pub fn with_schema_locator(mut self, locator: Arc<dyn SchemaLocator>) -> Self {
        self.schema_locator = Some(locator);
        self
    }

    pub fn with_meta_schema_locator(mut self, locator: Arc<dyn MetaSchemaLocator>) -> Self {
        self.meta_schema_locator = Some(locator);
        self
    }

    pub fn with_vocabulary_locator(mut self, locator: Arc<dyn VocabularyLocator>) -> Self {
        self.vocabulary_locator = Some(locator);
        self
    }

    pub fn with_format_type_locator(mut self, locator: Arc<dyn FormatTypeLocator>) -> Self {
        self.format_type_locator = locator;
        self
    }

    pub fn with_content_media_type_locator(mut self, locator: Arc<dyn ContentMediaTypeLocator>) -> Self {
        self.content_media_type_locator = locator;
        self
    }

    pub fn with_content_encoding_locator(mut self, locator: Arc<dyn ContentEncodingLocator>) -> Self {
        self.content_encoding_locator = locator;
        self
    }

    pub fn with_collect_annotations(mut self, collect: CollectAnnotations) -> Self {
        self.collect_annotations = collect;
        self
    }

    pub fn with_format_mode(mut self, mode: FormatMode) -> Self {
        self.format_mode = mode;
        self
    }

    pub fn with_assert_content(mut self, assert: bool) -> Self {
        self.assert_content = assert;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("default_schema", self.default_schema.id())
            .field("unknown_keywords", &self.unknown_keywords)
            .field("schema_locator", &self.schema_locator.is_some())
            .field("collect_annotations", &self.collect_annotations)
            .field("format_mode", &self.format_mode)
            .field("assert_content", &self.assert_content)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
