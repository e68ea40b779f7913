//! Draft 2020-12
//!
//! Keyword tables for the eight standard vocabularies, the default dialect,
//! and [`Draft2020_12`], a locator serving the embedded meta-schema documents
//! and vocabularies by id.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use include_dir::{include_dir, Dir, File};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::behavior::{
    annotations, applicators, arrays, contents, generic, identifiers, numbers, objects, references,
    reservations, strings, BuildFn, Category, KeywordSpec,
};
use crate::builder::Builder;
use crate::error::LocateError;
use crate::keyword::Keyword;
use crate::locator::{MetaSchemaLocator, SchemaLocator, VocabularyLocator};
use crate::options::Options;
use crate::schema::Schema;
use crate::uri;
use crate::value::InstanceType;
use crate::vocabulary::{MetaSchema, Vocabulary};

static DOCUMENTS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas/draft2020-12");

pub const SCHEMA_ID: &str = "https://json-schema.org/draft/2020-12/schema";

pub const CORE: &str = "https://json-schema.org/draft/2020-12/vocab/core";
pub const APPLICATOR: &str = "https://json-schema.org/draft/2020-12/vocab/applicator";
pub const UNEVALUATED: &str = "https://json-schema.org/draft/2020-12/vocab/unevaluated";
pub const VALIDATION: &str = "https://json-schema.org/draft/2020-12/vocab/validation";
pub const META_DATA: &str = "https://json-schema.org/draft/2020-12/vocab/meta-data";
pub const FORMAT_ANNOTATION: &str = "https://json-schema.org/draft/2020-12/vocab/format-annotation";
pub const FORMAT_ASSERTION: &str = "https://json-schema.org/draft/2020-12/vocab/format-assertion";
pub const CONTENT: &str = "https://json-schema.org/draft/2020-12/vocab/content";

fn url(text: &str) -> Url {
    Url::parse(text).expect("vocabulary ids are absolute URIs")
}

/// A vocabulary whose meta-schema lives at `meta/<name>`
fn standard_vocabulary(id: &str, name: &str) -> Vocabulary {
    let schema_id = format!("https://json-schema.org/draft/2020-12/meta/{}", name);
    Vocabulary::new(url(id), url(&schema_id))
}

// =============================================================================
// Vocabularies
// =============================================================================

pub fn core() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(CORE, "core")
                .with_types(&InstanceType::ALL)
                .with_keyword(KeywordSpec::new(Keyword::ID, Category::Identifier, identifiers::build_id))
                .with_keyword(KeywordSpec::new(Keyword::SCHEMA, Category::Identifier, identifiers::build_schema))
                .with_keyword(KeywordSpec::new(Keyword::REF, Category::Reference, references::build_ref))
                .with_keyword(KeywordSpec::new(Keyword::ANCHOR, Category::Identifier, identifiers::build_anchor))
                .with_keyword(KeywordSpec::new(
                    Keyword::DYNAMIC_REF,
                    Category::Reference,
                    references::build_dynamic_ref,
                ))
                .with_keyword(KeywordSpec::new(
                    Keyword::DYNAMIC_ANCHOR,
                    Category::Identifier,
                    identifiers::build_dynamic_anchor,
                ))
                .with_keyword(KeywordSpec::new(
                    Keyword::VOCABULARY,
                    Category::Identifier,
                    identifiers::build_vocabulary,
                ))
                .with_keyword(KeywordSpec::new(Keyword::COMMENT, Category::Reserved, reservations::build_comment))
                .with_keyword(KeywordSpec::new(Keyword::DEFS, Category::Reserved, reservations::build_defs)),
        )
    })
    .clone()
}

pub fn applicator() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(APPLICATOR, "applicator")
                .with_types(&InstanceType::ALL)
                .with_keyword(KeywordSpec::new(Keyword::PREFIX_ITEMS, Category::Applicator, arrays::build_prefix_items))
                .with_keyword(
                    KeywordSpec::new(Keyword::ITEMS, Category::Applicator, arrays::build_items)
                        .depends_on(&["prefixItems"]),
                )
                .with_keyword(KeywordSpec::new(Keyword::CONTAINS, Category::Applicator, arrays::build_contains))
                .with_keyword(
                    KeywordSpec::new(
                        Keyword::ADDITIONAL_PROPERTIES,
                        Category::Applicator,
                        objects::build_additional_properties,
                    )
                    .depends_on(&["properties", "patternProperties"]),
                )
                .with_keyword(KeywordSpec::new(Keyword::PROPERTIES, Category::Applicator, objects::build_properties))
                .with_keyword(KeywordSpec::new(
                    Keyword::PATTERN_PROPERTIES,
                    Category::Applicator,
                    objects::build_pattern_properties,
                ))
                .with_keyword(KeywordSpec::new(
                    Keyword::DEPENDENT_SCHEMAS,
                    Category::Applicator,
                    objects::build_dependent_schemas,
                ))
                .with_keyword(KeywordSpec::new(
                    Keyword::PROPERTY_NAMES,
                    Category::Applicator,
                    objects::build_property_names,
                ))
                .with_keyword(KeywordSpec::new(Keyword::IF, Category::Applicator, applicators::build_if))
                .with_keyword(
                    KeywordSpec::new(Keyword::THEN, Category::Applicator, applicators::build_then).depends_on(&["if"]),
                )
                .with_keyword(
                    KeywordSpec::new(Keyword::ELSE, Category::Applicator, applicators::build_else).depends_on(&["if"]),
                )
                .with_keyword(KeywordSpec::new(Keyword::ALL_OF, Category::Composite, applicators::build_all_of))
                .with_keyword(KeywordSpec::new(Keyword::ANY_OF, Category::Composite, applicators::build_any_of))
                .with_keyword(KeywordSpec::new(Keyword::ONE_OF, Category::Composite, applicators::build_one_of))
                .with_keyword(KeywordSpec::new(Keyword::NOT, Category::Applicator, applicators::build_not)),
        )
    })
    .clone()
}

pub fn unevaluated() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(UNEVALUATED, "unevaluated")
                .with_types(&[InstanceType::Array, InstanceType::Object])
                .with_keyword(
                    KeywordSpec::new(
                        Keyword::UNEVALUATED_ITEMS,
                        Category::Unevaluated,
                        arrays::build_unevaluated_items,
                    )
                    .depends_on(&["prefixItems", "items", "contains"]),
                )
                .with_keyword(
                    KeywordSpec::new(
                        Keyword::UNEVALUATED_PROPERTIES,
                        Category::Unevaluated,
                        objects::build_unevaluated_properties,
                    )
                    .depends_on(&["properties", "patternProperties", "additionalProperties"]),
                ),
        )
    })
    .clone()
}

pub fn validation() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        let assertion = |keyword: Keyword, build: BuildFn| KeywordSpec::new(keyword, Category::Assertion, build);
        Arc::new(
            standard_vocabulary(VALIDATION, "validation")
                .with_types(&InstanceType::ALL)
                .with_keyword(assertion(Keyword::TYPE, generic::build_type))
                .with_keyword(assertion(Keyword::CONST, generic::build_const))
                .with_keyword(assertion(Keyword::ENUM, generic::build_enum))
                .with_keyword(assertion(Keyword::MULTIPLE_OF, numbers::build_multiple_of))
                .with_keyword(assertion(Keyword::MAXIMUM, numbers::build_maximum))
                .with_keyword(assertion(Keyword::EXCLUSIVE_MAXIMUM, numbers::build_exclusive_maximum))
                .with_keyword(assertion(Keyword::MINIMUM, numbers::build_minimum))
                .with_keyword(assertion(Keyword::EXCLUSIVE_MINIMUM, numbers::build_exclusive_minimum))
                .with_keyword(assertion(Keyword::MAX_LENGTH, strings::build_max_length))
                .with_keyword(assertion(Keyword::MIN_LENGTH, strings::build_min_length))
                .with_keyword(assertion(Keyword::PATTERN, strings::build_pattern))
                .with_keyword(assertion(Keyword::MAX_ITEMS, arrays::build_max_items))
                .with_keyword(assertion(Keyword::MIN_ITEMS, arrays::build_min_items))
                .with_keyword(assertion(Keyword::UNIQUE_ITEMS, arrays::build_unique_items))
                .with_keyword(assertion(Keyword::MAX_CONTAINS, arrays::build_max_contains).depends_on(&["contains"]))
                .with_keyword(assertion(Keyword::MIN_CONTAINS, arrays::build_min_contains).depends_on(&["contains"]))
                .with_keyword(assertion(Keyword::MAX_PROPERTIES, objects::build_max_properties))
                .with_keyword(assertion(Keyword::MIN_PROPERTIES, objects::build_min_properties))
                .with_keyword(assertion(Keyword::REQUIRED, objects::build_required))
                .with_keyword(assertion(Keyword::DEPENDENT_REQUIRED, objects::build_dependent_required)),
        )
    })
    .clone()
}

pub fn meta_data() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        let annotation = |keyword: Keyword, build: BuildFn| KeywordSpec::new(keyword, Category::Annotation, build);
        Arc::new(
            standard_vocabulary(META_DATA, "meta-data")
                .with_types(&InstanceType::ALL)
                .with_keyword(annotation(Keyword::TITLE, annotations::build_title))
                .with_keyword(annotation(Keyword::DESCRIPTION, annotations::build_description))
                .with_keyword(annotation(Keyword::DEFAULT, annotations::build_default))
                .with_keyword(annotation(Keyword::DEPRECATED, annotations::build_deprecated))
                .with_keyword(annotation(Keyword::READ_ONLY, annotations::build_read_only))
                .with_keyword(annotation(Keyword::WRITE_ONLY, annotations::build_write_only))
                .with_keyword(annotation(Keyword::EXAMPLES, annotations::build_examples)),
        )
    })
    .clone()
}

pub fn format_annotation() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(FORMAT_ANNOTATION, "format-annotation")
                .with_types(&[InstanceType::String])
                .with_keyword(KeywordSpec::new(
                    Keyword::FORMAT,
                    Category::Annotation,
                    annotations::build_format_annotation,
                )),
        )
    })
    .clone()
}

/// Not part of the default dialect; meta-schemas enabling it assert `format`
pub fn format_assertion() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(FORMAT_ASSERTION, "format-assertion")
                .with_types(&[InstanceType::String])
                .with_keyword(KeywordSpec::new(
                    Keyword::FORMAT,
                    Category::Annotation,
                    annotations::build_format_assertion,
                )),
        )
    })
    .clone()
}

pub fn content() -> Arc<Vocabulary> {
    static CELL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            standard_vocabulary(CONTENT, "content")
                .with_types(&[InstanceType::String])
                .with_keyword(KeywordSpec::new(
                    Keyword::CONTENT_ENCODING,
                    Category::Annotation,
                    contents::build_content_encoding,
                ))
                .with_keyword(
                    KeywordSpec::new(
                        Keyword::CONTENT_MEDIA_TYPE,
                        Category::Annotation,
                        contents::build_content_media_type,
                    )
                    .depends_on(&["contentEncoding"]),
                )
                .with_keyword(
                    KeywordSpec::new(
                        Keyword::CONTENT_SCHEMA,
                        Category::Annotation,
                        contents::build_content_schema,
                    )
                    .depends_on(&["contentMediaType"]),
                ),
        )
    })
    .clone()
}

fn vocabularies() -> [Arc<Vocabulary>; 8] {
    [
        core(),
        applicator(),
        unevaluated(),
        validation(),
        meta_data(),
        format_annotation(),
        format_assertion(),
        content(),
    ]
}

/// The Draft 2020-12 dialect
pub fn meta_schema() -> Arc<MetaSchema> {
    static CELL: OnceLock<Arc<MetaSchema>> = OnceLock::new();
    CELL.get_or_init(|| {
        Arc::new(
            MetaSchema::builder(url(SCHEMA_ID))
                .vocabulary(core(), true)
                .vocabulary(applicator(), true)
                .vocabulary(unevaluated(), true)
                .vocabulary(validation(), true)
                .vocabulary(meta_data(), true)
                .vocabulary(format_annotation(), true)
                .vocabulary(content(), true)
                .schema_locator(Arc::new(Draft2020_12))
                .build(),
        )
    })
    .clone()
}

// =============================================================================
// Embedded documents
// =============================================================================

fn collect_files<'d>(dir: &'d Dir<'d>, files: &mut Vec<&'d File<'d>>) {
    files.extend(dir.files());
    for nested in dir.dirs() {
        collect_files(nested, files);
    }
}

fn compile_document(file: &File<'_>) -> Option<Schema> {
    let value: Value = match serde_json::from_slice(file.contents()) {
        Ok(value) => value,
        Err(error) => {
            warn!(path = %file.path().display(), error = %error, "embedded meta-schema is not JSON");
            return None;
        }
    };
    let id = Url::parse(value.get("$id")?.as_str()?).ok()?;
    match Builder::build(&value, &id, &Options::default()) {
        Ok(schema) => Some(schema),
        Err(error) => {
            warn!(id = %id, error = %error, "embedded meta-schema failed to compile");
            None
        }
    }
}

/// Compiled meta-schema documents by id, built on first lookup
fn documents() -> &'static HashMap<Url, Schema> {
    static CELL: OnceLock<HashMap<Url, Schema>> = OnceLock::new();
    CELL.get_or_init(|| {
        let mut files = Vec::new();
        collect_files(&DOCUMENTS, &mut files);
        let documents: HashMap<Url, Schema> = files
            .into_iter()
            .filter(|file| file.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(compile_document)
            .map(|schema| (schema.id().clone(), schema))
            .collect();
        debug!(documents = documents.len(), "compiled embedded Draft 2020-12 meta-schemas");
        documents
    })
}

/// Locator for the built-in Draft 2020-12 documents, dialect and vocabularies
#[derive(Debug, Clone, Copy, Default)]
pub struct Draft2020_12;

impl SchemaLocator for Draft2020_12 {
    fn locate(&self, id: &Url) -> Result<Option<Schema>, LocateError> {
        Ok(documents().get(&uri::without_fragment(id)).cloned())
    }
}

impl MetaSchemaLocator for Draft2020_12 {
    fn locate_meta_schema(&self, id: &Url) -> Option<Arc<MetaSchema>> {
        (uri::without_fragment(id).as_str() == SCHEMA_ID).then(meta_schema)
    }
}

impl VocabularyLocator for Draft2020_12 {
    fn locate_vocabulary(&self, id: &Url) -> Option<Arc<Vocabulary>> {
        vocabularies().into_iter().find(|vocabulary| vocabulary.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_documents_compile() {
        for name in [
            "schema",
            "meta/core",
            "meta/applicator",
            "meta/unevaluated",
            "meta/validation",
            "meta/meta-data",
            "meta/format-annotation",
            "meta/format-assertion",
            "meta/content",
        ] {
            let id = url(&format!("https://json-schema.org/draft/2020-12/{}", name));
            let schema = Draft2020_12.locate(&id).unwrap();
            assert!(schema.is_some(), "missing embedded document {}", id);
        }
    }

    #[test]
    fn test_vocabularies_by_id() {
        let vocabulary = Draft2020_12.locate_vocabulary(&url(VALIDATION)).unwrap();
        assert!(vocabulary.keywords().iter().any(|spec| spec.keyword == Keyword::MIN_CONTAINS));
        assert!(Draft2020_12.locate_vocabulary(&url("https://example.com/vocab")).is_none());
        assert!(!meta_schema().has_vocabulary(FORMAT_ASSERTION));
    }

    #[test]
    fn test_meta_schema_validates_schemas() {
        let schema = Schema::compile(&json!({"$ref": SCHEMA_ID})).unwrap();
        assert!(schema.is_valid(&json!({"type": "string", "minLength": 2})));
        assert!(schema.is_valid(&json!({"properties": {"a": {"items": {"type": "integer"}}}})));
        assert!(!schema.is_valid(&json!({"minLength": -1})));
        assert!(!schema.is_valid(&json!({"properties": {"a": {"type": "strin"}}})));
        assert!(!schema.is_valid(&json!(12)));
    }

    #[test]
    fn test_format_assertion_dialect() {
        let dialect = MetaSchema::builder(url("http://example.com/format-assertion"))
            .vocabulary(core(), true)
            .vocabulary(validation(), true)
            .vocabulary(format_assertion(), true)
            .build();
        let options = Options::default().with_default_schema(Arc::new(dialect));
        let schema = Schema::compile_with(&json!({"format": "ipv4"}), &options).unwrap();
        let valid = |instance: Value| {
            schema
                .validate(&instance, crate::validator::OutputFormat::Flag, &options)
                .is_valid()
        };
        assert!(valid(json!("127.0.0.1")));
        assert!(!valid(json!("127.0.0")));
    }
}
