//! Annotation keywords: meta-data, `format` and unknown keywords

use serde_json::Value;
use tracing::warn;

use crate::behavior::{AnnotationBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::options::FormatMode;
use crate::validator::Context;

/// `title`, `description`, `default`, `deprecated`, `readOnly`,
/// `writeOnly` and `examples`; annotates the literal value
#[derive(Debug, Clone)]
pub struct MetaData {
    pub keyword: Keyword,
    pub value: Value,
}

fn meta_data(keyword: Keyword, value: &Value) -> Result<Option<KeywordBehavior>> {
    Ok(Some(KeywordBehavior::Annotation(AnnotationBehavior::MetaData(MetaData {
        keyword,
        value: value.clone(),
    }))))
}

pub fn build_title(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_string() {
        return Err(ctx.invalid_type("string"));
    }
    meta_data(Keyword::TITLE, value)
}

pub fn build_description(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_string() {
        return Err(ctx.invalid_type("string"));
    }
    meta_data(Keyword::DESCRIPTION, value)
}

pub fn build_default(value: &Value, _ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    meta_data(Keyword::DEFAULT, value)
}

pub fn build_deprecated(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_boolean() {
        return Err(ctx.invalid_type("boolean"));
    }
    meta_data(Keyword::DEPRECATED, value)
}

pub fn build_read_only(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_boolean() {
        return Err(ctx.invalid_type("boolean"));
    }
    meta_data(Keyword::READ_ONLY, value)
}

pub fn build_write_only(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_boolean() {
        return Err(ctx.invalid_type("boolean"));
    }
    meta_data(Keyword::WRITE_ONLY, value)
}

pub fn build_examples(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_array() {
        return Err(ctx.invalid_type("array"));
    }
    meta_data(Keyword::EXAMPLES, value)
}

/// `format`
///
/// Always annotates the format name. Known formats are asserted when the
/// format-assertion vocabulary compiled the keyword or when
/// [`FormatMode::Assert`] is set.
#[derive(Debug, Clone)]
pub struct Format {
    pub name: String,
    pub assert: bool,
}

impl Format {
    pub(crate) fn annotate(&self, instance: &Value, ctx: &mut Context<'_>) -> Validation {
        let annotation = Validation::Annotation(Value::String(self.name.clone()));
        if !self.assert && ctx.options().format_mode != FormatMode::Assert {
            return annotation;
        }
        match ctx.options().format_type_locator.locate_format_type(&self.name) {
            Some(format) if !format.validate(instance) => {
                Validation::invalid(format!("Must be a valid '{}' value", self.name))
            }
            Some(_) => annotation,
            None => {
                warn!(format = %self.name, "unknown format, not asserted");
                annotation
            }
        }
    }
}

fn format(value: &Value, ctx: &BuildContext<'_>, assert: bool) -> Result<Option<KeywordBehavior>> {
    let Some(name) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    Ok(Some(KeywordBehavior::Annotation(AnnotationBehavior::Format(Format {
        name: name.to_string(),
        assert,
    }))))
}

pub fn build_format_annotation(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    format(value, ctx, false)
}

pub fn build_format_assertion(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    format(value, ctx, true)
}

/// A keyword unknown to the effective meta-schema, kept as an annotation
#[derive(Debug, Clone)]
pub struct Unknown {
    pub keyword: Keyword,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::options::{CollectAnnotations, FormatMode, Options};
    use crate::schema::Schema;
    use crate::validator::{OutputFormat, ValidationResult};
    use serde_json::json;

    #[test]
    fn test_format_annotates_by_default() {
        let schema = Schema::compile(&json!({"format": "email"})).unwrap();
        assert!(schema.is_valid(&json!("not an email")));
    }

    #[test]
    fn test_format_assert_mode() {
        let schema = Schema::compile(&json!({"format": "email"})).unwrap();
        let options = Options::default().with_format_mode(FormatMode::Assert);
        assert!(!schema.validate(&json!("nope"), OutputFormat::Flag, &options).is_valid());
        assert!(schema.validate(&json!("a@b.io"), OutputFormat::Flag, &options).is_valid());

        let unknown = Schema::compile(&json!({"format": "made-up"})).unwrap();
        assert!(unknown.validate(&json!("x"), OutputFormat::Flag, &options).is_valid());
    }

    #[test]
    fn test_meta_data_types_are_checked() {
        let err = Schema::compile(&json!({"readOnly": "yes"})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidType { .. }));
    }

    #[test]
    fn test_annotations_reported_in_verbose_output() {
        let schema = Schema::compile(&json!({"title": "Thing", "x-note": 1})).unwrap();
        let options = Options::default().with_collect_annotations(CollectAnnotations::All);
        let ValidationResult::Verbose(result) = schema.validate(&json!(null), OutputFormat::Verbose, &options) else {
            panic!("Expected verbose result");
        };
        let annotations: Vec<_> = result.children.iter().filter_map(|c| c.annotation.clone()).collect();
        assert!(annotations.contains(&json!("Thing")));
        assert!(annotations.contains(&json!(1)));
    }
}
