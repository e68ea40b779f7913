//! Output formats
//!
//! Result builders mirror the evaluation through a push/add/pop protocol:
//! `push` opens a nested evaluation, `add` records a leaf keyword result and
//! `pop` closes the nested evaluation with its combined outcome.
//!
//! - **Flag**: only the overall boolean
//! - **Basic**: flat list of errors from failing keywords
//! - **Detailed**: tree of results with valid leaves and single-child nodes collapsed
//! - **Verbose**: full tree of results, including passing keywords

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::behavior::Validation;
use crate::options::{CollectAnnotations, Options};
use crate::pointer::Pointer;
use crate::validator::Scope;

/// Requested shape of a validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Flag,
    Basic,
    Detailed,
    Verbose,
}

impl OutputFormat {
    pub(crate) fn result_builder(&self, options: &Options) -> Box<dyn ResultBuilder> {
        let annotations = options.collect_annotations == CollectAnnotations::All;
        match self {
            OutputFormat::Flag => Box::new(FlagBuilder::default()),
            OutputFormat::Basic => Box::new(BasicBuilder::new()),
            OutputFormat::Detailed => Box::new(VerboseBuilder::new(true, annotations)),
            OutputFormat::Verbose => Box::new(VerboseBuilder::new(false, annotations)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flag" => Ok(OutputFormat::Flag),
            "basic" => Ok(OutputFormat::Basic),
            "detailed" => Ok(OutputFormat::Detailed),
            "verbose" => Ok(OutputFormat::Verbose),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Flag => "flag",
            OutputFormat::Basic => "basic",
            OutputFormat::Detailed => "detailed",
            OutputFormat::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// Receives evaluation events and produces a [`ValidationResult`]
pub trait ResultBuilder {
    /// A nested evaluation starts
    fn push(&mut self);

    /// A keyword finished without nested evaluations
    fn add(&mut self, validation: &Validation, scope: &Scope);

    /// The innermost nested evaluation finished
    fn pop(&mut self, validation: &Validation, scope: &Scope);

    fn finish(self: Box<Self>) -> ValidationResult;
}

// =============================================================================
// Results
// =============================================================================

/// Result of validating an instance
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ValidationResult {
    Flag(FlagResult),
    Basic(BasicResult),
    Verbose(VerboseResult),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        match self {
            ValidationResult::Flag(result) => result.valid,
            ValidationResult::Basic(result) => result.valid,
            ValidationResult::Verbose(result) => result.valid,
        }
    }

    /// The standard JSON output structure
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Flag(result) => write!(f, "valid: {}", result.valid),
            ValidationResult::Basic(result) => {
                write!(f, "valid: {}", result.valid)?;
                for error in &result.errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
            ValidationResult::Verbose(result) => result.write_tree(f, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagResult {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BasicError>,
}

/// A failing keyword in a [`BasicResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicError {
    pub keyword_location: Pointer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_keyword_location: Option<String>,
    pub instance_location: Pointer,
    pub error: String,
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at '{}' (keyword '{}')",
            self.error, self.instance_location, self.keyword_location
        )
    }
}

/// A node of a detailed or verbose result tree
#[derive(Debug, Clone, PartialEq)]
pub struct VerboseResult {
    pub valid: bool,
    pub keyword_location: Pointer,
    pub absolute_keyword_location: Option<String>,
    pub instance_location: Pointer,
    pub error: Option<String>,
    pub annotation: Option<Value>,
    pub children: Vec<VerboseResult>,
}

impl VerboseResult {
    fn from_scope(validation: &Validation, scope: &Scope, annotations: bool) -> Self {
        Self {
            valid: validation.is_valid(),
            keyword_location: scope.keyword_location.clone(),
            absolute_keyword_location: scope.absolute_keyword_location().map(String::from),
            instance_location: scope.instance_location.clone(),
            error: validation.message().map(str::to_string),
            annotation: if annotations {
                validation.annotation().cloned()
            } else {
                None
            },
            children: Vec::new(),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let mark = if self.valid { "valid" } else { "invalid" };
        write!(f, "{:indent$}{} '{}' at '{}'", "", mark, self.keyword_location, self.instance_location, indent = depth * 2)?;
        if let Some(error) = &self.error {
            write!(f, ": {}", error)?;
        }
        for child in &self.children {
            writeln!(f)?;
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Serialize for VerboseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.valid)?;
        map.serialize_entry("keywordLocation", &self.keyword_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map.serialize_entry("absoluteKeywordLocation", absolute)?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(annotation) = &self.annotation {
            map.serialize_entry("annotation", annotation)?;
        }
        if !self.children.is_empty() {
            let key = if self.valid { "annotations" } else { "errors" };
            map.serialize_entry(key, &self.children)?;
        }
        map.end()
    }
}

// =============================================================================
// Builders
// =============================================================================

#[derive(Debug, Default)]
struct FlagBuilder {
    valid: bool,
}

impl ResultBuilder for FlagBuilder {
    fn push(&mut self) {}

    fn add(&mut self, _validation: &Validation, _scope: &Scope) {}

    fn pop(&mut self, validation: &Validation, _scope: &Scope) {
        // The last pop is the root schema.
        self.valid = validation.is_valid();
    }

    fn finish(self: Box<Self>) -> ValidationResult {
        ValidationResult::Flag(FlagResult { valid: self.valid })
    }
}

/// Errors of a nested evaluation survive only if that evaluation failed
#[derive(Debug)]
struct BasicBuilder {
    stack: Vec<Vec<BasicError>>,
    valid: bool,
}

impl BasicBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Vec::new()],
            valid: true,
        }
    }

    fn error(message: &str, scope: &Scope) -> BasicError {
        BasicError {
            keyword_location: scope.keyword_location.clone(),
            absolute_keyword_location: scope.absolute_keyword_location().map(String::from),
            instance_location: scope.instance_location.clone(),
            error: message.to_string(),
        }
    }
}

impl ResultBuilder for BasicBuilder {
    fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    fn add(&mut self, validation: &Validation, scope: &Scope) {
        if let (Some(message), Some(current)) = (validation.message(), self.stack.last_mut()) {
            current.push(Self::error(message, scope));
        }
    }

    fn pop(&mut self, validation: &Validation, scope: &Scope) {
        let nested = self.stack.pop().unwrap_or_default();
        self.valid = validation.is_valid();
        if self.valid {
            return;
        }
        if self.stack.is_empty() {
            self.stack.push(Vec::new());
        }
        if let Some(current) = self.stack.last_mut() {
            if let Some(message) = validation.message() {
                current.push(Self::error(message, scope));
            }
            current.extend(nested);
        }
    }

    fn finish(mut self: Box<Self>) -> ValidationResult {
        let errors = if self.valid {
            Vec::new()
        } else {
            self.stack.drain(..).flatten().collect()
        };
        ValidationResult::Basic(BasicResult {
            valid: self.valid,
            errors,
        })
    }
}

#[derive(Debug)]
struct VerboseBuilder {
    stack: Vec<Vec<VerboseResult>>,
    root: Option<VerboseResult>,
    details_only: bool,
    annotations: bool,
}

impl VerboseBuilder {
    fn new(details_only: bool, annotations: bool) -> Self {
        Self {
            stack: Vec::new(),
            root: None,
            details_only,
            annotations,
        }
    }

    fn insert(&mut self, mut result: VerboseResult) {
        if self.details_only {
            if result.valid && result.children.is_empty() && result.annotation.is_none() {
                return;
            }
            let collapsible = result.error.is_none()
                && result.annotation.is_none()
                && matches!(result.children.as_slice(), [child] if child.valid == result.valid);
            if collapsible {
                if let Some(child) = result.children.pop() {
                    result = child;
                }
            }
        }
        match self.stack.last_mut() {
            Some(current) => current.push(result),
            None => self.root = Some(result),
        }
    }
}

impl ResultBuilder for VerboseBuilder {
    fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    fn add(&mut self, validation: &Validation, scope: &Scope) {
        let result = VerboseResult::from_scope(validation, scope, self.annotations);
        self.insert(result);
    }

    fn pop(&mut self, validation: &Validation, scope: &Scope) {
        let mut result = VerboseResult::from_scope(validation, scope, self.annotations);
        result.children = self.stack.pop().unwrap_or_default();
        if self.details_only && result.valid {
            // Failed branches of a passing evaluation are not details.
            result.children.retain(|child| child.valid);
        }
        self.insert(result);
    }

    fn finish(self: Box<Self>) -> ValidationResult {
        let root = self.root.unwrap_or_else(|| VerboseResult {
            valid: true,
            keyword_location: Pointer::root(),
            absolute_keyword_location: None,
            instance_location: Pointer::root(),
            error: None,
            annotation: None,
            children: Vec::new(),
        });
        ValidationResult::Verbose(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn validate(schema: Value, instance: Value, format: OutputFormat) -> ValidationResult {
        let schema = Schema::compile(&schema).unwrap();
        schema.validate(&instance, format, &Options::default())
    }

    #[test]
    fn test_flag_json() {
        let result = validate(json!({"type": "string"}), json!(1), OutputFormat::Flag);
        assert_eq!(result.to_json(), json!({"valid": false}));
    }

    #[test]
    fn test_basic_reports_nested_message() {
        let result = validate(
            json!({"allOf": [{"type": "string"}, {"minLength": 1}]}),
            json!(5),
            OutputFormat::Basic,
        );
        let ValidationResult::Basic(basic) = result else {
            panic!("Expected basic result");
        };
        assert!(!basic.valid);
        assert!(basic
            .errors
            .iter()
            .any(|e| e.keyword_location.to_string() == "/allOf/0/type"));
    }

    #[test]
    fn test_verbose_contains_passing_siblings() {
        let result = validate(
            json!({"properties": {"a": {"type": "string"}, "b": {"type": "integer"}}}),
            json!({"a": 1, "b": 2}),
            OutputFormat::Verbose,
        );
        let ValidationResult::Verbose(root) = result else {
            panic!("Expected verbose result");
        };
        assert!(!root.valid);
        let properties = &root.children[0];
        assert_eq!(properties.keyword_location.to_string(), "/properties");
        assert_eq!(properties.children.len(), 2);
        assert!(properties.children.iter().any(|c| c.valid));
        let json = serde_json::to_value(&root).unwrap();
        assert!(json["errors"].is_array());
    }

    #[test]
    fn test_detailed_collapses_valid_leaves() {
        let result = validate(
            json!({"properties": {"a": {"type": "string"}, "b": {"type": "integer"}}}),
            json!({"a": 1, "b": 2}),
            OutputFormat::Detailed,
        );
        let ValidationResult::Verbose(root) = result else {
            panic!("Expected verbose result");
        };
        assert!(!root.valid);
        assert_eq!(root.keyword_location.to_string(), "/properties/a/type");
        assert_eq!(root.error.as_deref(), Some("Must be of type 'string'"));
    }

    #[test]
    fn test_detailed_keeps_validity_of_passing_one_of() {
        let schema = json!({"oneOf": [{"type": "string"}, {"type": "number"}]});
        let result = validate(schema.clone(), json!("x"), OutputFormat::Detailed);
        let ValidationResult::Verbose(root) = result else {
            panic!("Expected verbose result");
        };
        assert!(root.valid);
        assert!(root.error.is_none());

        let result = validate(schema, json!(true), OutputFormat::Detailed);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_detailed_drops_failed_if_condition() {
        let schema = json!({
            "if": {"exclusiveMaximum": 0},
            "then": {"minimum": -10},
            "else": {"multipleOf": 2}
        });
        let result = validate(schema.clone(), json!(4), OutputFormat::Detailed);
        let ValidationResult::Verbose(root) = result else {
            panic!("Expected verbose result");
        };
        assert!(root.valid);
        assert!(root.children.iter().all(|child| child.valid));

        let result = validate(schema, json!(3), OutputFormat::Detailed);
        let ValidationResult::Verbose(root) = result else {
            panic!("Expected verbose result");
        };
        assert!(!root.valid);
        assert_eq!(root.keyword_location.to_string(), "/else");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].keyword_location.to_string(), "/else/multipleOf");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("Verbose".parse::<OutputFormat>().unwrap(), OutputFormat::Verbose);
        assert!("tree".parse::<OutputFormat>().is_err());
    }
}
