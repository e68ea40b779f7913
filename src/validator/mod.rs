//! Validator
//!
//! Executes a compiled [`Schema`] against an instance. A [`Context`] is
//! created per `validate` call and owns the scope stack, the evaluation frames
//! that carry sibling and adjacent annotations, the dynamic scope used by
//! `$dynamicRef`, and the result builder for the requested output format.

pub mod output;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::behavior::{KeywordBehavior, Validation};
use crate::builder::Builder;
use crate::keyword::Keyword;
use crate::options::Options;
use crate::pointer::Pointer;
use crate::schema::{NodeIndex, RefTypes, ResourceIndex, Schema, SchemaDocument, SubSchema, SubSchemaKind};
use crate::uri;

pub use output::{
    BasicError, BasicResult, FlagResult, OutputFormat, ResultBuilder, ValidationResult, VerboseResult,
};

/// Location information for one step of an evaluation
#[derive(Debug, Clone)]
pub struct Scope {
    /// Id of the schema resource being evaluated
    pub base_id: Url,
    /// Location within that resource
    pub schema_location: Pointer,
    /// Evaluation path from the root schema, through references
    pub keyword_location: Pointer,
    pub instance_location: Pointer,
    relocated: bool,
}

impl Scope {
    /// Dereferenced location of the keyword, when it differs from the
    /// evaluation path
    pub fn absolute_keyword_location(&self) -> Option<Url> {
        self.relocated
            .then(|| uri::with_fragment(&self.base_id, &self.schema_location.to_string()))
    }
}

/// How a sub-schema application moves within the instance
#[derive(Debug, Clone, Copy)]
pub enum InstanceStep<'s> {
    Index(usize),
    Key(&'s str),
}

#[derive(Debug)]
struct Frame {
    instance_location: Pointer,
    siblings: Vec<(Keyword, Validation)>,
    annotations: Vec<(Keyword, Value)>,
}

/// State of a single validation run
pub struct Context<'a> {
    options: &'a Options,
    root: &'a Schema,
    scopes: Vec<Scope>,
    frames: Vec<Frame>,
    dynamic_scope: Vec<(Arc<SchemaDocument>, ResourceIndex)>,
    /// Pointer fragments compiled on demand, keyed by the full reference
    fragments: HashMap<Url, Option<(Arc<SchemaDocument>, NodeIndex)>>,
    results: Box<dyn ResultBuilder>,
}

/// Validate `instance` against `schema`, producing a result in `format`
pub(crate) fn execute(
    schema: &Schema,
    instance: &Value,
    format: OutputFormat,
    options: &Options,
) -> ValidationResult {
    let mut context = Context {
        options,
        root: schema,
        scopes: Vec::new(),
        frames: Vec::new(),
        dynamic_scope: Vec::new(),
        fragments: HashMap::new(),
        results: format.result_builder(options),
    };
    let validation = context.validate(schema.document(), schema.root_node(), instance, None, None);
    debug!(schema = %schema.id(), valid = validation.is_valid(), "validation finished");
    context.results.finish()
}

impl<'a> Context<'a> {
    pub fn options(&self) -> &Options {
        self.options
    }

    /// The innermost active scope
    pub fn scope(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    // =========================================================================
    // Sub-schema application
    // =========================================================================

    /// Apply a sub-schema, contributing its annotations to the enclosing
    /// schema object when it validates
    pub(crate) fn validate(
        &mut self,
        doc: &Arc<SchemaDocument>,
        node: NodeIndex,
        instance: &Value,
        step: Option<InstanceStep<'_>>,
        token: Option<&str>,
    ) -> Validation {
        self.apply_subschema(doc, node, instance, step, token, true)
    }

    /// Apply a sub-schema whose annotations are always discarded (`not`,
    /// `propertyNames`, `contentSchema`)
    pub(crate) fn validate_isolated(
        &mut self,
        doc: &Arc<SchemaDocument>,
        node: NodeIndex,
        instance: &Value,
        step: Option<InstanceStep<'_>>,
        token: Option<&str>,
    ) -> Validation {
        self.apply_subschema(doc, node, instance, step, token, false)
    }

    fn apply_subschema(
        &mut self,
        doc: &Arc<SchemaDocument>,
        node: NodeIndex,
        instance: &Value,
        step: Option<InstanceStep<'_>>,
        token: Option<&str>,
        propagate: bool,
    ) -> Validation {
        let subschema = doc.node(node);
        let scope = self.subschema_scope(doc, subschema, step, token);

        if self.scopes.len() >= self.options.max_depth {
            warn!(depth = self.scopes.len(), location = %scope.keyword_location, "maximum evaluation depth exceeded");
            let validation = Validation::invalid("Maximum evaluation depth exceeded");
            self.results.add(&validation, &scope);
            return validation;
        }

        self.scopes.push(scope);
        self.results.push();
        self.dynamic_scope.push((doc.clone(), subschema.resource()));

        let validation = match subschema.kind() {
            SubSchemaKind::Boolean(true) => Validation::Valid,
            SubSchemaKind::Boolean(false) => Validation::invalid("Value not allowed by schema"),
            SubSchemaKind::Object(behaviors) => {
                self.evaluate_object(doc, subschema, behaviors, instance, propagate)
            }
        };

        self.dynamic_scope.pop();
        if let Some(scope) = self.scopes.pop() {
            self.results.pop(&validation, &scope);
        }
        validation
    }

    fn evaluate_object(
        &mut self,
        doc: &Arc<SchemaDocument>,
        subschema: &SubSchema,
        behaviors: &[KeywordBehavior],
        instance: &Value,
        propagate: bool,
    ) -> Validation {
        let instance_location = self
            .scopes
            .last()
            .map(|scope| scope.instance_location.clone())
            .unwrap_or_default();
        self.frames.push(Frame {
            instance_location,
            siblings: Vec::new(),
            annotations: Vec::new(),
        });

        let mut valid = true;
        for behavior in behaviors {
            if matches!(behavior, KeywordBehavior::Reserved(_)) {
                continue;
            }
            valid &= self.apply_keyword(doc, subschema, behavior, instance).is_valid();
        }

        if let Some(frame) = self.frames.pop() {
            if valid && propagate {
                if let Some(parent) = self.frames.last_mut() {
                    if parent.instance_location == frame.instance_location {
                        parent.annotations.extend(frame.annotations);
                    }
                }
            }
        }
        Validation::from_valid(valid)
    }

    fn apply_keyword(
        &mut self,
        doc: &Arc<SchemaDocument>,
        subschema: &SubSchema,
        behavior: &KeywordBehavior,
        instance: &Value,
    ) -> Validation {
        let keyword = behavior.keyword();
        let scope = self.keyword_scope(&keyword);

        let validation = if behavior.is_leaf() {
            let validation = behavior.apply(instance, self, doc, subschema);
            self.results.add(&validation, &scope);
            validation
        } else {
            self.scopes.push(scope);
            self.results.push();
            let validation = behavior.apply(instance, self, doc, subschema);
            if let Some(scope) = self.scopes.pop() {
                self.results.pop(&validation, &scope);
            }
            validation
        };

        if let Some(frame) = self.frames.last_mut() {
            if let Validation::Annotation(value) = &validation {
                frame.annotations.push((keyword.clone(), value.clone()));
            }
            frame.siblings.push((keyword, validation.clone()));
        }
        validation
    }

    fn subschema_scope(
        &self,
        doc: &SchemaDocument,
        subschema: &SubSchema,
        step: Option<InstanceStep<'_>>,
        token: Option<&str>,
    ) -> Scope {
        let base_id = doc.resource(subschema.resource()).id().clone();
        let relocated = base_id != *self.root.id();
        match self.scopes.last() {
            Some(parent) => {
                let mut keyword_location = parent.keyword_location.clone();
                if let Some(token) = token {
                    keyword_location.push(token);
                }
                let mut instance_location = parent.instance_location.clone();
                match step {
                    Some(InstanceStep::Index(index)) => instance_location.push(index.to_string()),
                    Some(InstanceStep::Key(key)) => instance_location.push(key),
                    None => {}
                }
                Scope {
                    base_id,
                    schema_location: subschema.keyword_location().clone(),
                    keyword_location,
                    instance_location,
                    relocated: parent.relocated || relocated,
                }
            }
            None => Scope {
                base_id,
                schema_location: subschema.keyword_location().clone(),
                keyword_location: Pointer::root(),
                instance_location: Pointer::root(),
                relocated,
            },
        }
    }

    fn keyword_scope(&self, keyword: &Keyword) -> Scope {
        let through_reference = *keyword == Keyword::REF || *keyword == Keyword::DYNAMIC_REF;
        match self.scopes.last() {
            Some(parent) => Scope {
                base_id: parent.base_id.clone(),
                schema_location: parent.schema_location.appending(keyword.as_str()),
                keyword_location: parent.keyword_location.appending(keyword.as_str()),
                instance_location: parent.instance_location.clone(),
                relocated: parent.relocated || through_reference,
            },
            None => Scope {
                base_id: self.root.id().clone(),
                schema_location: Pointer::root().appending(keyword.as_str()),
                keyword_location: Pointer::root().appending(keyword.as_str()),
                instance_location: Pointer::root(),
                relocated: through_reference,
            },
        }
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    /// Result of an earlier keyword of the schema object being evaluated
    pub fn sibling(&self, keyword: &Keyword) -> Option<&Validation> {
        self.frames
            .last()?
            .siblings
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, validation)| validation)
    }

    /// Annotation produced by an earlier keyword of the same schema object
    pub fn sibling_annotation(&self, keyword: &Keyword) -> Option<&Value> {
        self.sibling(keyword).and_then(Validation::annotation)
    }

    /// Annotations collected at the current instance location by this schema
    /// object and by every successfully applied in-place sub-schema
    pub fn adjacent_annotations(&self, keyword: &Keyword) -> Vec<Value> {
        self.frames
            .last()
            .map(|frame| {
                frame
                    .annotations
                    .iter()
                    .filter(|(k, _)| k == keyword)
                    .map(|(_, value)| value.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Reference resolution
    // =========================================================================

    /// Resolve an absolute reference to a sub-schema
    ///
    /// Resources are looked up in the current document, the root document,
    /// the configured schema locator and finally the meta-schema documents.
    /// A JSON Pointer fragment that does not address a compiled sub-schema is
    /// compiled on demand from the resource's raw value, once per run.
    pub(crate) fn resolve_reference(
        &mut self,
        doc: &Arc<SchemaDocument>,
        reference: &Url,
        types: RefTypes,
    ) -> Option<(Arc<SchemaDocument>, NodeIndex)> {
        let resource_id = uri::without_fragment(reference);
        let fragment = uri::fragment(reference);
        let schema = self.locate_resource(doc, &resource_id)?;

        if let Some(node) = schema.locate_fragment(&fragment, types) {
            return Some((schema.document().clone(), node));
        }
        if !(types.pointer && fragment.starts_with('/')) {
            return None;
        }
        if let Some(compiled) = self.fragments.get(reference) {
            return compiled.clone();
        }

        let compiled = self.compile_fragment(&schema, &fragment, reference);
        self.fragments.insert(reference.clone(), compiled.clone());
        compiled
    }

    fn compile_fragment(
        &self,
        schema: &Schema,
        fragment: &str,
        reference: &Url,
    ) -> Option<(Arc<SchemaDocument>, NodeIndex)> {
        let pointer = Pointer::parse(fragment).ok()?;
        let value = pointer.resolve(schema.instance())?;
        match Builder::build_fragment(value, schema.id(), schema.meta_schema().clone(), self.options) {
            Ok(fragment_schema) => {
                debug!(reference = %reference, "compiled reference fragment on demand");
                let node = fragment_schema.root_node();
                Some((fragment_schema.document().clone(), node))
            }
            Err(error) => {
                warn!(reference = %reference, error = %error, "failed to compile reference fragment");
                None
            }
        }
    }

    fn locate_resource(&self, doc: &Arc<SchemaDocument>, id: &Url) -> Option<Schema> {
        if let Some(schema) = Schema::in_document(doc, id) {
            return Some(schema);
        }
        if let Some(schema) = self.root.locate(id) {
            return Some(schema);
        }

        let locators = self
            .options
            .schema_locator
            .iter()
            .chain(self.root.meta_schema().schema_locator())
            .chain(self.options.default_schema.schema_locator());
        for locator in locators {
            match locator.locate(id) {
                Ok(Some(schema)) => return Some(schema),
                Ok(None) => {}
                Err(error) => warn!(id = %id, error = %error, "schema locator failed"),
            }
        }
        None
    }

    /// Find the outermost resource in the dynamic scope declaring
    /// `$dynamicAnchor: name`
    pub(crate) fn dynamic_anchor_target(&self, name: &str) -> Option<(Arc<SchemaDocument>, NodeIndex)> {
        self.dynamic_scope.iter().find_map(|(doc, resource)| {
            doc.resource(*resource)
                .dynamic_anchor(name)
                .map(|node| (doc.clone(), node))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn basic_errors(schema: &Value, instance: &Value) -> Vec<BasicError> {
        let schema = Schema::compile(schema).unwrap();
        match schema.validate(instance, OutputFormat::Basic, &Options::default()) {
            ValidationResult::Basic(result) => result.errors,
            other => panic!("Expected basic result, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_locations_follow_refs() {
        let errors = basic_errors(
            &json!({"$defs": {"s": {"type": "string"}}, "properties": {"a": {"$ref": "#/$defs/s"}}}),
            &json!({"a": 1}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword_location.to_string(), "/properties/a/$ref/type");
        assert_eq!(errors[0].instance_location.to_string(), "/a");
        assert_eq!(
            errors[0].absolute_keyword_location.as_deref(),
            Some("local://schema#/$defs/s/type")
        );
    }

    #[test]
    fn test_failed_branches_do_not_leak_errors() {
        let errors = basic_errors(&json!({"anyOf": [{"type": "string"}, {"minimum": 2}]}), &json!(3));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let schema = Schema::compile(&json!({"$ref": "#"})).unwrap();
        let options = Options::default().with_max_depth(32);
        let result = schema.validate(&json!(1), OutputFormat::Basic, &options);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_annotations_from_failed_subschema_are_dropped() {
        let schema = Schema::compile(&json!({
            "anyOf": [
                {"properties": {"a": true}, "required": ["b"]},
                {"properties": {"c": true}}
            ],
            "unevaluatedProperties": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"c": 1})));
        assert!(!schema.is_valid(&json!({"a": 1, "c": 1})));
    }

    #[test]
    fn test_fragment_compiled_once_per_run() {
        let schema = Schema::compile(&json!({
            "items": {"$ref": "#/$defs/holder/x-item"},
            "$defs": {"holder": {"x-item": {"type": "integer"}}}
        }))
        .unwrap();
        let options = Options::default();
        let mut context = Context {
            options: &options,
            root: &schema,
            scopes: Vec::new(),
            frames: Vec::new(),
            dynamic_scope: Vec::new(),
            fragments: HashMap::new(),
            results: OutputFormat::Flag.result_builder(&options),
        };

        let instance = json!([1, 2, 3]);
        let validation = context.validate(schema.document(), schema.root_node(), &instance, None, None);
        assert!(validation.is_valid());
        assert_eq!(context.fragments.len(), 1);

        let instance = json!([1, "two"]);
        let validation = context.validate(schema.document(), schema.root_node(), &instance, None, None);
        assert!(!validation.is_valid());
        assert_eq!(context.fragments.len(), 1);
    }
}
