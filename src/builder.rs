//! Schema Builder
//!
//! Compiles a JSON value into a [`Schema`]. The builder walks the document
//! depth-first, selects the effective meta-schema of every schema object,
//! orders its recognised keywords by [`KeywordBehaviorOrder`] and dependency,
//! and invokes each keyword's build function. A build either yields a fully
//! formed document or a [`CompileError`] pointing at the offending location.
//!
//! [`KeywordBehaviorOrder`]: crate::behavior::KeywordBehaviorOrder

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::behavior::strings::Pattern;
use crate::behavior::annotations::Unknown;
use crate::behavior::{order_entries, AnnotationBehavior, Category, KeywordBehavior};
use crate::error::{CompileError, Result};
use crate::keyword::Keyword;
use crate::locator::{CompositeVocabularyLocator, MetaSchemaLocator, SchemaLocator, VocabularyLocator};
use crate::options::{Options, UnknownKeywords};
use crate::pointer::Pointer;
use crate::schema::{NodeIndex, Resource, ResourceIndex, Schema, SchemaDocument, SubSchema, SubSchemaKind};
use crate::uri;
use crate::vocabulary::draft2020_12::Draft2020_12;
use crate::vocabulary::MetaSchema;

/// Entry point for compiling schemas
pub struct Builder;

impl Builder {
    /// Compile `value` as a document retrieved from `resource_id`
    pub fn build(value: &Value, resource_id: &Url, options: &Options) -> Result<Schema> {
        let base = uri::without_fragment(resource_id);
        let meta_schema = options.default_schema.clone();
        BuildContext::new(options, base, meta_schema, true).build_document(value)
    }

    /// Compile a value found at a JSON Pointer inside an existing resource
    ///
    /// The root of the resulting document is not registered under `base_id`,
    /// so references inside it keep resolving against the original resource.
    pub(crate) fn build_fragment(
        value: &Value,
        base_id: &Url,
        meta_schema: Arc<MetaSchema>,
        options: &Options,
    ) -> Result<Schema> {
        BuildContext::new(options, base_id.clone(), meta_schema, false).build_document(value)
    }
}

#[derive(Clone)]
struct Frame {
    meta_schema: Arc<MetaSchema>,
    base_id: Url,
    resource: ResourceIndex,
    /// Location relative to every enclosing resource, innermost last
    paths: Vec<(ResourceIndex, Pointer)>,
    document_location: Pointer,
    keyword: Option<Keyword>,
    node: NodeIndex,
    anchor: Option<String>,
    dynamic_anchor: Option<String>,
    vocabularies: Option<Vec<(Url, bool)>>,
}

/// State threaded through a single build
pub struct BuildContext<'a> {
    options: &'a Options,
    nodes: Vec<Option<SubSchema>>,
    resources: Vec<Resource>,
    ids: HashMap<Url, ResourceIndex>,
    seen_ids: HashSet<Url>,
    register_root: bool,
    frame: Frame,
}

impl<'a> BuildContext<'a> {
    fn new(options: &'a Options, base: Url, meta_schema: Arc<MetaSchema>, register_root: bool) -> Self {
        let root = ResourceIndex(0);
        let mut ids = HashMap::new();
        let mut seen_ids = HashSet::new();
        if register_root {
            ids.insert(base.clone(), root);
            seen_ids.insert(base.clone());
        }
        let resource = Resource {
            id: base.clone(),
            node: NodeIndex(0),
            parent: None,
            meta_schema: meta_schema.clone(),
            anchors: HashMap::new(),
            dynamic_anchors: HashMap::new(),
            locations: HashMap::new(),
        };
        Self {
            options,
            nodes: Vec::new(),
            resources: vec![resource],
            ids,
            seen_ids,
            register_root,
            frame: Frame {
                meta_schema,
                base_id: base,
                resource: root,
                paths: vec![(root, Pointer::root())],
                document_location: Pointer::root(),
                keyword: None,
                node: NodeIndex(0),
                anchor: None,
                dynamic_anchor: None,
                vocabularies: None,
            },
        }
    }

    fn build_document(mut self, value: &Value) -> Result<Schema> {
        let root = self.build_node(value)?;
        let nodes = self
            .nodes
            .into_iter()
            .collect::<Option<Vec<SubSchema>>>()
            .ok_or_else(|| CompileError::InvalidValue {
                location: Pointer::root(),
                message: "incomplete schema document".to_string(),
            })?;
        debug!(
            id = %self.resources[0].id,
            nodes = nodes.len(),
            resources = self.resources.len(),
            "compiled schema document"
        );
        let document = SchemaDocument {
            nodes,
            resources: self.resources,
            ids: self.ids,
        };
        debug_assert_eq!(root, NodeIndex(0));
        Ok(Schema::new(Arc::new(document), ResourceIndex(0)))
    }

    // =========================================================================
    // Accessors used by keyword builders
    // =========================================================================

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Base URI for resolving references at the current location
    pub fn base_id(&self) -> &Url {
        &self.frame.base_id
    }

    pub fn meta_schema(&self) -> &Arc<MetaSchema> {
        &self.frame.meta_schema
    }

    /// Document location of the keyword being built
    pub fn keyword_location(&self) -> Pointer {
        match &self.frame.keyword {
            Some(keyword) => self.frame.document_location.appending(keyword.as_str()),
            None => self.frame.document_location.clone(),
        }
    }

    pub fn invalid_type(&self, expected: &str) -> CompileError {
        CompileError::InvalidType {
            location: self.keyword_location(),
            expected: expected.to_string(),
        }
    }

    pub fn invalid_value(&self, message: impl Into<String>) -> CompileError {
        CompileError::InvalidValue {
            location: self.keyword_location(),
            message: message.into(),
        }
    }

    /// Compile a regular expression located at the current keyword
    pub fn pattern(&self, source: &str) -> Result<Pattern> {
        Pattern::new(source).map_err(|error| CompileError::InvalidPattern {
            pattern: source.to_string(),
            location: self.keyword_location(),
            message: error.to_string(),
        })
    }

    // =========================================================================
    // Sub-schemas
    // =========================================================================

    /// Build the sub-schema found at `<keyword>[/<token>]`
    pub fn subschema(&mut self, value: &Value, token: Option<&str>) -> Result<NodeIndex> {
        let saved = self.frame.clone();
        let keyword = self.frame.keyword.take();

        let tokens: Vec<&str> = keyword.iter().map(Keyword::as_str).chain(token).collect();
        for (_, path) in &mut self.frame.paths {
            for token in &tokens {
                path.push(*token);
            }
        }
        for token in &tokens {
            self.frame.document_location.push(*token);
        }

        let result = self.build_node(value);
        self.frame = saved;
        result
    }

    /// Build every element of an array as a sub-schema
    pub fn subschemas(&mut self, value: &Value) -> Result<Vec<NodeIndex>> {
        let Value::Array(items) = value else {
            return Err(self.invalid_type("array"));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.subschema(item, Some(&index.to_string())))
            .collect()
    }

    /// Build every member of an object as a sub-schema, mapping member names
    /// through `key`
    pub fn subschema_map<K>(
        &mut self,
        value: &Value,
        mut key: impl FnMut(&Self, &str) -> Result<K>,
    ) -> Result<Vec<(K, NodeIndex)>> {
        let Value::Object(members) = value else {
            return Err(self.invalid_type("object"));
        };
        let mut schemas = Vec::with_capacity(members.len());
        for (name, member) in members {
            let mapped = key(self, name)?;
            let node = self.subschema(member, Some(name))?;
            schemas.push((mapped, node));
        }
        Ok(schemas)
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Process `$id`: resolve it against the current base and start a new
    /// resource unless this is the document root
    pub(crate) fn declare_id(&mut self, value: &Value) -> Result<()> {
        let Some(text) = value.as_str() else {
            return Err(self.invalid_type("string"));
        };
        let url = uri::resolve(&self.frame.base_id, text).map_err(|error| CompileError::InvalidSchemaId {
            id: text.to_string(),
            location: self.keyword_location(),
            message: error.to_string(),
        })?;
        if url.fragment().is_some_and(|fragment| !fragment.is_empty()) {
            return Err(CompileError::InvalidSchemaId {
                id: text.to_string(),
                location: self.keyword_location(),
                message: "must not contain a non-empty fragment".to_string(),
            });
        }
        let id = uri::without_fragment(&url);

        if self.frame.node == NodeIndex(0) {
            if id != self.resources[0].id {
                if !self.seen_ids.insert(id.clone()) {
                    return Err(CompileError::DuplicateId {
                        id,
                        location: self.keyword_location(),
                    });
                }
                if self.register_root {
                    self.ids.insert(id.clone(), ResourceIndex(0));
                }
                self.resources[0].id = id.clone();
            }
        } else {
            if !self.seen_ids.insert(id.clone()) {
                return Err(CompileError::DuplicateId {
                    id,
                    location: self.keyword_location(),
                });
            }
            let index = ResourceIndex(self.resources.len());
            self.resources.push(Resource {
                id: id.clone(),
                node: self.frame.node,
                parent: Some(self.frame.resource),
                meta_schema: self.frame.meta_schema.clone(),
                anchors: HashMap::new(),
                dynamic_anchors: HashMap::new(),
                locations: HashMap::new(),
            });
            self.ids.insert(id.clone(), index);
            self.frame.resource = index;
            self.frame.paths.push((index, Pointer::root()));
        }

        debug!(id = %id, location = %self.frame.document_location, "schema resource");
        self.frame.base_id = id;
        Ok(())
    }

    pub(crate) fn declare_anchor(&mut self, name: String) {
        self.frame.anchor = Some(name);
    }

    pub(crate) fn declare_dynamic_anchor(&mut self, name: String) {
        self.frame.dynamic_anchor = Some(name);
    }

    pub(crate) fn declare_vocabularies(&mut self, vocabularies: Vec<(Url, bool)>) {
        self.frame.vocabularies = Some(vocabularies);
    }

    /// Resolve `$schema` to a meta-schema
    fn resolve_meta_schema(&self, value: &Value) -> Result<Arc<MetaSchema>> {
        let Some(text) = value.as_str() else {
            return Err(self.invalid_type("string"));
        };
        let url = Url::parse(text)
            .map_err(|error| self.invalid_value(format!("'$schema' must be an absolute URI: {}", error)))?;
        let id = uri::without_fragment(&url);

        if *self.frame.meta_schema.id() == id {
            return Ok(self.frame.meta_schema.clone());
        }
        if *self.options.default_schema.id() == id {
            return Ok(self.options.default_schema.clone());
        }
        if let Some(meta_schema) = self
            .options
            .meta_schema_locator
            .as_ref()
            .and_then(|locator| locator.locate_meta_schema(&id))
        {
            return Ok(meta_schema);
        }
        if let Some(meta_schema) = Draft2020_12.locate_meta_schema(&id) {
            return Ok(meta_schema);
        }

        // A custom meta-schema document defines its vocabularies itself.
        if let Some(locator) = &self.options.schema_locator {
            match locator.locate(&id) {
                Ok(Some(schema)) => {
                    let vocabularies = self.vocabulary_locator();
                    let meta_schema =
                        MetaSchema::from_schema(&schema, &vocabularies, &self.options.default_schema)
                            .map_err(|unknown| CompileError::UnknownVocabulary {
                                id: unknown.to_string(),
                                location: self.keyword_location(),
                            })?;
                    return Ok(Arc::new(meta_schema));
                }
                Ok(None) => {}
                Err(error) => warn!(id = %id, error = %error, "meta-schema lookup failed"),
            }
        }

        Err(CompileError::UnknownMetaSchema {
            id: text.to_string(),
            location: self.keyword_location(),
        })
    }

    fn vocabulary_locator(&self) -> CompositeVocabularyLocator {
        let mut locators: Vec<Arc<dyn VocabularyLocator>> = Vec::new();
        if let Some(locator) = &self.options.vocabulary_locator {
            locators.push(locator.clone());
        }
        locators.push(Arc::new(Draft2020_12));
        CompositeVocabularyLocator::new(locators)
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn build_node(&mut self, value: &Value) -> Result<NodeIndex> {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(None);
        self.frame.node = index;
        self.frame.anchor = None;
        self.frame.dynamic_anchor = None;
        self.frame.vocabularies = None;

        let kind = match value {
            Value::Bool(value) => SubSchemaKind::Boolean(*value),
            Value::Object(members) => SubSchemaKind::Object(self.build_object(members)?),
            _ => {
                return Err(CompileError::InvalidType {
                    location: self.frame.document_location.clone(),
                    expected: "object or boolean".to_string(),
                })
            }
        };

        let (resource, location) = self
            .frame
            .paths
            .last()
            .cloned()
            .unwrap_or((self.frame.resource, Pointer::root()));
        for (enclosing, path) in &self.frame.paths {
            self.resources[enclosing.0]
                .locations
                .entry(path.clone())
                .or_insert(index);
        }

        let entry = &mut self.resources[resource.0];
        if location.is_root() {
            entry.node = index;
        }
        if let Some(anchor) = &self.frame.anchor {
            entry.anchors.insert(anchor.clone(), index);
        }
        if let Some(anchor) = &self.frame.dynamic_anchor {
            entry.dynamic_anchors.insert(anchor.clone(), index);
        }

        self.nodes[index.0] = Some(SubSchema {
            resource,
            location,
            instance: value.clone(),
            anchor: self.frame.anchor.take(),
            dynamic_anchor: self.frame.dynamic_anchor.take(),
            vocabularies: self.frame.vocabularies.take(),
            kind,
        });
        Ok(index)
    }

    fn build_object(&mut self, members: &Map<String, Value>) -> Result<Vec<KeywordBehavior>> {
        if let Some(value) = members.get(Keyword::SCHEMA.as_str()) {
            self.frame.keyword = Some(Keyword::SCHEMA);
            let meta_schema = self.resolve_meta_schema(value)?;
            if self.frame.node == NodeIndex(0) {
                self.resources[0].meta_schema = meta_schema.clone();
            }
            self.frame.meta_schema = meta_schema;
            self.frame.keyword = None;
        }

        let meta_schema = self.frame.meta_schema.clone();
        let mut entries = Vec::with_capacity(members.len());
        let mut unknown = Vec::new();
        for (name, value) in members {
            match meta_schema.keyword(name) {
                Some((position, spec)) => entries.push((position, spec, value)),
                None => unknown.push((name, value)),
            }
        }

        let mut behaviors = Vec::with_capacity(entries.len());
        for (spec, value) in order_entries(entries) {
            self.frame.keyword = Some(spec.keyword.clone());
            if let Some(behavior) = (spec.build)(value, self)? {
                behaviors.push(behavior);
            }
        }
        self.frame.keyword = None;

        for (name, value) in unknown {
            match self.options.unknown_keywords {
                UnknownKeywords::Ignore => debug!(keyword = %name, "ignoring unknown keyword"),
                UnknownKeywords::Annotate => {
                    let behavior = KeywordBehavior::Annotation(AnnotationBehavior::Unknown(Unknown {
                        keyword: Keyword::new(name.as_str()),
                        value: value.clone(),
                    }));
                    let position = behaviors
                        .iter()
                        .position(|b| b.category() == Category::Unevaluated)
                        .unwrap_or(behaviors.len());
                    behaviors.insert(position, behavior);
                }
                UnknownKeywords::Error => {
                    return Err(CompileError::UnknownKeyword {
                        keyword: name.clone(),
                        location: self.frame.document_location.clone(),
                    })
                }
            }
        }

        Ok(behaviors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(value: Value) -> Result<Schema> {
        Schema::compile(&value)
    }

    #[test]
    fn test_rejects_non_schema_values() {
        let err = compile(json!({"properties": {"a": 5}})).unwrap_err();
        match err {
            CompileError::InvalidType { location, .. } => {
                assert_eq!(location.to_string(), "/properties/a");
            }
            other => panic!("Expected InvalidType, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_fail() {
        let err = compile(json!({
            "$defs": {
                "a": {"$id": "http://example.com/same"},
                "b": {"$id": "http://example.com/same"}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateId { .. }));
    }

    #[test]
    fn test_negative_min_items_fails() {
        let err = compile(json!({"items": {"minItems": -1}})).unwrap_err();
        match err {
            CompileError::InvalidValue { location, .. } | CompileError::InvalidType { location, .. } => {
                assert_eq!(location.to_string(), "/items/minItems");
            }
            other => panic!("Expected invalid minItems, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_keyword_policies() {
        let value = json!({"x-custom": 1});
        assert!(Schema::compile(&value).is_ok());

        let strict = Options::default().with_unknown_keywords(UnknownKeywords::Error);
        let err = Schema::compile_with(&value, &strict).unwrap_err();
        assert!(matches!(err, CompileError::UnknownKeyword { ref keyword, .. } if keyword == "x-custom"));
    }

    #[test]
    fn test_unknown_meta_schema_fails() {
        let err = compile(json!({"$schema": "http://example.com/unknown"})).unwrap_err();
        assert!(matches!(err, CompileError::UnknownMetaSchema { .. }));
    }

    #[test]
    fn test_fragment_id_rejected() {
        let err = compile(json!({"$defs": {"a": {"$id": "#frag"}}})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchemaId { .. }));
    }

    #[test]
    fn test_behaviors_are_ordered() {
        let schema = compile(json!({
            "unevaluatedProperties": false,
            "then": true,
            "else": true,
            "if": true,
            "type": "object",
            "$ref": "#/$defs/a",
            "$defs": {"a": true}
        }))
        .unwrap();
        let keywords: Vec<String> = schema
            .root()
            .behaviors()
            .iter()
            .map(|b| b.keyword().to_string())
            .filter(|k| k != "$defs")
            .collect();
        assert_eq!(keywords, vec!["$ref", "if", "then", "else", "type", "unevaluatedProperties"]);
    }
}
