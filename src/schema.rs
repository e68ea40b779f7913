//! Compiled schemas
//!
//! A compiled document is an arena of [`SubSchema`] nodes addressed by
//! [`NodeIndex`]. The document root and every sub-schema declaring `$id` form
//! a schema *resource*; a [`Schema`] is a cheap handle to one resource of a
//! shared document.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::behavior::KeywordBehavior;
use crate::builder::Builder;
use crate::error::{LocateError, Result};
use crate::keyword::Keyword;
use crate::locator::SchemaLocator;
use crate::options::Options;
use crate::pointer::Pointer;
use crate::uri;
use crate::validator::{self, OutputFormat, ValidationResult};
use crate::vocabulary::MetaSchema;

/// Handle of a sub-schema within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub(crate) usize);

/// Handle of a schema resource within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceIndex(pub(crate) usize);

/// Which kinds of fragment a reference may resolve through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefTypes {
    /// Empty fragments and JSON Pointer fragments
    pub pointer: bool,
    /// `$anchor` names
    pub anchor: bool,
    /// `$dynamicAnchor` names
    pub dynamic_anchor: bool,
}

impl RefTypes {
    pub const STANDARD: Self = Self {
        pointer: true,
        anchor: true,
        dynamic_anchor: false,
    };
    pub const STANDARD_AND_DYNAMIC: Self = Self {
        pointer: true,
        anchor: true,
        dynamic_anchor: true,
    };
    pub const DYNAMIC_ONLY: Self = Self {
        pointer: false,
        anchor: false,
        dynamic_anchor: true,
    };
}

// =============================================================================
// Arena
// =============================================================================

/// Shape of a compiled sub-schema
#[derive(Debug, Clone)]
pub enum SubSchemaKind {
    Boolean(bool),
    /// Behaviors in application order
    Object(Vec<KeywordBehavior>),
}

/// A compiled schema object or boolean schema
#[derive(Debug, Clone)]
pub struct SubSchema {
    pub(crate) resource: ResourceIndex,
    pub(crate) location: Pointer,
    pub(crate) instance: Value,
    pub(crate) anchor: Option<String>,
    pub(crate) dynamic_anchor: Option<String>,
    pub(crate) vocabularies: Option<Vec<(Url, bool)>>,
    pub(crate) kind: SubSchemaKind,
}

impl SubSchema {
    pub fn resource(&self) -> ResourceIndex {
        self.resource
    }

    /// Location relative to the root of the enclosing resource
    pub fn keyword_location(&self) -> &Pointer {
        &self.location
    }

    /// The raw schema value
    pub fn instance(&self) -> &Value {
        &self.instance
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn dynamic_anchor(&self) -> Option<&str> {
        self.dynamic_anchor.as_deref()
    }

    pub fn kind(&self) -> &SubSchemaKind {
        &self.kind
    }

    pub fn behaviors(&self) -> &[KeywordBehavior] {
        match &self.kind {
            SubSchemaKind::Object(behaviors) => behaviors,
            SubSchemaKind::Boolean(_) => &[],
        }
    }

    /// The behavior compiled for `keyword`, if any
    pub fn behavior(&self, keyword: &Keyword) -> Option<&KeywordBehavior> {
        self.behaviors().iter().find(|b| b.keyword() == *keyword)
    }
}

/// A schema resource: the document root or a sub-schema with `$id`
#[derive(Debug, Clone)]
pub(crate) struct Resource {
    pub(crate) id: Url,
    pub(crate) node: NodeIndex,
    pub(crate) parent: Option<ResourceIndex>,
    pub(crate) meta_schema: Arc<MetaSchema>,
    pub(crate) anchors: HashMap<String, NodeIndex>,
    pub(crate) dynamic_anchors: HashMap<String, NodeIndex>,
    pub(crate) locations: HashMap<Pointer, NodeIndex>,
}

impl Resource {
    pub(crate) fn id(&self) -> &Url {
        &self.id
    }

    pub(crate) fn dynamic_anchor(&self, name: &str) -> Option<NodeIndex> {
        self.dynamic_anchors.get(name).copied()
    }
}

/// All nodes and resources of one compiled document
#[derive(Debug)]
pub struct SchemaDocument {
    pub(crate) nodes: Vec<SubSchema>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) ids: HashMap<Url, ResourceIndex>,
}

impl SchemaDocument {
    pub fn node(&self, index: NodeIndex) -> &SubSchema {
        &self.nodes[index.0]
    }

    pub(crate) fn resource(&self, index: ResourceIndex) -> &Resource {
        &self.resources[index.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// Schema handle
// =============================================================================

/// A compiled schema resource
#[derive(Clone)]
pub struct Schema {
    doc: Arc<SchemaDocument>,
    resource: ResourceIndex,
}

impl Schema {
    pub(crate) fn new(doc: Arc<SchemaDocument>, resource: ResourceIndex) -> Self {
        Self { doc, resource }
    }

    /// Compile a schema with the default base URI and options
    pub fn compile(value: &Value) -> Result<Schema> {
        Builder::build(value, &uri::default_base(), &Options::default())
    }

    /// Compile a schema with explicit options
    pub fn compile_with(value: &Value, options: &Options) -> Result<Schema> {
        Builder::build(value, &uri::default_base(), options)
    }

    /// The resource registered under `id` in `doc`
    pub(crate) fn in_document(doc: &Arc<SchemaDocument>, id: &Url) -> Option<Schema> {
        doc.ids.get(id).map(|resource| Schema::new(doc.clone(), *resource))
    }

    pub(crate) fn document(&self) -> &Arc<SchemaDocument> {
        &self.doc
    }

    fn info(&self) -> &Resource {
        self.doc.resource(self.resource)
    }

    pub(crate) fn root_node(&self) -> NodeIndex {
        self.info().node
    }

    /// Canonical id of the resource
    pub fn id(&self) -> &Url {
        &self.info().id
    }

    pub fn meta_schema(&self) -> &Arc<MetaSchema> {
        &self.info().meta_schema
    }

    /// The raw schema value of the resource
    pub fn instance(&self) -> &Value {
        self.root().instance()
    }

    pub fn root(&self) -> &SubSchema {
        self.doc.node(self.root_node())
    }

    pub fn anchor(&self) -> Option<&str> {
        self.root().anchor()
    }

    pub fn dynamic_anchor(&self) -> Option<&str> {
        self.root().dynamic_anchor()
    }

    /// `$vocabulary` declared by the resource root
    pub fn vocabularies(&self) -> Option<&[(Url, bool)]> {
        self.root().vocabularies.as_deref()
    }

    /// Resources directly nested in this one
    pub fn resources(&self) -> Vec<Schema> {
        self.doc
            .resources
            .iter()
            .enumerate()
            .filter(|(_, resource)| resource.parent == Some(self.resource))
            .map(|(index, _)| Schema::new(self.doc.clone(), ResourceIndex(index)))
            .collect()
    }

    /// Sub-schema handles of this resource, root first
    pub fn subschemas(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.info().locations.values().copied().collect();
        nodes.sort_by_key(|node| node.0);
        nodes
    }

    pub fn subschema(&self, node: NodeIndex) -> Option<&SubSchema> {
        self.doc.nodes.get(node.0)
    }

    /// Find a resource of the same document by id, ignoring any fragment
    pub fn locate(&self, id: &Url) -> Option<Schema> {
        Schema::in_document(&self.doc, &uri::without_fragment(id))
    }

    /// Resolve a decoded fragment relative to this resource
    pub fn locate_fragment(&self, fragment: &str, types: RefTypes) -> Option<NodeIndex> {
        let resource = self.info();
        if fragment.is_empty() {
            return types.pointer.then_some(resource.node);
        }
        if fragment.starts_with('/') {
            if !types.pointer {
                return None;
            }
            let pointer = Pointer::parse(fragment).ok()?;
            return resource.locations.get(&pointer).copied();
        }
        if types.anchor {
            if let Some(node) = resource.anchors.get(fragment) {
                return Some(*node);
            }
        }
        if types.dynamic_anchor {
            if let Some(node) = resource.dynamic_anchors.get(fragment) {
                return Some(*node);
            }
        }
        None
    }

    /// Validate an instance
    pub fn validate(&self, instance: &Value, format: OutputFormat, options: &Options) -> ValidationResult {
        validator::execute(self, instance, format, options)
    }

    /// Validate with the default options, returning only validity
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance, OutputFormat::Flag, &Options::default())
            .is_valid()
    }
}

impl SchemaLocator for Schema {
    fn locate(&self, id: &Url) -> std::result::Result<Option<Schema>, LocateError> {
        Ok(Schema::locate(self, id))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("id", self.id())
            .field("meta_schema", self.meta_schema().id())
            .field("nodes", &self.doc.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resources_are_promoted() {
        let schema = Schema::compile(&json!({
            "$id": "http://example.com/root.json",
            "$defs": {
                "a": {"$id": "a.json", "$defs": {"b": {"$id": "b.json"}}},
                "c": {"type": "string"}
            }
        }))
        .unwrap();
        assert_eq!(schema.id().as_str(), "http://example.com/root.json");
        let nested = schema.resources();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].id().as_str(), "http://example.com/a.json");
        assert_eq!(nested[0].resources()[0].id().as_str(), "http://example.com/b.json");
    }

    #[test]
    fn test_locate_fragment_kinds() {
        let schema = Schema::compile(&json!({
            "$defs": {
                "a": {"$anchor": "plain"},
                "b": {"$dynamicAnchor": "dyn"}
            }
        }))
        .unwrap();
        let pointer = schema.locate_fragment("/$defs/a", RefTypes::STANDARD);
        let anchor = schema.locate_fragment("plain", RefTypes::STANDARD);
        assert!(pointer.is_some());
        assert_eq!(pointer, anchor);
        assert!(schema.locate_fragment("dyn", RefTypes::STANDARD).is_none());
        assert!(schema.locate_fragment("dyn", RefTypes::DYNAMIC_ONLY).is_some());
        assert!(schema.locate_fragment("/$defs/a", RefTypes::DYNAMIC_ONLY).is_none());
    }

    #[test]
    fn test_pointer_crosses_into_embedded_resource() {
        let schema = Schema::compile(&json!({
            "$defs": {"inner": {"$id": "http://example.com/inner", "$defs": {"x": {"type": "null"}}}}
        }))
        .unwrap();
        assert!(schema
            .locate_fragment("/$defs/inner/$defs/x", RefTypes::STANDARD)
            .is_some());
        let inner = schema.resources().remove(0);
        assert!(inner.locate_fragment("/$defs/x", RefTypes::STANDARD).is_some());
    }
}
