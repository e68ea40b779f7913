//! Locators
//!
//! Locators resolve identifiers to compiled schemas, meta-schemas and
//! vocabularies. Lookups are synchronous; containers that accept
//! registrations guard their maps with an `RwLock`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

use crate::builder::Builder;
use crate::error::{CompileError, LocateError};
use crate::options::Options;
use crate::schema::Schema;
use crate::uri;
use crate::vocabulary::{MetaSchema, Vocabulary};

/// Resolves schema resource ids to compiled schemas
pub trait SchemaLocator: Send + Sync {
    fn locate(&self, id: &Url) -> Result<Option<Schema>, LocateError>;
}

/// Resolves `$schema` ids to meta-schemas
pub trait MetaSchemaLocator: Send + Sync {
    fn locate_meta_schema(&self, id: &Url) -> Option<Arc<MetaSchema>>;
}

/// Resolves `$vocabulary` ids to vocabularies
pub trait VocabularyLocator: Send + Sync {
    fn locate_vocabulary(&self, id: &Url) -> Option<Arc<Vocabulary>>;
}

// =============================================================================
// Composites
// =============================================================================

/// Tries each locator in order
#[derive(Default, Clone)]
pub struct CompositeSchemaLocator {
    locators: Vec<Arc<dyn SchemaLocator>>,
}

impl CompositeSchemaLocator {
    pub fn new(locators: Vec<Arc<dyn SchemaLocator>>) -> Self {
        Self { locators }
    }

    pub fn push(&mut self, locator: Arc<dyn SchemaLocator>) {
        self.locators.push(locator);
    }
}

impl SchemaLocator for CompositeSchemaLocator {
    fn locate(&self, id: &Url) -> Result<Option<Schema>, LocateError> {
        for locator in &self.locators {
            match locator.locate(id) {
                Ok(Some(schema)) => return Ok(Some(schema)),
                Ok(None) => {}
                Err(error) => warn!(id = %id, error = %error, "schema locator failed"),
            }
        }
        Ok(None)
    }
}

#[derive(Default, Clone)]
pub struct CompositeMetaSchemaLocator {
    locators: Vec<Arc<dyn MetaSchemaLocator>>,
}

impl CompositeMetaSchemaLocator {
    pub fn new(locators: Vec<Arc<dyn MetaSchemaLocator>>) -> Self {
        Self { locators }
    }
}

impl MetaSchemaLocator for CompositeMetaSchemaLocator {
    fn locate_meta_schema(&self, id: &Url) -> Option<Arc<MetaSchema>> {
        self.locators.iter().find_map(|locator| locator.locate_meta_schema(id))
    }
}

#[derive(Default, Clone)]
pub struct CompositeVocabularyLocator {
    locators: Vec<Arc<dyn VocabularyLocator>>,
}

impl CompositeVocabularyLocator {
    pub fn new(locators: Vec<Arc<dyn VocabularyLocator>>) -> Self {
        Self { locators }
    }
}

impl VocabularyLocator for CompositeVocabularyLocator {
    fn locate_vocabulary(&self, id: &Url) -> Option<Arc<Vocabulary>> {
        self.locators.iter().find_map(|locator| locator.locate_vocabulary(id))
    }
}

// =============================================================================
// Containers
// =============================================================================

/// In-memory registry of compiled schemas
#[derive(Default)]
pub struct LocalSchemaContainer {
    schemas: RwLock<HashMap<Url, Schema>>,
}

impl LocalSchemaContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema and every resource nested in it
    pub fn register(&self, schema: Schema) {
        let mut schemas = self.schemas.write().unwrap_or_else(|e| e.into_inner());
        let mut pending = vec![schema];
        while let Some(schema) = pending.pop() {
            pending.extend(schema.resources());
            debug!(id = %schema.id(), "registered schema");
            schemas.insert(schema.id().clone(), schema);
        }
    }

    /// Register a schema under an additional id, e.g. its retrieval URI
    pub fn register_as(&self, id: &Url, schema: Schema) {
        self.schemas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(uri::without_fragment(id), schema.clone());
        self.register(schema);
    }

    /// Compile `value` as retrieved from `id` and register it
    pub fn register_value(&self, value: &Value, id: &Url, options: &Options) -> Result<Schema, CompileError> {
        let schema = Builder::build(value, id, options)?;
        self.register_as(id, schema.clone());
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaLocator for LocalSchemaContainer {
    fn locate(&self, id: &Url) -> Result<Option<Schema>, LocateError> {
        let id = uri::without_fragment(id);
        Ok(self
            .schemas
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned())
    }
}

/// Schemas compiled from every `*.json` file below a directory
///
/// Each file is retrieved from `base` joined with its relative path, or from
/// its `file://` URL when no base is given.
pub struct DirectorySchemaContainer {
    container: LocalSchemaContainer,
}

impl DirectorySchemaContainer {
    pub fn load(dir: impl AsRef<Path>, base: Option<&Url>, options: &Options) -> Result<Self, LocateError> {
        let dir = dir.as_ref();
        let container = LocalSchemaContainer::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let id = Self::retrieval_id(dir, path, base)?;
            let content = std::fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&content)?;
            container
                .register_value(&value, &id, options)
                .map_err(|source| LocateError::Compile { id: id.clone(), source })?;
        }

        debug!(dir = %dir.display(), schemas = container.len(), "loaded schema directory");
        Ok(Self { container })
    }

    fn retrieval_id(dir: &Path, path: &Path, base: Option<&Url>) -> Result<Url, LocateError> {
        let invalid = || LocateError::InvalidPath(path.display().to_string());
        match base {
            Some(base) => {
                let relative = path.strip_prefix(dir).map_err(|_| invalid())?;
                let relative: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                base.join(&relative.join("/")).map_err(|_| invalid())
            }
            None => {
                let absolute = path.canonicalize()?;
                Url::from_file_path(absolute).map_err(|_| invalid())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }
}

impl SchemaLocator for DirectorySchemaContainer {
    fn locate(&self, id: &Url) -> Result<Option<Schema>, LocateError> {
        self.container.locate(id)
    }
}

/// Meta-schemas derived from custom meta-schema documents
pub struct MetaSchemaContainer {
    schemas: Arc<dyn SchemaLocator>,
    vocabularies: Arc<dyn VocabularyLocator>,
    default_schema: Arc<MetaSchema>,
    cache: RwLock<HashMap<Url, Arc<MetaSchema>>>,
}

impl MetaSchemaContainer {
    pub fn new(
        schemas: Arc<dyn SchemaLocator>,
        vocabularies: Arc<dyn VocabularyLocator>,
        default_schema: Arc<MetaSchema>,
    ) -> Self {
        Self {
            schemas,
            vocabularies,
            default_schema,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl MetaSchemaLocator for MetaSchemaContainer {
    fn locate_meta_schema(&self, id: &Url) -> Option<Arc<MetaSchema>> {
        if let Some(meta_schema) = self.cache.read().unwrap_or_else(|e| e.into_inner()).get(id) {
            return Some(meta_schema.clone());
        }
        let schema = match self.schemas.locate(id) {
            Ok(schema) => schema?,
            Err(error) => {
                warn!(id = %id, error = %error, "meta-schema document lookup failed");
                return None;
            }
        };
        match MetaSchema::from_schema(&schema, self.vocabularies.as_ref(), &self.default_schema) {
            Ok(meta_schema) => {
                let meta_schema = Arc::new(meta_schema);
                self.cache
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(id.clone(), meta_schema.clone());
                Some(meta_schema)
            }
            Err(vocabulary) => {
                warn!(id = %id, vocabulary = %vocabulary, "unknown required vocabulary");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::draft2020_12::{self, Draft2020_12};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_local_container_registers_nested_resources() {
        let container = LocalSchemaContainer::new();
        let id = Url::parse("http://example.com/root").unwrap();
        container
            .register_value(
                &json!({"$defs": {"a": {"$id": "http://example.com/a", "type": "string"}}}),
                &id,
                &Options::default(),
            )
            .unwrap();
        let nested = Url::parse("http://example.com/a#/type").unwrap();
        assert!(container.locate(&nested).unwrap().is_some());
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_directory_container_with_base() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("integer.json"), r#"{"type": "integer"}"#).unwrap();
        fs::write(
            dir.path().join("nested/foo-ref-string.json"),
            r#"{"type": "object", "properties": {"foo": {"$ref": "string.json"}}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("nested/string.json"), r#"{"type": "string"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let base = Url::parse("http://localhost:1234/").unwrap();
        let container = DirectorySchemaContainer::load(dir.path(), Some(&base), &Options::default()).unwrap();
        assert_eq!(container.len(), 3);

        let options = Options::default().with_schema_locator(Arc::new(container));
        let schema = Schema::compile_with(
            &json!({"$ref": "http://localhost:1234/nested/foo-ref-string.json"}),
            &options,
        )
        .unwrap();
        let valid = |instance| {
            schema
                .validate(&instance, crate::validator::OutputFormat::Flag, &options)
                .is_valid()
        };
        assert!(valid(json!({"foo": "x"})));
        assert!(!valid(json!({"foo": 1})));
    }

    #[test]
    fn test_meta_schema_container_derives_vocabularies() {
        let documents = LocalSchemaContainer::new();
        let id = Url::parse("http://example.com/no-validation").unwrap();
        documents
            .register_value(
                &json!({
                    "$id": "http://example.com/no-validation",
                    "$vocabulary": {
                        "https://json-schema.org/draft/2020-12/vocab/core": true,
                        "https://json-schema.org/draft/2020-12/vocab/applicator": true
                    }
                }),
                &id,
                &Options::default(),
            )
            .unwrap();
        let container = MetaSchemaContainer::new(
            Arc::new(documents),
            Arc::new(Draft2020_12),
            draft2020_12::meta_schema(),
        );
        let meta_schema = container.locate_meta_schema(&id).unwrap();
        assert!(meta_schema.keyword("properties").is_some());
        assert!(meta_schema.keyword("minimum").is_none());
    }
}
