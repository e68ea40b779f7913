//! Vocabularies and meta-schemas
//!
//! A [`Vocabulary`] is a named table of keyword specs. A [`MetaSchema`] is
//! the ordered union of the vocabularies a dialect enables; its effective
//! keyword table is what the builder consults for every schema object.

pub mod draft2020_12;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::behavior::{Category, KeywordSpec};
use crate::keyword::Keyword;
use crate::locator::{SchemaLocator, VocabularyLocator};
use crate::schema::Schema;
use crate::value::InstanceType;

/// A named set of keywords
#[derive(Debug, Clone)]
pub struct Vocabulary {
    id: Url,
    schema_id: Url,
    types: Vec<InstanceType>,
    keywords: Vec<KeywordSpec>,
}

impl Vocabulary {
    pub fn new(id: Url, schema_id: Url) -> Self {
        Self {
            id,
            schema_id,
            types: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Instance types this vocabulary's keywords apply to
    pub fn with_types(mut self, types: &[InstanceType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn with_keyword(mut self, spec: KeywordSpec) -> Self {
        self.keywords.push(spec);
        self
    }

    pub fn id(&self) -> &Url {
        &self.id
    }

    /// Id of the meta-schema document describing this vocabulary
    pub fn schema_id(&self) -> &Url {
        &self.schema_id
    }

    pub fn types(&self) -> &[InstanceType] {
        &self.types
    }

    pub fn keywords(&self) -> &[KeywordSpec] {
        &self.keywords
    }
}

/// A dialect: ordered vocabularies plus the derived keyword table
pub struct MetaSchema {
    id: Url,
    vocabularies: Vec<(Arc<Vocabulary>, bool)>,
    types: Vec<InstanceType>,
    keywords: Vec<KeywordSpec>,
    index: HashMap<Keyword, usize>,
    identifier_keywords: HashSet<Keyword>,
    applicator_keywords: HashSet<Keyword>,
    reserved_keywords: HashSet<Keyword>,
    schema_locator: Option<Arc<dyn SchemaLocator>>,
}

impl MetaSchema {
    pub fn builder(id: Url) -> MetaSchemaBuilder {
        MetaSchemaBuilder {
            id,
            vocabularies: Vec::new(),
            keywords: Vec::new(),
            schema_locator: None,
        }
    }

    /// Derive a meta-schema from a compiled meta-schema document
    ///
    /// The document's `$vocabulary` selects the vocabularies; a document
    /// without `$vocabulary` uses the vocabularies of `fallback`. Fails with
    /// the id of the first required vocabulary that cannot be located.
    pub fn from_schema(
        schema: &Schema,
        locator: &dyn VocabularyLocator,
        fallback: &MetaSchema,
    ) -> Result<MetaSchema, Url> {
        let mut builder = MetaSchema::builder(schema.id().clone()).schema_locator(Arc::new(schema.clone()));
        match schema.vocabularies() {
            Some(declared) => {
                for (id, required) in declared {
                    match locator.locate_vocabulary(id) {
                        Some(vocabulary) => builder = builder.vocabulary(vocabulary, *required),
                        None if *required => return Err(id.clone()),
                        None => tracing::debug!(vocabulary = %id, "skipping unknown optional vocabulary"),
                    }
                }
            }
            None => {
                for (vocabulary, required) in fallback.vocabularies() {
                    builder = builder.vocabulary(vocabulary.clone(), *required);
                }
            }
        }
        Ok(builder.build())
    }

    pub fn id(&self) -> &Url {
        &self.id
    }

    pub fn vocabularies(&self) -> &[(Arc<Vocabulary>, bool)] {
        &self.vocabularies
    }

    pub fn has_vocabulary(&self, id: &str) -> bool {
        self.vocabularies.iter().any(|(v, _)| v.id().as_str() == id)
    }

    /// Union of the instance types of all vocabularies
    pub fn types(&self) -> &[InstanceType] {
        &self.types
    }

    /// Registration position and spec of a keyword
    pub fn keyword(&self, name: &str) -> Option<(usize, &KeywordSpec)> {
        let position = *self.index.get(name)?;
        Some((position, &self.keywords[position]))
    }

    pub fn keywords(&self) -> &[KeywordSpec] {
        &self.keywords
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier_keywords.contains(name)
    }

    pub fn is_applicator(&self, name: &str) -> bool {
        self.applicator_keywords.contains(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_keywords.contains(name)
    }

    /// Locator for the documents of this meta-schema and its vocabularies
    pub fn schema_locator(&self) -> Option<&Arc<dyn SchemaLocator>> {
        self.schema_locator.as_ref()
    }
}

impl fmt::Debug for MetaSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSchema")
            .field("id", &self.id.as_str())
            .field(
                "vocabularies",
                &self.vocabularies.iter().map(|(v, r)| (v.id().as_str(), *r)).collect::<Vec<_>>(),
            )
            .field("keywords", &self.keywords.len())
            .finish()
    }
}

/// Assembles a [`MetaSchema`]
pub struct MetaSchemaBuilder {
    id: Url,
    vocabularies: Vec<(Arc<Vocabulary>, bool)>,
    keywords: Vec<KeywordSpec>,
    schema_locator: Option<Arc<dyn SchemaLocator>>,
}

impl MetaSchemaBuilder {
    pub fn vocabulary(mut self, vocabulary: Arc<Vocabulary>, required: bool) -> Self {
        self.vocabularies.push((vocabulary, required));
        self
    }

    /// A keyword outside any vocabulary, registered after all of them
    pub fn keyword(mut self, spec: KeywordSpec) -> Self {
        self.keywords.push(spec);
        self
    }

    pub fn schema_locator(mut self, locator: Arc<dyn SchemaLocator>) -> Self {
        self.schema_locator = Some(locator);
        self
    }

    pub fn build(self) -> MetaSchema {
        let mut keywords: Vec<KeywordSpec> = Vec::new();
        let mut index: HashMap<Keyword, usize> = HashMap::new();
        let mut types: Vec<InstanceType> = Vec::new();

        let specs = self
            .vocabularies
            .iter()
            .flat_map(|(vocabulary, _)| vocabulary.keywords().iter().cloned())
            .chain(self.keywords);
        for spec in specs {
            // Later registrations replace earlier ones in place.
            match index.get(&spec.keyword) {
                Some(position) => keywords[*position] = spec,
                None => {
                    index.insert(spec.keyword.clone(), keywords.len());
                    keywords.push(spec);
                }
            }
        }
        for (vocabulary, _) in &self.vocabularies {
            for instance_type in vocabulary.types() {
                if !types.contains(instance_type) {
                    types.push(*instance_type);
                }
            }
        }

        let keywords_in = |categories: &[Category]| -> HashSet<Keyword> {
            keywords
                .iter()
                .filter(|spec| categories.contains(&spec.category))
                .map(|spec| spec.keyword.clone())
                .collect()
        };
        let identifier_keywords = keywords_in(&[Category::Identifier]);
        let applicator_keywords = keywords_in(&[
            Category::Reference,
            Category::Composite,
            Category::Applicator,
            Category::Unevaluated,
        ]);
        let reserved_keywords = keywords_in(&[Category::Reserved]);

        MetaSchema {
            id: self.id,
            vocabularies: self.vocabularies,
            types,
            keywords,
            index,
            identifier_keywords,
            applicator_keywords,
            reserved_keywords,
            schema_locator: self.schema_locator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_category_sets() {
        let meta_schema = draft2020_12::meta_schema();
        assert!(meta_schema.is_identifier("$id"));
        assert!(meta_schema.is_identifier("$dynamicAnchor"));
        assert!(meta_schema.is_applicator("allOf"));
        assert!(meta_schema.is_applicator("$ref"));
        assert!(meta_schema.is_applicator("unevaluatedItems"));
        assert!(meta_schema.is_reserved("$defs"));
        assert!(!meta_schema.is_applicator("type"));
        assert_eq!(meta_schema.types().len(), InstanceType::ALL.len());
    }

    #[test]
    fn test_last_registration_wins() {
        let format_assertion = draft2020_12::format_assertion();
        let meta_schema = MetaSchema::builder(Url::parse("http://example.com/assert").unwrap())
            .vocabulary(draft2020_12::core(), true)
            .vocabulary(draft2020_12::format_annotation(), true)
            .vocabulary(format_assertion.clone(), true)
            .build();
        let (position, spec) = meta_schema.keyword("format").unwrap();
        let expected = format_assertion.keywords()[0].build as usize;
        assert_eq!(spec.build as usize, expected);
        assert_eq!(meta_schema.keywords().iter().filter(|s| s.keyword == Keyword::FORMAT).count(), 1);
        assert!(position > 0);
    }
}
