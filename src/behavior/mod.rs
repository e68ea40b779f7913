//! Keyword Behavior Framework
//!
//! Every recognised keyword of a schema object compiles into a
//! [`KeywordBehavior`]. Behaviors are grouped by category; the category decides
//! the default application order and how the validator drives the behavior:
//!
//! - **Identifier**: `$id`, `$schema`, `$anchor`, ... act during the build only
//! - **Reference**: `$ref`, `$dynamicRef` resolve a target and apply it in place
//! - **Composite**: `allOf`, `anyOf`, `oneOf` apply each sub-schema, then combine
//! - **Applicator**: apply sub-schemas to parts of the instance, annotate
//! - **Assertion**: pure checks on the instance
//! - **Annotation**: always valid, emit a value
//! - **Unevaluated**: consume adjacent annotations, run last
//! - **Reserved**: `$defs`, `$comment`, indexed but never validated

pub mod annotations;
pub mod applicators;
pub mod arrays;
pub mod contents;
pub mod generic;
pub mod identifiers;
pub mod numbers;
pub mod objects;
pub mod references;
pub mod reservations;
pub mod strings;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::schema::{NodeIndex, SchemaDocument, SubSchema};
use crate::validator::Context;

// =============================================================================
// Validation outcome
// =============================================================================

/// Outcome of applying a keyword or a sub-schema to an instance
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid,
    Annotation(Value),
    Invalid(Option<String>),
}

impl Validation {
    pub fn invalid(message: impl Into<String>) -> Self {
        Validation::Invalid(Some(message.into()))
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Validation::Invalid(_))
    }

    pub fn annotation(&self) -> Option<&Value> {
        match self {
            Validation::Annotation(value) => Some(value),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Validation::Invalid(message) => message.as_deref(),
            _ => None,
        }
    }

    /// Valid or invalid-without-message from a boolean
    pub(crate) fn from_valid(valid: bool) -> Self {
        if valid {
            Validation::Valid
        } else {
            Validation::Invalid(None)
        }
    }
}

// =============================================================================
// Ordering and categories
// =============================================================================

/// Application order band of a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeywordBehaviorOrder(pub i32);

impl KeywordBehaviorOrder {
    pub const IDENTIFIERS: Self = Self(-1000);
    pub const REFERENCES: Self = Self(-600);
    pub const COMPOSITES: Self = Self(-500);
    pub const APPLICATORS: Self = Self(-400);
    pub const DEFAULT: Self = Self(0);
    pub const UNEVALUATED: Self = Self(1000);
}

/// Keyword category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Identifier,
    Reference,
    Composite,
    Applicator,
    Assertion,
    Annotation,
    Unevaluated,
    Reserved,
}

impl Category {
    pub fn default_order(&self) -> KeywordBehaviorOrder {
        match self {
            Category::Identifier => KeywordBehaviorOrder::IDENTIFIERS,
            Category::Reference => KeywordBehaviorOrder::REFERENCES,
            Category::Composite => KeywordBehaviorOrder::COMPOSITES,
            Category::Applicator => KeywordBehaviorOrder::APPLICATORS,
            Category::Unevaluated => KeywordBehaviorOrder::UNEVALUATED,
            Category::Assertion | Category::Annotation | Category::Reserved => {
                KeywordBehaviorOrder::DEFAULT
            }
        }
    }

    /// Whether keywords of this category apply sub-schemas
    pub fn applies_subschemas(&self) -> bool {
        matches!(
            self,
            Category::Reference | Category::Composite | Category::Applicator | Category::Unevaluated
        )
    }
}

// =============================================================================
// Keyword specs
// =============================================================================

/// Compiles a keyword value; `None` means the keyword has no runtime behavior
pub type BuildFn = fn(&Value, &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>>;

/// Registration of a keyword within a vocabulary
#[derive(Clone)]
pub struct KeywordSpec {
    pub keyword: Keyword,
    pub category: Category,
    pub order: KeywordBehaviorOrder,
    pub dependencies: &'static [&'static str],
    pub build: BuildFn,
}

impl KeywordSpec {
    pub fn new(keyword: Keyword, category: Category, build: BuildFn) -> Self {
        Self {
            keyword,
            order: category.default_order(),
            category,
            dependencies: &[],
            build,
        }
    }

    pub fn with_order(mut self, order: KeywordBehaviorOrder) -> Self {
        self.order = order;
        self
    }

    /// Keywords that must be applied before this one when present
    pub fn depends_on(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl fmt::Debug for KeywordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordSpec")
            .field("keyword", &self.keyword)
            .field("category", &self.category)
            .field("order", &self.order)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Sort keyword entries into application order
///
/// Entries are ordered by band, then by registration position. Within that
/// order an entry is delayed until every dependency present in the same
/// schema object has been emitted.
pub(crate) fn order_entries<T>(mut entries: Vec<(usize, &KeywordSpec, T)>) -> Vec<(&KeywordSpec, T)> {
    entries.sort_by_key(|(position, spec, _)| (spec.order, *position));

    let mut ordered = Vec::with_capacity(entries.len());
    while !entries.is_empty() {
        let ready = entries
            .iter()
            .position(|(_, spec, _)| {
                spec.dependencies.iter().all(|dependency| {
                    !entries.iter().any(|(_, other, _)| other.keyword.as_str() == *dependency)
                })
            })
            .unwrap_or(0);
        let (_, spec, item) = entries.remove(ready);
        ordered.push((spec, item));
    }
    ordered
}

// =============================================================================
// Behaviors
// =============================================================================

/// A compiled keyword, tagged by category
#[derive(Debug, Clone)]
pub enum KeywordBehavior {
    Reference(ReferenceBehavior),
    Composite(CompositeBehavior),
    Applicator(ApplicatorBehavior),
    Assertion(AssertionBehavior),
    Annotation(AnnotationBehavior),
    Unevaluated(UnevaluatedBehavior),
    Reserved(ReservedBehavior),
}

#[derive(Debug, Clone)]
pub enum ReferenceBehavior {
    Ref(references::Ref),
    DynamicRef(references::DynamicRef),
}

#[derive(Debug, Clone)]
pub enum CompositeBehavior {
    AllOf(Vec<NodeIndex>),
    AnyOf(Vec<NodeIndex>),
    OneOf(Vec<NodeIndex>),
}

#[derive(Debug, Clone)]
pub enum ApplicatorBehavior {
    Not(NodeIndex),
    If(NodeIndex),
    Then(NodeIndex),
    Else(NodeIndex),
    DependentSchemas(objects::DependentSchemas),
    PrefixItems(arrays::PrefixItems),
    Items(arrays::Items),
    Contains(arrays::Contains),
    Properties(objects::Properties),
    PatternProperties(objects::PatternProperties),
    AdditionalProperties(objects::AdditionalProperties),
    PropertyNames(objects::PropertyNames),
}

#[derive(Debug, Clone)]
pub enum AssertionBehavior {
    Type(generic::Type),
    Const(generic::Const),
    Enum(generic::Enum),
    MultipleOf(numbers::MultipleOf),
    Limit(numbers::Limit),
    MaxLength(strings::MaxLength),
    MinLength(strings::MinLength),
    Pattern(strings::Pattern),
    MaxItems(arrays::MaxItems),
    MinItems(arrays::MinItems),
    UniqueItems(arrays::UniqueItems),
    MaxContains(arrays::MaxContains),
    MinContains(arrays::MinContains),
    MaxProperties(objects::MaxProperties),
    MinProperties(objects::MinProperties),
    Required(objects::Required),
    DependentRequired(objects::DependentRequired),
}

#[derive(Debug, Clone)]
pub enum AnnotationBehavior {
    MetaData(annotations::MetaData),
    Format(annotations::Format),
    ContentEncoding(contents::ContentEncoding),
    ContentMediaType(contents::ContentMediaType),
    ContentSchema(contents::ContentSchema),
    Unknown(annotations::Unknown),
}

#[derive(Debug, Clone)]
pub enum UnevaluatedBehavior {
    Items(NodeIndex),
    Properties(NodeIndex),
}

#[derive(Debug, Clone)]
pub enum ReservedBehavior {
    Defs(reservations::Defs),
    Comment(String),
}

impl KeywordBehavior {
    pub fn keyword(&self) -> Keyword {
        match self {
            KeywordBehavior::Reference(ReferenceBehavior::Ref(_)) => Keyword::REF,
            KeywordBehavior::Reference(ReferenceBehavior::DynamicRef(_)) => Keyword::DYNAMIC_REF,
            KeywordBehavior::Composite(composite) => composite.keyword(),
            KeywordBehavior::Applicator(applicator) => applicator.keyword(),
            KeywordBehavior::Assertion(assertion) => assertion.keyword(),
            KeywordBehavior::Annotation(annotation) => annotation.keyword(),
            KeywordBehavior::Unevaluated(UnevaluatedBehavior::Items(_)) => Keyword::UNEVALUATED_ITEMS,
            KeywordBehavior::Unevaluated(UnevaluatedBehavior::Properties(_)) => {
                Keyword::UNEVALUATED_PROPERTIES
            }
            KeywordBehavior::Reserved(ReservedBehavior::Defs(_)) => Keyword::DEFS,
            KeywordBehavior::Reserved(ReservedBehavior::Comment(_)) => Keyword::COMMENT,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            KeywordBehavior::Reference(_) => Category::Reference,
            KeywordBehavior::Composite(_) => Category::Composite,
            KeywordBehavior::Applicator(_) => Category::Applicator,
            KeywordBehavior::Assertion(_) => Category::Assertion,
            KeywordBehavior::Annotation(_) => Category::Annotation,
            KeywordBehavior::Unevaluated(_) => Category::Unevaluated,
            KeywordBehavior::Reserved(_) => Category::Reserved,
        }
    }

    /// Whether applying this behavior never recurses into sub-schemas
    pub(crate) fn is_leaf(&self) -> bool {
        match self {
            KeywordBehavior::Annotation(AnnotationBehavior::ContentSchema(_)) => false,
            other => !other.category().applies_subschemas(),
        }
    }

    /// Sub-schemas owned by this behavior
    pub fn subschemas(&self) -> Vec<NodeIndex> {
        match self {
            KeywordBehavior::Reference(_) => Vec::new(),
            KeywordBehavior::Composite(composite) => composite.subschemas().to_vec(),
            KeywordBehavior::Applicator(applicator) => applicator.subschemas(),
            KeywordBehavior::Unevaluated(
                UnevaluatedBehavior::Items(node) | UnevaluatedBehavior::Properties(node),
            ) => vec![*node],
            KeywordBehavior::Annotation(AnnotationBehavior::ContentSchema(content)) => {
                vec![content.schema]
            }
            KeywordBehavior::Reserved(ReservedBehavior::Defs(defs)) => {
                defs.schemas.iter().map(|(_, node)| *node).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Apply the behavior to an instance within the schema object `node`
    pub(crate) fn apply(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        match self {
            KeywordBehavior::Reference(ReferenceBehavior::Ref(reference)) => {
                reference.apply(instance, ctx, doc)
            }
            KeywordBehavior::Reference(ReferenceBehavior::DynamicRef(reference)) => {
                reference.apply(instance, ctx, doc)
            }
            KeywordBehavior::Composite(composite) => {
                let validations: Vec<Validation> = composite
                    .subschemas()
                    .iter()
                    .enumerate()
                    .map(|(index, subschema)| {
                        let token = index.to_string();
                        ctx.validate(doc, *subschema, instance, None, Some(&token))
                    })
                    .collect();
                composite.combine(&validations)
            }
            KeywordBehavior::Applicator(applicator) => applicator.apply(instance, ctx, doc, node),
            KeywordBehavior::Assertion(assertion) => assertion.assert(instance, ctx, node),
            KeywordBehavior::Annotation(annotation) => annotation.annotate(instance, ctx, doc, node),
            KeywordBehavior::Unevaluated(UnevaluatedBehavior::Items(subschema)) => {
                arrays::apply_unevaluated_items(*subschema, instance, ctx, doc)
            }
            KeywordBehavior::Unevaluated(UnevaluatedBehavior::Properties(subschema)) => {
                objects::apply_unevaluated_properties(*subschema, instance, ctx, doc)
            }
            KeywordBehavior::Reserved(_) => Validation::Valid,
        }
    }
}

impl CompositeBehavior {
    pub fn keyword(&self) -> Keyword {
        match self {
            CompositeBehavior::AllOf(_) => Keyword::ALL_OF,
            CompositeBehavior::AnyOf(_) => Keyword::ANY_OF,
            CompositeBehavior::OneOf(_) => Keyword::ONE_OF,
        }
    }

    pub fn subschemas(&self) -> &[NodeIndex] {
        match self {
            CompositeBehavior::AllOf(nodes)
            | CompositeBehavior::AnyOf(nodes)
            | CompositeBehavior::OneOf(nodes) => nodes,
        }
    }

    /// Combine the per-subschema validations into the keyword's outcome
    pub fn combine(&self, validations: &[Validation]) -> Validation {
        let valid = validations.iter().filter(|v| v.is_valid()).count();
        match self {
            CompositeBehavior::AllOf(_) => {
                let failed = validations.len() - valid;
                if failed == 0 {
                    Validation::Valid
                } else {
                    Validation::invalid(format!(
                        "Must match all of the subschemas, {failed} did not match"
                    ))
                }
            }
            CompositeBehavior::AnyOf(_) => {
                if valid > 0 {
                    Validation::Valid
                } else {
                    Validation::invalid("Must match at least one of the subschemas, none matched")
                }
            }
            CompositeBehavior::OneOf(_) => {
                if valid == 1 {
                    Validation::Valid
                } else {
                    Validation::invalid(format!(
                        "Must match exactly one of the subschemas, {valid} matched"
                    ))
                }
            }
        }
    }
}

impl AssertionBehavior {
    pub fn keyword(&self) -> Keyword {
        match self {
            AssertionBehavior::Type(_) => Keyword::TYPE,
            AssertionBehavior::Const(_) => Keyword::CONST,
            AssertionBehavior::Enum(_) => Keyword::ENUM,
            AssertionBehavior::MultipleOf(_) => Keyword::MULTIPLE_OF,
            AssertionBehavior::Limit(limit) => limit.keyword(),
            AssertionBehavior::MaxLength(_) => Keyword::MAX_LENGTH,
            AssertionBehavior::MinLength(_) => Keyword::MIN_LENGTH,
            AssertionBehavior::Pattern(_) => Keyword::PATTERN,
            AssertionBehavior::MaxItems(_) => Keyword::MAX_ITEMS,
            AssertionBehavior::MinItems(_) => Keyword::MIN_ITEMS,
            AssertionBehavior::UniqueItems(_) => Keyword::UNIQUE_ITEMS,
            AssertionBehavior::MaxContains(_) => Keyword::MAX_CONTAINS,
            AssertionBehavior::MinContains(_) => Keyword::MIN_CONTAINS,
            AssertionBehavior::MaxProperties(_) => Keyword::MAX_PROPERTIES,
            AssertionBehavior::MinProperties(_) => Keyword::MIN_PROPERTIES,
            AssertionBehavior::Required(_) => Keyword::REQUIRED,
            AssertionBehavior::DependentRequired(_) => Keyword::DEPENDENT_REQUIRED,
        }
    }

    pub(crate) fn assert(&self, instance: &Value, ctx: &Context<'_>, _node: &SubSchema) -> Validation {
        match self {
            AssertionBehavior::Type(assertion) => assertion.assert(instance),
            AssertionBehavior::Const(assertion) => assertion.assert(instance),
            AssertionBehavior::Enum(assertion) => assertion.assert(instance),
            AssertionBehavior::MultipleOf(assertion) => assertion.assert(instance),
            AssertionBehavior::Limit(assertion) => assertion.assert(instance),
            AssertionBehavior::MaxLength(assertion) => assertion.assert(instance),
            AssertionBehavior::MinLength(assertion) => assertion.assert(instance),
            AssertionBehavior::Pattern(assertion) => assertion.assert(instance),
            AssertionBehavior::MaxItems(assertion) => assertion.assert(instance),
            AssertionBehavior::MinItems(assertion) => assertion.assert(instance),
            AssertionBehavior::UniqueItems(assertion) => assertion.assert(instance),
            AssertionBehavior::MaxContains(assertion) => assertion.assert(instance, ctx),
            AssertionBehavior::MinContains(assertion) => assertion.assert(instance, ctx),
            AssertionBehavior::MaxProperties(assertion) => assertion.assert(instance),
            AssertionBehavior::MinProperties(assertion) => assertion.assert(instance),
            AssertionBehavior::Required(assertion) => assertion.assert(instance),
            AssertionBehavior::DependentRequired(assertion) => assertion.assert(instance),
        }
    }
}

impl ApplicatorBehavior {
    pub fn keyword(&self) -> Keyword {
        match self {
            ApplicatorBehavior::Not(_) => Keyword::NOT,
            ApplicatorBehavior::If(_) => Keyword::IF,
            ApplicatorBehavior::Then(_) => Keyword::THEN,
            ApplicatorBehavior::Else(_) => Keyword::ELSE,
            ApplicatorBehavior::DependentSchemas(_) => Keyword::DEPENDENT_SCHEMAS,
            ApplicatorBehavior::PrefixItems(_) => Keyword::PREFIX_ITEMS,
            ApplicatorBehavior::Items(_) => Keyword::ITEMS,
            ApplicatorBehavior::Contains(_) => Keyword::CONTAINS,
            ApplicatorBehavior::Properties(_) => Keyword::PROPERTIES,
            ApplicatorBehavior::PatternProperties(_) => Keyword::PATTERN_PROPERTIES,
            ApplicatorBehavior::AdditionalProperties(_) => Keyword::ADDITIONAL_PROPERTIES,
            ApplicatorBehavior::PropertyNames(_) => Keyword::PROPERTY_NAMES,
        }
    }

    pub fn subschemas(&self) -> Vec<NodeIndex> {
        match self {
            ApplicatorBehavior::Not(node)
            | ApplicatorBehavior::If(node)
            | ApplicatorBehavior::Then(node)
            | ApplicatorBehavior::Else(node) => vec![*node],
            ApplicatorBehavior::DependentSchemas(a) => a.schemas.iter().map(|(_, n)| *n).collect(),
            ApplicatorBehavior::PrefixItems(a) => a.schemas.clone(),
            ApplicatorBehavior::Items(a) => vec![a.schema],
            ApplicatorBehavior::Contains(a) => vec![a.schema],
            ApplicatorBehavior::Properties(a) => a.schemas.iter().map(|(_, n)| *n).collect(),
            ApplicatorBehavior::PatternProperties(a) => a.schemas.iter().map(|(_, n)| *n).collect(),
            ApplicatorBehavior::AdditionalProperties(a) => vec![a.schema],
            ApplicatorBehavior::PropertyNames(a) => vec![a.schema],
        }
    }

    pub(crate) fn apply(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        match self {
            ApplicatorBehavior::Not(subschema) => applicators::apply_not(*subschema, instance, ctx, doc),
            ApplicatorBehavior::If(subschema) => applicators::apply_if(*subschema, instance, ctx, doc),
            ApplicatorBehavior::Then(subschema) => {
                applicators::apply_branch(*subschema, true, instance, ctx, doc)
            }
            ApplicatorBehavior::Else(subschema) => {
                applicators::apply_branch(*subschema, false, instance, ctx, doc)
            }
            ApplicatorBehavior::DependentSchemas(a) => a.apply(instance, ctx, doc),
            ApplicatorBehavior::PrefixItems(a) => a.apply(instance, ctx, doc),
            ApplicatorBehavior::Items(a) => a.apply(instance, ctx, doc),
            ApplicatorBehavior::Contains(a) => a.apply(instance, ctx, doc, node),
            ApplicatorBehavior::Properties(a) => a.apply(instance, ctx, doc),
            ApplicatorBehavior::PatternProperties(a) => a.apply(instance, ctx, doc),
            ApplicatorBehavior::AdditionalProperties(a) => a.apply(instance, ctx, doc, node),
            ApplicatorBehavior::PropertyNames(a) => a.apply(instance, ctx, doc),
        }
    }
}

impl AnnotationBehavior {
    pub fn keyword(&self) -> Keyword {
        match self {
            AnnotationBehavior::MetaData(annotation) => annotation.keyword.clone(),
            AnnotationBehavior::Format(_) => Keyword::FORMAT,
            AnnotationBehavior::ContentEncoding(_) => Keyword::CONTENT_ENCODING,
            AnnotationBehavior::ContentMediaType(_) => Keyword::CONTENT_MEDIA_TYPE,
            AnnotationBehavior::ContentSchema(_) => Keyword::CONTENT_SCHEMA,
            AnnotationBehavior::Unknown(unknown) => unknown.keyword.clone(),
        }
    }

    pub(crate) fn annotate(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        match self {
            AnnotationBehavior::MetaData(annotation) => Validation::Annotation(annotation.value.clone()),
            AnnotationBehavior::Format(format) => format.annotate(instance, ctx),
            AnnotationBehavior::ContentEncoding(content) => content.annotate(instance, ctx),
            AnnotationBehavior::ContentMediaType(content) => content.annotate(instance, ctx, node),
            AnnotationBehavior::ContentSchema(content) => content.annotate(instance, ctx, doc, node),
            AnnotationBehavior::Unknown(unknown) => Validation::Annotation(unknown.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Value, _: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
        Ok(None)
    }

    fn spec(keyword: &'static str, category: Category) -> KeywordSpec {
        KeywordSpec::new(Keyword::new(keyword), category, noop)
    }

    #[test]
    fn test_order_bands_beat_source_order() {
        let specs = [
            spec("unevaluatedProperties", Category::Unevaluated),
            spec("type", Category::Assertion),
            spec("$ref", Category::Reference),
            spec("allOf", Category::Composite),
            spec("properties", Category::Applicator),
        ];
        let entries = specs.iter().enumerate().map(|(i, s)| (i, s, s.keyword.as_str())).collect();
        let ordered: Vec<&str> = order_entries(entries).into_iter().map(|(_, k)| k).collect();
        assert_eq!(ordered, vec!["$ref", "allOf", "properties", "type", "unevaluatedProperties"]);
    }

    #[test]
    fn test_dependencies_within_band() {
        let specs = [
            spec("else", Category::Applicator)
                .with_order(KeywordBehaviorOrder::COMPOSITES)
                .depends_on(&["if"]),
            spec("if", Category::Applicator).with_order(KeywordBehaviorOrder::COMPOSITES),
            spec("then", Category::Applicator)
                .with_order(KeywordBehaviorOrder::COMPOSITES)
                .depends_on(&["if"]),
        ];
        let entries = specs.iter().enumerate().map(|(i, s)| (i, s, s.keyword.as_str())).collect();
        let ordered: Vec<&str> = order_entries(entries).into_iter().map(|(_, k)| k).collect();
        assert_eq!(ordered, vec!["if", "else", "then"]);
    }

    #[test]
    fn test_combine_messages() {
        let all = CompositeBehavior::AllOf(vec![]);
        let result = all.combine(&[Validation::Valid, Validation::Invalid(None)]);
        assert_eq!(result.message(), Some("Must match all of the subschemas, 1 did not match"));

        let one = CompositeBehavior::OneOf(vec![]);
        let result = one.combine(&[Validation::Valid, Validation::Annotation(Value::Bool(true))]);
        assert_eq!(result.message(), Some("Must match exactly one of the subschemas, 2 matched"));

        let any = CompositeBehavior::AnyOf(vec![]);
        assert!(any.combine(&[Validation::Invalid(None), Validation::Valid]).is_valid());
    }
}
