//! Keyword tokens
//!
//! A [`Keyword`] is the name of a schema object member. Every Draft 2020-12
//! keyword has an associated constant so behaviors and meta-schemas can refer
//! to them without allocating.

use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Serialize, Serializer};

/// An interned keyword name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(Cow<'static, str>);

macro_rules! keywords {
    ($($name:ident => $text:literal),* $(,)?) => {
        impl Keyword {
            $(pub const $name: Keyword = Keyword(Cow::Borrowed($text));)*
        }
    };
}

keywords! {
    // core
    ID => "$id",
    SCHEMA => "$schema",
    REF => "$ref",
    ANCHOR => "$anchor",
    DYNAMIC_REF => "$dynamicRef",
    DYNAMIC_ANCHOR => "$dynamicAnchor",
    VOCABULARY => "$vocabulary",
    COMMENT => "$comment",
    DEFS => "$defs",

    // applicator
    PREFIX_ITEMS => "prefixItems",
    ITEMS => "items",
    CONTAINS => "contains",
    ADDITIONAL_PROPERTIES => "additionalProperties",
    PROPERTIES => "properties",
    PATTERN_PROPERTIES => "patternProperties",
    DEPENDENT_SCHEMAS => "dependentSchemas",
    PROPERTY_NAMES => "propertyNames",
    IF => "if",
    THEN => "then",
    ELSE => "else",
    ALL_OF => "allOf",
    ANY_OF => "anyOf",
    ONE_OF => "oneOf",
    NOT => "not",

    // unevaluated
    UNEVALUATED_ITEMS => "unevaluatedItems",
    UNEVALUATED_PROPERTIES => "unevaluatedProperties",

    // validation
    TYPE => "type",
    CONST => "const",
    ENUM => "enum",
    MULTIPLE_OF => "multipleOf",
    MAXIMUM => "maximum",
    EXCLUSIVE_MAXIMUM => "exclusiveMaximum",
    MINIMUM => "minimum",
    EXCLUSIVE_MINIMUM => "exclusiveMinimum",
    MAX_LENGTH => "maxLength",
    MIN_LENGTH => "minLength",
    PATTERN => "pattern",
    MAX_ITEMS => "maxItems",
    MIN_ITEMS => "minItems",
    UNIQUE_ITEMS => "uniqueItems",
    MAX_CONTAINS => "maxContains",
    MIN_CONTAINS => "minContains",
    MAX_PROPERTIES => "maxProperties",
    MIN_PROPERTIES => "minProperties",
    REQUIRED => "required",
    DEPENDENT_REQUIRED => "dependentRequired",

    // meta-data
    TITLE => "title",
    DESCRIPTION => "description",
    DEFAULT => "default",
    DEPRECATED => "deprecated",
    READ_ONLY => "readOnly",
    WRITE_ONLY => "writeOnly",
    EXAMPLES => "examples",

    // format
    FORMAT => "format",

    // content
    CONTENT_ENCODING => "contentEncoding",
    CONTENT_MEDIA_TYPE => "contentMediaType",
    CONTENT_SCHEMA => "contentSchema",
}

impl Keyword {
    /// A keyword that is not one of the built-in constants
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Keyword {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Keyword {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_constants_and_owned_compare_equal() {
        assert_eq!(Keyword::new("$ref"), Keyword::REF);
        assert_eq!(Keyword::UNEVALUATED_PROPERTIES.as_str(), "unevaluatedProperties");
    }

    #[test]
    fn test_lookup_by_str() {
        let set: HashSet<Keyword> = [Keyword::IF, Keyword::THEN].into_iter().collect();
        assert!(set.contains("if"));
        assert!(!set.contains("else"));
    }
}
