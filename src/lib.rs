//! JSON Schema Engine
//!
//! A JSON Schema Draft 2020-12 compiler and validator. Schemas are compiled
//! once into an immutable arena of keyword behaviors and then applied to any
//! number of instances.
//!
//! ## Features
//!
//! - **Vocabulary-driven**: keywords come from the vocabularies the effective
//!   meta-schema enables, so custom dialects can add or drop keywords
//! - **Dynamic scope**: `$ref`, `$dynamicRef` and `$dynamicAnchor` across
//!   embedded resources and external documents
//! - **Annotations**: `unevaluatedItems`/`unevaluatedProperties` see the
//!   results of every successfully applied adjacent sub-schema
//! - **Output formats**: flag, basic, detailed and verbose
//!
//! ## Architecture
//!
//! ```text
//! value ──Builder──▶ SchemaDocument (nodes + resources)
//!                         │
//! instance ──Context──────┴──▶ ResultBuilder ──▶ ValidationResult
//! ```
//!
//! ## Example
//!
//! ```
//! use json_schema_engine::{OutputFormat, Options, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::compile(&json!({"type": "integer", "minimum": 1})).unwrap();
//! assert!(schema.is_valid(&json!(3)));
//!
//! let result = schema.validate(&json!(0), OutputFormat::Basic, &Options::default());
//! assert!(!result.is_valid());
//! ```

pub mod behavior;
pub mod builder;
pub mod config;
pub mod error;
pub mod formats;
pub mod keyword;
pub mod locator;
pub mod media;
pub mod options;
pub mod pointer;
pub mod schema;
pub mod uri;
pub mod validator;
pub mod value;
pub mod vocabulary;

pub use behavior::{Category, KeywordBehavior, KeywordBehaviorOrder, KeywordSpec, Validation};
pub use builder::Builder;
pub use config::ValidatorConfig;
pub use error::{CompileError, LocateError, Result};
pub use formats::{FormatType, FormatTypeLocator, FormatTypes};
pub use keyword::Keyword;
pub use locator::{
    CompositeMetaSchemaLocator, CompositeSchemaLocator, CompositeVocabularyLocator, DirectorySchemaContainer,
    LocalSchemaContainer, MetaSchemaContainer, MetaSchemaLocator, SchemaLocator, VocabularyLocator,
};
pub use media::{ContentEncodingType, ContentEncodingTypes, ContentMediaTypeType, ContentMediaTypeTypes};
pub use options::{CollectAnnotations, FormatMode, Options, UnknownKeywords};
pub use pointer::Pointer;
pub use schema::{NodeIndex, RefTypes, Schema, SubSchema};
pub use validator::{OutputFormat, ValidationResult};
pub use value::InstanceType;
pub use vocabulary::draft2020_12::Draft2020_12;
pub use vocabulary::{MetaSchema, Vocabulary};
