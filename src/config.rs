//! Configuration for the validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-validator.toml)
//! - Environment variables (SCHEMA_VALIDATOR__*)
//!
//! ## Example config file (schema-validator.toml):
//! ```toml
//! [validation]
//! output = "basic"
//! unknown_keywords = "annotate"
//! collect_annotations = "none"
//! format_mode = "assert"
//! assert_content = false
//! max_depth = 512
//!
//! [schemas]
//! directories = ["./schemas"]
//! base_uri = "http://localhost:1234/"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::error::LocateError;
use crate::locator::{CompositeSchemaLocator, DirectorySchemaContainer, SchemaLocator};
use crate::options::{CollectAnnotations, FormatMode, Options, UnknownKeywords, DEFAULT_MAX_DEPTH};
use crate::validator::OutputFormat;

/// Main configuration for the validator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidatorConfig {
    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// External schemas
    #[serde(default)]
    pub schemas: SchemasConfig,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Output format of the `validate` command
    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default)]
    pub unknown_keywords: UnknownKeywords,

    #[serde(default)]
    pub collect_annotations: CollectAnnotations,

    #[serde(default)]
    pub format_mode: FormatMode,

    /// Decode and check `contentEncoding`/`contentMediaType`/`contentSchema`
    #[serde(default)]
    pub assert_content: bool,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Schemas made available to `$ref`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemasConfig {
    /// Directories of `*.json` schemas to pre-register
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// URI the directories are served from; files use their `file://` URL
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            unknown_keywords: UnknownKeywords::default(),
            collect_annotations: CollectAnnotations::default(),
            format_mode: FormatMode::default(),
            assert_content: false,
            max_depth: default_max_depth(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "schema-validator.toml",
            ".schema-validator.toml",
            "config/schema-validator.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-validator") {
            let xdg_config = config_dir.config_dir().join("schema-validator.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SCHEMA_VALIDATOR__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_VALIDATOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Build validator options, compiling every configured schema directory
    pub fn options(&self) -> Result<Options, LocateError> {
        let validation = &self.validation;
        let mut options = Options::default()
            .with_unknown_keywords(validation.unknown_keywords)
            .with_collect_annotations(validation.collect_annotations)
            .with_format_mode(validation.format_mode)
            .with_assert_content(validation.assert_content)
            .with_max_depth(validation.max_depth);

        if self.schemas.directories.is_empty() {
            return Ok(options);
        }

        let base = self
            .schemas
            .base_uri
            .as_deref()
            .map(|uri| {
                Url::parse(uri).map_err(|source| LocateError::InvalidBase {
                    uri: uri.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut locators: Vec<Arc<dyn SchemaLocator>> = Vec::new();
        for dir in &self.schemas.directories {
            let container = DirectorySchemaContainer::load(dir, base.as_ref(), &options)?;
            locators.push(Arc::new(container));
        }
        options = options.with_schema_locator(Arc::new(CompositeSchemaLocator::new(locators)));
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert_eq!(config.validation.output, OutputFormat::Flag);
        assert_eq!(config.validation.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.schemas.directories.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = ValidatorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[schemas]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validator.toml");
        fs::write(
            &path,
            "[validation]\noutput = \"verbose\"\nformat_mode = \"assert\"\nmax_depth = 64\n",
        )
        .unwrap();
        let config = ValidatorConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.validation.output, OutputFormat::Verbose);
        assert_eq!(config.validation.format_mode, FormatMode::Assert);
        let options = config.options().unwrap();
        assert_eq!(options.max_depth, 64);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = ValidatorConfig::default();
        config.validation.assert_content = true;
        config.save(path.to_str().unwrap()).unwrap();
        let loaded = ValidatorConfig::load_from(path.to_str()).unwrap();
        assert!(loaded.validation.assert_content);
    }

    #[test]
    fn test_options_register_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("name.json"), r#"{"type": "string", "minLength": 1}"#).unwrap();
        let config = ValidatorConfig {
            schemas: SchemasConfig {
                directories: vec![dir.path().to_path_buf()],
                base_uri: Some("http://example.com/schemas/".to_string()),
            },
            ..Default::default()
        };
        let options = config.options().unwrap();
        let schema = crate::schema::Schema::compile_with(
            &json!({"$ref": "http://example.com/schemas/name.json"}),
            &options,
        )
        .unwrap();
        let valid = |instance| schema.validate(&instance, OutputFormat::Flag, &options).is_valid();
        assert!(valid(json!("x")));
        assert!(!valid(json!("")));
    }

    #[test]
    fn test_invalid_base_uri() {
        let dir = TempDir::new().unwrap();
        let config = ValidatorConfig {
            schemas: SchemasConfig {
                directories: vec![dir.path().to_path_buf()],
                base_uri: Some("not a uri".to_string()),
            },
            ..Default::default()
        };
        assert!(matches!(config.options(), Err(LocateError::InvalidBase { .. })));
    }
}
