//! Format types
//!
//! A [`FormatType`] checks values against a named `format`. [`FormatTypes`]
//! is the default registry; it ships the common string formats and accepts
//! registrations at runtime.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::behavior::strings::Pattern;
use crate::pointer::Pointer;

/// A named `format`
pub trait FormatType: Send + Sync {
    fn identifier(&self) -> &str;

    /// Whether `value` conforms; values of types the format does not cover
    /// conform
    fn validate(&self, value: &Value) -> bool;
}

/// Resolves `format` names
pub trait FormatTypeLocator: Send + Sync {
    fn locate_format_type(&self, id: &str) -> Option<Arc<dyn FormatType>>;
}

/// A string format checked by a plain function
struct StringFormat {
    identifier: &'static str,
    check: fn(&str) -> bool,
}

impl FormatType for StringFormat {
    fn identifier(&self) -> &str {
        self.identifier
    }

    fn validate(&self, value: &Value) -> bool {
        match value {
            Value::String(text) => (self.check)(text),
            _ => true,
        }
    }
}

/// Registry of format types
pub struct FormatTypes {
    formats: RwLock<HashMap<String, Arc<dyn FormatType>>>,
}

impl FormatTypes {
    /// A registry without any formats
    pub fn empty() -> Self {
        Self {
            formats: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, format: Arc<dyn FormatType>) {
        self.formats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(format.identifier().to_string(), format);
    }

    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .formats
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl Default for FormatTypes {
    fn default() -> Self {
        let registry = Self::empty();
        let builtins: [(&'static str, fn(&str) -> bool); 12] = [
            ("date-time", is_date_time),
            ("date", is_date),
            ("time", is_time),
            ("email", is_email),
            ("hostname", is_hostname),
            ("ipv4", is_ipv4),
            ("ipv6", is_ipv6),
            ("uri", is_uri),
            ("uri-reference", is_uri_reference),
            ("uuid", is_uuid),
            ("regex", is_regex),
            ("json-pointer", is_json_pointer),
        ];
        for (identifier, check) in builtins {
            registry.register(Arc::new(StringFormat { identifier, check }));
        }
        registry
    }
}

impl FormatTypeLocator for FormatTypes {
    fn locate_format_type(&self, id: &str) -> Option<Arc<dyn FormatType>> {
        self.formats.read().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }
}

// =============================================================================
// Built-in checks
// =============================================================================

fn regex(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in format pattern compiles"))
}

fn full_date_regex() -> &'static Regex {
    static FULL_DATE: OnceLock<Regex> = OnceLock::new();
    regex(&FULL_DATE, r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")
}

/// RFC 3339 `date-time`
fn is_date_time(text: &str) -> bool {
    match text.split_once(['T', 't']) {
        Some((date, _)) => is_date(date) && DateTime::parse_from_rfc3339(text).is_ok(),
        None => false,
    }
}

/// RFC 3339 `full-date`
fn is_date(text: &str) -> bool {
    full_date_regex().is_match(text) && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `full-time`, offset required
fn is_time(text: &str) -> bool {
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{}", text)).is_ok()
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    let local_valid = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !local.contains(char::is_whitespace);
    let domain_valid = match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => match literal.strip_prefix("IPv6:") {
            Some(v6) => is_ipv6(v6),
            None => is_ipv4(literal),
        },
        None => is_hostname(domain),
    };
    local_valid && domain_valid
}

/// RFC 1123 host name
fn is_hostname(text: &str) -> bool {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let label = regex(&LABEL, r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$");
    let text = text.strip_suffix('.').unwrap_or(text);
    !text.is_empty() && text.len() <= 253 && text.split('.').all(|part| label.is_match(part))
}

fn is_ipv4(text: &str) -> bool {
    Ipv4Addr::from_str(text).is_ok()
}

fn is_ipv6(text: &str) -> bool {
    Ipv6Addr::from_str(text).is_ok()
}

fn is_uri(text: &str) -> bool {
    !text.contains(['\\', ' ']) && Url::parse(text).is_ok()
}

fn is_uri_reference(text: &str) -> bool {
    static BASE: OnceLock<Url> = OnceLock::new();
    let base = BASE.get_or_init(|| Url::parse("http://reference.invalid/").unwrap());
    !text.contains(['\\', ' ']) && base.join(text).is_ok()
}

fn is_uuid(text: &str) -> bool {
    static UUID: OnceLock<Regex> = OnceLock::new();
    regex(
        &UUID,
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .is_match(text)
}

fn is_regex(text: &str) -> bool {
    Pattern::new(text).is_ok()
}

fn is_json_pointer(text: &str) -> bool {
    Pointer::parse(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(id: &str, text: &str) -> bool {
        FormatTypes::default()
            .locate_format_type(id)
            .unwrap()
            .validate(&json!(text))
    }

    #[test]
    fn test_dates_and_times() {
        assert!(check("date-time", "1963-06-19T08:30:06.283185Z"));
        assert!(check("date-time", "1963-06-19t08:30:06+01:00"));
        assert!(!check("date-time", "1963-06-19T08:30:06"));
        assert!(check("date", "2020-02-29"));
        assert!(!check("date", "2021-02-29"));
        assert!(!check("date", "20200-01-01"));
        assert!(check("time", "08:30:06Z"));
        assert!(!check("time", "08:30:06"));
    }

    #[test]
    fn test_network_formats() {
        assert!(check("ipv4", "192.168.0.1"));
        assert!(!check("ipv4", "256.0.0.1"));
        assert!(check("ipv6", "::1"));
        assert!(!check("ipv6", "12345::"));
        assert!(check("hostname", "www.example.com"));
        assert!(!check("hostname", "-bad.example.com"));
        assert!(check("email", "joe.bloggs@example.com"));
        assert!(!check("email", "joe..bloggs@example.com"));
        assert!(!check("email", "no-at-sign"));
    }

    #[test]
    fn test_identifier_formats() {
        assert!(check("uri", "http://example.com/a?b#c"));
        assert!(!check("uri", "relative/path"));
        assert!(check("uri-reference", "relative/path#frag"));
        assert!(check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d16380"));
        assert!(!check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d1638"));
        assert!(check("regex", "^[a-z]+$"));
        assert!(!check("regex", "^[a-z"));
        assert!(check("json-pointer", "/a~1b/0"));
        assert!(!check("json-pointer", "a/b"));
    }

    #[test]
    fn test_non_strings_conform() {
        let formats = FormatTypes::default();
        let email = formats.locate_format_type("email").unwrap();
        assert!(email.validate(&json!(12)));
        assert!(formats.locate_format_type("unknown").is_none());
    }
}
