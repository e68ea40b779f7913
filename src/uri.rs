//! URI helpers built on the `url` crate
//!
//! Schema identifiers are stored without fragments; fragments are decoded
//! separately when a reference is resolved.

use url::Url;

/// Base URI assigned to schemas built without an explicit resource id
pub const DEFAULT_BASE_URI: &str = "local://schema";

/// The default base URI as a parsed `Url`
pub fn default_base() -> Url {
    Url::parse(DEFAULT_BASE_URI).expect("default base URI is valid")
}

/// Resolve a URI reference against a base
pub fn resolve(base: &Url, reference: &str) -> Result<Url, url::ParseError> {
    base.join(reference)
}

/// A copy of `url` with the fragment removed
pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// The percent-decoded fragment, or an empty string when absent
pub fn fragment(url: &Url) -> String {
    url.fragment().map(percent_decode).unwrap_or_default()
}

/// Build `base#pointer` for absolute keyword locations
pub fn with_fragment(base: &Url, fragment: &str) -> Url {
    let mut url = base.clone();
    url.set_fragment(Some(fragment));
    url
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        let base = Url::parse("http://localhost:1234/draft2020-12/tree").unwrap();
        let resolved = resolve(&base, "node").unwrap();
        assert_eq!(resolved.as_str(), "http://localhost:1234/draft2020-12/node");
    }

    #[test]
    fn test_default_base_join() {
        let resolved = resolve(&default_base(), "#/$defs/a").unwrap();
        assert_eq!(fragment(&resolved), "/$defs/a");
        assert_eq!(without_fragment(&resolved), default_base());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/$defs/a%25b"), "/$defs/a%b");
        assert_eq!(percent_decode("/foo%22bar"), "/foo\"bar");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("abc%2"), "abc%2");
    }

    #[test]
    fn test_urn_fragment() {
        let base = Url::parse("urn:uuid:deadbeef-1234-ffff-ffff-4321feebdaed").unwrap();
        let resolved = resolve(&base, "#/$defs/bar").unwrap();
        assert_eq!(fragment(&resolved), "/$defs/bar");
    }
}
