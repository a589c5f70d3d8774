//! Percent-encoding for the pieces of a resource location.
//!
//! Character classes follow RFC 3986. Text is always encoded as UTF-8 and
//! escapes use upper-case hex digits.

use crate::error::{LoadError, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// The URI component a piece of text is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Scheme,
    Authority,
    UserInfo,
    Host,
    Port,
    Path,
    PathSegment,
    Query,
    QueryParam,
    Fragment,
    /// Only unreserved characters pass through.
    Uri,
}

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const fn without_sub_delimiters(set: &AsciiSet) -> AsciiSet {
    set.remove(b'!')
        .remove(b'$')
        .remove(b'&')
        .remove(b'\'')
        .remove(b'(')
        .remove(b')')
        .remove(b'*')
        .remove(b'+')
        .remove(b',')
        .remove(b';')
        .remove(b'=')
}

const fn with_letters(set: &AsciiSet) -> AsciiSet {
    let mut set = set.add(b'A');
    let mut c = b'B';
    while c <= b'Z' {
        set = set.add(c);
        c += 1;
    }
    c = b'a';
    while c <= b'z' {
        set = set.add(c);
        c += 1;
    }
    set
}

const HOST: &AsciiSet = &without_sub_delimiters(UNRESERVED);
const USER_INFO: &AsciiSet = &HOST.remove(b':');
const AUTHORITY: &AsciiSet = &USER_INFO.remove(b'@');
const PATH_SEGMENT: &AsciiSet = &HOST.remove(b':').remove(b'@');
const PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');
const QUERY: &AsciiSet = &PATH.remove(b'?');
const QUERY_PARAM: &AsciiSet = &QUERY.add(b'=').add(b'&');
const SCHEME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'+').remove(b'-').remove(b'.');
const PORT: &AsciiSet = &with_letters(NON_ALPHANUMERIC);

impl Component {
    /// ASCII bytes that must be escaped; non-ASCII bytes always are.
    pub fn escaped(self) -> &'static AsciiSet {
        match self {
            Component::Scheme => SCHEME,
            Component::Authority => AUTHORITY,
            Component::UserInfo => USER_INFO,
            Component::Host => HOST,
            Component::Port => PORT,
            Component::Path => PATH,
            Component::PathSegment => PATH_SEGMENT,
            Component::Query | Component::Fragment => QUERY,
            Component::QueryParam => QUERY_PARAM,
            Component::Uri => UNRESERVED,
        }
    }
}

pub fn encode_component(source: &str, component: Component) -> String {
    utf8_percent_encode(source, component.escaped()).to_string()
}

pub fn encode(source: &str) -> String {
    encode_component(source, Component::Uri)
}

pub fn encode_path(path: &str) -> String {
    encode_component(path, Component::Path)
}

pub fn encode_path_segment(segment: &str) -> String {
    encode_component(segment, Component::PathSegment)
}

/// Reverses [`encode_component`] for any component kind.
///
/// Unlike a lenient decoder, a `%` not followed by two hex digits is an error.
pub fn decode(source: &str) -> Result<String> {
    let bytes = source.as_bytes();
    for (index, _) in source.match_indices('%') {
        let well_formed = bytes
            .get(index + 1..index + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(LoadError::invalid(format!(
                "Invalid encoded sequence \"{}\"",
                &source[index..]
            )));
        }
    }

    percent_decode_str(source)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| LoadError::invalid(format!("decoded \"{source}\" is not valid UTF-8")))
}

/// Extension of the last path segment, ignoring query, fragment and `;` parameters.
pub fn extract_file_extension(path: &str) -> Option<&str> {
    let mut end = path.find(['?', '#']).unwrap_or(path.len());
    let begin = path[..end].rfind('/').map_or(0, |i| i + 1);
    if let Some(param) = path[begin..end].find(';') {
        end = begin + param;
    }
    let ext = path[begin..end].rfind('.')? + begin;
    if ext > begin {
        Some(&path[ext + 1..end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_keeps_slashes_and_escapes_spaces() {
        assert_eq!(encode_path("com/acme/my file.txt"), "com/acme/my%20file.txt");
        assert_eq!(encode_path_segment("a/b"), "a%2Fb");
    }

    #[test]
    fn test_round_trip_non_ascii() {
        for name in ["资源/配置 文件.properties", "a b/c+d~e", "naïve café.txt", ""] {
            assert_eq!(decode(&encode_path(name)).unwrap(), name);
            assert_eq!(decode(&encode(name)).unwrap(), name);
        }
    }

    #[test]
    fn test_encoding_is_uppercase_utf8() {
        assert_eq!(encode("é"), "%C3%A9");
        assert_eq!(decode("%c3%a9").unwrap(), "é");
    }

    #[test]
    fn test_component_classes() {
        assert_eq!(encode_component("a=b&c d", Component::QueryParam), "a%3Db%26c%20d");
        assert_eq!(encode_component("a=b/c?d", Component::Query), "a=b/c?d");
        assert_eq!(encode_component("80a", Component::Port), "80%61");
        assert_eq!(encode_component("user:pw@h", Component::UserInfo), "user:pw%40h");
        assert_eq!(encode_component("user:pw@h", Component::Authority), "user:pw@h");
        assert_eq!(encode_component("c++.x", Component::Scheme), "c++.x");
        assert_eq!(encode("a/b"), "a%2Fb");
    }

    #[test]
    fn test_decode_rejects_bad_sequences() {
        assert!(decode("abc%2").is_err());
        assert!(decode("%zz").is_err());
        assert!(decode("%FF").is_err());
        assert!(decode("%").is_err());
        assert!(decode("a%2").is_err());
    }

    #[test]
    fn test_extract_file_extension() {
        assert_eq!(extract_file_extension("a/b/C.class"), Some("class"));
        assert_eq!(extract_file_extension("a/b.c/d"), None);
        assert_eq!(extract_file_extension("x.tar.gz?v=1#top"), Some("gz"));
        assert_eq!(extract_file_extension("file.txt;jsessionid=1"), Some("txt"));
        assert_eq!(extract_file_extension("a/.hidden"), None);
    }
}
