use super::Filter;
use crate::error::Result;
use regex::Regex;
use url::Url;

/// Matches the whole resource name against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    source: String,
    regex: Regex,
}

impl RegexFilter {
    /// Fails immediately on invalid syntax.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl Filter for RegexFilter {
    fn filtrate(&self, name: &str, _location: &Url) -> bool {
        self.is_match(name)
    }
}

/// Ant-style glob (`?`, `*`, `**`) over `/` separated names.
#[derive(Debug, Clone)]
pub struct AntFilter {
    glob: String,
    inner: RegexFilter,
}

impl AntFilter {
    pub fn new(glob: &str) -> Result<Self> {
        Ok(Self {
            glob: glob.to_string(),
            inner: RegexFilter::new(&ant_to_regex(glob))?,
        })
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn regex(&self) -> &str {
        self.inner.as_str()
    }
}

impl Filter for AntFilter {
    fn filtrate(&self, name: &str, location: &Url) -> bool {
        self.inner.filtrate(name, location)
    }
}

const SYMBOLS: [&str; 12] = ["\\", "$", "(", ")", "+", ".", "[", "]", "^", "{", "}", "|"];

/// Translates an Ant glob into the equivalent regex source.
///
/// The replacement order matters: each step must only see wildcards that
/// the previous steps left untouched.
pub fn ant_to_regex(glob: &str) -> String {
    let mut regex = glob.to_string();
    for symbol in SYMBOLS {
        regex = regex.replace(symbol, &format!("\\{symbol}"));
    }
    let regex = regex
        .replace('?', ".{1}")
        .replace("**/", "(.{0,}?/){0,}?")
        .replace("**", ".{0,}?")
        .replace('*', "[^/]{0,}?");
    regex.trim_matches('/').to_string()
}
