//! URL glob patterns
//!
//! Post-conditions match URLs with Playwright-style globs: `**` matches any
//! run of characters, `*` matches within one path segment. A pattern with no
//! glob characters is treated as a substring match, so `/dashboard` and
//! `**/dashboard` both match `http://localhost:3000/dashboard`.

use regex::Regex;

use super::{Error, Result};

/// A compiled URL pattern.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    raw: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compile a glob pattern into a matcher.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut source = String::from("^");
        if pattern.contains('*') {
            let mut chars = pattern.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '*' {
                    if chars.peek() == Some(&'*') {
                        chars.next();
                        source.push_str(".*");
                    } else {
                        source.push_str("[^/]*");
                    }
                } else {
                    source.push_str(&regex::escape(&c.to_string()));
                }
            }
        } else {
            source.push_str(".*");
            source.push_str(&regex::escape(pattern));
            source.push_str(".*");
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|e| Error::Config(format!("invalid URL pattern '{pattern}': {e}")))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Whether a URL satisfies this pattern.
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The pattern as written in the scenario.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
