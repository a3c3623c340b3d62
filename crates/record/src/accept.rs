//! `accept` attribute patterns (`".pdf,image/*,video/mp4"`).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptRule {
    /// `*` or `*/*`.
    Any,
    /// `.ext`, stored lowercased without the dot.
    Extension(String),
    /// `type/*`, stored as the lowercased top-level type.
    MimeGroup(String),
    /// `type/subtype`, lowercased.
    Mime(String),
}

/// A parsed accept pattern.
///
/// An empty pattern accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptPattern {
    rules: Vec<AcceptRule>,
    raw: String,
}

impl AcceptPattern {
    pub fn parse(pattern: &str) -> Self {
        let rules = pattern
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let token = token.to_ascii_lowercase();
                if token == "*" || token == "*/*" {
                    AcceptRule::Any
                } else if let Some(ext) = token.strip_prefix('.') {
                    AcceptRule::Extension(ext.to_string())
                } else if let Some(group) = token.strip_suffix("/*") {
                    AcceptRule::MimeGroup(group.to_string())
                } else {
                    AcceptRule::Mime(token)
                }
            })
            .collect();
        Self {
            rules,
            raw: pattern.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks a file name and MIME type against the pattern.
    pub fn accepts(&self, name: &str, mime_type: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let mime_type = mime_type.to_ascii_lowercase();
        let name = name.to_ascii_lowercase();
        self.rules.iter().any(|rule| match rule {
            AcceptRule::Any => true,
            AcceptRule::Extension(ext) => name
                .rsplit_once('.')
                .is_some_and(|(stem, e)| !stem.is_empty() && e == ext),
            AcceptRule::MimeGroup(group) => mime_type
                .split_once('/')
                .is_some_and(|(top, _)| top == group),
            AcceptRule::Mime(exact) => mime_type == *exact,
        })
    }

    /// Value for the `accept` attribute of the underlying input control.
    pub fn as_input_accept(&self) -> &str {
        if self.raw.is_empty() { "*" } else { &self.raw }
    }
}

impl FromStr for AcceptPattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for AcceptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_input_accept())
    }
}
