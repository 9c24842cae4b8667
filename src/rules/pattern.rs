//! Match template compiler.
//!
//! A template is a space-separated list of tokens:
//!
//! - `word`: matched verbatim (case-sensitive).
//! - `:name`: captures one run of ASCII alphanumerics as `name`.
//! - `~name`: captures the rest of the line (spaces included) as `name`.
//!
//! The compiled pattern is anchored at both ends and runs against a message's
//! trailing text.

use crate::error::{ActionError, RuleError};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// What a placeholder captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// One run of alphanumeric characters.
    Word,
    /// Everything up to the end of the line.
    Rest,
}

impl CaptureKind {
    fn regex(self) -> &'static str {
        match self {
            Self::Word => "[[:alnum:]]+",
            Self::Rest => ".+",
        }
    }
}

/// Named substrings captured by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(HashMap<String, String>);

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Like [`Captures::get`], but a missing capture is an action fault.
    pub fn require(&self, name: &str) -> Result<&str, ActionError> {
        self.get(name)
            .ok_or_else(|| ActionError::MissingCapture(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A compiled match template.
#[derive(Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
    captures: Vec<(String, CaptureKind)>,
}

impl Pattern {
    /// Compile `template`. Errors are configuration errors.
    pub fn compile(template: &str) -> Result<Self, RuleError> {
        if template.is_empty() {
            return Err(RuleError::EmptyTemplate);
        }

        let mut captures: Vec<(String, CaptureKind)> = Vec::new();
        let mut parts = Vec::new();

        for token in template.split(' ') {
            let placeholder = match token.chars().next() {
                Some(':') => Some(CaptureKind::Word),
                Some('~') => Some(CaptureKind::Rest),
                _ => None,
            };

            let Some(kind) = placeholder else {
                parts.push(regex::escape(token));
                continue;
            };

            let name = &token[1..];
            if name.is_empty() {
                return Err(RuleError::EmptyPlaceholder {
                    template: template.to_string(),
                });
            }
            if !is_valid_name(name) {
                return Err(RuleError::InvalidPlaceholder {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            if captures.iter().any(|(existing, _)| existing == name) {
                return Err(RuleError::DuplicateCapture {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            parts.push(format!("(?P<{name}>{})", kind.regex()));
            captures.push((name.to_string(), kind));
        }

        let source = format!("^{}$", parts.join(" "));
        let regex = Regex::new(&source).map_err(|source| RuleError::Compile {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            captures,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names and kinds, in template order.
    pub fn placeholders(&self) -> &[(String, CaptureKind)] {
        &self.captures
    }

    /// Run against `text`. `None` means no match.
    pub fn captures(&self, text: &str) -> Option<Captures> {
        let caps = self.regex.captures(text)?;
        let map = self
            .captures
            .iter()
            .filter_map(|(name, _)| {
                caps.name(name)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(Captures(map))
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("template", &self.template)
            .field("captures", &self.captures)
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// How a rule matches a message's trailing text.
#[derive(Debug, Clone)]
pub enum MatchSpec {
    /// Exact string equality.
    Literal(String),
    /// Compiled template with named captures.
    Pattern(Pattern),
}

impl MatchSpec {
    /// `Some` with the captures (empty for literals) on match.
    pub fn matches(&self, text: &str) -> Option<Captures> {
        match self {
            Self::Literal(expected) => (expected == text).then(Captures::default),
            Self::Pattern(pattern) => pattern.captures(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_only_template_matches_exact_text() {
        let p = Pattern::compile("!hello world").unwrap();
        assert!(p.captures("!hello world").is_some());
        assert!(p.captures("!hello world!").is_none());
        assert!(p.captures("x !hello world").is_none());
        assert!(p.captures("!Hello world").is_none());
        assert!(p.captures("!hello").is_none());
    }

    #[test]
    fn literal_tokens_are_escaped() {
        let p = Pattern::compile("what? (a.b)").unwrap();
        assert!(p.captures("what? (a.b)").is_some());
        assert!(p.captures("wha (aXb)").is_none());
        assert!(p.captures("what (a.b)").is_none());
    }

    #[test]
    fn word_placeholder_captures_alphanumeric_run() {
        let p = Pattern::compile("!seen :nick").unwrap();
        let caps = p.captures("!seen alice42").unwrap();
        assert_eq!(caps.get("nick"), Some("alice42"));
        assert_eq!(caps.len(), 1);

        assert!(p.captures("!seen ").is_none());
        assert!(p.captures("!seen al-ice").is_none());
        assert!(p.captures("!seen alice bob").is_none());
    }

    #[test]
    fn word_placeholder_in_the_middle() {
        let p = Pattern::compile("give :nick a cookie").unwrap();
        let caps = p.captures("give bob a cookie").unwrap();
        assert_eq!(caps.get("nick"), Some("bob"));
        assert!(p.captures("give  a cookie").is_none());
    }

    #[test]
    fn rest_placeholder_captures_remainder_with_spaces() {
        let p = Pattern::compile("!say ~text").unwrap();
        let caps = p.captures("!say hello there, world ").unwrap();
        assert_eq!(caps.get("text"), Some("hello there, world "));
    }

    #[test]
    fn mixed_placeholders() {
        let p = Pattern::compile("!tell :who ~what").unwrap();
        let caps = p.captures("!tell carol meet at 5").unwrap();
        assert_eq!(caps.get("who"), Some("carol"));
        assert_eq!(caps.get("what"), Some("meet at 5"));
        assert_eq!(
            p.placeholders()
                .iter()
                .map(|(_, k)| *k)
                .collect::<Vec<_>>(),
            vec![CaptureKind::Word, CaptureKind::Rest]
        );
    }

    #[test]
    fn template_spacing_is_preserved() {
        let p = Pattern::compile("a  b").unwrap();
        assert!(p.captures("a  b").is_some());
        assert!(p.captures("a b").is_none());
    }

    #[test]
    fn duplicate_capture_names_are_rejected() {
        let err = Pattern::compile(":x and :x").unwrap_err();
        assert!(matches!(err, RuleError::DuplicateCapture { ref name, .. } if name == "x"));
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        assert!(matches!(
            Pattern::compile("!cmd :"),
            Err(RuleError::EmptyPlaceholder { .. })
        ));
        assert!(matches!(
            Pattern::compile("!cmd ~1abc"),
            Err(RuleError::InvalidPlaceholder { .. })
        ));
        assert!(matches!(Pattern::compile(""), Err(RuleError::EmptyTemplate)));
    }

    #[test]
    fn literal_match_spec_yields_empty_captures() {
        let spec = MatchSpec::Literal("!ping".into());
        assert_eq!(spec.matches("!ping"), Some(Captures::default()));
        assert!(spec.matches("!ping ").is_none());
    }

    #[test]
    fn missing_capture_is_an_action_error() {
        let caps = Captures::default();
        assert!(matches!(
            caps.require("nick"),
            Err(ActionError::MissingCapture(ref n)) if n == "nick"
        ));
    }
}
