//! Numeric name templates.
//!
//! A template holds exactly one contiguous run of a placeholder character
//! (`#` by default). Formatting replaces the run with a number zero-padded to
//! the run length: `"IMG_####"` formats 7 as `"IMG_0007"`.

use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::model::has_separator;

/// Placeholder character used by `NameTemplate::parse`.
pub const DEFAULT_PLACEHOLDER: char = '#';

/// A validated name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    raw: String,
    prefix: String,
    suffix: String,
    width: usize,
    placeholder: char,
}

impl NameTemplate {
    /// Parse a template using the default placeholder.
    pub fn parse(template: &str) -> EngineResult<Self> {
        Self::with_placeholder(template, DEFAULT_PLACEHOLDER)
    }

    /// Parse a template using a custom placeholder character.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidFormat` if the placeholder does not occur,
    /// occurs in more than one disjoint run, or the template contains a path
    /// separator.
    pub fn with_placeholder(template: &str, placeholder: char) -> EngineResult<Self> {
        if has_separator(template) {
            return Err(EngineError::InvalidFormat {
                template: template.to_string(),
                reason: "path separator in template",
            });
        }

        let mut run: Option<(usize, usize)> = None;
        let mut in_run = false;

        for (idx, ch) in template.char_indices() {
            if ch == placeholder {
                let end = idx + ch.len_utf8();
                run = match run {
                    None => Some((idx, end)),
                    Some((start, _)) if in_run => Some((start, end)),
                    Some(_) => {
                        return Err(EngineError::InvalidFormat {
                            template: template.to_string(),
                            reason: "more than one placeholder run",
                        });
                    }
                };
                in_run = true;
            } else {
                in_run = false;
            }
        }

        let (start, end) = run.ok_or_else(|| EngineError::InvalidFormat {
            template: template.to_string(),
            reason: "no placeholder run",
        })?;

        Ok(NameTemplate {
            raw: template.to_string(),
            prefix: template[..start].to_string(),
            suffix: template[end..].to_string(),
            width: template[start..end].chars().count(),
            placeholder,
        })
    }

    /// Placeholder run length.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn placeholder(&self) -> char {
        self.placeholder
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substitute `n`, zero-padded to at least the run width. Wider numbers are not truncated.
    pub fn format(&self, n: u64) -> String {
        self.format_digits(&n.to_string())
    }

    /// Same as `format` for a canonical digit string, so keys wider than u64 still format.
    pub(crate) fn format_digits(&self, digits: &str) -> String {
        format!(
            "{}{:0>width$}{}",
            self.prefix,
            digits,
            self.suffix,
            width = self.width
        )
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
