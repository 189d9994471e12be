//! Parameter-placeholder discovery for native query strings.
//!
//! Before a query can be executed with bound parameters, something has to
//! know which placeholders it contains. [`ParameterMetadataBuilder`] is that
//! contract: a pure parsing step from a native query string to its named and
//! ordinal placeholders, with no query execution involved.
//!
//! Two implementations cover the two kinds of stores:
//!
//! - [`TokenizerParameterMetadataBuilder`] scans query *strings* for `:name`
//!   and `?`/`?n` placeholders, skipping quoted literals.
//! - [`NoopParameterMetadataBuilder`] is for stores whose native queries are
//!   pre-structured objects rather than strings; there is nothing to scan,
//!   and parameters are declared where the query object is built.

use std::collections::BTreeSet;

use thiserror::Error;

/// A native query string could not be scanned for placeholders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterParseError {
    /// A quoted literal was opened but never closed.
    #[error("unterminated {quote}-quoted literal starting at byte {start}")]
    UnterminatedLiteral {
        /// The quote character that opened the literal.
        quote: char,
        /// Byte offset of the opening quote.
        start: usize,
    },
}

/// The placeholders found in one native query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMetadata {
    named: BTreeSet<String>,
    ordinal: BTreeSet<u32>,
}

impl ParameterMetadata {
    /// Metadata for a query with no placeholders.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The named placeholders (`:name`), deduplicated.
    #[must_use]
    pub const fn named_parameters(&self) -> &BTreeSet<String> {
        &self.named
    }

    /// The ordinal placeholder positions (`?`/`?n`), one-based, deduplicated.
    #[must_use]
    pub const fn ordinal_parameters(&self) -> &BTreeSet<u32> {
        &self.ordinal
    }

    /// Whether the query has no placeholders at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.ordinal.is_empty()
    }
}

/// Discovers the parameter placeholders of a native query.
pub trait ParameterMetadataBuilder {
    /// Parse `native_query` and return its placeholders.
    fn build_parameter_metadata(
        &self,
        native_query: &str,
    ) -> Result<ParameterMetadata, ParameterParseError>;
}

/// Scans query strings for `:name` and `?`/`?n` placeholders.
///
/// The scan is quote-aware: placeholders inside single- or double-quoted
/// literals are ignored, and a doubled quote inside a literal escapes it
/// (`'it''s'`). A `::` sequence is consumed whole so that cast syntax does
/// not produce a phantom named parameter. Bare `?` placeholders are numbered
/// left to right starting at one; explicit `?n` placeholders keep their
/// position.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenizerParameterMetadataBuilder;

impl TokenizerParameterMetadataBuilder {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ParameterMetadataBuilder for TokenizerParameterMetadataBuilder {
    fn build_parameter_metadata(
        &self,
        native_query: &str,
    ) -> Result<ParameterMetadata, ParameterParseError> {
        let mut metadata = ParameterMetadata::none();
        let mut next_bare_ordinal: u32 = 1;

        let bytes = native_query.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'\'' | b'"') => {
                    i = skip_quoted(bytes, i, quote)?;
                }
                b':' => {
                    // `::` is cast syntax, not a placeholder
                    if bytes.get(i + 1) == Some(&b':') {
                        i += 2;
                        continue;
                    }
                    let start = i + 1;
                    let end = scan_identifier(bytes, start);
                    if end > start {
                        // Placeholder names are ASCII identifiers, so the
                        // slice is valid UTF-8 by construction.
                        let name = String::from_utf8_lossy(&bytes[start..end]).into_owned();
                        metadata.named.insert(name);
                        i = end;
                    } else {
                        i += 1;
                    }
                }
                b'?' => {
                    let start = i + 1;
                    let end = scan_digits(bytes, start);
                    if end > start {
                        let digits = String::from_utf8_lossy(&bytes[start..end]);
                        // Longer-than-u32 ordinals are nonsense input; cap them.
                        let position = digits.parse::<u32>().unwrap_or(u32::MAX);
                        metadata.ordinal.insert(position);
                        i = end;
                    } else {
                        metadata.ordinal.insert(next_bare_ordinal);
                        next_bare_ordinal += 1;
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        Ok(metadata)
    }
}

/// Skips a quoted literal, honoring doubled-quote escapes. Returns the index
/// just past the closing quote.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> Result<usize, ParameterParseError> {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(ParameterParseError::UnterminatedLiteral { quote: quote as char, start })
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    i
}

fn scan_digits(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

/// Builder for stores whose native queries are pre-structured objects.
///
/// Such queries carry their parameters structurally; there is no string to
/// scan, so every query reports no placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopParameterMetadataBuilder;

impl NoopParameterMetadataBuilder {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ParameterMetadataBuilder for NoopParameterMetadataBuilder {
    fn build_parameter_metadata(
        &self,
        _native_query: &str,
    ) -> Result<ParameterMetadata, ParameterParseError> {
        Ok(ParameterMetadata::none())
    }
}
