//! Scanned code values and screen contexts.
//!
//! A scanner is expected to read the same physical identifier twice, once
//! from each of two locations on a label. Raw scanner input is sanitized at
//! the boundary: everything outside `[0-9A-Za-z]` is stripped and the result
//! is truncated to [`CODE_MAX_LEN`] characters. The core re-applies the same
//! sanitization rather than trusting callers.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted code length after sanitization.
pub const CODE_MAX_LEN: usize = 10;

static CODE_STRIP_RE: OnceLock<Regex> = OnceLock::new();

fn code_strip_regex() -> &'static Regex {
    CODE_STRIP_RE.get_or_init(|| {
        Regex::new("[^0-9A-Za-z]")
            .unwrap_or_else(|error| panic!("code strip regex failed to compile: {error}"))
    })
}

/// A sanitized scanned code; possibly empty when the raw input carried no
/// alphanumeric characters.
///
/// ## Invariants
/// - Contains only `[0-9A-Za-z]`.
/// - At most [`CODE_MAX_LEN`] characters.
///
/// Sanitization is idempotent: re-sanitizing an already sanitized code is a
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScanCode(String);

impl ScanCode {
    /// Sanitize raw scanner or keyboard input into a code.
    pub fn sanitize(raw: &str) -> Self {
        let stripped = code_strip_regex().replace_all(raw, "");
        Self(stripped.chars().take(CODE_MAX_LEN).collect())
    }

    /// Whether sanitization left nothing behind.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for ScanCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<String> for ScanCode {
    fn from(value: String) -> Self {
        Self::sanitize(&value)
    }
}

impl From<ScanCode> for String {
    fn from(value: ScanCode) -> Self {
        value.0
    }
}

/// Screen the scan originated from; part of the duplicate-detection key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ScreenContext {
    /// Single-scan flow.
    #[serde(rename = "LEITURA")]
    Single,
    /// Batch ("several volumes") flow.
    #[serde(rename = "VARIOS")]
    Batch,
}

impl ScreenContext {
    /// Canonical tag stored in the record log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "LEITURA",
            Self::Batch => "VARIOS",
        }
    }
}

impl fmt::Display for ScreenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScreenContext {
    type Err = UnknownScreenContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEITURA" => Ok(Self::Single),
            "VARIOS" => Ok(Self::Batch),
            other => Err(UnknownScreenContext {
                value: other.to_owned(),
            }),
        }
    }
}

/// Error for context tags outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown screen context: {value}")]
pub struct UnknownScreenContext {
    /// The rejected input.
    pub value: String,
}
