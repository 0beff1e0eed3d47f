use std::ffi::OsString;
use std::path::Path;
use thiserror::Error;

/// Named output profile selecting which external operation(s) produce a
/// finished file and which extension the output carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Single-stage WebM encode.
    Webm,
    /// Two-stage job: WebM encode, then a Matroska mux against the source.
    Mkv,
    /// User-supplied encoder command template.
    Custom(CustomTemplate),
}

impl Profile {
    /// Human-readable profile name for start-up logging.
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Webm => "WebM",
            Profile::Mkv => "MKV",
            Profile::Custom(_) => "Custom",
        }
    }

    /// Extension the derived output path carries under this profile.
    pub fn extension(&self) -> &str {
        match self {
            Profile::Webm => "webm",
            Profile::Mkv => "mkv",
            Profile::Custom(template) => template.output_suffix(),
        }
    }
}

/// Errors from parsing a custom encoder command template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("custom encode command is empty")]
    Empty,
    #[error("custom encode command has no %o output placeholder")]
    MissingOutput,
}

/// A user-supplied encoder command with `%i` / `%o` placeholders.
///
/// The command is split on whitespace once at parse time. A token equal to
/// `%i` expands to the input path; a token starting with `%o` expands to
/// the derived output path. Whatever follows `%o` in that token, minus a
/// leading dot, becomes the output extension: `"ffmpeg -i %i %o.webm"`
/// produces outputs named `<stem>.webm`. A bare `%o` leaves the output
/// without an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTemplate {
    tokens: Vec<String>,
    suffix: String,
}

impl CustomTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let tokens: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
        if tokens.is_empty() {
            return Err(TemplateError::Empty);
        }
        let out_token = tokens
            .iter()
            .find(|t| t.starts_with("%o"))
            .ok_or(TemplateError::MissingOutput)?;
        let rest = &out_token["%o".len()..];
        let suffix = rest.strip_prefix('.').unwrap_or(rest).to_string();
        Ok(CustomTemplate { tokens, suffix })
    }

    /// Extension derived from the `%o` token; empty for a bare `%o`.
    pub fn output_suffix(&self) -> &str {
        &self.suffix
    }

    /// Expand the template into an argument vector for one input/output
    /// pair. Tokens that are not placeholders pass through unchanged and
    /// in order; the first element is the program to run.
    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        self.tokens
            .iter()
            .map(|token| {
                if token == "%i" {
                    input.as_os_str().to_os_string()
                } else if token.starts_with("%o") {
                    output.as_os_str().to_os_string()
                } else {
                    OsString::from(token)
                }
            })
            .collect()
    }
}
