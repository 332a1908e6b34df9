//! Core domain types for devlens.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod sanitize;
mod text;
pub mod ui;

pub use sanitize::sanitize_terminal_text;
pub use text::truncate_with_ellipsis;

use thiserror::Error;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
///
/// The original value is kept as-is; trimming is only used for the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("text must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A compile-time checked non-empty static string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonEmptyStaticStr(&'static str);

impl NonEmptyStaticStr {
    #[must_use]
    pub const fn new(value: &'static str) -> Self {
        assert!(!value.is_empty(), "NonEmptyStaticStr must not be empty");
        Self(value)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<NonEmptyStaticStr> for NonEmptyString {
    fn from(value: NonEmptyStaticStr) -> Self {
        Self(value.0.to_string())
    }
}

/// Result text used when a successful response carries no analysis.
pub const FALLBACK_ANALYSIS_TEXT: NonEmptyStaticStr = NonEmptyStaticStr::new("No analysis found");

// ============================================================================
// Service Variants
// ============================================================================

/// Form fields a variant may collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Primary,
    Secondary,
    Instruction,
}

/// Presentation of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub placeholder: &'static str,
    pub multiline: bool,
}

/// Deployed analysis service flavours.
///
/// Each variant decides which form fields exist, how they are labelled, and
/// (in `devlens-service`) how the request body and response text map onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceVariant {
    /// Datasheet + device log + query, answered with `{ analysis }`.
    #[default]
    DeviceAnalysis,
    /// Meeting transcript summarization.
    MeetingSummary,
}

impl ServiceVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeviceAnalysis => "device",
            Self::MeetingSummary => "meeting",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "device" | "device-analysis" | "datasheet" => Some(Self::DeviceAnalysis),
            "meeting" | "summary" | "summarize" => Some(Self::MeetingSummary),
            _ => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::DeviceAnalysis => "AI Device Debug & Command Assistant",
            Self::MeetingSummary => "Meeting Summarizer",
        }
    }

    #[must_use]
    pub const fn fields(self) -> &'static [FormField] {
        match self {
            Self::DeviceAnalysis => &[
                FormField::Primary,
                FormField::Secondary,
                FormField::Instruction,
            ],
            Self::MeetingSummary => &[FormField::Primary],
        }
    }

    #[must_use]
    pub fn has_field(self, field: FormField) -> bool {
        self.fields().contains(&field)
    }

    #[must_use]
    pub const fn field_spec(self, field: FormField) -> FieldSpec {
        match (self, field) {
            (Self::DeviceAnalysis, FormField::Primary) => FieldSpec {
                label: "Datasheet",
                placeholder: "Paste relevant datasheet content here...",
                multiline: true,
            },
            (Self::MeetingSummary, FormField::Primary) => FieldSpec {
                label: "Meeting transcript",
                placeholder: "Paste the meeting transcript here...",
                multiline: true,
            },
            (_, FormField::Secondary) => FieldSpec {
                label: "Device log",
                placeholder: "Paste device logs here (optional)...",
                multiline: true,
            },
            (_, FormField::Instruction) => FieldSpec {
                label: "Query",
                placeholder: "Optional query (e.g., Set channel to 193.5 THz)",
                multiline: false,
            },
        }
    }

    #[must_use]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::DeviceAnalysis => "Analyze",
            Self::MeetingSummary => "Summarize",
        }
    }

    #[must_use]
    pub const fn busy_label(self) -> &'static str {
        match self {
            Self::DeviceAnalysis => "Analyzing...",
            Self::MeetingSummary => "Summarizing...",
        }
    }

    #[must_use]
    pub const fn result_title(self) -> &'static str {
        match self {
            Self::DeviceAnalysis => "Analysis & Suggestions",
            Self::MeetingSummary => "Summary",
        }
    }
}

/// How the reviewer starts editing the displayed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditTrigger {
    /// A separately focusable `[ Edit ]` control next to the result.
    #[default]
    Button,
    /// Activating the result text itself.
    Direct,
}

impl EditTrigger {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "button" | "icon" => Some(Self::Button),
            "direct" | "click" | "text" => Some(Self::Direct),
            _ => None,
        }
    }
}

// ============================================================================
// Analysis Request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} is required")]
pub struct ValidationError {
    pub field: &'static str,
}

/// One submission's worth of form content.
///
/// Optional fields that are blank are absent, so they serialize as `null`
/// rather than `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    primary_text: NonEmptyString,
    secondary_text: Option<String>,
    instruction: Option<String>,
}

impl AnalysisRequest {
    pub fn new(
        primary_text: &str,
        secondary_text: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let primary_text =
            NonEmptyString::new(primary_text).map_err(|_| ValidationError {
                field: "primary text",
            })?;
        Ok(Self {
            primary_text,
            secondary_text: present(secondary_text),
            instruction: present(instruction),
        })
    }

    #[must_use]
    pub fn primary_text(&self) -> &str {
        self.primary_text.as_str()
    }

    #[must_use]
    pub fn secondary_text(&self) -> Option<&str> {
        self.secondary_text.as_deref()
    }

    #[must_use]
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }
}

fn present(raw: Option<&str>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}
