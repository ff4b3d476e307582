//! Contains the definition of the [`Diagnostic`] struct and related types.

use std::fmt::{self, Display};

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// A position in the declaration input, both components are 1-based.
///
/// A zero line means the position is unknown (synthesized declarations).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_new::new,
)]
pub struct Location {
    /// The line number.
    pub line: u32,

    /// The column number.
    pub column: u32,
}

/// Represents a region of the declaration input a diagnostic points at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_new::new,
)]
#[serde(default)]
pub struct Span {
    /// The inclusive start of the region.
    pub start: Location,

    /// The exclusive end of the region.
    pub end: Location,
}

impl Span {
    /// Creates a span covering a single position.
    #[must_use]
    pub const fn at(line: u32, column: u32) -> Self {
        let location = Location { line, column };
        Self { start: location, end: location }
    }

    /// Returns `true` if the span refers to a known position.
    #[must_use]
    pub const fn is_known(&self) -> bool { self.start.line != 0 }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.start.line, self.start.column)
        } else {
            write!(f, "<unknown>")
        }
    }
}

/// Enumeration of the severity levels of a diagnostic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Severity {
    /// An error that prevents the program from compiling.
    Error,

    /// A warning that does not prevent the program from compiling.
    Warning,

    /// An informational message that does not prevent the program from
    /// compiling.
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = match self {
            Self::Error => "error".bright_red().bold(),
            Self::Warning => "warning".yellow().bold(),
            Self::Info => "info".bright_green().bold(),
        };

        write!(f, "{header}")
    }
}

/// Implement this trait for a type that can report a diagnostic.
///
/// This trait is typically implemented by error and warning types.
pub trait Report {
    /// Creates a diagnostic.
    fn report(&self) -> Diagnostic;
}

/// A struct containing all the information required to display the diagnostic
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Diagnostic {
    /// The span location where the diagnostic occurred.
    pub span: Span,

    /// The message to display to the user.
    pub message: String,

    /// The severity of the diagnostic.
    pub severity: Severity,

    /// The optional help message to display to the user. This will be
    /// displayed alongside the main message.
    pub help_message: Option<String>,

    /// List of related useful information to display to the user.
    pub related: Vec<Related>,
}

/// The related information that is displayed alongside the main [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_new::new)]
pub struct Related {
    /// The span location to display the message.
    pub span: Span,

    /// The message to display to the user.
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message.bold())?;
        write!(f, "\n  {} {}", "-->".bright_cyan().bold(), self.span)?;

        if let Some(help_message) = &self.help_message {
            write!(f, "\n  {} {help_message}", "help:".bold())?;
        }

        for related in &self.related {
            write!(
                f,
                "\n  {} {}: {}",
                "note".bright_cyan().bold(),
                related.span,
                related.message
            )?;
        }

        Ok(())
    }
}

/// The error is caused by the user input that makes it impossible to continue
/// a particular process.
///
/// The diagnostic should've been reported to the user to inform them about the
/// error.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    thiserror::Error,
)]
#[error(
    "encountered an error from the user input that makes it impossible to \
     continue the process"
)]
pub struct Abort;

#[cfg(test)]
mod test;
