//! Error adapter for converting PedigreeError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use pedigree::{FetchError, PedigreeError};

/// Adapter rendering a [`PedigreeError`] with a code and a hint.
pub struct ErrorAdapter<'a>(pub &'a PedigreeError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            PedigreeError::Fetch(_) => "pedigree::fetch",
            PedigreeError::Io(_) => "pedigree::io",
            PedigreeError::Json(_) => "pedigree::json",
            PedigreeError::Config(_) => "pedigree::config",
            PedigreeError::Layout(_) => "pedigree::layout",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            PedigreeError::Fetch(FetchError::Rejected(_)) => {
                "check the auth token in the [source] section"
            }
            PedigreeError::Fetch(_) => "the record store could not be reached; try again",
            PedigreeError::Json(_) => {
                r#"a record store is a JSON object: {"owned": [...], "records": [...]}"#
            }
            PedigreeError::Config(_) => {
                "valid sections are [source], [expansion] and [layout]"
            }
            PedigreeError::Io(_) | PedigreeError::Layout(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
