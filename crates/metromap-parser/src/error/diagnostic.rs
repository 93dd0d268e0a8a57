//! The core diagnostic type.
//!
//! Every problem in a network file is fatal, so a [`Diagnostic`] has no
//! severity. It always carries an [`ErrorCode`] and a primary label, and it
//! names the 1-based source line once the offending statement is known.

use std::fmt;

use crate::{
    error::{error_code::ErrorCode, label::Label},
    span::Span,
};

/// A problem found in a network file.
///
/// # Example
///
/// ```text
/// error[E206]: line 14: curve between `Bank` and `Moorgate` on line `red`, but they are not connected
///   --> network.metro:14:1
///    |
/// 14 | curve "Bank, Moorgate" right,down
///    | ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ no edge between these stations
///    |
///    = help: add `edges "Bank, Moorgate"` to the line
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: ErrorCode,
    line: Option<usize>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic labelled at `span` with the code's description.
    ///
    /// # Example
    ///
    /// ```
    /// # use metromap_parser::error::{Diagnostic, ErrorCode};
    /// # use metromap_parser::Span;
    ///
    /// let diag = Diagnostic::at(ErrorCode::E200, Span::new(30..35), "unknown station `Foo`")
    ///     .on_line(3)
    ///     .with_help("declare it with `station \"Foo\" x y`");
    ///
    /// assert_eq!(diag.to_string(), "error[E200]: line 3: unknown station `Foo`");
    /// ```
    pub fn at(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            line: None,
            message: message.into(),
            labels: vec![Label::primary(span, code.description())],
            help: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The 1-based source line of the offending statement, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The message prefixed with its source line.
    pub fn headline(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}: {}", self.message),
            None => self.message.clone(),
        }
    }

    pub fn on_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Point at a related declaration, such as the first of two duplicates.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.headline())
    }
}

impl std::error::Error for Diagnostic {}
