//! Error and diagnostic system for the network parser.
//!
//! Every [`Diagnostic`] carries an [`ErrorCode`], the source line of the
//! offending statement and labelled spans into the network source. The
//! lexer and the validation pass report every problem they find, so a
//! [`ParseError`] may wrap several diagnostics.
//!
//! # Example
//!
//! ```
//! # use metromap_parser::error::{Diagnostic, ErrorCode};
//! # use metromap_parser::Span;
//!
//! let diag = Diagnostic::at(ErrorCode::E204, Span::new(100..120), "station `Bank` is declared twice on line `red`")
//!     .on_line(7)
//!     .with_secondary_label(Span::new(50..70), "first declared here")
//!     .with_help("rename one of the stations");
//!
//! assert_eq!(diag.labels().len(), 2);
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
