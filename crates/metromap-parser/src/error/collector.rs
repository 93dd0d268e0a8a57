//! Collector for accumulating diagnostics during a validation pass.
//!
//! The [`DiagnosticCollector`] lets a pass report every finding instead of
//! stopping at the first one.

use crate::error::{Diagnostic, ParseError};

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Fails with every emitted diagnostic, in emission order.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ParseError::new(self.diagnostics))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_ok() {
        assert!(DiagnosticCollector::new().finish().is_ok());
    }

    #[test]
    fn test_collector_keeps_every_orphan() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(
            Diagnostic::at(ErrorCode::E300, Span::new(10..20), "station `A` is not connected")
                .on_line(2),
        );
        collector.emit(
            Diagnostic::at(ErrorCode::E300, Span::new(21..31), "station `B` is not connected")
                .on_line(3),
        );

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.diagnostics()[0].message(), "station `A` is not connected");
        assert_eq!(err.diagnostics()[1].line(), Some(3));
    }
}
