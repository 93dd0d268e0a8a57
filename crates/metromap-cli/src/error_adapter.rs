//! Rendering [`MetroMapError`] through miette.
//!
//! A parse error becomes one [`Report`] per diagnostic, labelled in the
//! network source. Errors raised after parsing have no span. Their message
//! names the source line instead, and each stage adds its own code and hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceCode, SourceSpan};

use metromap::MetroMapError;
use metromap_parser::error::Diagnostic;

/// One renderable failure.
#[derive(Debug)]
pub enum Report<'a> {
    /// A parser diagnostic and the network source it points into.
    Parse {
        diagnostic: &'a Diagnostic,
        src: &'a str,
    },
    /// A failure from reading inputs or from a later pipeline stage.
    Stage(&'a MetroMapError),
}

impl Report<'_> {
    fn stage_code(err: &MetroMapError) -> Option<&'static str> {
        match err {
            MetroMapError::Io(_) => Some("metromap::io"),
            MetroMapError::Parse { .. } => None,
            MetroMapError::Json(_) => Some("metromap::lookup"),
            MetroMapError::Config(_) => Some("metromap::config"),
            MetroMapError::Consistency(_) => Some("metromap::consistency"),
            MetroMapError::Solver(_) => Some("metromap::solver"),
            MetroMapError::Synthesis(_) => Some("metromap::curves"),
        }
    }

    fn stage_help(err: &MetroMapError) -> Option<&'static str> {
        match err {
            MetroMapError::Io(_) => Some("check the network and lookup file paths"),
            MetroMapError::Parse { .. } => None,
            MetroMapError::Json(_) => {
                Some("the templates, colors and station id files must be JSON objects")
            }
            MetroMapError::Config(_) => None,
            MetroMapError::Consistency(_) => {
                Some("remove one of the z-index or parallel declarations forming the cycle")
            }
            MetroMapError::Solver(_) => {
                Some("the alignment constraint on the named line cannot hold together with the others")
            }
            MetroMapError::Synthesis(_) => {
                Some("check the stations of the named curve against its template")
            }
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Parse { diagnostic, .. } => f.write_str(&diagnostic.headline()),
            Report::Stage(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Report<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Report::Parse { .. } => None,
            Report::Stage(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Report::Parse { diagnostic, .. } => {
                Some(Box::new(diagnostic.code()) as Box<dyn fmt::Display + 'a>)
            }
            Report::Stage(err) => {
                Self::stage_code(err).map(|code| Box::new(code) as Box<dyn fmt::Display + 'a>)
            }
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            Report::Parse { diagnostic, .. } => diagnostic.help(),
            Report::Stage(err) => Self::stage_help(err),
        };
        help.map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Report::Parse { src, .. } => Some(src as &dyn SourceCode),
            Report::Stage(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Report::Parse { diagnostic, .. } = self else {
            return None;
        };

        Some(Box::new(diagnostic.labels().iter().map(|label| {
            let span = label.span();
            let span = SourceSpan::new(span.start().into(), span.len());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Splits `err` into the reports to render, one per parser diagnostic.
pub fn reports(err: &MetroMapError) -> Vec<Report<'_>> {
    match err {
        MetroMapError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diagnostic| Report::Parse { diagnostic, src })
            .collect(),
        _ => vec![Report::Stage(err)],
    }
}

#[cfg(test)]
mod tests {
    use metromap_parser::{
        Span,
        error::{ErrorCode, ParseError},
    };

    use super::*;

    fn orphan(name: &str, line: usize, span: Span) -> Diagnostic {
        Diagnostic::at(ErrorCode::E300, span, format!("station `{name}` is not connected"))
            .on_line(line)
            .with_help("add it to an `edges` statement")
    }

    #[test]
    fn test_every_orphan_is_reported() {
        let src = "line red:\nstation \"A\" 0 0\nstation \"B\" 9 0";
        let diagnostics = vec![orphan("A", 2, Span::new(10..25)), orphan("B", 3, Span::new(26..41))];
        let err = MetroMapError::new_parse_error(ParseError::from(diagnostics), src);

        let reports = reports(&err);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "line 2: station `A` is not connected");
        assert_eq!(reports[1].to_string(), "line 3: station `B` is not connected");
        assert_eq!(reports[0].code().map(|c| c.to_string()), Some("E300".to_string()));
        assert!(reports[0].help().is_some());
        assert!(reports[0].source_code().is_some());
    }

    #[test]
    fn test_duplicate_keeps_both_labels() {
        let diagnostic = Diagnostic::at(ErrorCode::E204, Span::new(26..41), "station `A` is declared twice")
            .with_secondary_label(Span::new(10..25), "first declared here");
        let report = Report::Parse {
            diagnostic: &diagnostic,
            src: "line red:\nstation \"A\" 0 0\nstation \"A\" 9 0",
        };

        let labels: Vec<_> = report.labels().unwrap().collect();

        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert_eq!(labels[1].label(), Some("first declared here"));
        assert_eq!(labels[1].offset(), 10);
        assert!(!labels[1].primary());
    }

    #[test]
    fn test_zindex_cycle_has_hint_without_source() {
        let err = MetroMapError::Consistency("z-index constraints form a cycle".to_string());

        let reports = reports(&err);

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.to_string(), "Consistency error: z-index constraints form a cycle");
        assert_eq!(
            report.code().map(|c| c.to_string()),
            Some("metromap::consistency".to_string())
        );
        assert!(report.help().is_some());
        assert!(report.source_code().is_none());
        assert!(report.labels().is_none());
    }

    #[test]
    fn test_missing_lookup_file_is_coded() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "colors.json not found");
        let err = MetroMapError::from(io_err);

        let reports = reports(&err);

        assert_eq!(
            reports[0].code().map(|c| c.to_string()),
            Some("metromap::io".to_string())
        );
        assert!(reports[0].to_string().contains("colors.json"));
    }
}
