//! Statement parser building a [`Network`] from tokens.
//!
//! Parsing runs in two phases. The declaration phase walks the statements
//! in order, threading the active [`Scope`] from one statement to the next.
//! It creates lines, stations, edges and endpoints immediately, and records
//! curves and constraints with their references still in textual form. The
//! resolution phase then turns every reference into an arena id, which lets
//! curves and constraints refer to curves, stations and lines declared
//! further down the file.
//!
//! Both phases stop at the first error.

use std::{collections::HashMap, fmt};

use log::{debug, trace};

use metromap_core::{
    constraint::{
        AlignmentConstraint, Axis, Component, ConstraintKind, Diagonal, Relation, Term,
        ZIndexConstraint,
    },
    curve::{Bend, Curve, CurveShape, SequenceLeg},
    direction::Direction,
    endpoint::{Endpoint, EndpointAxis},
    geometry::Point,
    network::{CurveId, LineId, Network, Station, StationId, StationKind},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    lexer::{PositionedToken, Token},
    span::{Span, Spanned},
    station_ids::StationIdResolver,
};

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Origin {
    pub span: Span,
    /// 1-based source line.
    pub line_number: usize,
}

impl Origin {
    /// An error prefixed with the source line and labelled at `span`.
    pub fn error(&self, code: ErrorCode, span: Span, message: impl fmt::Display) -> Diagnostic {
        Diagnostic::at(code, span, message.to_string()).on_line(self.line_number)
    }
}

/// Source locations of stations and curves, indexed by arena id.
#[derive(Debug, Default)]
pub(crate) struct SourceMap {
    stations: Vec<Origin>,
    curves: Vec<Origin>,
}

impl SourceMap {
    pub fn station(&self, id: StationId) -> Origin {
        self.stations[id.index()]
    }

    pub fn curve(&self, id: CurveId) -> Origin {
        self.curves[id.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    Word,
    Quoted,
}

/// A word or quoted string of a statement.
#[derive(Debug, Clone, Copy)]
struct Arg<'a> {
    kind: ArgKind,
    text: &'a str,
    span: Span,
}

impl<'a> Arg<'a> {
    /// Splits the contents of a quoted argument on `separator`, trimming
    /// each item and tracking its span.
    fn items(&self, separator: char) -> Vec<Spanned<&'a str>> {
        let base = match self.kind {
            ArgKind::Quoted => self.span.start() + 1,
            ArgKind::Word => self.span.start(),
        };
        let mut offset = 0;
        self.text
            .split(separator)
            .map(|piece| {
                let leading = piece.len() - piece.trim_start().len();
                let item = piece.trim();
                let start = base + offset + leading;
                offset += piece.len() + separator.len_utf8();
                Spanned::new(item, Span::new(start..start + item.len()))
            })
            .collect()
    }
}

/// One non-empty source line, with comments and whitespace removed.
#[derive(Debug, Clone)]
pub(crate) struct Statement<'a> {
    origin: Origin,
    args: Vec<Arg<'a>>,
}

impl<'a> Statement<'a> {
    fn keyword(&self) -> &'a str {
        self.args.first().map(|arg| arg.text).unwrap_or_default()
    }

    fn error(&self, code: ErrorCode, span: Span, message: impl fmt::Display) -> Diagnostic {
        self.origin.error(code, span, message)
    }

    /// Checks the statement has exactly `expected` words and strings.
    fn arity(&self, expected: usize, usage: &str) -> Result<()> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(self.arity_error(expected, usage))
        }
    }

    fn arity_error(&self, expected: usize, usage: &str) -> Diagnostic {
        let found = self.args.len();
        let span = match self.args.get(expected) {
            Some(extra) => extra.span.union(self.origin.span),
            None => self.origin.span,
        };
        let message = if found > expected {
            format!("unexpected trailing arguments after `{}`", self.keyword())
        } else {
            format!("missing arguments for `{}`", self.keyword())
        };
        self.error(ErrorCode::E101, span, message)
            .with_help(format!("expected `{usage}`"))
    }

    fn arg(&self, index: usize, kind: ArgKind, usage: &str) -> Result<Arg<'a>> {
        match self.args.get(index) {
            Some(arg) if arg.kind == kind => Ok(*arg),
            Some(arg) => {
                let expected = match kind {
                    ArgKind::Word => "a bare word",
                    ArgKind::Quoted => "a quoted string",
                };
                Err(self
                    .error(
                        ErrorCode::E101,
                        arg.span,
                        format!("expected {expected}, found `{}`", arg.text),
                    )
                    .with_help(format!("expected `{usage}`")))
            }
            None => Err(self
                .error(
                    ErrorCode::E101,
                    self.origin.span,
                    format!("missing arguments for `{}`", self.keyword()),
                )
                .with_help(format!("expected `{usage}`"))),
        }
    }

    fn word(&self, index: usize, usage: &str) -> Result<Arg<'a>> {
        self.arg(index, ArgKind::Word, usage)
    }

    fn quoted(&self, index: usize, usage: &str) -> Result<Arg<'a>> {
        self.arg(index, ArgKind::Quoted, usage)
    }

    fn integer(&self, index: usize, usage: &str) -> Result<i64> {
        let arg = self.word(index, usage)?;
        arg.text.parse().map_err(|_| {
            self.error(
                ErrorCode::E102,
                arg.span,
                format!("`{}` is not an integer coordinate", arg.text),
            )
        })
    }

    /// A quoted, comma separated list of at least `min` station names.
    fn names(&self, index: usize, min: usize, usage: &str) -> Result<Vec<Spanned<&'a str>>> {
        let arg = self.quoted(index, usage)?;
        let names = arg.items(',');
        if let Some(empty) = names.iter().find(|name| name.inner().is_empty()) {
            return Err(self.error(ErrorCode::E101, empty.span(), "empty station name"));
        }
        if names.len() < min {
            return Err(self
                .error(
                    ErrorCode::E101,
                    arg.span,
                    format!("expected at least {min} stations, found {}", names.len()),
                )
                .with_help(format!("expected `{usage}`")));
        }
        Ok(names)
    }

    /// A quoted pair of station names.
    fn pair(&self, index: usize, usage: &str) -> Result<(Spanned<&'a str>, Spanned<&'a str>)> {
        let mut names = self.names(index, 2, usage)?;
        if names.len() != 2 {
            return Err(self
                .error(
                    ErrorCode::E101,
                    self.args[index].span,
                    format!("expected exactly 2 stations, found {}", names.len()),
                )
                .with_help(format!("expected `{usage}`")));
        }
        let to = names.remove(1);
        let from = names.remove(0);
        Ok((from, to))
    }
}

/// Groups tokens into one statement per non-empty source line.
pub(crate) fn statements<'a>(tokens: &[PositionedToken<'a>]) -> Vec<Statement<'a>> {
    fn flush<'a>(statements: &mut Vec<Statement<'a>>, line_number: usize, args: &mut Vec<Arg<'a>>) {
        if let (Some(first), Some(last)) = (args.first(), args.last()) {
            let origin = Origin {
                span: first.span.union(last.span),
                line_number,
            };
            statements.push(Statement {
                origin,
                args: std::mem::take(args),
            });
        }
    }

    let mut statements = Vec::new();
    let mut args = Vec::new();
    let mut line_number = 1;

    for positioned in tokens {
        let span = positioned.span;
        match positioned.token {
            Token::Word(text) => args.push(Arg {
                kind: ArgKind::Word,
                text,
                span,
            }),
            Token::Quoted(text) => args.push(Arg {
                kind: ArgKind::Quoted,
                text,
                span,
            }),
            Token::Comment(_) | Token::Whitespace => {}
            Token::Newline => {
                flush(&mut statements, line_number, &mut args);
                line_number += 1;
            }
        }
    }
    flush(&mut statements, line_number, &mut args);

    statements
}

/// The parser context carried from one statement to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Before the first header.
    TopLevel,
    /// After `line <name>:`.
    Line(LineId),
    /// After `multi-line:`.
    MultiLine,
}

/// A station named in a constraint or curve reference, not yet resolved.
#[derive(Debug, Clone)]
struct StationRef<'a> {
    /// Explicit line, or `None` for the statement's own line.
    line: Option<&'a str>,
    name: String,
    span: Span,
}

/// A curve named by its two stations, not yet resolved.
#[derive(Debug, Clone)]
struct CurveRef<'a> {
    line: Option<Spanned<&'a str>>,
    from: Spanned<&'a str>,
    to: Spanned<&'a str>,
    span: Span,
}

#[derive(Debug, Clone)]
enum PendingShape<'a> {
    Bend(Bend),
    Parallel {
        bend: Bend,
        target: CurveRef<'a>,
    },
    Sequence {
        stations: Vec<Spanned<&'a str>>,
        bends: Vec<Bend>,
    },
    Join(Vec<CurveRef<'a>>),
}

#[derive(Debug, Clone)]
struct PendingCurve<'a> {
    line: LineId,
    from: Spanned<&'a str>,
    to: Spanned<&'a str>,
    shape: PendingShape<'a>,
    origin: Origin,
}

#[derive(Debug, Clone)]
struct PendingTerm<'a> {
    station: StationRef<'a>,
    component: Component,
}

#[derive(Debug, Clone)]
enum PendingConstraintKind<'a> {
    Axis(Axis, Vec<StationRef<'a>>),
    Diagonal(Diagonal, Vec<StationRef<'a>>),
    SameStation(Relation, Vec<(StationRef<'a>, StationRef<'a>)>),
    Equal(Vec<PendingTerm<'a>>, Vec<PendingTerm<'a>>),
}

#[derive(Debug, Clone)]
struct PendingConstraint<'a> {
    kind: PendingConstraintKind<'a>,
    line: Option<LineId>,
    origin: Origin,
    text: &'a str,
}

#[derive(Debug, Clone)]
struct PendingZIndex<'a> {
    above: Spanned<&'a str>,
    below: Spanned<&'a str>,
    origin: Origin,
}

/// Alignment keyword families taking a single station list.
#[derive(Debug, Clone, Copy)]
enum ListAlignment {
    Axis(Axis),
    Diagonal(Diagonal),
}

/// State of the declaration phase.
struct Declarations<'a, 'r> {
    source: &'a str,
    resolver: &'r dyn StationIdResolver,
    network: Network,
    line_spans: Vec<Span>,
    source_map: SourceMap,
    curves: Vec<PendingCurve<'a>>,
    constraints: Vec<PendingConstraint<'a>>,
    z_constraints: Vec<PendingZIndex<'a>>,
}

const LINE_USAGE: &str = "line <name>:";
const STATION_USAGE: &str = r#"station "<name>" <x> <y>"#;
const EDGES_USAGE: &str = r#"edges "<station>, <station>, ...""#;
const CURVE_USAGE: &str = r#"curve "<from>, <to>" <direction>,<direction> [parallelto <line>]"#;
const SEQUENCE_USAGE: &str = r#"curve "<from>, <to>" special "<from>, ..., <to>" "<shape> : ...""#;
const JOIN_USAGE: &str = r#"curve "<from>, <to>" special of "<a>, <b>" "<b>, <c>" ..."#;
const PARALLEL_CURVE_USAGE: &str = r#"parallelto curve "<line>: <from>, <to>""#;
const ENDPOINT_USAGE: &str = r#"endpoint "<station>" <type>[:<half>]"#;
const LIST_USAGE: &str = r#"<alignment> "<station>, <station>, ...""#;
const SAME_STATION_USAGE: &str =
    r#"same-station "<line>: <station>" <direction> "<line>: <station>""#;
const EQUAL_USAGE: &str = r#"equal "<station>.x + ..." "<station>.y + ...""#;
const ZINDEX_USAGE: &str = "zindex <line> above|below <line>";

impl<'a, 'r> Declarations<'a, 'r> {
    fn new(source: &'a str, resolver: &'r dyn StationIdResolver) -> Self {
        Self {
            source,
            resolver,
            network: Network::new(),
            line_spans: Vec::new(),
            source_map: SourceMap::default(),
            curves: Vec::new(),
            constraints: Vec::new(),
            z_constraints: Vec::new(),
        }
    }

    /// Handles one statement and returns the scope for the next one.
    fn statement(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<Scope> {
        trace!(line_number = stmt.origin.line_number, keyword = stmt.keyword(); "Parsing statement");

        match stmt.keyword() {
            "line" => return self.line_header(stmt).map(Scope::Line),
            "multi-line" | "multi-line:" => {
                stmt.arity(1, "multi-line:")?;
                return Ok(Scope::MultiLine);
            }
            "station" => self.station(scope, stmt, StationKind::Station)?,
            "alignment-point" => self.station(scope, stmt, StationKind::AlignmentPoint)?,
            "edges" => self.edges(scope, stmt)?,
            "curve" => self.curve(scope, stmt)?,
            "endpoint" => self.endpoint(scope, stmt)?,
            "vertical" => self.list_constraint(scope, stmt, ListAlignment::Axis(Axis::Vertical))?,
            "horizontal" => {
                self.list_constraint(scope, stmt, ListAlignment::Axis(Axis::Horizontal))?
            }
            "up-right" | "down-left" => {
                self.list_constraint(scope, stmt, ListAlignment::Diagonal(Diagonal::Rising))?
            }
            "down-right" | "up-left" => {
                self.list_constraint(scope, stmt, ListAlignment::Diagonal(Diagonal::Falling))?
            }
            "same-station" => self.same_station(scope, stmt)?,
            "equal" => self.equal(scope, stmt)?,
            "zindex" => self.zindex(stmt)?,
            other => {
                let span = stmt.args.first().map(|arg| arg.span).unwrap_or_default();
                return Err(stmt
                    .error(
                        ErrorCode::E100,
                        span,
                        format!("unrecognized statement `{other}`"),
                    )
                    .with_help(
                        "statements start with `line`, `station`, `alignment-point`, `edges`, \
                         `curve`, `endpoint`, an alignment keyword, `same-station`, `equal`, \
                         `zindex` or `multi-line:`",
                    ));
            }
        }
        Ok(scope)
    }

    fn active_line(&self, scope: Scope, stmt: &Statement<'a>) -> Result<LineId> {
        match scope {
            Scope::Line(line) => Ok(line),
            Scope::TopLevel | Scope::MultiLine => Err(stmt
                .error(
                    ErrorCode::E108,
                    stmt.origin.span,
                    format!("`{}` must appear inside a line", stmt.keyword()),
                )
                .with_help("add a `line <name>:` header before this statement")),
        }
    }

    fn line_header(&mut self, stmt: &Statement<'a>) -> Result<LineId> {
        stmt.arity(2, LINE_USAGE)?;
        let arg = stmt.word(1, LINE_USAGE)?;
        let name = arg.text.strip_suffix(':').unwrap_or(arg.text);
        if name.is_empty() {
            return Err(stmt.error(ErrorCode::E101, arg.span, "line name is empty"));
        }

        if let Some(existing) = self.network.line_id(name) {
            return Err(stmt
                .error(
                    ErrorCode::E203,
                    arg.span,
                    format!("line `{name}` is declared twice"),
                )
                .with_secondary_label(self.line_spans[existing.index()], "first declared here"));
        }

        let id = self.network.add_line(name);
        self.line_spans.push(arg.span);
        debug!(line = name; "Declared line");
        Ok(id)
    }

    fn station(&mut self, scope: Scope, stmt: &Statement<'a>, kind: StationKind) -> Result<()> {
        let line = self.active_line(scope, stmt)?;
        stmt.arity(4, STATION_USAGE)?;
        let name = stmt.quoted(1, STATION_USAGE)?;
        let x = stmt.integer(2, STATION_USAGE)?;
        let y = stmt.integer(3, STATION_USAGE)?;

        if name.text.trim().is_empty() {
            return Err(stmt.error(ErrorCode::E101, name.span, "empty station name"));
        }

        let line_name = self.network.line(line).name().to_string();
        if let Some(existing) = self.network.station_id(line, name.text) {
            return Err(stmt
                .error(
                    ErrorCode::E204,
                    name.span,
                    format!(
                        "station `{}` is declared twice on line `{line_name}`",
                        name.text
                    ),
                )
                .with_secondary_label(self.source_map.station(existing).span, "first declared here"));
        }

        let external_id = match kind {
            StationKind::AlignmentPoint => format!("{line_name}:{}", name.text),
            StationKind::Station => {
                self.resolver
                    .resolve(&line_name, name.text)
                    .ok_or_else(|| {
                        stmt.error(
                            ErrorCode::E205,
                            name.span,
                            format!(
                                "no station id for `{}` on line `{line_name}`",
                                name.text
                            ),
                        )
                        .with_help("add an entry to the station-id file or a `[station_ids]` override")
                    })?
            }
        };

        let station = Station::new(name.text, line, kind, external_id, Point::from_grid(x, y));
        trace!(station:?; "Declared station");
        self.network.add_station(station);
        self.source_map.stations.push(stmt.origin);
        Ok(())
    }

    /// Looks up a station of `line` declared earlier in the file.
    fn local_station(
        &self,
        stmt: &Statement<'a>,
        line: LineId,
        name: &Spanned<&'a str>,
    ) -> Result<StationId> {
        self.network.station_id(line, name.inner()).ok_or_else(|| {
            stmt.error(
                ErrorCode::E200,
                name.span(),
                format!(
                    "unknown station `{}` on line `{}`",
                    name.inner(),
                    self.network.line(line).name()
                ),
            )
        })
    }

    fn edges(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<()> {
        let line = self.active_line(scope, stmt)?;
        stmt.arity(2, EDGES_USAGE)?;
        let names = stmt.names(1, 2, EDGES_USAGE)?;

        let ids = names
            .iter()
            .map(|name| self.local_station(stmt, line, name))
            .collect::<Result<Vec<_>>>()?;

        for pair in ids.windows(2) {
            self.network.add_edge(line, pair[0], pair[1]);
        }
        Ok(())
    }

    fn curve(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<()> {
        let line = self.active_line(scope, stmt)?;
        if stmt.args.len() < 3 {
            return Err(stmt.arity_error(3, CURVE_USAGE));
        }
        let (from, to) = stmt.pair(1, CURVE_USAGE)?;
        let shape_arg = stmt.word(2, CURVE_USAGE)?;

        let shape = if shape_arg.text == "special" {
            self.special_shape(stmt, &from, &to)?
        } else {
            let bend = parse_bend(stmt, shape_arg.text, shape_arg.span)?;
            if stmt.args.len() == 3 {
                PendingShape::Bend(bend)
            } else {
                PendingShape::Parallel {
                    bend,
                    target: parallel_target(stmt, &from, &to)?,
                }
            }
        };

        self.curves.push(PendingCurve {
            line,
            from,
            to,
            shape,
            origin: stmt.origin,
        });
        Ok(())
    }

    fn special_shape(
        &self,
        stmt: &Statement<'a>,
        from: &Spanned<&'a str>,
        to: &Spanned<&'a str>,
    ) -> Result<PendingShape<'a>> {
        match stmt.args.get(3) {
            Some(arg) if arg.kind == ArgKind::Word && arg.text == "of" => {
                if stmt.args.len() < 5 {
                    return Err(stmt.arity_error(5, JOIN_USAGE));
                }
                let parts = (4..stmt.args.len())
                    .map(|index| {
                        let (part_from, part_to) = stmt.pair(index, JOIN_USAGE)?;
                        Ok(CurveRef {
                            line: None,
                            from: part_from,
                            to: part_to,
                            span: stmt.args[index].span,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PendingShape::Join(parts))
            }
            Some(arg) if arg.kind == ArgKind::Word && arg.text == "parallelto" => Err(stmt
                .error(
                    ErrorCode::E101,
                    arg.span,
                    "only sharp and wide curves can be parallel to another curve",
                )
                .with_help("declare the path with `special of` and make its parts parallel")),
            _ => {
                stmt.arity(5, SEQUENCE_USAGE)?;
                let stations = stmt.names(3, 2, SEQUENCE_USAGE)?;
                let shapes = stmt.quoted(4, SEQUENCE_USAGE)?;
                let bends = shapes
                    .items(':')
                    .iter()
                    .map(|item| parse_bend(stmt, item.inner(), item.span()))
                    .collect::<Result<Vec<_>>>()?;

                if stations.len() != bends.len() + 1 {
                    return Err(stmt.error(
                        ErrorCode::E101,
                        shapes.span,
                        format!(
                            "{} stations need {} shapes, found {}",
                            stations.len(),
                            stations.len() - 1,
                            bends.len()
                        ),
                    ));
                }

                let first = stations.first().map(|s| *s.inner());
                let last = stations.last().map(|s| *s.inner());
                if first != Some(*from.inner()) || last != Some(*to.inner()) {
                    return Err(stmt.error(
                        ErrorCode::E101,
                        stmt.args[3].span,
                        format!(
                            "the station sequence must run from `{}` to `{}`",
                            from.inner(),
                            to.inner()
                        ),
                    ));
                }

                Ok(PendingShape::Sequence { stations, bends })
            }
        }
    }

    fn endpoint(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<()> {
        let line = self.active_line(scope, stmt)?;
        stmt.arity(3, ENDPOINT_USAGE)?;
        let name = stmt.quoted(1, ENDPOINT_USAGE)?;
        let kind = stmt.word(2, ENDPOINT_USAGE)?;
        let station = self.local_station(stmt, line, &Spanned::new(name.text, name.span))?;

        let (axis_text, half_text) = match kind.text.split_once(':') {
            Some((axis, half)) => (axis, Some(half)),
            None => (kind.text, None),
        };
        let axis: EndpointAxis = axis_text.parse().map_err(|err| {
            stmt.error(ErrorCode::E104, kind.span, err).with_help(
                "endpoint types are `horizontal`, `vertical`, `up-right`, `down-right`, `up-left` and `down-left`",
            )
        })?;

        let half = match half_text {
            None => None,
            Some(text) => {
                let half = text
                    .parse::<Direction>()
                    .ok()
                    .filter(|half| axis.accepts_half(*half))
                    .ok_or_else(|| {
                        let (a, b) = axis.directions();
                        stmt.error(
                            ErrorCode::E104,
                            kind.span,
                            format!("`{text}` is not a half of a `{axis_text}` endpoint"),
                        )
                        .with_help(format!("use `{axis_text}:{a}` or `{axis_text}:{b}`"))
                    })?;
                Some(half)
            }
        };

        self.network.add_endpoint(
            line,
            Endpoint {
                station,
                axis,
                half,
                source_line: stmt.origin.line_number,
            },
        );
        Ok(())
    }

    /// A station reference inside a constraint: local in a line scope,
    /// `line: station` elsewhere.
    fn station_ref(
        &self,
        scope: Scope,
        stmt: &Statement<'a>,
        item: &Spanned<&'a str>,
    ) -> Result<StationRef<'a>> {
        match scope {
            Scope::Line(_) => Ok(StationRef {
                line: None,
                name: unescape(item.inner()),
                span: item.span(),
            }),
            Scope::TopLevel | Scope::MultiLine => qualified_ref(stmt, item),
        }
    }

    fn push_constraint(
        &mut self,
        scope: Scope,
        stmt: &Statement<'a>,
        kind: PendingConstraintKind<'a>,
    ) {
        let line = match scope {
            Scope::Line(line) => Some(line),
            Scope::TopLevel | Scope::MultiLine => None,
        };
        let span = stmt.origin.span;
        let text = self
            .source
            .get(span.start()..span.end())
            .unwrap_or_default();
        self.constraints.push(PendingConstraint {
            kind,
            line,
            origin: stmt.origin,
            text,
        });
    }

    fn list_constraint(
        &mut self,
        scope: Scope,
        stmt: &Statement<'a>,
        alignment: ListAlignment,
    ) -> Result<()> {
        stmt.arity(2, LIST_USAGE)?;
        let stations = stmt
            .names(1, 2, LIST_USAGE)?
            .iter()
            .map(|item| self.station_ref(scope, stmt, item))
            .collect::<Result<Vec<_>>>()?;

        let kind = match alignment {
            ListAlignment::Axis(axis) => PendingConstraintKind::Axis(axis, stations),
            ListAlignment::Diagonal(diagonal) => PendingConstraintKind::Diagonal(diagonal, stations),
        };
        self.push_constraint(scope, stmt, kind);
        Ok(())
    }

    fn same_station(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<()> {
        let relation_at = |index: usize| -> Result<Relation> {
            let arg = stmt.word(index, SAME_STATION_USAGE)?;
            arg.text.parse().map_err(|err| {
                stmt.error(ErrorCode::E105, arg.span, err).with_help(
                    "directions are `above`, `below`, `left`, `right`, `above-left`, \
                     `above-right`, `below-left`, `below-right` and `exact`",
                )
            })
        };

        let (relation, pairs) = match stmt.args.len() {
            4 => {
                let first = stmt.quoted(1, SAME_STATION_USAGE)?;
                let relation = relation_at(2)?;
                let second = stmt.quoted(3, SAME_STATION_USAGE)?;
                let a = qualified_ref(stmt, &Spanned::new(first.text.trim(), first.span))?;
                let b = qualified_ref(stmt, &Spanned::new(second.text.trim(), second.span))?;
                (relation, vec![(a, b)])
            }
            5 => {
                let first_line = stmt.word(1, SAME_STATION_USAGE)?;
                let relation = relation_at(2)?;
                let second_line = stmt.word(3, SAME_STATION_USAGE)?;
                let pairs = stmt
                    .names(4, 1, SAME_STATION_USAGE)?
                    .into_iter()
                    .map(|name| {
                        let station = |line: &Arg<'a>| StationRef {
                            line: Some(line.text),
                            name: unescape(name.inner()),
                            span: name.span(),
                        };
                        (station(&first_line), station(&second_line))
                    })
                    .collect();
                (relation, pairs)
            }
            _ => return Err(stmt.arity_error(4, SAME_STATION_USAGE)),
        };

        self.push_constraint(scope, stmt, PendingConstraintKind::SameStation(relation, pairs));
        Ok(())
    }

    fn equal(&mut self, scope: Scope, stmt: &Statement<'a>) -> Result<()> {
        stmt.arity(3, EQUAL_USAGE)?;
        let lhs = self.terms(scope, stmt, 1)?;
        let rhs = self.terms(scope, stmt, 2)?;
        self.push_constraint(scope, stmt, PendingConstraintKind::Equal(lhs, rhs));
        Ok(())
    }

    /// Parses a `+` separated sum of `station.x` / `station.y` terms.
    fn terms(&self, scope: Scope, stmt: &Statement<'a>, index: usize) -> Result<Vec<PendingTerm<'a>>> {
        let arg = stmt.quoted(index, EQUAL_USAGE)?;
        arg.items('+')
            .iter()
            .map(|item| {
                let text = *item.inner();
                let malformed = || {
                    stmt.error(
                        ErrorCode::E106,
                        item.span(),
                        format!("malformed term `{text}`"),
                    )
                    .with_help(r"terms look like `station.x` or `station.y`; write `\.` for a dot in a name")
                };

                let dot = unescaped_dot(text).ok_or_else(malformed)?;
                let component = match text[dot + 1..].trim() {
                    "x" => Component::X,
                    "y" => Component::Y,
                    _ => return Err(malformed()),
                };
                let name = text[..dot].trim_end();
                if name.is_empty() {
                    return Err(malformed());
                }
                let station = self.station_ref(
                    scope,
                    stmt,
                    &Spanned::new(name, Span::new(item.span().start()..item.span().start() + name.len())),
                )?;
                Ok(PendingTerm { station, component })
            })
            .collect()
    }

    fn zindex(&mut self, stmt: &Statement<'a>) -> Result<()> {
        stmt.arity(4, ZINDEX_USAGE)?;
        let first = stmt.word(1, ZINDEX_USAGE)?;
        let relation = stmt.word(2, ZINDEX_USAGE)?;
        let second = stmt.word(3, ZINDEX_USAGE)?;

        let first = Spanned::new(first.text, first.span);
        let second = Spanned::new(second.text, second.span);
        let (above, below) = match relation.text {
            "above" => (first, second),
            "below" => (second, first),
            other => {
                return Err(stmt
                    .error(
                        ErrorCode::E101,
                        relation.span,
                        format!("expected `above` or `below`, found `{other}`"),
                    )
                    .with_help(format!("expected `{ZINDEX_USAGE}`")));
            }
        };

        self.z_constraints.push(PendingZIndex {
            above,
            below,
            origin: stmt.origin,
        });
        Ok(())
    }

    /// Second phase: resolves every recorded reference.
    fn resolve(self) -> Result<(Network, SourceMap)> {
        let Declarations {
            mut network,
            mut source_map,
            curves,
            constraints,
            z_constraints,
            ..
        } = self;

        let mut index: HashMap<(LineId, StationId, StationId), CurveId> = HashMap::new();
        let mut ends = Vec::with_capacity(curves.len());

        for (position, pending) in curves.iter().enumerate() {
            let from = lookup_station(&network, pending.line, &pending.from, &pending.origin)?;
            let to = lookup_station(&network, pending.line, &pending.to, &pending.origin)?;

            let pins_geometry = network.station(from).is_alignment_point()
                || network.station(to).is_alignment_point();
            if !pins_geometry && !network.line(pending.line).has_edge(from, to) {
                return Err(pending
                    .origin
                    .error(
                        ErrorCode::E206,
                        pending.origin.span,
                        format!(
                            "curve between `{}` and `{}`, but they are not connected on line `{}`",
                            pending.from.inner(),
                            pending.to.inner(),
                            network.line(pending.line).name()
                        ),
                    )
                    .with_help(format!(
                        r#"add `edges "{}, {}"` to the line"#,
                        pending.from.inner(),
                        pending.to.inner()
                    )));
            }

            let key = curve_key(pending.line, from, to);
            if let Some(existing) = index.get(&key) {
                return Err(pending
                    .origin
                    .error(
                        ErrorCode::E207,
                        pending.origin.span,
                        format!(
                            "a curve between `{}` and `{}` is already declared",
                            pending.from.inner(),
                            pending.to.inner()
                        ),
                    )
                    .with_secondary_label(curves[existing.index()].origin.span, "first declared here"));
            }
            index.insert(key, CurveId::new(position));
            ends.push((from, to));
        }

        for (pending, (from, to)) in curves.iter().zip(ends) {
            let shape = resolve_shape(&network, &index, pending)?;
            let curve = Curve {
                line: pending.line,
                from,
                to,
                shape,
                source_line: pending.origin.line_number,
            };
            trace!(curve:?; "Resolved curve");
            network.add_curve(curve);
            source_map.curves.push(pending.origin);
        }

        for pending in &constraints {
            let constraint = resolve_constraint(&network, pending)?;
            network.add_alignment_constraint(constraint);
        }

        for pending in &z_constraints {
            let above = lookup_line(&network, &pending.above, &pending.origin)?;
            let below = lookup_line(&network, &pending.below, &pending.origin)?;
            network.add_z_constraint(ZIndexConstraint {
                above,
                below,
                source_line: pending.origin.line_number,
            });
        }

        debug!(
            lines = network.line_count(),
            stations = network.station_count(),
            curves = network.curve_count(),
            constraints = network.alignment_constraints().len();
            "Resolved network references"
        );

        Ok((network, source_map))
    }
}

/// Parses `dir1,dir2` into a drawable bend.
fn parse_bend(stmt: &Statement<'_>, text: &str, span: Span) -> Result<Bend> {
    let invalid = |reason: String| {
        stmt.error(
            ErrorCode::E103,
            span,
            format!("invalid curve shape `{text}`: {reason}"),
        )
        .with_help("shapes are `special` or two directions such as `right,down` or `up,up-right`")
    };

    let (first, second) = text
        .split_once(',')
        .ok_or_else(|| invalid("expected two directions separated by `,`".to_string()))?;
    let departure: Direction = first.trim().parse().map_err(|err| invalid(format!("{err}")))?;
    let arrival: Direction = second.trim().parse().map_err(|err| invalid(format!("{err}")))?;

    let bend = Bend::new(departure, arrival);
    match bend.kind() {
        Some(_) => Ok(bend),
        None => Err(invalid("not a 90° or 135° turn".to_string())),
    }
}

/// Parses the `parallelto ...` tail of a curve statement.
fn parallel_target<'a>(
    stmt: &Statement<'a>,
    from: &Spanned<&'a str>,
    to: &Spanned<&'a str>,
) -> Result<CurveRef<'a>> {
    let keyword = stmt.word(3, CURVE_USAGE)?;
    if keyword.text != "parallelto" {
        return Err(stmt.arity_error(3, CURVE_USAGE));
    }

    match stmt.args.len() {
        5 => {
            let line = stmt.word(4, CURVE_USAGE)?;
            Ok(CurveRef {
                line: Some(Spanned::new(line.text, line.span)),
                from: from.clone(),
                to: to.clone(),
                span: line.span,
            })
        }
        6 => {
            let curve_keyword = stmt.word(4, PARALLEL_CURVE_USAGE)?;
            if curve_keyword.text != "curve" {
                return Err(stmt
                    .error(
                        ErrorCode::E101,
                        curve_keyword.span,
                        format!("expected `curve`, found `{}`", curve_keyword.text),
                    )
                    .with_help(format!("expected `{PARALLEL_CURVE_USAGE}`")));
            }
            let reference = stmt.quoted(5, PARALLEL_CURVE_USAGE)?;
            let malformed = || {
                stmt.error(
                    ErrorCode::E107,
                    reference.span,
                    format!("malformed curve reference `{}`", reference.text),
                )
                .with_help(format!("expected `{PARALLEL_CURVE_USAGE}`"))
            };

            let (raw_line, stations) = reference.text.split_once(':').ok_or_else(malformed)?;
            let line = raw_line.trim();
            let stations_start = reference.span.start() + 1 + raw_line.len() + 1;
            let stations_arg = Arg {
                kind: ArgKind::Word,
                text: stations,
                span: Span::new(stations_start..stations_start + stations.len()),
            };
            let items = stations_arg.items(',');
            match items.as_slice() {
                [target_from, target_to]
                    if !line.is_empty()
                        && !target_from.inner().is_empty()
                        && !target_to.inner().is_empty() =>
                {
                    Ok(CurveRef {
                        line: Some(Spanned::new(line, reference.span)),
                        from: target_from.clone(),
                        to: target_to.clone(),
                        span: reference.span,
                    })
                }
                _ => Err(malformed()),
            }
        }
        _ => Err(stmt.arity_error(6, PARALLEL_CURVE_USAGE)),
    }
}

/// Parses a `line: station` reference.
fn qualified_ref<'a>(stmt: &Statement<'a>, item: &Spanned<&'a str>) -> Result<StationRef<'a>> {
    let text = *item.inner();
    match text.split_once(':') {
        Some((line, name)) if !line.trim().is_empty() && !name.trim().is_empty() => {
            Ok(StationRef {
                line: Some(line.trim()),
                name: unescape(name.trim()),
                span: item.span(),
            })
        }
        _ => Err(stmt
            .error(
                ErrorCode::E107,
                item.span(),
                format!("expected `line: station`, found `{text}`"),
            )
            .with_help("outside a line, stations are named with their line, e.g. `red: Bank`")),
    }
}

/// Byte offset of the only unescaped `.` in `text`.
fn unescaped_dot(text: &str) -> Option<usize> {
    let mut escaped = false;
    let mut found = None;
    for (offset, c) in text.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '.' if !escaped => {
                if found.is_some() {
                    return None;
                }
                found = Some(offset);
            }
            _ => escaped = false,
        }
        if c != '\\' {
            escaped = false;
        }
    }
    found
}

/// Replaces `\.` with `.`.
fn unescape(name: &str) -> String {
    name.replace("\\.", ".")
}

fn curve_key(line: LineId, a: StationId, b: StationId) -> (LineId, StationId, StationId) {
    if a <= b { (line, a, b) } else { (line, b, a) }
}

fn lookup_line(network: &Network, name: &Spanned<&str>, origin: &Origin) -> Result<LineId> {
    network.line_id(name.inner()).ok_or_else(|| {
        origin.error(
            ErrorCode::E201,
            name.span(),
            format!("unknown line `{}`", name.inner()),
        )
    })
}

fn lookup_station(
    network: &Network,
    line: LineId,
    name: &Spanned<&str>,
    origin: &Origin,
) -> Result<StationId> {
    network.station_id(line, name.inner()).ok_or_else(|| {
        origin.error(
            ErrorCode::E200,
            name.span(),
            format!(
                "unknown station `{}` on line `{}`",
                name.inner(),
                network.line(line).name()
            ),
        )
    })
}

fn resolve_curve_ref(
    network: &Network,
    index: &HashMap<(LineId, StationId, StationId), CurveId>,
    own_line: LineId,
    reference: &CurveRef<'_>,
    origin: &Origin,
) -> Result<CurveId> {
    let line = match &reference.line {
        Some(name) => lookup_line(network, name, origin)?,
        None => own_line,
    };
    let from = lookup_station(network, line, &reference.from, origin)?;
    let to = lookup_station(network, line, &reference.to, origin)?;

    index.get(&curve_key(line, from, to)).copied().ok_or_else(|| {
        origin.error(
            ErrorCode::E202,
            reference.span,
            format!(
                "no curve between `{}` and `{}` on line `{}`",
                reference.from.inner(),
                reference.to.inner(),
                network.line(line).name()
            ),
        )
    })
}

fn resolve_shape(
    network: &Network,
    index: &HashMap<(LineId, StationId, StationId), CurveId>,
    pending: &PendingCurve<'_>,
) -> Result<CurveShape> {
    let origin = &pending.origin;
    match &pending.shape {
        PendingShape::Bend(bend) => CurveShape::from_bend(*bend).ok_or_else(|| {
            origin.error(
                ErrorCode::E103,
                origin.span,
                format!("invalid curve shape `{bend}`"),
            )
        }),
        PendingShape::Parallel { bend, target } => Ok(CurveShape::ParallelTo {
            target: resolve_curve_ref(network, index, pending.line, target, origin)?,
            bend: *bend,
        }),
        PendingShape::Sequence { stations, bends } => {
            let ids = stations
                .iter()
                .map(|name| lookup_station(network, pending.line, name, origin))
                .collect::<Result<Vec<_>>>()?;
            let legs = ids
                .windows(2)
                .zip(bends)
                .map(|(pair, bend)| SequenceLeg {
                    from: pair[0],
                    to: pair[1],
                    bend: *bend,
                })
                .collect();
            Ok(CurveShape::SpecialSequence(legs))
        }
        PendingShape::Join(parts) => {
            let ids = parts
                .iter()
                .map(|part| resolve_curve_ref(network, index, pending.line, part, origin))
                .collect::<Result<Vec<_>>>()?;
            Ok(CurveShape::SpecialJoin(ids))
        }
    }
}

fn resolve_station_ref(
    network: &Network,
    pending: &PendingConstraint<'_>,
    reference: &StationRef<'_>,
) -> Result<StationId> {
    let origin = &pending.origin;
    let line = match (reference.line, pending.line) {
        (Some(name), _) => lookup_line(network, &Spanned::new(name, reference.span), origin)?,
        (None, Some(line)) => line,
        (None, None) => {
            return Err(origin.error(
                ErrorCode::E107,
                reference.span,
                format!("station `{}` needs a line", reference.name),
            ));
        }
    };
    lookup_station(
        network,
        line,
        &Spanned::new(reference.name.as_str(), reference.span),
        origin,
    )
}

fn resolve_constraint(
    network: &Network,
    pending: &PendingConstraint<'_>,
) -> Result<AlignmentConstraint> {
    let stations = |refs: &[StationRef<'_>]| -> Result<Vec<StationId>> {
        refs.iter()
            .map(|reference| resolve_station_ref(network, pending, reference))
            .collect()
    };
    let terms = |terms: &[PendingTerm<'_>]| -> Result<Vec<Term>> {
        terms
            .iter()
            .map(|term| {
                Ok(Term {
                    station: resolve_station_ref(network, pending, &term.station)?,
                    component: term.component,
                })
            })
            .collect()
    };

    let kind = match &pending.kind {
        PendingConstraintKind::Axis(axis, refs) => ConstraintKind::Axis {
            axis: *axis,
            stations: stations(refs.as_slice())?,
        },
        PendingConstraintKind::Diagonal(diagonal, refs) => ConstraintKind::Diagonal {
            diagonal: *diagonal,
            stations: stations(refs.as_slice())?,
        },
        PendingConstraintKind::SameStation(relation, pairs) => ConstraintKind::SameStation {
            relation: *relation,
            pairs: pairs
                .iter()
                .map(|(a, b)| {
                    Ok((
                        resolve_station_ref(network, pending, a)?,
                        resolve_station_ref(network, pending, b)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
        },
        PendingConstraintKind::Equal(lhs, rhs) => ConstraintKind::LinearEqual {
            lhs: terms(lhs.as_slice())?,
            rhs: terms(rhs.as_slice())?,
        },
    };

    Ok(AlignmentConstraint {
        kind,
        line: pending.line,
        source_line: pending.origin.line_number,
        text: pending.text.to_string(),
    })
}

/// Runs both parsing phases over the statements of a network file.
pub(crate) fn build_network<'a>(
    source: &'a str,
    statements: &[Statement<'a>],
    resolver: &dyn StationIdResolver,
) -> Result<(Network, SourceMap)> {
    let mut declarations = Declarations::new(source, resolver);
    let mut scope = Scope::TopLevel;
    for statement in statements {
        scope = declarations.statement(scope, statement)?;
    }
    declarations.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescaped_dot() {
        assert_eq!(unescaped_dot("Bank.x"), Some(4));
        assert_eq!(unescaped_dot(r"St\. Pancras.y"), Some(12));
        assert_eq!(unescaped_dot("Bank"), None);
        assert_eq!(unescaped_dot("a.b.x"), None);
        assert_eq!(unescaped_dot(r"St\. Pancras"), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"St\. Pancras"), "St. Pancras");
    }

    #[test]
    fn test_arg_items_track_spans() {
        // `"A, Bb ,C"` starting at byte 10
        let arg = Arg {
            kind: ArgKind::Quoted,
            text: "A, Bb ,C",
            span: Span::new(10..20),
        };
        let items = arg.items(',');

        let texts: Vec<_> = items.iter().map(|item| *item.inner()).collect();
        assert_eq!(texts, vec!["A", "Bb", "C"]);
        assert_eq!(items[0].span(), Span::new(11..12));
        assert_eq!(items[1].span(), Span::new(14..16));
        assert_eq!(items[2].span(), Span::new(18..19));
    }

    #[test]
    fn test_curve_key_is_unordered() {
        let line = LineId::new(0);
        let (a, b) = (StationId::new(1), StationId::new(2));
        assert_eq!(curve_key(line, a, b), curve_key(line, b, a));
    }
}
