//! # Metromap Parser
//!
//! Parser for the metro network description language. This crate turns
//! network source text into a [`metromap_core::network::Network`].
//!
//! ## Usage
//!
//! ```
//! # use metromap_parser::{parse, ParseError, StationIdTable};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         line red:
//!         station "A" 0 0
//!         station "B" 10 0
//!         edges "A, B"
//!     "#;
//!
//!     let mut ids = StationIdTable::new();
//!     ids.insert("red", "A", "1");
//!     ids.insert("red", "B", "2");
//!
//!     let network = parse(source, &ids)?;
//!     assert_eq!(network.station_count(), 2);
//!     Ok(())
//! }
//! ```

pub mod error;
mod lexer;
mod parser;
mod span;
mod station_ids;
mod validate;

pub use error::ParseError;
pub use span::{Span, Spanned};
pub use station_ids::{StationIdResolver, StationIdTable};

use log::debug;

use metromap_core::network::Network;

/// Parse network source text into a [`Network`].
///
/// The pipeline runs in four steps:
///
/// 1. **Tokenize** - Convert source text to tokens, collecting every lexical error
/// 2. **Declare** - Walk the statements, creating lines, stations and edges
/// 3. **Resolve** - Turn curve and constraint references into ids
/// 4. **Validate** - Report orphan stations and inconsistent curve references
///
/// Steps 2 and 3 stop at the first error; steps 1 and 4 report all of theirs.
///
/// # Arguments
///
/// * `source` - The network file contents
/// * `resolver` - Supplies the external id of every drawn station
///
/// # Errors
///
/// Returns a [`ParseError`] holding one or more diagnostics with source
/// spans.
pub fn parse(source: &str, resolver: &dyn StationIdResolver) -> Result<Network, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;

    // Steps 2 and 3: Declare and resolve
    let statements = parser::statements(&tokens);
    debug!(statements = statements.len(); "Split source into statements");
    let (network, source_map) = parser::build_network(source, &statements, resolver)?;

    // Step 4: Validate
    validate::validate_network(&network, &source_map)?;

    Ok(network)
}
