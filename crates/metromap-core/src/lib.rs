//! Metromap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the metro map
//! parser and generator. It includes:
//!
//! - **Geometry**: Points and reflections ([`geometry`] module)
//! - **Segments**: Cubic Bezier curves and drawn line segments ([`segment`] module)
//! - **Directions**: The eight grid directions ([`direction::Direction`])
//! - **Network**: The parsed station/line arena ([`network`] module)
//! - **Curves**: Curve shapes and their canonical forms ([`curve`] module)
//! - **Constraints**: Alignment and draw-order constraints ([`constraint`] module)
//! - **Endpoints**: Terminal decorations ([`endpoint`] module)

pub mod constraint;
pub mod curve;
pub mod direction;
pub mod endpoint;
pub mod geometry;
pub mod network;
pub mod segment;
