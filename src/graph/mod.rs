//! Graph configuration, expo curves and layout resolution.

pub mod config;
pub mod curve;
pub mod layout;

pub use config::{FieldSpec, GraphConfig, GraphSpec, PALETTE};
pub use curve::{CurveParams, ExpoCurve};
pub use layout::{LayoutIssue, Resolution, ResolvedField, ResolvedGraph, resolve};
