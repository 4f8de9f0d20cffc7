//! Pedigree Core Types and Definitions
//!
//! This crate provides the foundational types shared by the pedigree graph
//! builder and layout engine. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Points and bounds in layout space ([`geometry`] module)
//! - **Individuals**: The validated animal record model ([`individual`] module)

pub mod geometry;
pub mod identifier;
pub mod individual;
