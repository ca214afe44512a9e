//! # catsync-core
//!
//! Core types shared across all catsync crates:
//! - Entity structs for persisted catalog state (products, prices, barcodes, sync runs)
//! - Status enums with state machine transitions
//! - Change events emitted by the reconciler and consumed by the report writer
//! - Cross-cutting error types

pub mod changes;
pub mod entities;
pub mod enums;
pub mod errors;
