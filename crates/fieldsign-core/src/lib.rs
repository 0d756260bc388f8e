//! Field placement and signing engine
//!
//! This crate owns the resolution-independent field geometry model, the
//! transform from on-screen fractions to document-native coordinates, the
//! aspect-preserving image fit, and the hash-chained audit trail produced
//! per signing operation. All I/O happens behind the capability traits in
//! [`sign`]; adapters (HTTP, filesystem, SQLite, lopdf) live in sibling
//! crates.

pub mod audit;
pub mod coords;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod image;
pub mod sign;

pub use audit::{digest, verify_chain, AuditRecord, MemoryAuditLog};
pub use coords::{to_document_box, to_relative, DocumentBox};
pub use error::SignError;
pub use fit::{fit, FittedRect};
pub use geometry::{Field, FieldKind, PlacementSession};
pub use image::{ImageFormat, SignatureImage};
pub use sign::{
    is_safe_stem, sign, AuditStore, DocumentEditor, DocumentStore, SignOutcome, SignRequest,
};
