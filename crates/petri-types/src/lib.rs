//! Shared type definitions for the Petri simulation.
//!
//! Everything that crosses a crate boundary, or leaves the process for a
//! renderer, is defined here. Types flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Monotonic cell identifiers and their generator
//! - [`enums`] -- Species, action kinds, death causes, shapes
//! - [`geometry`] -- Two-dimensional vector math
//! - [`snapshot`] -- Per-tick snapshots and lifecycle events

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionCategory, ActionKind, DeathCause, ShapeKind, Species, UnknownVariant};
pub use geometry::{Vec2, distance_between};
pub use ids::{CellId, IdExhausted, IdGenerator};
pub use snapshot::{CellSprite, LifecycleEvent, LifecycleEventKind, Rgb, Snapshot, square_side};
