//! Cell state, behavior rules, and lifecycle for the Petri simulation.
//!
//! This crate contains the logic layer for cells: everything that operates
//! on cell state without touching I/O or owning the arena. It sits between
//! `petri-types` (plain data) and `petri-core` (the arena and run loop).
//!
//! # Modules
//!
//! - [`actions`] -- Applying a decision: steering, eating, splitting
//! - [`cell`] -- The [`Cell`] agent and its life state
//! - [`context`] -- Per-tick borrowed state ([`TickContext`], [`Walls`])
//! - [`cooldown`] -- Per-cell rule cooldowns
//! - [`engine`] -- Priority-ordered [`RuleSet`] and greedy selection
//! - [`error`] -- Error types ([`AgentError`], [`RuleError`])
//! - [`lifecycle`] -- Physics, squish, growth, aging, death, corpses
//! - [`presets`] -- Built-in species profiles
//! - [`rule`] -- Declarative [`BehaviorRule`]s and their builder
//! - [`species`] -- [`SpeciesProfile`] and its growth/split/squish policies

pub mod actions;
pub mod cell;
pub mod context;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod presets;
pub mod rule;
pub mod species;

#[cfg(test)]
mod testing;

// Re-export primary types at crate root for convenience.
pub use actions::{ActionOutcome, resolve};
pub use cell::{Cell, LifeState};
pub use context::{TickContext, WALL_MARGIN, Walls};
pub use cooldown::{Cooldown, Cooldowns};
pub use engine::{Candidate, Decision, Observer, RuleSet};
pub use error::{AgentError, RuleError};
pub use lifecycle::{GrowthChange, apply_physics, grow_older, push_apart, settle, squish_factor};
pub use rule::{BehaviorRule, Bounds, RuleBuilder, RuleConfig, TargetSpec};
pub use species::{GrowthPolicy, SpeciesConfig, SpeciesProfile, SplitPolicy, SquishPolicy};
