//! Arena, tick cycle, and run loop for the Petri simulation.
//!
//! This crate owns the live cell collection and everything that moves it
//! forward in time: the per-tick phases, the snapshot hand-off to a renderer,
//! operator controls, and the paced async run loop.
//!
//! # Modules
//!
//! - [`arena`] -- The [`Arena`]: live cells, RNG, ids, species catalog.
//! - [`channel`] -- Snapshot publish/acknowledge channel and the lifecycle
//!   event feed.
//! - [`config`] -- Configuration loading from `petri-config.yaml` into
//!   strongly-typed structs.
//! - [`operator`] -- Pause, resume, stop, tick budget, end reasons.
//! - [`runner`] -- [`run_simulation`] and tick pacing.
//! - [`spatial`] -- Brute-force range, touching, and engulfed queries.
//! - [`tick`] -- The tick phases and [`TickSummary`].
//!
//! [`Arena`]: arena::Arena
//! [`run_simulation`]: runner::run_simulation
//! [`TickSummary`]: tick::TickSummary

pub mod arena;
pub mod channel;
pub mod config;
pub mod operator;
pub mod runner;
pub mod spatial;
pub mod tick;
