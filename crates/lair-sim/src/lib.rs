//! Lair Sim - headless host for Lair agents.
//!
//! Plays every collaborator the behavior core needs: broad-phase neighbor
//! queries, population tracking, loot rolls and a scripted opponent, driven
//! by a frame loop with a fixed physics step.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod population;
pub mod spatial;
pub mod target;
pub mod timing;
pub mod world;

pub use config::SimConfig;
pub use world::{RunSummary, World};
