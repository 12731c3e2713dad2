//! World-state simulation core for a turn-based tactical RPG: spatial rule
//! overlays inscribed into the world, faction tension with a single
//! fight-authorization gate, and a territorial control engine driven by a
//! daily tick.

pub mod control;
pub mod id;
pub mod model;
pub mod overlay;
pub mod sim;
pub mod snapshot;
pub mod tension;

pub use sim::{SimConfig, TurnPhase, WorldSim};
