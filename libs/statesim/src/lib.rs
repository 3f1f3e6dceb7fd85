//! # StateSim - Listener Conformance Simulator
//!
//! ## Purpose
//!
//! Drives a [`appdata::Listener`] with synthetic, schema-valid blocks and
//! keeps an independent model of what the listener should have stored:
//! - **Generators**: random values for every kind and random updates against
//!   live state ([`generator`], [`updates`])
//! - **Reference state**: app → module → object collection, ordered by
//!   encoded key ([`AppState`])
//! - **Simulator**: block generation with per-block key uniqueness and
//!   replay through a [`appdata::StreamSession`] ([`Simulator`])
//! - **Example schema**: every kind in key and value position
//!   ([`EXAMPLE_APP_SCHEMA`])
//!
//! ## Architecture Role
//!
//! ```text
//! SimulatorConfig → [Simulator] ── StreamSession ──→ Listener under test
//!                        ↓
//!                    AppState (expected contents after each commit)
//! ```
//!
//! ## Determinism
//!
//! All randomness comes from one `StdRng` seeded by
//! [`SimulatorConfig::seed`]; two simulators with equal seeds, schemas and
//! listeners that accept everything emit identical packet streams.

pub mod config;
pub mod error;
pub mod example_schema;
pub mod generator;
pub mod simulator;
pub mod state;
pub mod updates;

pub use config::{SimulatorConfig, DEFAULT_CONFIG};
pub use error::{SimError, SimResult};
pub use example_schema::{example_app_schema, EXAMPLE_APP_SCHEMA};
pub use simulator::{BlockData, Simulator};
pub use state::{AppState, ModuleState, ObjectCollection, ObjectEntry};
