//! Decker is a line-oriented terminal chat client that turns model replies
//! into reviewable file creates and edits.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state, model/provider resolution, structured
//!   response validation, and streaming orchestration.
//! - [`providers`] holds the per-backend adapters behind a single trait,
//!   selected once at startup.
//! - [`diff`] and [`fsops`] preview and apply the model's proposed file
//!   operations.
//! - [`ui`] runs the interactive line shell; [`commands`] implements the
//!   slash commands it dispatches.
//! - [`api`] defines the wire payloads shared by adapters and streaming.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod diff;
pub mod fsops;
pub mod providers;
pub mod ui;
pub mod utils;
