//! # asyncorm-core
//!
//! Error types, settings, and logging setup shared by every asyncorm crate.
//! This crate has no database dependencies.
//!
//! ## Modules
//!
//! - [`error`] - The [`OrmError`] taxonomy and the [`OrmResult`] alias
//! - [`settings`] - Runtime configuration with the defaults the ORM expects
//! - [`settings_loader`] - TOML/JSON loading and `ASYNCORM_*` environment overrides
//! - [`logging`] - Tracing subscriber setup and per-statement spans

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{OrmError, OrmResult};
pub use settings::{DatabaseSettings, Settings};
