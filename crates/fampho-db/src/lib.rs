//! Fampho Database Library
//!
//! Persistence for photos, photo files and workflow events.

pub mod db;
pub mod setup;

pub use db::*;
pub use setup::setup_database;
