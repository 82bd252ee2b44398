//! # hallsync
//!
//! Publishes a conference programme from a Conference Hall JSON export as
//! static MDX pages.
//!
//! ## Usage
//!
//! ```bash
//! CONFERENCE_HALL=https://conference-hall.io/api/... hallsync [--output-dir site] [--dry-run]
//! ```
//!
//! ## Modules
//!
//! - `cli` - Command-line arguments
//! - `config` - Layered run configuration (defaults, TOML file, environment, flags)
//! - `model` - Talk and speaker records and their validation
//! - `filter` - Selection of confirmed talks and their speakers
//! - `slug` - Slug derivation and collision handling
//! - `photo` - Speaker photo file naming
//! - `render` - MDX page templates
//! - `output` - Staged writes committed only when a run succeeds
//! - `source` - Export and photo retrieval over HTTP
//! - `sync` - The end-to-end pipeline
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod photo;
pub mod render;
pub mod slug;
pub mod source;
pub mod sync;

pub use error::{Error, Result};
pub use sync::{run, SyncReport};
