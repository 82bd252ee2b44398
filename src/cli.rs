//! Command-line arguments
//!
//! Every flag is optional; running with no arguments syncs from the
//! `CONFERENCE_HALL` endpoint into the working directory.

use crate::config::ConfigLayer;
use crate::slug::CollisionPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Sync confirmed talks and their speakers into static MDX files
#[derive(Parser, Debug)]
#[command(name = "hallsync")]
#[command(about = "hallsync - Sync a Conference Hall export into talks/, speakers/ and images/", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to a TOML config file (default: ./hallsync.toml when present)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Export endpoint (overrides CONFERENCE_HALL)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Directory receiving talks/, speakers/ and images/
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Value written as `start` in talk files, e.g. 2023-10-26T08:00:00.000+0100
    #[arg(long, value_name = "TIMESTAMP")]
    pub talk_start: Option<String>,

    /// Value written as `end` in talk files
    #[arg(long, value_name = "TIMESTAMP")]
    pub talk_end: Option<String>,

    /// Number of talks or speakers processed at once
    #[arg(short = 'j', long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// What to do when two talks or speakers share a slug (suffix or fail)
    #[arg(long, value_name = "POLICY")]
    pub slug_collisions: Option<CollisionPolicy>,

    /// Validate and render without writing files or downloading photos
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Flag values as the highest-precedence config layer.
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            endpoint: self.endpoint.clone(),
            output_dir: self.output_dir.clone(),
            talk_start: self.talk_start.clone(),
            talk_end: self.talk_end.clone(),
            max_parallel: self.max_parallel,
            slug_collisions: self.slug_collisions,
            log_level: None,
        }
    }
}

/// Tracing filter for the given verbosity, falling back to the configured level.
pub fn get_log_level(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        2 => "trace".to_string(),
        _ => "trace,hyper=debug,reqwest=debug".to_string(), // -vvv shows everything including dependencies
    }
}
