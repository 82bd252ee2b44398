use clap::Parser;
use hallsync::cli::{get_log_level, Cli};
use hallsync::config::{default_config_file, load_config};
use hallsync::source::HttpSource;
use hallsync::SyncReport;
use std::collections::HashMap;
use tracing::{debug, error, trace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env: HashMap<String, String> = std::env::vars().collect();
    let config_file = cli.config.clone().or_else(default_config_file);
    let config = match load_config(config_file.as_deref(), &env, cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(get_log_level(cli.verbose, &config.log_level))
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(cli.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(cli.verbose >= 3) // Show line numbers for -vvv
        .with_writer(std::io::stderr)
        .init();

    debug!("hallsync started with verbosity level: {}", cli.verbose);
    trace!("Resolved configuration: {:?}", config);

    let result = match HttpSource::new(config.endpoint.clone()) {
        Ok(source) => hallsync::run(&config, &source, cli.dry_run).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => print_summary(&report),
        Err(e) => {
            error!("Fatal error: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_summary(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}✅ {} talks, {} speakers, {} images",
        report.talks, report.speakers, report.images_written
    );
    if report.images_skipped > 0 {
        println!("⚠️  {} speaker photos could not be downloaded", report.images_skipped);
    }
    if report.renamed_slugs > 0 {
        println!("⚠️  {} slugs were disambiguated", report.renamed_slugs);
    }
}
