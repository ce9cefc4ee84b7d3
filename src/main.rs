use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use sis_scraper::cli::Args;
use sis_scraper::codemaps::CodeMaps;
use sis_scraper::config::Config;
use sis_scraper::{harvest, logging, postprocess};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from a .env file if one exists
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!(
                "ERROR: incomplete configuration: {error}. Ensure all required variables are \
                 set in the environment or an .env file."
            );
            return ExitCode::FAILURE;
        }
    };

    // The guard flushes buffered file output when dropped at exit
    let _guard = match logging::setup_logging(&config, args.tracing) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("ERROR: failed to initialize logging: {error}");
            return ExitCode::FAILURE;
        }
    };

    if !args.postprocess_only {
        let paths = config.code_map_paths();
        let maps = match CodeMaps::load(&paths) {
            Ok(maps) => Arc::new(maps),
            Err(error) => {
                error!(error = ?error, "failed to load code mapping files");
                return ExitCode::FAILURE;
            }
        };

        match harvest::run::run(&config, args.start_year, args.end_year, Arc::clone(&maps)).await {
            Ok(_) => {
                if let Err(error) = maps.save(&paths) {
                    error!(error = ?error, "failed to write code mapping files");
                    return ExitCode::FAILURE;
                }
            }
            Err(error) => {
                error!(error = ?error, "scrape failed");
                return ExitCode::FAILURE;
            }
        }
    }

    if !args.scrape_only {
        if let Err(error) = postprocess::run(&config) {
            error!(error = ?error, "post-processing failed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
