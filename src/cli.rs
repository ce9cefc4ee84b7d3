//! Command-line arguments.

use clap::Parser;

/// Scrape and process course data from the SIS.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The year at which to start scraping from.
    pub start_year: u16,

    /// The year at which to stop scraping, inclusive.
    pub end_year: u16,

    /// Only run the scraping step.
    #[arg(long, conflicts_with = "postprocess_only")]
    pub scrape_only: bool,

    /// Only run the post-processing step.
    #[arg(long)]
    pub postprocess_only: bool,

    /// Log formatter to use.
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum TracingFormat {
    /// Use pretty formatter (default in debug mode)
    Pretty,
    /// Use JSON formatter (default in release mode)
    Json,
}

#[cfg(debug_assertions)]
const DEFAULT_TRACING_FORMAT: TracingFormat = TracingFormat::Pretty;
#[cfg(not(debug_assertions))]
const DEFAULT_TRACING_FORMAT: TracingFormat = TracingFormat::Json;

fn default_tracing_format() -> TracingFormat {
    DEFAULT_TRACING_FORMAT
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_parse_years() {
        let args = Args::parse_from(["sis-scraper", "2023", "2024"]);
        assert_eq!(args.start_year, 2023);
        assert_eq!(args.end_year, 2024);
        assert!(!args.scrape_only);
        assert!(!args.postprocess_only);
    }

    #[test]
    fn test_args_mode_flags_exclusive() {
        let result = Args::try_parse_from([
            "sis-scraper",
            "2023",
            "2024",
            "--scrape-only",
            "--postprocess-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_scrape_only() {
        let args = Args::parse_from(["sis-scraper", "2023", "2024", "--scrape-only"]);
        assert!(args.scrape_only);
        assert!(!args.postprocess_only);
    }

    #[test]
    fn test_command_debug_assert() {
        Args::command().debug_assert();
    }
}
