//! Environment-driven configuration.
//!
//! Configuration comes from environment variables (a `.env` file is honored
//! when present) extracted through figment. The request timeout accepts both
//! a bare number of seconds and a duration string with units.

use figment::{Figment, providers::Env};
use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::codemaps::CodeMapPaths;

/// Filename of the synthesized-identifier dictionary written by the codifier.
const GENERATED_INSTRUCTOR_MAP_FILENAME: &str = "generated_instructor_rcsid_name_map.json";

/// Scraper configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Log level for this crate's own target.
    ///
    /// Valid values are: "trace", "debug", "info", "warn", "error".
    /// Defaults to "info" if not specified.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory receiving rotating log files.
    pub scraper_logs_dir: PathBuf,
    /// Directory receiving raw per-term snapshots.
    pub scraper_raw_output_data_dir: PathBuf,
    /// Directory receiving codified per-term snapshots.
    pub scraper_processed_output_data_dir: PathBuf,
    /// Directory holding the code-mapping dictionaries.
    pub scraper_code_maps_dir: PathBuf,

    pub attribute_code_name_map_filename: String,
    pub instructor_rcsid_name_map_filename: String,
    pub restriction_code_name_map_filename: String,
    pub subject_code_name_map_filename: String,

    /// Base URL of the SIS self-service API.
    #[serde(default = "default_sis_base_url")]
    pub sis_base_url: String,

    /// Maximum number of simultaneously open sessions, which is also the
    /// number of subject workers in flight.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Maximum concurrent connections a single session may hold to the SIS
    /// host.
    #[serde(default = "default_limit_per_host")]
    pub limit_per_host: usize,

    /// Total per-request timeout.
    ///
    /// Accepts both numeric values (seconds) and duration strings.
    /// Defaults to 30 seconds if not specified.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Config {
    /// Extracts configuration from the process environment.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }

    /// Paths of the four persisted dictionaries.
    pub fn code_map_paths(&self) -> CodeMapPaths {
        CodeMapPaths {
            subjects: self
                .scraper_code_maps_dir
                .join(&self.subject_code_name_map_filename),
            attributes: self
                .scraper_code_maps_dir
                .join(&self.attribute_code_name_map_filename),
            instructors: self
                .scraper_code_maps_dir
                .join(&self.instructor_rcsid_name_map_filename),
            restrictions: self
                .scraper_code_maps_dir
                .join(&self.restriction_code_name_map_filename),
        }
    }

    /// Path of the synthesized-identifier dictionary.
    pub fn generated_instructor_map_path(&self) -> PathBuf {
        self.scraper_code_maps_dir
            .join(GENERATED_INSTRUCTOR_MAP_FILENAME)
    }
}

/// Default log level of "info"
fn default_log_level() -> String {
    "info".to_string()
}

/// Default SIS base URL
fn default_sis_base_url() -> String {
    "https://sis9.rpi.edu/StudentRegistrationSsb/ssb".to_string()
}

/// Default session cap of 10
fn default_max_sessions() -> usize {
    10
}

/// Default per-session connection cap of 5
fn default_limit_per_host() -> usize {
    5
}

/// Default request timeout of 30 seconds
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Duration parser with seconds as the default unit.
///
/// Supports seconds (s), milliseconds (ms), and minutes (m); multiple units
/// are summed ("2m 30s" = 150 seconds).
const DURATION_PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[TimeUnit::Second, TimeUnit::MilliSecond, TimeUnit::Minute])
    .parse_multiple(None)
    .allow_time_unit_delimiter()
    .disable_infinity()
    .disable_fraction()
    .disable_exponent()
    .default_unit(TimeUnit::Second)
    .build();

/// Deserializer for duration fields accepting both numeric and string values.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a duration string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            DURATION_PARSER
                .parse(value)
                .map_err(|e| {
                    serde::de::Error::custom(format!(
                        "Invalid duration format '{value}': {e}. Examples: '30' (30 seconds), '3500ms', '2m'"
                    ))
                })?
                .try_into()
                .map_err(|e| serde::de::Error::custom(format!("Duration conversion error: {e}")))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(serde::de::Error::custom("Duration cannot be negative"));
            }
            Ok(Duration::from_secs(value as u64))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
