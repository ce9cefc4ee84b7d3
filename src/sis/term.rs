//! Term codes used by the SIS.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Years the SIS term encoding can represent.
const VALID_YEARS: std::ops::RangeInclusive<u16> = 1000..=9999;

/// An academic season within a term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Season {
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Every season, in calendar order.
    pub const ALL: [Season; 3] = [Season::Spring, Season::Summer, Season::Fall];

    /// Returns the two-digit season code used in term identifiers.
    fn to_code(self) -> &'static str {
        match self {
            Season::Spring => "01",
            Season::Summer => "05",
            Season::Fall => "09",
        }
    }

    /// Parses a season name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Season> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "fall" => Some(Season::Fall),
            _ => None,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Fall => write!(f, "Fall"),
        }
    }
}

impl FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let season = match s {
            "01" => Season::Spring,
            "05" => Season::Summer,
            "09" => Season::Fall,
            _ => return Err(anyhow::anyhow!("Invalid season code: {s}")),
        };
        Ok(season)
    }
}

/// An academic term, encoded on the wire as `YYYYSS`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Term {
    pub year: u16,
    pub season: Season,
}

impl Term {
    /// Builds a term from a year and a season name.
    ///
    /// Years outside 1000-9999 and unrecognized season names yield `None`,
    /// which callers treat as a skip signal rather than an error.
    pub fn new(year: u16, season: &str) -> Option<Term> {
        Term::from_parts(year, Season::parse(season)?)
    }

    /// Builds a term from a year and a parsed season, validating the year.
    pub fn from_parts(year: u16, season: Season) -> Option<Term> {
        if !VALID_YEARS.contains(&year) {
            return None;
        }
        Some(Term { year, season })
    }

    /// Returns the six-character wire code for this term.
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{year}{season}", year = self.year, season = self.season.to_code())
    }
}

impl FromStr for Term {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 {
            return Err(anyhow::anyhow!("Term string must be 6 characters"));
        }

        let year = s[0..4].parse::<u16>().context("Failed to parse year")?;
        let season = Season::from_str(&s[4..6])?;

        Term::from_parts(year, season).ok_or_else(|| anyhow::anyhow!("Year out of range"))
    }
}
