//! # lattes-score
//!
//! Scores the journal articles of a Lattes curriculum export.
//!
//! Each article's ISSN is classified against the Qualis, JCR and SJR tables,
//! its authors are matched against a roster of faculty and students, and the
//! Qualis weights are summed per year, split among permanent faculty
//! co-authors.
//!
//! Provides:
//! - **Library**: parsing, lookups, attribution and scoring
//! - **CLI**: `lattes-score` binary for terminal use (includes `lattes-score serve` for MCP)
//! - **Python**: `lattes_score` module (feature `python`)
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> lattes_score::error::Result<()> {
//! use lattes_score::{analyze_input, Config, ReferenceTables, YearRange};
//!
//! let config = Config::from_env()?;
//! let tables = ReferenceTables::load(&config).await;
//!
//! let bytes = std::fs::read("curriculo.zip")?;
//! let report = analyze_input("curriculo.zip", &bytes, &tables, Some(YearRange::new(2017, 2020)))?;
//! for year in &report.yearly_scores {
//!     println!("{}: {:?}", year.year, year.total);
//! }
//! print!("{}", lattes_score::format_report(&report.yearly_scores));
//! # Ok(())
//! # }
//! ```
//!
//! ## Identifiers
//!
//! ```
//! use lattes_score::identifier::{format_identifier, normalize_identifier};
//!
//! assert_eq!(normalize_identifier(" 0950-0618 "), "09500618");
//! assert_eq!(format_identifier("09500618"), "0950-0618");
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod identifier;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod roster;
pub mod scoring;
pub mod tables;
pub mod types;

pub mod mcp;

#[cfg(feature = "python")]
pub mod python;

// Re-export key types at the crate root.
pub use config::Config;
pub use error::ScoreError;
pub use pipeline::{analyze_input, run_pipeline, run_pipeline_with};
pub use report::{format_report, report_file_name};
pub use resolve::ReferenceTables;
pub use roster::{AuthorMatcher, ContainmentMatcher, Roster};
pub use types::*;
