//! Public types for curriculum scoring.
//!
//! These types only depend on serde. Everything the pipeline produces
//! serializes to plain JSON, which is what the CLI, the MCP server and the
//! Python bindings hand out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel for an impact-index value that could not be resolved.
pub const UNAVAILABLE: &str = "---";

/// Separator used when an author list is rendered as a single string.
pub const AUTHOR_DELIMITER: &str = "; ";

/// An article extracted from a curriculum document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Article title.
    pub title: String,
    /// Author names in document order.
    pub authors: Vec<String>,
    /// Publication year (0 when missing or unparseable).
    pub year: i32,
    /// Normalized ISSN of the journal (`"none"` when missing).
    pub journal_identifier: String,
    /// Journal title.
    pub journal_title: String,
    /// DOI as a resolver URL (`"none"` when missing).
    pub external_identifier: String,
}

impl Article {
    /// Authors rendered as one `"; "`-separated string.
    pub fn authors_joined(&self) -> String {
        self.authors.join(AUTHOR_DELIMITER)
    }
}

/// Qualis stratum of a journal.
///
/// Variants are declared in descending weight order, so the derived `Ord`
/// matches the report column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    A1,
    A2,
    A3,
    A4,
    B1,
    B2,
    B3,
    B4,
    C,
    /// Journal not present in the Qualis table.
    #[serde(rename = "NP")]
    NotClassified,
}

impl QualityTier {
    /// All tiers in report order.
    pub const ALL: [QualityTier; 10] = [
        Self::A1,
        Self::A2,
        Self::A3,
        Self::A4,
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::C,
        Self::NotClassified,
    ];

    /// Short label used in tables and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::B4 => "B4",
            Self::C => "C",
            Self::NotClassified => "NP",
        }
    }

    /// Parse a table value (case-insensitive). Unknown labels are `NotClassified`.
    pub fn from_str_loose(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(Self::NotClassified)
    }

    /// Upper band (A1–A4).
    pub fn is_band_a(&self) -> bool {
        matches!(self, Self::A1 | Self::A2 | Self::A3 | Self::A4)
    }

    /// Lower band (B1–B4).
    pub fn is_band_b(&self) -> bool {
        matches!(self, Self::B1 | Self::B2 | Self::B3 | Self::B4)
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An impact-index score and quartile (JCR or SJR).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRating {
    pub score: String,
    pub quartile: String,
}

impl ImpactRating {
    pub fn new(score: impl Into<String>, quartile: impl Into<String>) -> Self {
        Self {
            score: score.into(),
            quartile: quartile.into(),
        }
    }

    /// Both fields set to [`UNAVAILABLE`].
    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE, UNAVAILABLE)
    }
}

impl Default for ImpactRating {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Participation category of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Permanent faculty ("DP"). Credit is split among these.
    #[serde(rename = "DP")]
    Permanent,
    /// Collaborating faculty ("DC").
    #[serde(rename = "DC")]
    Collaborator,
    /// Students ("DISC").
    #[serde(rename = "DISC")]
    Student,
}

impl Category {
    /// Roster code for this category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Permanent => "DP",
            Self::Collaborator => "DC",
            Self::Student => "DISC",
        }
    }

    /// Parse a roster code. Anything other than `DP`/`DC` is a student.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "DP" => Self::Permanent,
            "DC" => Self::Collaborator,
            _ => Self::Student,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// How many of an article's authors fall into each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCounts {
    pub permanent: u32,
    pub collaborator: u32,
    pub student: u32,
}

impl ParticipantCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Permanent => self.permanent += 1,
            Category::Collaborator => self.collaborator += 1,
            Category::Student => self.student += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.permanent + self.collaborator + self.student
    }
}

/// An article with its classification and participant counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub quality_tier: QualityTier,
    pub jcr: ImpactRating,
    pub sjr: ImpactRating,
    pub participants: ParticipantCounts,
}

/// Inclusive range of publication years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Build a range from optional bounds; a missing bound is open.
    pub fn from_bounds(start: Option<i32>, end: Option<i32>) -> Option<Self> {
        match (start, end) {
            (None, None) => None,
            (start, end) => Some(Self::new(
                start.unwrap_or(i32::MIN),
                end.unwrap_or(i32::MAX),
            )),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Weighted points for one publication year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyScore {
    pub year: i32,
    /// Points per tier; every tier is present.
    pub subscores: BTreeMap<QualityTier, f64>,
    pub total_a: f64,
    pub total_b: f64,
    pub total: f64,
    pub percent_a: f64,
    pub percent_b: f64,
}

/// A [`YearlyScore`] with non-finite values replaced by `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyScoreRow {
    pub year: i32,
    pub subscores: BTreeMap<QualityTier, Option<f64>>,
    pub total_a: Option<f64>,
    pub total_b: Option<f64>,
    pub total: Option<f64>,
    pub percent_a: Option<f64>,
    pub percent_b: Option<f64>,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Display name of the curriculum owner.
    pub owner_name: String,
    /// Enriched articles ordered by year.
    pub articles: Vec<EnrichedArticle>,
    /// One row per distinct year, ascending.
    pub yearly_scores: Vec<YearlyScoreRow>,
    /// Outcome message when the run produced no articles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Degraded lookups (unreadable tables and similar).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AnalysisReport {
    /// An empty report carrying only a message.
    pub fn with_message(owner_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            articles: Vec::new(),
            yearly_scores: Vec::new(),
            message: Some(message.into()),
            warnings: Vec::new(),
        }
    }
}
