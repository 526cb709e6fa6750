//! Journal classification lookups against the Qualis, JCR and SJR tables.
//!
//! Each table is indexed once by normalized ISSN. When several rows share an
//! identifier the first row in table order wins.

use crate::config::{delimiter_byte, Config, JcrTableConfig, QualityTableConfig, SjrTableConfig};
use crate::error::{Result, ScoreError};
use crate::identifier::{format_decimal, format_identifier, normalize_identifier, parse_decimal, split_identifier_list};
use crate::roster::Roster;
use crate::tables::Table;
use crate::types::{ImpactRating, QualityTier, UNAVAILABLE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// One Qualis row.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityEntry {
    pub identifier: String,
    pub tier: QualityTier,
}

/// One JCR row.
#[derive(Debug, Clone, PartialEq)]
pub struct JcrEntry {
    pub identifier: String,
    pub alt_identifier: String,
    pub score: String,
    pub quartile: String,
}

/// One SJR row; a journal may list several ISSNs.
#[derive(Debug, Clone, PartialEq)]
pub struct SjrEntry {
    pub identifier_list: Vec<String>,
    pub score: String,
    pub quartile: String,
}

/// Insert `key → row` unless the key is empty or already taken.
fn index_first(index: &mut HashMap<String, usize>, key: &str, row: usize) {
    if !key.is_empty() {
        index.entry(key.to_string()).or_insert(row);
    }
}

fn non_empty_or_unavailable(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Qualis tiers by ISSN.
#[derive(Debug, Clone, Default)]
pub struct QualityTable {
    entries: Vec<QualityEntry>,
    index: HashMap<String, usize>,
}

impl QualityTable {
    pub fn from_entries(entries: Vec<QualityEntry>) -> Self {
        let mut index = HashMap::new();
        for (row, entry) in entries.iter().enumerate() {
            index_first(&mut index, &normalize_identifier(&entry.identifier), row);
        }
        Self { entries, index }
    }

    pub fn from_table(table: &Table, config: &QualityTableConfig) -> Result<Self> {
        let identifier = table.require_column(&config.identifier_column)?;
        let tier = table.require_column(&config.tier_column)?;
        let entries = (0..table.len())
            .map(|row| QualityEntry {
                identifier: table.cell(row, identifier).to_string(),
                tier: QualityTier::from_str_loose(table.cell(row, tier)),
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    /// Tier for an ISSN, or [`QualityTier::NotClassified`].
    pub fn lookup(&self, identifier: &str) -> QualityTier {
        self.index
            .get(&normalize_identifier(identifier))
            .map(|&row| self.entries[row].tier)
            .unwrap_or(QualityTier::NotClassified)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// JCR impact factors, matched on print or electronic ISSN.
#[derive(Debug, Clone, Default)]
pub struct JcrTable {
    entries: Vec<JcrEntry>,
    index: HashMap<String, usize>,
}

impl JcrTable {
    pub fn from_entries(entries: Vec<JcrEntry>) -> Self {
        let mut index = HashMap::new();
        for (row, entry) in entries.iter().enumerate() {
            index_first(&mut index, &normalize_identifier(&entry.identifier), row);
            index_first(&mut index, &normalize_identifier(&entry.alt_identifier), row);
        }
        Self { entries, index }
    }

    /// Numeric scores are rendered with two decimals and a decimal comma.
    pub fn from_table(table: &Table, config: &JcrTableConfig) -> Result<Self> {
        let identifier = table.require_column(&config.identifier_column)?;
        let alt_identifier = table.require_column(&config.alt_identifier_column)?;
        let score = table.require_column(&config.score_column)?;
        let quartile = table.require_column(&config.quartile_column)?;

        let entries = (0..table.len())
            .map(|row| {
                let raw_score = table.cell(row, score);
                JcrEntry {
                    identifier: table.cell(row, identifier).to_string(),
                    alt_identifier: table.cell(row, alt_identifier).to_string(),
                    score: parse_decimal(raw_score)
                        .map(|value| format_decimal(value, 2))
                        .unwrap_or_else(|| non_empty_or_unavailable(raw_score)),
                    quartile: non_empty_or_unavailable(table.cell(row, quartile)),
                }
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    pub fn lookup(&self, identifier: &str) -> ImpactRating {
        self.index
            .get(&normalize_identifier(identifier))
            .map(|&row| {
                let entry = &self.entries[row];
                ImpactRating::new(entry.score.clone(), entry.quartile.clone())
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SCImago journal rank, matched against each row's ISSN list.
#[derive(Debug, Clone, Default)]
pub struct SjrTable {
    entries: Vec<SjrEntry>,
    index: HashMap<String, usize>,
}

impl SjrTable {
    pub fn from_entries(entries: Vec<SjrEntry>) -> Self {
        let mut index = HashMap::new();
        for (row, entry) in entries.iter().enumerate() {
            for identifier in &entry.identifier_list {
                index_first(&mut index, &normalize_identifier(identifier), row);
            }
        }
        Self { entries, index }
    }

    pub fn from_table(table: &Table, config: &SjrTableConfig) -> Result<Self> {
        let identifiers = table.require_column(&config.identifiers_column)?;
        let score = table.require_column(&config.score_column)?;
        let quartile = table.require_column(&config.quartile_column)?;

        let entries = (0..table.len())
            .map(|row| SjrEntry {
                identifier_list: split_identifier_list(table.cell(row, identifiers)),
                score: non_empty_or_unavailable(table.cell(row, score)),
                quartile: non_empty_or_unavailable(table.cell(row, quartile)),
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    pub fn lookup(&self, identifier: &str) -> ImpactRating {
        self.index
            .get(&normalize_identifier(identifier))
            .map(|&row| {
                let entry = &self.entries[row];
                ImpactRating::new(entry.score.clone(), entry.quartile.clone())
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a pipeline run reads besides the curriculum itself.
///
/// Shared read-only across the per-article workers.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub quality: QualityTable,
    pub jcr: JcrTable,
    pub sjr: SjrTable,
    pub roster: Roster,
    /// Tables that failed to load and were replaced by empty ones.
    pub warnings: Vec<String>,
}

impl ReferenceTables {
    /// Read all four tables concurrently.
    ///
    /// A table that cannot be read or lacks a required column is replaced by
    /// an empty one, so its lookups miss instead of failing the run.
    pub async fn load(config: &Config) -> Self {
        let (qualis, jcr, sjr, roster) = tokio::join!(
            read_table("qualis", config.table_path(&config.qualis.file), config.qualis.delimiter),
            read_table("jcr", config.table_path(&config.jcr.file), config.jcr.delimiter),
            read_table("sjr", config.table_path(&config.sjr.file), config.sjr.delimiter),
            read_table("roster", config.table_path(&config.roster.file), config.roster.delimiter),
        );

        let mut warnings = Vec::new();
        let quality = or_degraded(
            qualis.and_then(|t| QualityTable::from_table(&t, &config.qualis)),
            &mut warnings,
        );
        let jcr = or_degraded(jcr.and_then(|t| JcrTable::from_table(&t, &config.jcr)), &mut warnings);
        let sjr = or_degraded(sjr.and_then(|t| SjrTable::from_table(&t, &config.sjr)), &mut warnings);
        let roster = or_degraded(
            roster.and_then(|t| Roster::from_table(&t, &config.roster)),
            &mut warnings,
        );

        info!(
            qualis = quality.len(),
            jcr = jcr.len(),
            sjr = sjr.len(),
            roster = roster.len(),
            "Loaded reference tables"
        );

        Self {
            quality,
            jcr,
            sjr,
            roster,
            warnings,
        }
    }

    /// Classify a single ISSN against all three tables.
    pub fn classify_journal(&self, identifier: &str) -> JournalClassification {
        JournalClassification {
            identifier: format_identifier(identifier),
            quality_tier: self.quality.lookup(identifier),
            jcr: self.jcr.lookup(identifier),
            sjr: self.sjr.lookup(identifier),
        }
    }
}

/// Classification of one journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalClassification {
    /// ISSN formatted as `XXXX-XXXX` when well-formed.
    pub identifier: String,
    pub quality_tier: QualityTier,
    pub jcr: ImpactRating,
    pub sjr: ImpactRating,
}

async fn read_table(name: &str, path: PathBuf, delimiter: char) -> Result<Table> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ScoreError::table(name, format!("cannot read {}: {}", path.display(), e)))?;
    Table::read(name, &bytes, delimiter_byte(delimiter)?)
}

fn or_degraded<T: Default>(result: Result<T>, warnings: &mut Vec<String>) -> T {
    match result {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "Reference table unavailable, its lookups will miss");
            warnings.push(e.to_string());
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn qualis() -> QualityTable {
        let table = Table::read(
            "qualis",
            b"ISSN,Titulo,Estrato\n1234-5678,Journal A,A1\n0950-0618,Constr Build Mater,A1\n1234-5678,Journal A dup,B2\n9999-0000,Weird,Z9\n",
            b',',
        )
        .unwrap();
        QualityTable::from_table(&table, &QualityTableConfig::default()).unwrap()
    }

    #[test]
    fn test_quality_lookup_ignores_hyphens() {
        let table = qualis();
        assert_eq!(table.lookup("1234-5678"), QualityTier::A1);
        assert_eq!(table.lookup("12345678"), QualityTier::A1);
        assert_eq!(table.lookup(" 09500618 "), QualityTier::A1);
    }

    #[test]
    fn test_quality_first_row_wins() {
        assert_eq!(qualis().lookup("12345678"), QualityTier::A1);
    }

    #[test]
    fn test_quality_miss_and_unknown_tier() {
        let table = qualis();
        assert_eq!(table.lookup("00000000"), QualityTier::NotClassified);
        assert_eq!(table.lookup("99990000"), QualityTier::NotClassified);
        assert_eq!(table.lookup("none"), QualityTier::NotClassified);
    }

    #[test]
    fn test_jcr_matches_either_column() {
        let table = Table::read(
            "jcr",
            b"Journal name,ISSN,eISSN,2023 JIF,JIF Quartile\nCement Concr Res,0008-8846,1873-3948,10.9,Q1\nNo eISSN,1111-2222,,1.234,Q3\n",
            b',',
        )
        .unwrap();
        let jcr = JcrTable::from_table(&table, &JcrTableConfig::default()).unwrap();

        assert_eq!(jcr.lookup("00088846"), ImpactRating::new("10,90", "Q1"));
        assert_eq!(jcr.lookup("1873-3948"), ImpactRating::new("10,90", "Q1"));
        assert_eq!(jcr.lookup("11112222"), ImpactRating::new("1,23", "Q3"));
        assert_eq!(jcr.lookup("22223333"), ImpactRating::unavailable());
    }

    #[test]
    fn test_rows_missing_trailing_cells_still_match() {
        let table = Table::read("qualis", b"ISSN,Estrato,Area\n1234-5678,A1\n", b',').unwrap();
        let quality = QualityTable::from_table(&table, &QualityTableConfig::default()).unwrap();
        assert_eq!(quality.lookup("12345678"), QualityTier::A1);

        let table = Table::read(
            "jcr",
            b"Journal name,ISSN,eISSN,2023 JIF,JIF Quartile,Category\nCement Concr Res,0008-8846,1873-3948,10.9,Q1\n",
            b',',
        )
        .unwrap();
        let jcr = JcrTable::from_table(&table, &JcrTableConfig::default()).unwrap();
        assert_eq!(jcr.lookup("0008-8846"), ImpactRating::new("10,90", "Q1"));
    }

    #[test]
    fn test_jcr_non_numeric_score_is_kept() {
        let jcr = JcrTable::from_entries(vec![JcrEntry {
            identifier: "12345678".into(),
            alt_identifier: String::new(),
            score: "N/A".into(),
            quartile: "Q2".into(),
        }]);
        assert_eq!(jcr.lookup("1234-5678").score, "N/A");

        let table = Table::read("jcr", b"ISSN,eISSN,2023 JIF,JIF Quartile\n1111-2222,,NaN,Q4\n", b',').unwrap();
        let jcr = JcrTable::from_table(&table, &JcrTableConfig::default()).unwrap();
        assert_eq!(jcr.lookup("11112222").score, "NaN");
    }

    #[test]
    fn test_sjr_matches_any_listed_identifier() {
        let table = Table::read(
            "sjr",
            b"Rank;Title;Issn;SJR;SJR Best Quartile\n1;Ca Cancer J Clin;15424863, 00079235;62,937;Q1\n2;Other;19834195;0,250;Q4\n",
            b';',
        )
        .unwrap();
        let sjr = SjrTable::from_table(&table, &SjrTableConfig::default()).unwrap();

        assert_eq!(sjr.lookup("0007-9235"), ImpactRating::new("62,937", "Q1"));
        assert_eq!(sjr.lookup("15424863"), ImpactRating::new("62,937", "Q1"));
        assert_eq!(sjr.lookup("1983-4195"), ImpactRating::new("0,250", "Q4"));
        assert_eq!(sjr.lookup("0007"), ImpactRating::unavailable());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = Table::read("sjr", b"Issn;SJR\n1;2\n", b';').unwrap();
        let err = SjrTable::from_table(&table, &SjrTableConfig::default()).unwrap_err();
        assert!(err.to_string().contains("SJR Best Quartile"));
    }

    #[test]
    fn test_classify_journal_formats_identifier() {
        let tables = ReferenceTables {
            quality: qualis(),
            ..Default::default()
        };
        let result = tables.classify_journal("12345678");
        assert_eq!(result.identifier, "1234-5678");
        assert_eq!(result.quality_tier, QualityTier::A1);
        assert_eq!(result.jcr, ImpactRating::unavailable());
        assert_eq!(result.sjr, ImpactRating::unavailable());
    }

    #[tokio::test]
    async fn test_load_degrades_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut qualis = std::fs::File::create(dir.path().join("qualis.csv")).unwrap();
        writeln!(qualis, "ISSN,Estrato\n1234-5678,A2").unwrap();

        let config = Config::default().with_data_dir(dir.path());
        let tables = ReferenceTables::load(&config).await;

        assert_eq!(tables.quality.lookup("12345678"), QualityTier::A2);
        assert!(tables.jcr.is_empty());
        assert!(tables.sjr.is_empty());
        assert!(tables.roster.is_empty());
        assert_eq!(tables.warnings.len(), 3);
    }
}
