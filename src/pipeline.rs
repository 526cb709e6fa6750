//! End-to-end analysis of one curriculum.
//!
//! Articles are extracted, enriched in parallel (journal lookups and author
//! attribution are independent per article), scored by year, and the scores
//! are sanitized for serialization.

use crate::archive::{extract_xml, InputFormat};
use crate::error::{Result, ScoreError};
use crate::parse::{extract_articles, owner_name, parse_curriculum, CurriculumDocument, DEFAULT_OWNER_NAME};
use crate::resolve::ReferenceTables;
use crate::roster::{classify_authors, AuthorMatcher, ContainmentMatcher};
use crate::scoring::score_by_year;
use crate::types::{AnalysisReport, Article, EnrichedArticle, QualityTier, YearRange, YearlyScore, YearlyScoreRow};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Message of a run that found nothing to score.
pub const NO_ARTICLES_MESSAGE: &str = "No articles found.";

/// Analyze a parsed curriculum with the default author matcher.
pub fn run_pipeline(
    document: &CurriculumDocument,
    tables: &ReferenceTables,
    year_range: Option<YearRange>,
) -> AnalysisReport {
    run_pipeline_with(document, tables, year_range, &ContainmentMatcher)
}

/// Analyze a parsed curriculum with a custom author matcher.
#[tracing::instrument(skip_all, fields(articles = document.articles.len()))]
pub fn run_pipeline_with(
    document: &CurriculumDocument,
    tables: &ReferenceTables,
    year_range: Option<YearRange>,
    matcher: &dyn AuthorMatcher,
) -> AnalysisReport {
    let owner = owner_name(document);
    let articles = extract_articles(document, year_range);

    if articles.is_empty() {
        info!(owner = %owner, "No articles to score");
        let mut report = AnalysisReport::with_message(owner, NO_ARTICLES_MESSAGE);
        report.warnings = tables.warnings.clone();
        return report;
    }

    let enriched: Vec<EnrichedArticle> = articles
        .into_par_iter()
        .map(|article| enrich(article, tables, matcher))
        .collect();

    let unclassified = enriched
        .iter()
        .filter(|a| a.quality_tier == QualityTier::NotClassified)
        .count();
    debug!(unclassified, "Journal tier lookups missed");

    let yearly_scores: Vec<YearlyScoreRow> = score_by_year(&enriched).into_iter().map(sanitize).collect();

    info!(
        owner = %owner,
        articles = enriched.len(),
        years = yearly_scores.len(),
        "Scored curriculum"
    );

    AnalysisReport {
        owner_name: owner,
        articles: enriched,
        yearly_scores,
        message: None,
        warnings: tables.warnings.clone(),
    }
}

/// Attach journal classification and participant counts to one article.
pub fn enrich(article: Article, tables: &ReferenceTables, matcher: &dyn AuthorMatcher) -> EnrichedArticle {
    let identifier = &article.journal_identifier;
    let quality_tier = tables.quality.lookup(identifier);
    let jcr = tables.jcr.lookup(identifier);
    let sjr = tables.sjr.lookup(identifier);
    let participants = classify_authors(&article.authors_joined(), &tables.roster, matcher);

    EnrichedArticle {
        article,
        quality_tier,
        jcr,
        sjr,
        participants,
    }
}

/// Replace non-finite values with `None`.
pub fn sanitize(score: YearlyScore) -> YearlyScoreRow {
    fn finite(value: f64) -> Option<f64> {
        value.is_finite().then_some(value)
    }

    YearlyScoreRow {
        year: score.year,
        subscores: score
            .subscores
            .into_iter()
            .map(|(tier, points)| (tier, finite(points)))
            .collect(),
        total_a: finite(score.total_a),
        total_b: finite(score.total_b),
        total: finite(score.total),
        percent_a: finite(score.percent_a),
        percent_b: finite(score.percent_b),
    }
}

/// Analyze an uploaded file given its name and contents.
///
/// Only an unsupported file extension is an error. An unreadable archive or
/// malformed XML produces a report with no articles whose message starts with
/// [`NO_ARTICLES_MESSAGE`] and then describes the failure.
#[tracing::instrument(skip(bytes, tables), fields(size = bytes.len()))]
pub fn analyze_input(
    file_name: &str,
    bytes: &[u8],
    tables: &ReferenceTables,
    year_range: Option<YearRange>,
) -> Result<AnalysisReport> {
    let format = InputFormat::from_file_name(file_name)?;

    let document = match format {
        InputFormat::Zip => extract_xml(bytes).and_then(|xml| parse_curriculum(&xml)),
        InputFormat::Xml => parse_curriculum(bytes),
    };

    match document {
        Ok(document) => Ok(run_pipeline(&document, tables, year_range)),
        Err(e @ (ScoreError::Archive(_) | ScoreError::Parse(_) | ScoreError::Io(_))) => {
            warn!(error = %e, "Curriculum could not be read");
            let message = format!("{} {}", NO_ARTICLES_MESSAGE, e);
            let mut report = AnalysisReport::with_message(DEFAULT_OWNER_NAME, message);
            report.warnings = tables.warnings.clone();
            Ok(report)
        }
        Err(e) => Err(e),
    }
}
