//! Yearly weighted scoring.
//!
//! Each article is worth the weight of its journal tier, split evenly among
//! the permanent faculty who co-authored it.

use crate::types::{EnrichedArticle, QualityTier, YearlyScore};
use std::collections::BTreeMap;

/// Weight of one article in a journal of the given tier.
pub fn weight(tier: QualityTier) -> f64 {
    match tier {
        QualityTier::A1 => 1.0,
        QualityTier::A2 => 0.9,
        QualityTier::A3 => 0.75,
        QualityTier::A4 => 0.6,
        QualityTier::B1 => 0.4,
        QualityTier::B2 => 0.3,
        QualityTier::B3 => 0.15,
        QualityTier::B4 => 0.05,
        QualityTier::C | QualityTier::NotClassified => 0.0,
    }
}

/// Points credited for one article.
///
/// An article with no permanent co-author keeps its full weight.
pub fn article_points(tier: QualityTier, permanent: u32) -> f64 {
    weight(tier) / f64::from(permanent.max(1))
}

fn empty_subscores() -> BTreeMap<QualityTier, f64> {
    QualityTier::ALL.into_iter().map(|tier| (tier, 0.0)).collect()
}

/// Sum points per year and tier, one entry per distinct year, ascending.
pub fn score_by_year(articles: &[EnrichedArticle]) -> Vec<YearlyScore> {
    let mut by_year: BTreeMap<i32, BTreeMap<QualityTier, f64>> = BTreeMap::new();
    for enriched in articles {
        let points = article_points(enriched.quality_tier, enriched.participants.permanent);
        *by_year
            .entry(enriched.article.year)
            .or_insert_with(empty_subscores)
            .entry(enriched.quality_tier)
            .or_insert(0.0) += points;
    }

    by_year
        .into_iter()
        .map(|(year, subscores)| {
            let total_a: f64 = subscores.iter().filter(|(t, _)| t.is_band_a()).map(|(_, p)| p).sum();
            let total_b: f64 = subscores.iter().filter(|(t, _)| t.is_band_b()).map(|(_, p)| p).sum();
            let total = total_a + total_b;
            let (percent_a, percent_b) = if total > 0.0 {
                (100.0 * total_a / total, 100.0 * total_b / total)
            } else {
                (0.0, 0.0)
            };
            YearlyScore {
                year,
                subscores,
                total_a,
                total_b,
                total,
                percent_a,
                percent_b,
            }
        })
        .collect()
}
