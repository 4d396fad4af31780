//! Top-N selection and sort presets for company metrics.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pipelens_shared::PipelensError;

use crate::metrics::{CompanyMetrics, round1, rounded};

/// A company's place in the composite-score ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCompany {
    pub rank: usize,
    pub company: String,
    pub score: f64,
    pub offers: usize,
    #[serde(serialize_with = "rounded")]
    pub offer_rate: f64,
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// The `n` best companies by `offers * 0.7 + offer_rate * 0.3`.
///
/// Equal scores keep input order.
pub fn rank_by_score(metrics: &[CompanyMetrics], n: usize) -> Vec<RankedCompany> {
    let mut scored: Vec<(&CompanyMetrics, f64)> = metrics.iter().map(|m| (m, m.score())).collect();
    scored.sort_by(|a, b| descending(a.1, b.1));
    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (m, score))| RankedCompany {
            rank: i + 1,
            company: m.company.clone(),
            score: round1(score),
            offers: m.offers,
            offer_rate: m.offer_rate,
        })
        .collect()
}

/// The `n` companies with the highest offer rate, ties in input order.
pub fn top_by_offer_rate(metrics: &[CompanyMetrics], n: usize) -> Vec<&CompanyMetrics> {
    let mut sorted: Vec<&CompanyMetrics> = metrics.iter().collect();
    sorted.sort_by(|a, b| descending(a.offer_rate, b.offer_rate));
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// Sort presets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Named orderings for the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPreset {
    #[default]
    Offers,
    OfferRate,
    Recommendations,
    DocumentPassRate,
    FirstRoundPassRate,
    Cycle,
    Company,
}

impl SortPreset {
    pub const ALL: [SortPreset; 7] = [
        Self::Offers,
        Self::OfferRate,
        Self::Recommendations,
        Self::DocumentPassRate,
        Self::FirstRoundPassRate,
        Self::Cycle,
        Self::Company,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Offers => "offers",
            Self::OfferRate => "offer-rate",
            Self::Recommendations => "recommendations",
            Self::DocumentPassRate => "document-pass-rate",
            Self::FirstRoundPassRate => "first-round-pass-rate",
            Self::Cycle => "cycle",
            Self::Company => "company",
        }
    }

    /// Direction used when the caller does not override it.
    pub fn default_order(self) -> SortOrder {
        match self {
            Self::Cycle | Self::Company => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn compare(self, a: &CompanyMetrics, b: &CompanyMetrics) -> Ordering {
        let by_f64 = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        match self {
            Self::Offers => a.offers.cmp(&b.offers),
            Self::OfferRate => by_f64(a.offer_rate, b.offer_rate),
            Self::Recommendations => a.recommendations.cmp(&b.recommendations),
            Self::DocumentPassRate => by_f64(a.document_pass_rate, b.document_pass_rate),
            Self::FirstRoundPassRate => by_f64(a.first_round_pass_rate, b.first_round_pass_rate),
            Self::Cycle => a.avg_cycle_days.cmp(&b.avg_cycle_days),
            Self::Company => a.company.cmp(&b.company),
        }
    }
}

impl std::fmt::Display for SortPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortPreset {
    type Err = PipelensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                PipelensError::validation(format!(
                    "unknown sort preset '{s}' (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

/// Sort metrics rows in place. Stable, so equal keys keep first-appearance order.
pub fn sort_metrics(metrics: &mut [CompanyMetrics], preset: SortPreset, order: Option<SortOrder>) {
    let order = order.unwrap_or_else(|| preset.default_order());
    metrics.sort_by(|a, b| {
        let ord = preset.compare(a, b);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}
