//! Merchant ranking over a fetched candidate set.
//!
//! With a resolved origin the candidates are filtered to a radius, sorted by
//! great-circle distance, and each result carries its distance. Without an
//! origin the fallback order is (priority desc, highlight desc, company asc).
//! Pagination applies after filtering and sorting; `total` counts matches
//! before pagination. All state is request-scoped and returned to the caller.

use std::cmp::Ordering;

use crate::geo::{distance_km, GeoPoint};
use crate::merchant::Merchant;

/// Request-scoped ranking parameters.
#[derive(Debug, Clone, Copy)]
pub struct RankParams {
    pub origin: Option<GeoPoint>,
    /// Inclusive radius in kilometers; ignored when `origin` is `None`.
    pub radius_km: f64,
    pub limit: usize,
    pub offset: usize,
}

/// A ranked merchant with its computed distance when location-based.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedMerchant {
    #[serde(flatten)]
    pub merchant: Merchant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// The ordered result of one ranking call.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub merchants: Vec<RankedMerchant>,
    /// Matches before limit/offset were applied.
    pub total: usize,
}

/// Rank `candidates` according to `params`.
#[must_use]
pub fn rank_merchants(candidates: Vec<Merchant>, params: &RankParams) -> RankedResult {
    let ranked: Vec<RankedMerchant> = match params.origin {
        Some(origin) => {
            let mut within: Vec<RankedMerchant> = candidates
                .into_iter()
                .map(|merchant| {
                    let distance = distance_km(origin, merchant.location());
                    RankedMerchant {
                        merchant,
                        distance: Some(distance),
                    }
                })
                .filter(|r| r.distance.is_some_and(|d| d <= params.radius_km))
                .collect();
            within.sort_by(|a, b| {
                // Distances are finite here; clamped acos cannot yield NaN.
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(Ordering::Equal)
            });
            within
        }
        None => {
            let mut all: Vec<Merchant> = candidates;
            all.sort_by(compare_by_attributes);
            all.into_iter()
                .map(|merchant| RankedMerchant {
                    merchant,
                    distance: None,
                })
                .collect()
        }
    };

    let total = ranked.len();
    let merchants = ranked
        .into_iter()
        .skip(params.offset)
        .take(params.limit)
        .collect();

    RankedResult { merchants, total }
}

fn compare_by_attributes(a: &Merchant, b: &Merchant) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.highlight.cmp(&a.highlight))
        .then_with(|| a.company.cmp(&b.company))
}
