//! The merchant finder endpoints: ranked proximity search and merchant pick.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefind_core::{rank_merchants, GeoPoint, Merchant, RankParams, RankedMerchant};
use storefind_db::{
    find_candidates, get_merchant, upsert_pick, GeoCacheRow, MerchantFilter, Visibility,
};

use crate::events::MerchantsLoaded;
use crate::middleware::RequestId;
use crate::resolver::{resolve_term, ResolveError};

use super::{map_db_error, ApiError, AppState, ResponseMeta};

const MAX_RADIUS_KM: f64 = 1_000.0;
const MAX_PAGE_SIZE: usize = 500;

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Storefront search body. Field names follow the shop frontend's camelCase
/// conventions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct SearchRequest {
    /// `"pick"` selects a merchant; anything else runs a ranked search.
    pub action: Option<String>,
    /// Merchant id, required when `action` is `"pick"`.
    pub merchant: Option<Uuid>,
    /// When present, a pick is persisted for this customer.
    pub customer_id: Option<Uuid>,
    /// Location query text; `zipcode` wins over `term` when both are set.
    pub zipcode: Option<String>,
    pub term: Option<String>,
    /// Free-text merchant name filter, independent of the location query.
    pub search: Option<String>,
    /// Explicit origin; skips geocoding entirely.
    pub location: Option<GeoPoint>,
    /// Radius in kilometers.
    pub distance: Option<f64>,
    /// Page size.
    pub items: Option<usize>,
    pub offset: Option<usize>,
    pub country_code: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_manufacturer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    /// Subset of `isHighlighted`, `hasPriority`, `hasLogo`.
    #[serde(default)]
    pub rules: Vec<String>,
    pub sales_channel_id: Option<Uuid>,
    pub customer_group_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SearchResponse {
    pub data: Vec<RankedMerchant>,
    pub loc: Vec<LocationCandidate>,
    pub total: usize,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct PickResponse {
    pub reload: bool,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SuggestResponse {
    pub data: Vec<RankedMerchant>,
    pub meta: ResponseMeta,
}

/// A resolved location candidate as presented to the storefront.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct LocationCandidate {
    pub id: i64,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub suburb: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl From<GeoCacheRow> for LocationCandidate {
    fn from(row: GeoCacheRow) -> Self {
        Self {
            id: row.id,
            zipcode: row.zipcode,
            city: row.city,
            state: row.state,
            country: row.country,
            country_code: row.country_code,
            suburb: row.suburb,
            lat: row.lat,
            lon: row.lon,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /merchant-finder/search — pick a merchant or run a ranked search.
pub(in crate::api) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SearchRequest>,
) -> Result<axum::response::Response, ApiError> {
    use axum::response::IntoResponse;

    if body.action.as_deref() == Some("pick") {
        return pick_merchant(&state, &req_id.0, &body)
            .await
            .map(|r| Json(r).into_response());
    }

    ranked_search(&state, &req_id.0, body)
        .await
        .map(|r| Json(r).into_response())
}

/// POST /merchant-finder/suggest — autocomplete seam, currently empty.
pub(in crate::api) async fn suggest(
    Extension(req_id): Extension<RequestId>,
    Json(_body): Json<SearchRequest>,
) -> Json<SuggestResponse> {
    Json(SuggestResponse {
        data: Vec::new(),
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn pick_merchant(
    state: &AppState,
    rid: &str,
    body: &SearchRequest,
) -> Result<PickResponse, ApiError> {
    let Some(merchant_id) = body.merchant else {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "'merchant' is required when action is 'pick'",
        ));
    };

    let merchant = get_merchant(&state.pool, merchant_id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;
    if merchant.is_none() {
        return Err(ApiError::new(rid, "not_found", "merchant not found"));
    }

    if let Some(customer_id) = body.customer_id {
        upsert_pick(&state.pool, customer_id, merchant_id)
            .await
            .map_err(|e| map_db_error(rid.to_owned(), &e))?;
        tracing::info!(%customer_id, %merchant_id, "merchant pick stored");
    }

    Ok(PickResponse {
        reload: true,
        meta: ResponseMeta::new(rid.to_owned()),
    })
}

async fn ranked_search(
    state: &AppState,
    rid: &str,
    body: SearchRequest,
) -> Result<SearchResponse, ApiError> {
    let config = &state.config;

    let radius_km = effective_radius(rid, config.default_radius_km, &body, config.filter_radius_enabled)?;
    let limit = body
        .items
        .unwrap_or(config.default_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = body.offset.unwrap_or(0);

    // Explicit coordinates win; otherwise geocode the place text.
    let mut locations: Vec<GeoCacheRow> = Vec::new();
    let origin: Option<GeoPoint> = if let Some(location) = body.location {
        Some(location)
    } else {
        let term = location_term(&body);
        match resolve_term(
            &state.pool,
            &state.geocoder,
            &config.allowed_country_codes,
            config.single_country_hint(),
            term,
        )
        .await
        {
            Ok(resolved) => {
                locations = resolved;
                locations.first().map(GeoCacheRow::geo_point)
            }
            Err(ResolveError::Storage(e)) => {
                return Err(map_db_error(rid.to_owned(), &e));
            }
            Err(ResolveError::Provider(e)) => {
                // Geocoding is best effort; fall back to attribute ranking.
                tracing::warn!(error = %e, "geocoding failed, ranking without location");
                None
            }
        }
    };

    let filter = build_filter(&body, config);
    let candidates = find_candidates(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;
    let merchants: Vec<Merchant> = candidates.into_iter().map(Into::into).collect();

    let ranked = rank_merchants(
        merchants,
        &RankParams {
            origin,
            radius_km,
            limit,
            offset,
        },
    );

    state.events.publish(MerchantsLoaded {
        request_id: rid.to_owned(),
        merchant_ids: ranked.merchants.iter().map(|r| r.merchant.id).collect(),
        total: ranked.total,
        distance_ranked: origin.is_some(),
    });

    Ok(SearchResponse {
        data: ranked.merchants,
        loc: locations.into_iter().map(Into::into).collect(),
        total: ranked.total,
        meta: ResponseMeta::new(rid.to_owned()),
    })
}

// ---------------------------------------------------------------------------
// Parameter shaping
// ---------------------------------------------------------------------------

fn effective_radius(
    rid: &str,
    default_radius_km: f64,
    body: &SearchRequest,
    radius_filter_enabled: bool,
) -> Result<f64, ApiError> {
    if !radius_filter_enabled {
        return Ok(default_radius_km);
    }
    match body.distance {
        None => Ok(default_radius_km),
        Some(distance) if distance.is_finite() && distance > 0.0 => {
            Ok(distance.min(MAX_RADIUS_KM))
        }
        Some(distance) => Err(ApiError::new(
            rid,
            "validation_error",
            format!("'distance' must be a positive number of kilometers, got {distance}"),
        )),
    }
}

fn location_term(body: &SearchRequest) -> &str {
    [body.zipcode.as_deref(), body.term.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or("")
}

fn build_filter(body: &SearchRequest, config: &storefind_core::AppConfig) -> MerchantFilter {
    let rule = |name: &str| body.rules.iter().any(|r| r == name);

    MerchantFilter {
        country_code: config
            .filter_country_enabled
            .then(|| body.country_code.clone())
            .flatten()
            .map(|c| c.to_lowercase()),
        category_id: body.category_id,
        manufacturer_id: config
            .filter_manufacturer_enabled
            .then_some(body.product_manufacturer_id)
            .flatten(),
        product_id: body.product_id,
        tag_ids: if config.filter_tags_enabled {
            body.tags.clone()
        } else {
            Vec::new()
        },
        term: body.search.clone(),
        is_highlighted: rule("isHighlighted"),
        has_priority: rule("hasPriority"),
        has_logo: rule("hasLogo"),
        visibility: Visibility {
            sales_channel_id: body.sales_channel_id,
            customer_group_id: body.customer_group_id,
        },
    }
}
