//! Term-to-location resolution: cached lookup first, geocoder on a miss.
//!
//! Provider results from countries outside the allowed set are discarded
//! and never cached. Storage failures are fatal; provider failures are
//! surfaced as a distinct variant so callers can degrade gracefully.

use sqlx::PgPool;
use thiserror::Error;

use storefind_db::{find_locations, insert_location, GeoCacheRow, NewCachedLocation};
use storefind_nominatim::{GeocodeError, NominatimClient, Place};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("location cache query failed")]
    Storage(#[from] sqlx::Error),
    #[error("geocoding provider failed")]
    Provider(#[from] GeocodeError),
}

/// Resolve a free-text place term to location candidates.
///
/// A blank term resolves to no candidates without touching the cache or
/// the provider. On a cache miss the geocoder is queried, optionally with
/// a country hint when exactly one country is allowed, and each accepted
/// result is written back to the cache.
///
/// # Errors
///
/// [`ResolveError::Storage`] when a cache read or write fails,
/// [`ResolveError::Provider`] when the geocoder call fails.
pub async fn resolve_term(
    pool: &PgPool,
    client: &NominatimClient,
    allowed_countries: &[String],
    country_hint: Option<&str>,
    term: &str,
) -> Result<Vec<GeoCacheRow>, ResolveError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let cached = find_locations(pool, term, allowed_countries).await?;
    if !cached.is_empty() {
        tracing::debug!(term, hits = cached.len(), "location cache hit");
        return Ok(cached);
    }

    let places = client.search_free(term, country_hint).await?;
    tracing::debug!(term, results = places.len(), "geocoder queried");

    let mut resolved = Vec::new();
    for place in places {
        let Some(candidate) = accept_place(&place, allowed_countries) else {
            continue;
        };
        insert_location(pool, &candidate).await?;
        resolved.push(GeoCacheRow {
            id: candidate.id,
            zipcode: candidate.zipcode,
            city: candidate.city,
            state: candidate.state,
            country: candidate.country,
            country_code: candidate.country_code,
            suburb: candidate.suburb,
            lon: candidate.lon,
            lat: candidate.lat,
            licence: candidate.licence,
        });
    }

    Ok(resolved)
}

/// Turn a provider place into a cacheable record, or `None` when its
/// country is not allowed or its coordinates are unparseable.
fn accept_place(place: &Place, allowed_countries: &[String]) -> Option<NewCachedLocation> {
    let country_code = place.country_code()?.to_lowercase();
    if !allowed_countries.contains(&country_code) {
        return None;
    }
    let point = place.geo_point()?;

    Some(NewCachedLocation {
        id: place.place_id,
        zipcode: place.address.postcode.clone(),
        city: place.city().map(ToOwned::to_owned),
        state: place.address.state.clone(),
        country: place.address.country.clone(),
        country_code,
        suburb: place.address.suburb.clone(),
        lon: point.lon,
        lat: point.lat,
        licence: place.licence.clone(),
    })
}
