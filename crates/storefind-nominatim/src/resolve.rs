//! Structured-address geocoding with a relaxation ladder.
//!
//! When the full address yields no result, the query is relaxed one step at a
//! time through a fixed, ordered list of transforms until the provider
//! answers or the ladder is exhausted. A transport or provider error aborts
//! the whole resolution and surfaces typed; the caller decides whether to
//! degrade.

use std::time::Duration;

use storefind_core::GeoPoint;

use crate::client::NominatimClient;
use crate::error::GeocodeError;
use crate::types::AddressQuery;

/// Number of relaxation steps after the initial full-address attempt.
pub const MAX_RELAXATIONS: usize = 4;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// The ordered relaxation steps, least destructive first. Applied one per
/// retry after an empty provider result.
fn relaxations() -> [fn(&mut AddressQuery); MAX_RELAXATIONS] {
    [
        // 1: most shops here are German; a missing country often means one.
        |q| q.country_iso = Some("de".to_string()),
        // 2: let the provider pick the country.
        |q| q.country_iso = None,
        // 3: unknown street names are the most common geocoding miss.
        |q| {
            q.street = None;
            q.street_number = None;
        },
        // 4: fall back to city-only.
        |q| q.zipcode = None,
    ]
}

/// Resolve a structured address to coordinates, relaxing the query on empty
/// results. Waits one second between attempts to stay within the public
/// provider's rate expectations.
///
/// Returns `Ok(None)` when every attempt came back empty.
///
/// # Errors
///
/// Returns the underlying [`GeocodeError`] as soon as any attempt fails;
/// no further relaxation is tried.
pub async fn resolve_address(
    client: &NominatimClient,
    query: AddressQuery,
) -> Result<Option<GeoPoint>, GeocodeError> {
    resolve_address_with_delay(client, query, RETRY_DELAY).await
}

/// [`resolve_address`] with an injectable inter-attempt delay, so tests can
/// run the full ladder without sleeping.
///
/// # Errors
///
/// Same as [`resolve_address`].
pub async fn resolve_address_with_delay(
    client: &NominatimClient,
    query: AddressQuery,
    delay: Duration,
) -> Result<Option<GeoPoint>, GeocodeError> {
    let mut query = query;
    let steps = relaxations();

    for attempt in 0..=MAX_RELAXATIONS {
        let places = client.search_address(&query).await?;
        if let Some(place) = places.first() {
            tracing::debug!(attempt, place_id = place.place_id, "address resolved");
            return Ok(place.geo_point());
        }

        let Some(step) = steps.get(attempt) else {
            break;
        };
        tracing::debug!(attempt, "empty geocoder result, relaxing address query");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        step(&mut query);
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_query() -> AddressQuery {
        AddressQuery {
            street: Some("Hauptstr.".to_string()),
            street_number: Some("12".to_string()),
            zipcode: Some("10115".to_string()),
            city: Some("Berlin".to_string()),
            country_iso: Some("fr".to_string()),
        }
    }

    #[test]
    fn relaxation_order_matches_the_ladder() {
        let mut query = full_query();
        let steps = relaxations();

        steps[0](&mut query);
        assert_eq!(query.country_iso.as_deref(), Some("de"));

        steps[1](&mut query);
        assert!(query.country_iso.is_none());

        steps[2](&mut query);
        assert!(query.street.is_none());
        assert!(query.street_number.is_none());
        assert!(query.zipcode.is_some(), "zipcode survives step 3");

        steps[3](&mut query);
        assert!(query.zipcode.is_none());
        assert_eq!(query.city.as_deref(), Some("Berlin"), "city is never dropped");
    }
}
