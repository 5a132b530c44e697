//! Response and query types for the Nominatim search endpoint.

use serde::Deserialize;
use storefind_core::GeoPoint;

/// One result from a Nominatim search.
///
/// Coordinates arrive as strings; `place_id` is the provider-assigned id
/// later used as the geo-cache primary key.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub place_id: i64,
    pub licence: Option<String>,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub address: PlaceAddress,
}

/// Address detail subfields (`addressdetails=1`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceAddress {
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub suburb: Option<String>,
}

impl Place {
    /// The settlement name at whatever granularity Nominatim matched:
    /// city, then town, then village.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.address
            .city
            .as_deref()
            .or(self.address.town.as_deref())
            .or(self.address.village.as_deref())
    }

    #[must_use]
    pub fn country_code(&self) -> Option<&str> {
        self.address.country_code.as_deref()
    }

    /// Parse the string coordinates. `None` if the provider sent garbage.
    #[must_use]
    pub fn geo_point(&self) -> Option<GeoPoint> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lon = self.lon.parse::<f64>().ok()?;
        Some(GeoPoint::new(lat, lon))
    }
}

/// Structured address fragments for the relaxation ladder. All fields are
/// optional; empty fields are omitted from the provider query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressQuery {
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub country_iso: Option<String>,
}

impl AddressQuery {
    /// Street and house number joined with a space, or `None` when both
    /// are absent.
    #[must_use]
    pub fn street_line(&self) -> Option<String> {
        let line = match (self.street.as_deref(), self.street_number.as_deref()) {
            (Some(street), Some(number)) => format!("{street} {number}"),
            (Some(street), None) => street.to_string(),
            (None, Some(number)) => number.to_string(),
            (None, None) => return None,
        };
        let line = line.trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_falls_back_to_town_and_village() {
        let mut place = Place {
            place_id: 1,
            licence: None,
            lat: "52.5".to_string(),
            lon: "13.4".to_string(),
            address: PlaceAddress {
                town: Some("Teltow".to_string()),
                village: Some("Ruhlsdorf".to_string()),
                ..PlaceAddress::default()
            },
        };
        assert_eq!(place.city(), Some("Teltow"));

        place.address.town = None;
        assert_eq!(place.city(), Some("Ruhlsdorf"));

        place.address.city = Some("Berlin".to_string());
        assert_eq!(place.city(), Some("Berlin"));
    }

    #[test]
    fn geo_point_rejects_unparseable_coordinates() {
        let place = Place {
            place_id: 1,
            licence: None,
            lat: "not-a-float".to_string(),
            lon: "13.4".to_string(),
            address: PlaceAddress::default(),
        };
        assert!(place.geo_point().is_none());
    }

    #[test]
    fn street_line_joins_street_and_number() {
        let query = AddressQuery {
            street: Some("Hauptstr.".to_string()),
            street_number: Some("12a".to_string()),
            ..AddressQuery::default()
        };
        assert_eq!(query.street_line().as_deref(), Some("Hauptstr. 12a"));

        let empty = AddressQuery::default();
        assert!(empty.street_line().is_none());
    }
}
