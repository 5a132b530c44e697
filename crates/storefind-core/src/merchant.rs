//! The read-only merchant view consumed by ranking and the API.

use serde::Serialize;
use uuid::Uuid;

use crate::geo::GeoPoint;

/// A merchant record as seen by the finder. Field names serialize in the
/// storefront plugin's camelCase wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: Uuid,
    pub active: bool,
    pub company: String,
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub location_lat: f64,
    pub location_lon: f64,
    pub priority: i32,
    pub highlight: bool,
    pub logo_url: Option<String>,
    pub sales_channel_id: Option<Uuid>,
    pub customer_group_id: Option<Uuid>,
}

impl Merchant {
    #[must_use]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.location_lat, self.location_lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_serializes_in_camel_case() {
        let merchant = Merchant {
            id: Uuid::new_v4(),
            active: true,
            company: "Musterladen".to_string(),
            street: Some("Hauptstr. 1".to_string()),
            zipcode: Some("10115".to_string()),
            city: Some("Berlin".to_string()),
            country_code: Some("de".to_string()),
            location_lat: 52.5200,
            location_lon: 13.4050,
            priority: 0,
            highlight: false,
            logo_url: None,
            sales_channel_id: None,
            customer_group_id: None,
        };
        let json = serde_json::to_string(&merchant).expect("serialize");
        assert!(json.contains("\"locationLat\":52.52"));
        assert!(json.contains("\"countryCode\":\"de\""));
    }
}
