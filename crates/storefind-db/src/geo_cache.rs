//! Cached geocoder results keyed by the provider's place id.

use sqlx::PgPool;

use storefind_core::GeoPoint;

/// A cached location as stored in `geo_cache`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeoCacheRow {
    pub id: i64,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub suburb: Option<String>,
    pub lon: f64,
    pub lat: f64,
    pub licence: Option<String>,
}

impl GeoCacheRow {
    #[must_use]
    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// A geocoder result about to be cached.
#[derive(Debug, Clone)]
pub struct NewCachedLocation {
    pub id: i64,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub suburb: Option<String>,
    pub lon: f64,
    pub lat: f64,
    pub licence: Option<String>,
}

/// Fuzzy lookup of cached locations for a search term.
///
/// Matches the term as a substring of the city or a prefix of the zipcode,
/// restricted to the allowed countries, oldest entries first, at most ten rows.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_locations(
    pool: &PgPool,
    term: &str,
    allowed_countries: &[String],
) -> Result<Vec<GeoCacheRow>, sqlx::Error> {
    let escaped = crate::escape_like(term);
    let city_pattern = format!("%{escaped}%");
    let zipcode_pattern = format!("{escaped}%");

    sqlx::query_as::<_, GeoCacheRow>(
        "SELECT id, zipcode, city, state, country, country_code, suburb, lon, lat, licence \
         FROM geo_cache \
         WHERE (city ILIKE $1 OR zipcode LIKE $2) \
           AND country_code = ANY($3) \
         ORDER BY created_at ASC, id ASC \
         LIMIT 10",
    )
    .bind(city_pattern)
    .bind(zipcode_pattern)
    .bind(allowed_countries)
    .fetch_all(pool)
    .await
}

/// Insert a geocoder result, ignoring duplicates by place id.
///
/// Returns `true` if a new row was written, `false` if the place was already
/// cached.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails.
pub async fn insert_location(
    pool: &PgPool,
    location: &NewCachedLocation,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO geo_cache \
           (id, zipcode, city, state, country, country_code, suburb, lon, lat, licence) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(location.id)
    .bind(&location.zipcode)
    .bind(&location.city)
    .bind(&location.state)
    .bind(&location.country)
    .bind(&location.country_code)
    .bind(&location.suburb)
    .bind(location.lon)
    .bind(location.lat)
    .bind(&location.licence)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
