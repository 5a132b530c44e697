//! Merchant candidate queries.
//!
//! Attribute and visibility filters run in SQL; distance filtering and
//! ordering happen in application code over the returned candidates.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use storefind_core::Merchant;

/// A merchant row as stored in the `merchant` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchantRow {
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

impl From<MerchantRow> for Merchant {
    fn from(row: MerchantRow) -> Self {
        Self {
            id: row.id,
            active: row.active,
            company: row.company,
            street: row.street,
            zipcode: row.zipcode,
            city: row.city,
            country_code: row.country_code,
            location_lat: row.location_lat,
            location_lon: row.location_lon,
            priority: row.priority,
            highlight: row.highlight,
            logo_url: row.logo_url,
            sales_channel_id: row.sales_channel_id,
            customer_group_id: row.customer_group_id,
        }
    }
}

/// Storefront visibility scoping.
///
/// With no sales channel the query is unscoped (internal callers). With a
/// channel, merchants bound to another channel are hidden, and merchants
/// bound to a customer group are only shown to members of that group.
#[derive(Debug, Clone, Copy, Default)]
pub struct Visibility {
    pub sales_channel_id: Option<Uuid>,
    pub customer_group_id: Option<Uuid>,
}

/// Attribute filters applied to the candidate query.
#[derive(Debug, Clone, Default)]
pub struct MerchantFilter {
    pub country_code: Option<String>,
    pub category_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub term: Option<String>,
    pub is_highlighted: bool,
    pub has_priority: bool,
    pub has_logo: bool,
    pub visibility: Visibility,
}

const MERCHANT_COLUMNS: &str = "id, active, company, street, zipcode, city, country_code, \
     location_lat, location_lon, priority, highlight, logo_url, \
     sales_channel_id, customer_group_id";

/// Fetch active merchants matching the filter.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_candidates(
    pool: &PgPool,
    filter: &MerchantFilter,
) -> Result<Vec<MerchantRow>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
    query.push(MERCHANT_COLUMNS);
    query.push(" FROM merchant WHERE active = TRUE");

    if let Some(country_code) = &filter.country_code {
        query.push(" AND country_code = ");
        query.push_bind(country_code);
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND ");
        query.push_bind(category_id);
        query.push(" = ANY(category_ids)");
    }
    if let Some(manufacturer_id) = filter.manufacturer_id {
        query.push(" AND ");
        query.push_bind(manufacturer_id);
        query.push(" = ANY(manufacturer_ids)");
    }
    if let Some(product_id) = filter.product_id {
        query.push(" AND ");
        query.push_bind(product_id);
        query.push(" = ANY(product_ids)");
    }
    if !filter.tag_ids.is_empty() {
        query.push(" AND tag_ids && ");
        query.push_bind(filter.tag_ids.clone());
    }
    if let Some(term) = filter.term.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = format!("%{}%", crate::escape_like(term.trim()));
        query.push(" AND company ILIKE ");
        query.push_bind(pattern);
    }
    if filter.is_highlighted {
        query.push(" AND highlight = TRUE");
    }
    if filter.has_priority {
        query.push(" AND priority <> 0");
    }
    if filter.has_logo {
        query.push(" AND logo_url IS NOT NULL");
    }

    if let Some(sales_channel_id) = filter.visibility.sales_channel_id {
        query.push(" AND (sales_channel_id IS NULL OR sales_channel_id = ");
        query.push_bind(sales_channel_id);
        query.push(")");

        if let Some(customer_group_id) = filter.visibility.customer_group_id {
            query.push(" AND (customer_group_id IS NULL OR customer_group_id = ");
            query.push_bind(customer_group_id);
            query.push(")");
        } else {
            query.push(" AND customer_group_id IS NULL");
        }
    }

    query.push(" ORDER BY company ASC, id ASC");

    query
        .build_query_as::<MerchantRow>()
        .fetch_all(pool)
        .await
}

/// Fetch a single merchant by id, active or not.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_merchant(pool: &PgPool, id: Uuid) -> Result<Option<MerchantRow>, sqlx::Error> {
    sqlx::query_as::<_, MerchantRow>(
        "SELECT id, active, company, street, zipcode, city, country_code, \
            location_lat, location_lon, priority, highlight, logo_url, \
            sales_channel_id, customer_group_id \
         FROM merchant WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
