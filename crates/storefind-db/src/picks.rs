//! Per-customer merchant picks.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PickRow {
    pub customer_id: Uuid,
    pub merchant_id: Uuid,
    pub picked_at: DateTime<Utc>,
}

/// Record a customer's merchant choice, replacing any previous pick.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the upsert fails, including foreign key
/// violations for unknown merchants.
pub async fn upsert_pick(
    pool: &PgPool,
    customer_id: Uuid,
    merchant_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO merchant_pick (customer_id, merchant_id) \
         VALUES ($1, $2) \
         ON CONFLICT (customer_id) DO UPDATE \
           SET merchant_id = EXCLUDED.merchant_id, picked_at = NOW()",
    )
    .bind(customer_id)
    .bind(merchant_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a customer's current pick, if any.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_pick(pool: &PgPool, customer_id: Uuid) -> Result<Option<PickRow>, sqlx::Error> {
    sqlx::query_as::<_, PickRow>(
        "SELECT customer_id, merchant_id, picked_at \
         FROM merchant_pick WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await
}
