use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::contract::ContractForm;
use crate::models::records::SavedJobRow;

/// Jobs created before this instant are expired.
pub fn expiry_cutoff(now: DateTime<Utc>, expiry_hours: i64) -> DateTime<Utc> {
    now - Duration::hours(expiry_hours)
}

pub async fn save_job(pool: &PgPool, form: &ContractForm) -> Result<SavedJobRow, AppError> {
    let row = sqlx::query_as::<_, SavedJobRow>(
        r#"
        INSERT INTO saved_jobs (id, form_data, rendszam)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(Json(form))
    .bind(form.job_label())
    .fetch_one(pool)
    .await?;

    info!("Saved job {} ({})", row.id, row.rendszam);
    Ok(row)
}

/// Deletes every job older than the cutoff and returns how many went.
pub async fn sweep_expired_jobs(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM saved_jobs WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        info!("Removed {removed} expired saved job(s) created before {cutoff}");
    }
    Ok(removed)
}

/// Sweeps expired jobs, then returns the remaining ones newest first.
/// A failed sweep is logged and does not prevent listing.
pub async fn list_jobs(pool: &PgPool, expiry_hours: i64) -> Result<Vec<SavedJobRow>, AppError> {
    let cutoff = expiry_cutoff(Utc::now(), expiry_hours);

    if let Err(e) = sweep_expired_jobs(pool, cutoff).await {
        warn!("Couldn't clean up expired jobs: {e}");
    }

    Ok(sqlx::query_as::<_, SavedJobRow>(
        "SELECT * FROM saved_jobs WHERE created_at >= $1 ORDER BY created_at DESC",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?)
}

pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM saved_jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Saved job {id} not found")));
    }

    info!("Deleted saved job {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cutoff_is_48_hours_back() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let cutoff = expiry_cutoff(now, 48);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_job_exactly_at_cutoff_survives() {
        // The sweep deletes strictly older rows; listing keeps `created_at >= cutoff`.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let cutoff = expiry_cutoff(now, 48);
        let created = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        assert!(created >= cutoff);
        assert!(Utc.with_ymd_and_hms(2026, 10, 17, 11, 59, 59).unwrap() < cutoff);
    }
}
