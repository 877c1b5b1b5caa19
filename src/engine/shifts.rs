use super::error::EngineError;
use crate::model::shift::{Shift, ShiftAssignment};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn create_shift(
    pool: &SqlitePool,
    name: &str,
    start_time: NaiveTime,
    end_time: NaiveTime,
    color: &str,
    now: DateTime<Utc>,
) -> Result<Shift, EngineError> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO shifts (id, name, start_time, end_time, color, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(start_time)
    .bind(end_time)
    .bind(color)
    .bind(now)
    .execute(pool)
    .await?;
    fetch_shift(pool, &id).await?.ok_or(EngineError::NotFound)
}

pub async fn update_shift(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    start_time: NaiveTime,
    end_time: NaiveTime,
    color: &str,
) -> Result<Shift, EngineError> {
    let updated = sqlx::query(
        "UPDATE shifts SET name = ?, start_time = ?, end_time = ?, color = ? WHERE id = ?",
    )
    .bind(name)
    .bind(start_time)
    .bind(end_time)
    .bind(color)
    .bind(id)
    .execute(pool)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::NotFound);
    }
    fetch_shift(pool, id).await?.ok_or(EngineError::NotFound)
}

/// Shifts still referenced by an assignment cannot be deleted.
pub async fn delete_shift(pool: &SqlitePool, id: &str) -> Result<(), EngineError> {
    let mut tx = pool.begin().await?;

    let assigned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shift_assignments WHERE shift_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if assigned > 0 {
        return Err(EngineError::ShiftInUse);
    }

    let deleted = sqlx::query("DELETE FROM shifts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(EngineError::NotFound);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn list_shifts(pool: &SqlitePool) -> Result<Vec<Shift>, EngineError> {
    let shifts = sqlx::query_as(
        "SELECT id, name, start_time, end_time, color, created_at FROM shifts ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(shifts)
}

async fn fetch_shift(pool: &SqlitePool, id: &str) -> Result<Option<Shift>, EngineError> {
    let shift = sqlx::query_as(
        "SELECT id, name, start_time, end_time, color, created_at FROM shifts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(shift)
}

/// Assigns a shift to an employee for a date range (open-ended when `to` is
/// absent). An employee may have at most one assignment covering any given
/// date, so ranges that intersect an existing assignment are rejected.
pub async fn assign(
    pool: &SqlitePool,
    employee_id: &str,
    shift_id: &str,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> Result<ShiftAssignment, EngineError> {
    if to.is_some_and(|to| to < from) {
        return Err(EngineError::InvalidRange);
    }

    let mut tx = pool.begin().await?;

    let shift_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE id = ?")
        .bind(shift_id)
        .fetch_one(&mut *tx)
        .await?;
    if shift_exists == 0 {
        return Err(EngineError::NotFound);
    }

    // Two ranges overlap unless one ends before the other starts; an
    // absent end date extends to infinity.
    let overlapping: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM shift_assignments
        WHERE employee_id = ?
        AND (effective_to IS NULL OR effective_to >= ?)
        AND (? IS NULL OR effective_from <= ?)
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_one(&mut *tx)
    .await?;
    if overlapping > 0 {
        return Err(EngineError::OverlappingAssignment);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO shift_assignments (id, employee_id, shift_id, effective_from, effective_to)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(employee_id)
    .bind(shift_id)
    .bind(from)
    .bind(to)
    .execute(&mut *tx)
    .await?;

    let assignment: ShiftAssignment = sqlx::query_as(
        r#"
        SELECT id, employee_id, shift_id, effective_from, effective_to
        FROM shift_assignments WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(assignment)
}

pub async fn list_assignments(pool: &SqlitePool) -> Result<Vec<ShiftAssignment>, EngineError> {
    let assignments = sqlx::query_as(
        r#"
        SELECT id, employee_id, shift_id, effective_from, effective_to
        FROM shift_assignments ORDER BY effective_from
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(assignments)
}
