use super::error::EngineError;
use crate::model::leave::{LeaveBalance, LeaveKind};
use sqlx::{SqliteConnection, SqlitePool};

/// The three ledger mutators. Each takes the caller's open transaction so
/// the balance change commits or rolls back together with the request-state
/// change it belongs to; nothing else writes `leave_balances`.
///
/// Rows are created lazily with the leave type's configured allotment the
/// first time an employee touches a (type, year) bucket.
async fn ensure_row(
    conn: &mut SqliteConnection,
    employee_id: &str,
    kind: LeaveKind,
    period: i64,
    allotted: i64,
) -> Result<(), EngineError> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO leave_balances (employee_id, leave_type, period, allotted, used, held)
        VALUES (?, ?, ?, ?, 0, 0)
        "#,
    )
    .bind(employee_id)
    .bind(kind)
    .bind(period)
    .bind(allotted)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Reserves `days` against the balance. The guard predicate keeps
/// `used + held <= allotted` true under concurrent submissions: the UPDATE
/// only lands when the invariant still holds afterwards.
pub async fn hold(
    conn: &mut SqliteConnection,
    employee_id: &str,
    kind: LeaveKind,
    period: i64,
    days: i64,
) -> Result<(), EngineError> {
    let Some(allotted) = kind.policy().allotted else {
        return Ok(());
    };
    ensure_row(&mut *conn, employee_id, kind, period, allotted).await?;

    let updated = sqlx::query(
        r#"
        UPDATE leave_balances
        SET held = held + ?
        WHERE employee_id = ? AND leave_type = ? AND period = ?
        AND used + held + ? <= allotted
        "#,
    )
    .bind(days)
    .bind(employee_id)
    .bind(kind)
    .bind(period)
    .bind(days)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        let remaining: i64 = sqlx::query_scalar(
            r#"
            SELECT allotted - used - held FROM leave_balances
            WHERE employee_id = ? AND leave_type = ? AND period = ?
            "#,
        )
        .bind(employee_id)
        .bind(kind)
        .bind(period)
        .fetch_one(&mut *conn)
        .await?;
        return Err(EngineError::InsufficientBalance { remaining });
    }
    Ok(())
}

/// Converts a hold into consumption on approval.
pub async fn commit(
    conn: &mut SqliteConnection,
    employee_id: &str,
    kind: LeaveKind,
    period: i64,
    days: i64,
) -> Result<(), EngineError> {
    sqlx::query(
        r#"
        UPDATE leave_balances
        SET held = held - ?, used = used + ?
        WHERE employee_id = ? AND leave_type = ? AND period = ?
        "#,
    )
    .bind(days)
    .bind(days)
    .bind(employee_id)
    .bind(kind)
    .bind(period)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Returns a hold to the pool on rejection or cancellation.
pub async fn release(
    conn: &mut SqliteConnection,
    employee_id: &str,
    kind: LeaveKind,
    period: i64,
    days: i64,
) -> Result<(), EngineError> {
    sqlx::query(
        r#"
        UPDATE leave_balances
        SET held = held - ?
        WHERE employee_id = ? AND leave_type = ? AND period = ?
        "#,
    )
    .bind(days)
    .bind(employee_id)
    .bind(kind)
    .bind(period)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Read-side view: one row per quota-tracked leave type, defaulted to the
/// configured allotment when the employee has not touched the bucket yet.
pub async fn balances(
    pool: &SqlitePool,
    employee_id: &str,
    period: i64,
) -> Result<Vec<LeaveBalance>, EngineError> {
    let mut out = Vec::new();
    for kind in LeaveKind::all() {
        let Some(allotted) = kind.policy().allotted else {
            continue;
        };
        let row: Option<LeaveBalance> = sqlx::query_as(
            r#"
            SELECT employee_id, leave_type, period, allotted, used, held
            FROM leave_balances
            WHERE employee_id = ? AND leave_type = ? AND period = ?
            "#,
        )
        .bind(employee_id)
        .bind(kind)
        .bind(period)
        .fetch_optional(pool)
        .await?;

        out.push(row.unwrap_or(LeaveBalance {
            employee_id: employee_id.to_string(),
            leave_type: kind,
            period,
            allotted,
            used: 0,
            held: 0,
        }));
    }
    Ok(out)
}
