use super::error::EngineError;
use super::requests;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::Employee;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

/// Month-level projection over persisted attendance records. Pure read
/// side; absence rows come from the sweep, never from this query.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub expected_workdays: i64,
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub excused: i64,
    /// (present + late) / expected workdays, one decimal.
    pub attendance_pct: f64,
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

fn is_workday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

pub async fn month_stats(
    pool: &SqlitePool,
    year: i32,
    month: u32,
    employee_id: Option<&str>,
) -> Result<AttendanceStats, EngineError> {
    let (first, last) = month_bounds(year, month).ok_or(EngineError::InvalidRange)?;

    let expected_workdays = {
        let mut count = 0;
        let mut d = first;
        while d <= last {
            if is_workday(d) {
                count += 1;
            }
            d += Duration::days(1);
        }
        count
    };

    let mut sql = String::from(
        "SELECT status, COUNT(*) FROM attendance WHERE date >= ? AND date <= ?",
    );
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" GROUP BY status");

    let mut q = sqlx::query_as::<_, (AttendanceStatus, i64)>(&sql)
        .bind(first)
        .bind(last);
    if let Some(id) = employee_id {
        q = q.bind(id.to_string());
    }
    let counts = q.fetch_all(pool).await?;

    let mut stats = AttendanceStats {
        expected_workdays,
        present: 0,
        late: 0,
        absent: 0,
        excused: 0,
        attendance_pct: 0.0,
    };
    for (status, count) in counts {
        match status {
            AttendanceStatus::Present => stats.present = count,
            AttendanceStatus::Late => stats.late = count,
            AttendanceStatus::Absent => stats.absent = count,
            AttendanceStatus::Excused => stats.excused = count,
        }
    }
    if expected_workdays > 0 {
        let pct = (stats.present + stats.late) as f64 / expected_workdays as f64 * 100.0;
        stats.attendance_pct = (pct * 10.0).round() / 10.0;
    }
    Ok(stats)
}

/// Marks every active employee without a record on the given past workday
/// as absent (excused when an approved leave covers the day). Inserts are
/// keyed on (employee, date), so re-running the sweep is a no-op.
/// Returns the number of records created.
pub async fn mark_absentees(
    pool: &SqlitePool,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<u64, EngineError> {
    if date >= today {
        return Err(EngineError::InvalidRange);
    }
    if !is_workday(date) {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    let employees: Vec<Employee> =
        sqlx::query_as("SELECT id, full_name, status FROM employees WHERE status = 'active'")
            .fetch_all(&mut *tx)
            .await?;

    let mut created = 0;
    for employee in employees {
        let status = if requests::approved_leave_covers(&mut tx, &employee.id, date).await? {
            AttendanceStatus::Excused
        } else {
            AttendanceStatus::Absent
        };

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO attendance (id, employee_id, date, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&employee.id)
        .bind(date)
        .bind(status)
        .execute(&mut *tx)
        .await?;
        created += result.rows_affected();
    }

    tx.commit().await?;
    Ok(created)
}
