use super::error::EngineError;
use super::{authority, ledger, round2};
use crate::engine::authority::Actor;
use crate::model::leave::{LeaveKind, LeaveRequest, RequestStatus};
use crate::model::overtime::OvertimeRequest;
use crate::model::role::Role;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, start_date, end_date, day_count, reason,
    attachment_ref, status, decision_reason, decided_by, decided_at, created_at
"#;

const OVERTIME_COLUMNS: &str = r#"
    id, employee_id, date, start_time, end_time, hour_count, reason,
    status, decision_reason, decided_by, decided_at, created_at
"#;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitLeave {
    pub leave_type: LeaveKind,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Reject,
}

/// Inclusive Mon-Fri day count of a date range.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut days = 0;
    let mut current = start;
    while current <= end {
        if current.weekday().num_days_from_monday() < 5 {
            days += 1;
        }
        current += Duration::days(1);
    }
    days
}

/// Accepts "HH:MM" (what clients send) as well as "HH:MM:SS".
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, EngineError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| EngineError::InvalidRange)
}

/// Whether an approved leave request of this employee covers `date`.
pub async fn approved_leave_covers(
    conn: &mut SqliteConnection,
    employee_id: &str,
    date: NaiveDate,
) -> Result<bool, EngineError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM leave_requests
        WHERE employee_id = ? AND status = 'approved'
        AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(date)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Validation chain, balance hold and insert in one transaction. On any
/// failure the hold is rolled back with the request, so no orphan holds can
/// exist.
pub async fn submit_leave(
    pool: &SqlitePool,
    employee_id: &str,
    req: &SubmitLeave,
    now: DateTime<Utc>,
) -> Result<LeaveRequest, EngineError> {
    if req.end_date < req.start_date {
        return Err(EngineError::InvalidRange);
    }

    let day_count = working_days(req.start_date, req.end_date);
    if day_count == 0 {
        return Err(EngineError::InvalidRange);
    }

    let policy = req.leave_type.policy();
    if day_count > policy.max_days {
        return Err(EngineError::ExceedsMaxDays {
            requested: day_count,
            max: policy.max_days,
        });
    }

    if policy.min_lead_days > 0 {
        let lead = (req.start_date - now.date_naive()).num_days();
        if lead < policy.min_lead_days {
            return Err(EngineError::LeadTimeViolation {
                min_lead_days: policy.min_lead_days,
            });
        }
    }

    let mut tx = pool.begin().await?;

    let overlapping: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM leave_requests
        WHERE employee_id = ? AND status IN ('pending', 'approved')
        AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(req.end_date)
    .bind(req.start_date)
    .fetch_one(&mut *tx)
    .await?;
    if overlapping > 0 {
        return Err(EngineError::OverlappingRequest);
    }

    if policy.deducts_quota {
        ledger::hold(
            &mut tx,
            employee_id,
            req.leave_type,
            req.start_date.year() as i64,
            day_count,
        )
        .await?;
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (id, employee_id, leave_type, start_date, end_date, day_count,
             reason, attachment_ref, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&id)
    .bind(employee_id)
    .bind(req.leave_type)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(day_count)
    .bind(&req.reason)
    .bind(&req.attachment_ref)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let request = fetch_leave(&mut *tx, &id).await?.ok_or(EngineError::NotFound)?;
    tx.commit().await?;
    Ok(request)
}

/// Terminal approve/reject transition. The `status = 'pending'` guard on
/// the UPDATE makes concurrent decisions race to a single winner; the
/// loser sees zero rows and gets `NotPending`.
pub async fn decide_leave(
    pool: &SqlitePool,
    actor: &Actor,
    request_id: &str,
    action: DecisionAction,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<LeaveRequest, EngineError> {
    let mut tx = pool.begin().await?;

    let request = fetch_leave(&mut *tx, request_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    if request.status != RequestStatus::Pending {
        return Err(EngineError::NotPending);
    }

    let policy = request.leave_type.policy();
    if !authority::can_decide(actor.role, policy.approval) {
        return Err(EngineError::Unauthorized);
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if action == DecisionAction::Reject && reason.is_none() {
        return Err(EngineError::MissingReason);
    }

    let status = match action {
        DecisionAction::Approve => RequestStatus::Approved,
        DecisionAction::Reject => RequestStatus::Rejected,
    };

    let updated = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, decision_reason = ?, decided_by = ?, decided_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(&actor.user_id)
    .bind(now)
    .bind(request_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::NotPending);
    }

    if policy.deducts_quota {
        let period = request.start_date.year() as i64;
        match action {
            DecisionAction::Approve => {
                ledger::commit(
                    &mut tx,
                    &request.employee_id,
                    request.leave_type,
                    period,
                    request.day_count,
                )
                .await?;
            }
            DecisionAction::Reject => {
                ledger::release(
                    &mut tx,
                    &request.employee_id,
                    request.leave_type,
                    period,
                    request.day_count,
                )
                .await?;
            }
        }
    }

    let request = fetch_leave(&mut *tx, request_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    tx.commit().await?;
    Ok(request)
}

/// Only the owner (or HR/Admin) may cancel, and only while pending. The
/// hold is released in the same transaction.
pub async fn cancel_leave(
    pool: &SqlitePool,
    actor: &Actor,
    request_id: &str,
) -> Result<LeaveRequest, EngineError> {
    let mut tx = pool.begin().await?;

    let request = fetch_leave(&mut *tx, request_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    let is_owner = actor.employee_id.as_deref() == Some(request.employee_id.as_str());
    if !is_owner && !matches!(actor.role, Role::Admin | Role::Hr) {
        return Err(EngineError::Unauthorized);
    }
    if request.status != RequestStatus::Pending {
        return Err(EngineError::NotPending);
    }

    let updated = sqlx::query(
        "UPDATE leave_requests SET status = 'cancelled' WHERE id = ? AND status = 'pending'",
    )
    .bind(request_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::NotPending);
    }

    if request.leave_type.policy().deducts_quota {
        ledger::release(
            &mut tx,
            &request.employee_id,
            request.leave_type,
            request.start_date.year() as i64,
            request.day_count,
        )
        .await?;
    }

    let request = fetch_leave(&mut *tx, request_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    tx.commit().await?;
    Ok(request)
}

async fn fetch_leave(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<LeaveRequest>, EngineError> {
    let req = sqlx::query_as(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(req)
}

/// Leave requests newest first, optionally filtered.
pub async fn list_leave(
    pool: &SqlitePool,
    employee_id: Option<&str>,
    status: Option<RequestStatus>,
) -> Result<Vec<LeaveRequest>, EngineError> {
    let mut sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE 1=1");
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as(&sql);
    if let Some(id) = employee_id {
        q = q.bind(id.to_string());
    }
    if let Some(status) = status {
        q = q.bind(status);
    }
    Ok(q.fetch_all(pool).await?)
}

/// The pending queue an approver may decide, newest first. HR-level
/// requests are hidden from managers.
pub async fn pending_leave(
    pool: &SqlitePool,
    actor: &Actor,
) -> Result<Vec<LeaveRequest>, EngineError> {
    let all: Vec<LeaveRequest> = sqlx::query_as(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE status = 'pending' ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(all
        .into_iter()
        .filter(|r| authority::can_decide(actor.role, r.leave_type.policy().approval))
        .collect())
}

// --- Overtime ---

#[derive(Debug, Clone)]
pub struct SubmitOvertime {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: String,
}

pub async fn submit_overtime(
    pool: &SqlitePool,
    employee_id: &str,
    req: &SubmitOvertime,
    now: DateTime<Utc>,
) -> Result<OvertimeRequest, EngineError> {
    if req.end_time <= req.start_time {
        return Err(EngineError::InvalidRange);
    }
    let hour_count = round2((req.end_time - req.start_time).num_seconds() as f64 / 3600.0);

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO overtime_requests
            (id, employee_id, date, start_time, end_time, hour_count,
             reason, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&id)
    .bind(employee_id)
    .bind(req.date)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(hour_count)
    .bind(&req.reason)
    .bind(now)
    .execute(pool)
    .await?;

    fetch_overtime(pool, &id).await?.ok_or(EngineError::NotFound)
}

/// Same terminal transition as leave but with no ledger, and the rejection
/// reason stays optional.
pub async fn decide_overtime(
    pool: &SqlitePool,
    actor: &Actor,
    request_id: &str,
    action: DecisionAction,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<OvertimeRequest, EngineError> {
    if !authority::can_decide(actor.role, authority::ApprovalLevel::Manager) {
        return Err(EngineError::Unauthorized);
    }

    let mut tx = pool.begin().await?;

    let request: Option<OvertimeRequest> = sqlx::query_as(&format!(
        "SELECT {OVERTIME_COLUMNS} FROM overtime_requests WHERE id = ?"
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?;
    let request = request.ok_or(EngineError::NotFound)?;
    if request.status != RequestStatus::Pending {
        return Err(EngineError::NotPending);
    }

    let status = match action {
        DecisionAction::Approve => RequestStatus::Approved,
        DecisionAction::Reject => RequestStatus::Rejected,
    };
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let updated = sqlx::query(
        r#"
        UPDATE overtime_requests
        SET status = ?, decision_reason = ?, decided_by = ?, decided_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(&actor.user_id)
    .bind(now)
    .bind(request_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::NotPending);
    }

    let request: OvertimeRequest = sqlx::query_as(&format!(
        "SELECT {OVERTIME_COLUMNS} FROM overtime_requests WHERE id = ?"
    ))
    .bind(request_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(request)
}

pub async fn list_overtime(
    pool: &SqlitePool,
    employee_id: Option<&str>,
    status: Option<RequestStatus>,
) -> Result<Vec<OvertimeRequest>, EngineError> {
    let mut sql = format!("SELECT {OVERTIME_COLUMNS} FROM overtime_requests WHERE 1=1");
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as(&sql);
    if let Some(id) = employee_id {
        q = q.bind(id.to_string());
    }
    if let Some(status) = status {
        q = q.bind(status);
    }
    Ok(q.fetch_all(pool).await?)
}

async fn fetch_overtime(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<OvertimeRequest>, EngineError> {
    let req = sqlx::query_as(&format!(
        "SELECT {OVERTIME_COLUMNS} FROM overtime_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{seed_balance, seed_employee, test_pool};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap() // a Monday
    }

    fn manager() -> Actor {
        Actor {
            user_id: "user-mgr".to_string(),
            employee_id: None,
            role: Role::Manager,
        }
    }

    fn hr() -> Actor {
        Actor {
            user_id: "user-hr".to_string(),
            employee_id: None,
            role: Role::Hr,
        }
    }

    fn owner(employee_id: &str) -> Actor {
        Actor {
            user_id: format!("user-{employee_id}"),
            employee_id: Some(employee_id.to_string()),
            role: Role::Employee,
        }
    }

    fn annual(start: &str, end: &str) -> SubmitLeave {
        SubmitLeave {
            leave_type: LeaveKind::Annual,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            reason: "family trip".to_string(),
            attachment_ref: None,
        }
    }

    #[test]
    fn working_days_skips_weekends() {
        // Mon 2026-02-02 .. Fri 2026-02-06
        assert_eq!(working_days("2026-02-02".parse().unwrap(), "2026-02-06".parse().unwrap()), 5);
        // Fri .. Mon spans a weekend
        assert_eq!(working_days("2026-02-06".parse().unwrap(), "2026-02-09".parse().unwrap()), 2);
        // Sat .. Sun only
        assert_eq!(working_days("2026-02-07".parse().unwrap(), "2026-02-08".parse().unwrap()), 0);
    }

    #[tokio::test]
    async fn reversed_range_is_invalid() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        let err = submit_leave(&pool, "emp-1", &annual("2026-02-06", "2026-02-02"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange));
    }

    #[tokio::test]
    async fn hold_then_approve_consumes_balance() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        // Mon-Fri, 5 working days
        let req = submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-06"), now())
            .await
            .unwrap();
        assert_eq!(req.day_count, 5);
        assert_eq!(req.status, RequestStatus::Pending);

        let balances = ledger::balances(&pool, "emp-1", 2026).await.unwrap();
        let b = balances.iter().find(|b| b.leave_type == LeaveKind::Annual).unwrap();
        assert_eq!((b.used, b.held), (0, 5));

        let req = decide_leave(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap();
        assert_eq!(req.status, RequestStatus::Approved);

        let balances = ledger::balances(&pool, "emp-1", 2026).await.unwrap();
        let b = balances.iter().find(|b| b.leave_type == LeaveKind::Annual).unwrap();
        assert_eq!((b.used, b.held), (5, 0));

        // 5 used + 8 requested > 12 allotted
        let err = submit_leave(&pool, "emp-1", &annual("2026-03-02", "2026-03-11"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance { remaining: 7 }));
    }

    #[tokio::test]
    async fn double_approval_is_rejected() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        let req = submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-03"), now())
            .await
            .unwrap();
        decide_leave(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap();
        let err = decide_leave(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotPending));
    }

    #[tokio::test]
    async fn overlapping_pending_request_is_rejected() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-06"), now())
            .await
            .unwrap();
        let err = submit_leave(&pool, "emp-1", &annual("2026-02-05", "2026-02-10"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OverlappingRequest));
    }

    #[tokio::test]
    async fn cancel_releases_hold_and_allows_resubmission() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        let req = submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-06"), now())
            .await
            .unwrap();
        let cancelled = cancel_leave(&pool, &owner("emp-1"), &req.id).await.unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);

        let balances = ledger::balances(&pool, "emp-1", 2026).await.unwrap();
        let b = balances.iter().find(|b| b.leave_type == LeaveKind::Annual).unwrap();
        assert_eq!((b.used, b.held), (0, 0));

        // Identical range goes through again.
        submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-06"), now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_is_owner_or_hr_only_and_pending_only() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        let req = submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-03"), now())
            .await
            .unwrap();

        let err = cancel_leave(&pool, &owner("emp-2"), &req.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized));

        decide_leave(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap();
        let err = cancel_leave(&pool, &owner("emp-1"), &req.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotPending));
    }

    #[tokio::test]
    async fn lead_time_and_max_days_are_enforced() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        // Annual needs 3 days of lead; submitting on Jan 5 for Jan 6 fails.
        let err = submit_leave(&pool, "emp-1", &annual("2026-01-06", "2026-01-07"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::LeadTimeViolation { min_lead_days: 3 }));

        // Sick leave is exempt from lead time.
        let sick = SubmitLeave {
            leave_type: LeaveKind::Sick,
            start_date: "2026-01-05".parse().unwrap(),
            end_date: "2026-01-05".parse().unwrap(),
            reason: "flu".to_string(),
            attachment_ref: Some("doctor-note-1".to_string()),
        };
        submit_leave(&pool, "emp-1", &sick, now()).await.unwrap();

        // 16 working days exceed annual's max of 14.
        let err = submit_leave(&pool, "emp-1", &annual("2026-03-02", "2026-03-23"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExceedsMaxDays { requested: 16, max: 14 }));
    }

    #[tokio::test]
    async fn reject_requires_reason_and_releases_hold() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        let req = submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-03"), now())
            .await
            .unwrap();

        let err = decide_leave(&pool, &manager(), &req.id, DecisionAction::Reject, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingReason));

        let req = decide_leave(
            &pool,
            &manager(),
            &req.id,
            DecisionAction::Reject,
            Some("headcount too thin that week"),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(req.status, RequestStatus::Rejected);
        assert_eq!(req.decision_reason.as_deref(), Some("headcount too thin that week"));

        let balances = ledger::balances(&pool, "emp-1", 2026).await.unwrap();
        let b = balances.iter().find(|b| b.leave_type == LeaveKind::Annual).unwrap();
        assert_eq!((b.used, b.held), (0, 0));
    }

    #[tokio::test]
    async fn approval_level_gates_the_decision() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        // Marriage leave requires HR.
        let req = SubmitLeave {
            leave_type: LeaveKind::Marriage,
            start_date: "2026-02-02".parse().unwrap(),
            end_date: "2026-02-04".parse().unwrap(),
            reason: "wedding".to_string(),
            attachment_ref: None,
        };
        let req = submit_leave(&pool, "emp-1", &req, now()).await.unwrap();

        let err = decide_leave(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized));

        decide_leave(&pool, &hr(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_queue_hides_hr_level_requests_from_managers() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_employee(&pool, "emp-2").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        submit_leave(&pool, "emp-1", &annual("2026-02-02", "2026-02-03"), now())
            .await
            .unwrap();
        let marriage = SubmitLeave {
            leave_type: LeaveKind::Marriage,
            start_date: "2026-02-02".parse().unwrap(),
            end_date: "2026-02-04".parse().unwrap(),
            reason: "wedding".to_string(),
            attachment_ref: None,
        };
        submit_leave(&pool, "emp-2", &marriage, now()).await.unwrap();

        assert_eq!(pending_leave(&pool, &manager()).await.unwrap().len(), 1);
        assert_eq!(pending_leave(&pool, &hr()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn overtime_hours_survive_approval() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        let req = SubmitOvertime {
            date: "2024-05-01".parse().unwrap(),
            start_time: parse_hhmm("18:00").unwrap(),
            end_time: parse_hhmm("21:30").unwrap(),
            reason: "release night".to_string(),
        };
        let req = submit_overtime(&pool, "emp-1", &req, now()).await.unwrap();
        assert_eq!(req.hour_count, 3.5);

        let req = decide_overtime(&pool, &manager(), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap();
        assert_eq!(req.status, RequestStatus::Approved);
        assert_eq!(req.hour_count, 3.5);
    }

    #[tokio::test]
    async fn overtime_rejects_reversed_times_but_not_missing_reason() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        let bad = SubmitOvertime {
            date: "2026-01-06".parse().unwrap(),
            start_time: parse_hhmm("21:00").unwrap(),
            end_time: parse_hhmm("19:00").unwrap(),
            reason: "late deploy".to_string(),
        };
        let err = submit_overtime(&pool, "emp-1", &bad, now()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange));

        let req = SubmitOvertime {
            date: "2026-01-06".parse().unwrap(),
            start_time: parse_hhmm("19:00").unwrap(),
            end_time: parse_hhmm("21:00").unwrap(),
            reason: "late deploy".to_string(),
        };
        let req = submit_overtime(&pool, "emp-1", &req, now()).await.unwrap();

        // Unlike leave, rejecting overtime without a reason goes through.
        let req = decide_overtime(&pool, &manager(), &req.id, DecisionAction::Reject, None, now())
            .await
            .unwrap();
        assert_eq!(req.status, RequestStatus::Rejected);
        assert_eq!(req.decision_reason, None);

        let err = decide_overtime(&pool, &owner("emp-1"), &req.id, DecisionAction::Approve, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized));
    }

    /// Random submit/decide/cancel sequences never break the ledger
    /// invariant used + held <= allotted.
    #[tokio::test]
    async fn ledger_invariant_holds_under_random_sequences() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        seed_balance(&pool, "emp-1", LeaveKind::Annual, 2026, 12).await;

        let mut rng = StdRng::seed_from_u64(42);
        let mut ids: Vec<String> = Vec::new();

        for _ in 0..80 {
            match rng.gen_range(0..3) {
                0 => {
                    let offset = rng.gen_range(4..120);
                    let len = rng.gen_range(0..4);
                    let start = now().date_naive() + Duration::days(offset);
                    let req = SubmitLeave {
                        leave_type: LeaveKind::Annual,
                        start_date: start,
                        end_date: start + Duration::days(len),
                        reason: "trip".to_string(),
                        attachment_ref: None,
                    };
                    if let Ok(created) = submit_leave(&pool, "emp-1", &req, now()).await {
                        ids.push(created.id);
                    }
                }
                1 => {
                    if !ids.is_empty() {
                        let id = &ids[rng.gen_range(0..ids.len())];
                        let action = if rng.gen_bool(0.5) {
                            DecisionAction::Approve
                        } else {
                            DecisionAction::Reject
                        };
                        let _ = decide_leave(&pool, &manager(), id, action, Some("no"), now()).await;
                    }
                }
                _ => {
                    if !ids.is_empty() {
                        let id = &ids[rng.gen_range(0..ids.len())];
                        let _ = cancel_leave(&pool, &owner("emp-1"), id).await;
                    }
                }
            }

            let (used, held, allotted): (i64, i64, i64) = sqlx::query_as(
                r#"
                SELECT used, held, allotted FROM leave_balances
                WHERE employee_id = 'emp-1' AND leave_type = 'annual'
                "#,
            )
            .fetch_one(&pool)
            .await
            .unwrap();
            assert!(used + held <= allotted, "invariant broken: {used} + {held} > {allotted}");
            assert!(used >= 0 && held >= 0);
        }
    }
}
