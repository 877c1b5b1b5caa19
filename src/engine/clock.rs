use super::error::EngineError;
use super::{evidence, face, geofence, requests, round2};
use crate::config::WorkPolicy;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, ClockKind, ClockMode};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

const RECORD_COLUMNS: &str = r#"
    id, employee_id, date,
    clock_in, clock_in_mode, clock_in_latitude, clock_in_longitude,
    clock_in_accuracy, clock_in_evidence,
    clock_out, clock_out_mode, clock_out_latitude, clock_out_longitude,
    clock_out_evidence, total_hours, status, note
"#;

/// A clock event as delivered by the capture client: coordinates, evidence
/// reference and (optionally) a face embedding are already resolved values.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClockSubmission {
    #[serde(rename = "type")]
    pub kind: ClockKind,
    pub mode: ClockMode,
    pub latitude: f64,
    pub longitude: f64,
    /// Reported GPS accuracy in meters, if the client provides one.
    pub accuracy: Option<f64>,
    pub evidence_ref: String,
    /// Required when mode is client_visit.
    pub client_address: Option<String>,
    pub note: Option<String>,
    /// Face descriptor captured alongside the evidence, when biometric
    /// verification is in use.
    pub embedding: Option<Vec<f32>>,
}

/// Pure classification of a clock-in instant against the work policy.
/// Excused (approved leave) and absent (sweep) are assigned elsewhere.
pub fn classify(clock_in: NaiveTime, policy: &WorkPolicy) -> AttendanceStatus {
    let deadline = policy.work_start + Duration::minutes(policy.late_tolerance_min);
    if clock_in <= deadline {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

/// Runs the full validation chain and applies the day's state transition
/// (`Empty -> ClockedIn -> ClockedOut`) in one transaction. Returns the
/// current-day record.
pub async fn clock(
    pool: &SqlitePool,
    policy: &WorkPolicy,
    employee_id: &str,
    sub: &ClockSubmission,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, EngineError> {
    evidence::validate(&sub.evidence_ref, sub.latitude, sub.longitude)?;

    match sub.mode {
        ClockMode::Office => {
            geofence::check(&policy.offices, sub.latitude, sub.longitude)?;
        }
        ClockMode::ClientVisit => {
            if sub
                .client_address
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
            {
                return Err(EngineError::MissingClientAddress);
            }
        }
        ClockMode::Remote => {}
    }

    if let Some(embedding) = &sub.embedding {
        match face::verify(pool, employee_id, embedding, policy.face_match_threshold).await {
            Ok(true) => {}
            Ok(false) => {
                if policy.face_enforced {
                    return Err(EngineError::FaceMismatch);
                }
                warn!(employee_id, "Face verification failed, clock allowed");
            }
            Err(e @ (EngineError::NoTemplateRegistered | EngineError::InvalidEmbedding(_))) => {
                if policy.face_enforced {
                    return Err(e);
                }
                warn!(employee_id, error = %e, "Face verification skipped, clock allowed");
            }
            Err(e) => return Err(e),
        }
    }

    let today = now.date_naive();
    let mut tx = pool.begin().await?;

    let existing = fetch_record(&mut tx, employee_id, today).await?;

    let record_id = match sub.kind {
        ClockKind::In => {
            if existing.as_ref().is_some_and(|r| r.clock_in.is_some()) {
                return Err(EngineError::DuplicateClockIn);
            }

            let on_leave =
                requests::approved_leave_covers(&mut *tx, employee_id, today).await?;
            let status = if on_leave {
                AttendanceStatus::Excused
            } else {
                classify(now.time(), policy)
            };
            let note = sub.note.clone().or_else(|| sub.client_address.clone());

            match existing {
                Some(rec) => {
                    sqlx::query(
                        r#"
                        UPDATE attendance
                        SET clock_in = ?, clock_in_mode = ?, clock_in_latitude = ?,
                            clock_in_longitude = ?, clock_in_accuracy = ?,
                            clock_in_evidence = ?, status = ?, note = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(now)
                    .bind(sub.mode)
                    .bind(sub.latitude)
                    .bind(sub.longitude)
                    .bind(sub.accuracy)
                    .bind(&sub.evidence_ref)
                    .bind(status)
                    .bind(&note)
                    .bind(&rec.id)
                    .execute(&mut *tx)
                    .await?;
                    rec.id
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    sqlx::query(
                        r#"
                        INSERT INTO attendance
                            (id, employee_id, date, clock_in, clock_in_mode,
                             clock_in_latitude, clock_in_longitude, clock_in_accuracy,
                             clock_in_evidence, status, note)
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(&id)
                    .bind(employee_id)
                    .bind(today)
                    .bind(now)
                    .bind(sub.mode)
                    .bind(sub.latitude)
                    .bind(sub.longitude)
                    .bind(sub.accuracy)
                    .bind(&sub.evidence_ref)
                    .bind(status)
                    .bind(&note)
                    .execute(&mut *tx)
                    .await?;
                    id
                }
            }
        }

        ClockKind::Out => {
            let Some(rec) = existing else {
                return Err(EngineError::NoPriorClockIn);
            };
            let Some(clock_in) = rec.clock_in else {
                return Err(EngineError::NoPriorClockIn);
            };
            if rec.clock_out.is_some() {
                return Err(EngineError::NoPriorClockIn);
            }
            // Clock-out must land strictly after clock-in.
            if now <= clock_in {
                return Err(EngineError::InvalidRange);
            }
            let total_hours = round2((now - clock_in).num_seconds() as f64 / 3600.0);

            sqlx::query(
                r#"
                UPDATE attendance
                SET clock_out = ?, clock_out_mode = ?, clock_out_latitude = ?,
                    clock_out_longitude = ?, clock_out_evidence = ?, total_hours = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(sub.mode)
            .bind(sub.latitude)
            .bind(sub.longitude)
            .bind(&sub.evidence_ref)
            .bind(total_hours)
            .bind(&rec.id)
            .execute(&mut *tx)
            .await?;
            rec.id
        }
    };

    let record: AttendanceRecord = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE id = ?"
    ))
    .bind(&record_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(record)
}

async fn fetch_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    employee_id: &str,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, EngineError> {
    let rec = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(rec)
}

/// Today's record, if any.
pub async fn today_record(
    pool: &SqlitePool,
    employee_id: &str,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, EngineError> {
    let rec = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// Attendance history, newest first, optionally bounded and filtered.
pub async fn history(
    pool: &SqlitePool,
    employee_id: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<AttendanceRecord>, EngineError> {
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM attendance WHERE 1=1");
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    if start.is_some() {
        sql.push_str(" AND date >= ?");
    }
    if end.is_some() {
        sql.push_str(" AND date <= ?");
    }
    sql.push_str(" ORDER BY date DESC");

    let mut q = sqlx::query_as(&sql);
    if let Some(id) = employee_id {
        q = q.bind(id.to_string());
    }
    if let Some(start) = start {
        q = q.bind(start);
    }
    if let Some(end) = end {
        q = q.bind(end);
    }

    Ok(q.fetch_all(pool).await?)
}

/// Everyone's records for a single day (team view).
pub async fn day_records(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, EngineError> {
    let recs = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE date = ? ORDER BY clock_in"
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{seed_employee, test_pool};
    use chrono::TimeZone;

    fn submission(kind: ClockKind, mode: ClockMode) -> ClockSubmission {
        ClockSubmission {
            kind,
            mode,
            // Inside the default office fence.
            latitude: -6.161777101062483,
            longitude: 106.87519933469652,
            accuracy: Some(12.0),
            evidence_ref: "selfie-abc".to_string(),
            client_address: None,
            note: None,
            embedding: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap() // a Monday
    }

    #[test]
    fn within_tolerance_is_present_after_is_late() {
        let policy = WorkPolicy::test_default();
        assert_eq!(
            classify(NaiveTime::from_hms_opt(9, 10, 0).unwrap(), &policy),
            AttendanceStatus::Present
        );
        assert_eq!(
            classify(NaiveTime::from_hms_opt(9, 20, 0).unwrap(), &policy),
            AttendanceStatus::Late
        );
    }

    #[tokio::test]
    async fn clock_in_then_out_produces_one_closed_record() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        let rec = clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::In, ClockMode::Office),
            at(8, 55),
        )
        .await
        .unwrap();
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert!(rec.clock_out.is_none());

        let rec = clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::Out, ClockMode::Office),
            at(17, 55),
        )
        .await
        .unwrap();
        let clock_out = rec.clock_out.unwrap();
        assert!(clock_out > rec.clock_in.unwrap());
        assert_eq!(rec.total_hours, Some(9.0));
    }

    #[tokio::test]
    async fn second_clock_in_same_day_conflicts() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();
        let sub = submission(ClockKind::In, ClockMode::Office);

        clock(&pool, &policy, "emp-1", &sub, at(9, 0)).await.unwrap();
        let err = clock(&pool, &policy, "emp-1", &sub, at(9, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateClockIn));
    }

    #[tokio::test]
    async fn clock_out_without_clock_in_conflicts() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        let err = clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::Out, ClockMode::Office),
            at(18, 0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::NoPriorClockIn));
    }

    #[tokio::test]
    async fn double_clock_out_conflicts() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::In, ClockMode::Office),
            at(9, 0),
        )
        .await
        .unwrap();
        clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::Out, ClockMode::Office),
            at(17, 0),
        )
        .await
        .unwrap();
        let err = clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::Out, ClockMode::Office),
            at(18, 0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::NoPriorClockIn));
    }

    #[tokio::test]
    async fn office_mode_far_from_every_office_is_rejected() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        let mut sub = submission(ClockKind::In, ClockMode::Office);
        sub.latitude -= 0.018; // ~2 km south
        let err = clock(&pool, &policy, "emp-1", &sub, at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OutsideGeofence { .. }));
    }

    #[tokio::test]
    async fn client_visit_requires_address_but_not_geofence() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        let mut sub = submission(ClockKind::In, ClockMode::ClientVisit);
        sub.latitude += 1.0; // nowhere near an office
        let err = clock(&pool, &policy, "emp-1", &sub, at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingClientAddress));

        sub.client_address = Some("12 Harbor Road".to_string());
        let rec = clock(&pool, &policy, "emp-1", &sub, at(9, 0)).await.unwrap();
        assert_eq!(rec.note.as_deref(), Some("12 Harbor Road"));
    }

    #[tokio::test]
    async fn missing_evidence_is_rejected_before_anything_else() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        let mut sub = submission(ClockKind::In, ClockMode::Office);
        sub.evidence_ref = String::new();
        let err = clock(&pool, &policy, "emp-1", &sub, at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingEvidence));
    }

    #[tokio::test]
    async fn approved_leave_takes_precedence_over_lateness() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();

        sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, employee_id, leave_type, start_date, end_date, day_count,
                 reason, status, created_at)
            VALUES ('lr-1', 'emp-1', 'annual', '2026-01-05', '2026-01-06', 2,
                    'family trip', 'approved', ?)
            "#,
        )
        .bind(at(0, 0))
        .execute(&pool)
        .await
        .unwrap();

        let rec = clock(
            &pool,
            &policy,
            "emp-1",
            &submission(ClockKind::In, ClockMode::Office),
            at(11, 30),
        )
        .await
        .unwrap();
        assert_eq!(rec.status, AttendanceStatus::Excused);
    }

    #[tokio::test]
    async fn enforced_face_policy_blocks_without_template() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let mut policy = WorkPolicy::test_default();
        policy.face_enforced = true;

        let mut sub = submission(ClockKind::In, ClockMode::Office);
        sub.embedding = Some(vec![0.1; face::EMBEDDING_DIM]);
        let err = clock(&pool, &policy, "emp-1", &sub, at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoTemplateRegistered));
    }

    #[tokio::test]
    async fn advisory_face_policy_lets_mismatch_through() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        let policy = WorkPolicy::test_default();
        face::register(&pool, "emp-1", &vec![0.9; face::EMBEDDING_DIM], at(8, 0))
            .await
            .unwrap();

        let mut sub = submission(ClockKind::In, ClockMode::Office);
        sub.embedding = Some(vec![0.1; face::EMBEDDING_DIM]);
        let rec = clock(&pool, &policy, "emp-1", &sub, at(9, 0)).await.unwrap();
        assert_eq!(rec.status, AttendanceStatus::Present);
    }
}
