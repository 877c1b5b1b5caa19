use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::{clock, stats};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

/// Clock in / clock out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock",
    request_body = clock::ClockSubmission,
    responses(
        (status = 200, description = "Current-day attendance record", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Incomplete submission (missing evidence or location)"),
        (status = 409, description = "Already clocked in, or no open clock-in"),
        (status = 422, description = "Outside geofence / missing client address / face mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<clock::ClockSubmission>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let record = clock::clock(
        pool.get_ref(),
        &config.policy,
        employee_id,
        &payload,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Today's record for the caller
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record, or null when not clocked in yet"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let Some(employee_id) = auth.employee_id.as_deref() else {
        return Ok(HttpResponse::Ok().json(serde_json::Value::Null));
    };

    let record = clock::today_record(pool.get_ref(), employee_id, Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryFilter {
    /// Start of the date range (inclusive)
    #[schema(format = "date", value_type = Option<String>)]
    #[param(format = "date", value_type = Option<String>)]
    pub start: Option<NaiveDate>,
    /// End of the date range (inclusive)
    #[schema(format = "date", value_type = Option<String>)]
    #[param(format = "date", value_type = Option<String>)]
    pub end: Option<NaiveDate>,
    /// HR/Admin only; other callers always see their own history
    pub employee_id: Option<String>,
}

/// Attendance history
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Records newest first", body = Vec<crate::model::attendance::AttendanceRecord>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<HistoryFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.sees_all() {
        query.employee_id.clone()
    } else {
        match auth.employee_id.clone() {
            Some(id) => Some(id),
            None => return Ok(HttpResponse::Ok().json(Vec::<serde_json::Value>::new())),
        }
    };

    let records = clock::history(
        pool.get_ref(),
        employee_id.as_deref(),
        query.start,
        query.end,
    )
    .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatsFilter {
    /// Month in YYYY-MM form; defaults to the current month
    pub month: Option<String>,
    /// HR/Admin only; other callers always see their own stats
    pub employee_id: Option<String>,
}

/// Month-level attendance aggregates
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats",
    params(StatsFilter),
    responses(
        (status = 200, description = "Counts per status and attendance percentage", body = stats::AttendanceStats),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn month_stats(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<StatsFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.sees_all() {
        query.employee_id.clone()
    } else {
        auth.employee_id.clone()
    };

    let now = Utc::now();
    let (year, month) = match query.month.as_deref() {
        Some(raw) => parse_month(raw)
            .ok_or_else(|| actix_web::error::ErrorBadRequest("month must be YYYY-MM"))?,
        None => (now.year(), now.month()),
    };

    let stats = stats::month_stats(pool.get_ref(), year, month, employee_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (y, m) = raw.split_once('-')?;
    let year = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TeamFilter {
    /// Defaults to today
    #[schema(format = "date", value_type = Option<String>)]
    #[param(format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

/// Day view over everyone's records (approver roles)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/team",
    params(TeamFilter),
    responses(
        (status = 200, description = "All records for the day", body = Vec<crate::model::attendance::AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn team(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<TeamFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let records = clock::day_records(pool.get_ref(), date).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Office locations and work-hours policy, for rendering the geofence
#[utoipa::path(
    get,
    path = "/api/v1/attendance/settings",
    responses(
        (status = 200, description = "Office locations and work hours"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn settings(
    _auth: AuthUser,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let policy = &config.policy;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "office_locations": policy.offices,
        "work_hours": {
            "start": policy.work_start.format("%H:%M").to_string(),
            "end": policy.work_end.format("%H:%M").to_string(),
            "late_tolerance_minutes": policy.late_tolerance_min,
        }
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct SweepRequest {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// Absentee sweep: mark employees without a record on a past workday
#[utoipa::path(
    post,
    path = "/api/v1/attendance/sweep",
    request_body = SweepRequest,
    responses(
        (status = 200, description = "Number of records created", body = Object, example = json!({
            "created": 3
        })),
        (status = 400, description = "Date is today or in the future"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn sweep(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<SweepRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let created =
        stats::mark_absentees(pool.get_ref(), payload.date, Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "created": created })))
}
