use crate::auth::auth::AuthUser;
use crate::engine::authority::ApprovalLevel;
use crate::engine::requests::{self, DecisionAction, SubmitLeave};
use crate::engine::ledger;
use crate::model::leave::{LeaveKind, RequestStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct LeaveTypeInfo {
    pub kind: LeaveKind,
    pub label: String,
    pub allotted: Option<i64>,
    pub deducts_quota: bool,
    pub approval_level: ApprovalLevel,
    pub min_lead_days: i64,
    pub max_days: i64,
    pub needs_attachment: bool,
}

/// The leave-type policy table
#[utoipa::path(
    get,
    path = "/api/v1/leave/types",
    responses(
        (status = 200, description = "All leave types and their rules", body = Vec<LeaveTypeInfo>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn types(_auth: AuthUser) -> actix_web::Result<impl Responder> {
    let types: Vec<LeaveTypeInfo> = LeaveKind::all()
        .map(|kind| {
            let p = kind.policy();
            LeaveTypeInfo {
                kind,
                label: p.label.to_string(),
                allotted: p.allotted,
                deducts_quota: p.deducts_quota,
                approval_level: p.approval,
                min_lead_days: p.min_lead_days,
                max_days: p.max_days,
                needs_attachment: p.needs_attachment,
            }
        })
        .collect();
    Ok(HttpResponse::Ok().json(types))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceFilter {
    /// HR/Admin only; other callers always see their own balance
    pub employee_id: Option<String>,
    /// Defaults to the current year
    pub year: Option<i64>,
}

/// Balance per quota-tracked leave type
#[utoipa::path(
    get,
    path = "/api/v1/leave/balance",
    params(BalanceFilter),
    responses(
        (status = 200, description = "Allotted / used / held per type", body = Vec<crate::model::leave::LeaveBalance>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn balance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<BalanceFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.sees_all() {
        query.employee_id.clone().or_else(|| auth.employee_id.clone())
    } else {
        auth.employee_id.clone()
    };
    let Some(employee_id) = employee_id else {
        return Ok(HttpResponse::Ok().json(Vec::<serde_json::Value>::new()));
    };

    let year = query.year.unwrap_or_else(|| Utc::now().year() as i64);
    let balances = ledger::balances(pool.get_ref(), &employee_id, year).await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave/request",
    request_body = SubmitLeave,
    responses(
        (status = 200, description = "Created pending request", body = crate::model::leave::LeaveRequest),
        (status = 400, description = "Invalid range"),
        (status = 409, description = "Overlapping request"),
        (status = 422, description = "Policy violation (max days, lead time, balance)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn submit(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let request =
        requests::submit_leave(pool.get_ref(), employee_id, &payload, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Approver roles only; other callers always see their own requests
    pub employee_id: Option<String>,
    #[schema(example = "pending")]
    pub status: Option<RequestStatus>,
}

/// Leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leave/requests",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Requests", body = Vec<crate::model::leave::LeaveRequest>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.require_approver().is_ok() {
        query.employee_id.clone()
    } else {
        match auth.employee_id.clone() {
            Some(id) => Some(id),
            None => return Ok(HttpResponse::Ok().json(Vec::<serde_json::Value>::new())),
        }
    };

    let requests = requests::list_leave(pool.get_ref(), employee_id.as_deref(), query.status).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Pending requests the caller may decide
#[utoipa::path(
    get,
    path = "/api/v1/leave/pending",
    responses(
        (status = 200, description = "Decidable pending requests, newest first", body = Vec<crate::model::leave::LeaveRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let requests = requests::pending_leave(pool.get_ref(), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[derive(Deserialize, ToSchema)]
pub struct DecideRequest {
    pub action: DecisionAction,
    /// Required when rejecting a leave request
    pub reason: Option<String>,
}

/// Approve or reject a pending leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{request_id}/approve",
    params(("request_id" = String, Path, description = "Request to decide")),
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Decided request", body = crate::model::leave::LeaveRequest),
        (status = 400, description = "Missing reject reason"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Below the required approval level")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<DecideRequest>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = requests::decide_leave(
        pool.get_ref(),
        &auth.actor(),
        &request_id,
        payload.action,
        payload.reason.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Cancel a pending leave request (owner or HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{request_id}",
    params(("request_id" = String, Path, description = "Request to cancel")),
    responses(
        (status = 200, description = "Cancelled request", body = crate::model::leave::LeaveRequest),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = requests::cancel_leave(pool.get_ref(), &auth.actor(), &request_id).await?;
    Ok(HttpResponse::Ok().json(request))
}
