use crate::auth::auth::AuthUser;
use crate::engine::requests::{self, SubmitOvertime, parse_hhmm};
use crate::model::leave::RequestStatus;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use super::leave::DecideRequest;

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "18:00")]
    pub start_time: String,
    #[schema(example = "21:30")]
    pub end_time: String,
    pub reason: String,
}

/// Submit an overtime request
#[utoipa::path(
    post,
    path = "/api/v1/overtime/request",
    request_body = CreateOvertime,
    responses(
        (status = 200, description = "Created pending request", body = crate::model::overtime::OvertimeRequest),
        (status = 400, description = "End not after start"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn submit(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateOvertime>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let req = SubmitOvertime {
        date: payload.date,
        start_time: parse_hhmm(&payload.start_time)?,
        end_time: parse_hhmm(&payload.end_time)?,
        reason: payload.reason.clone(),
    };
    let request = requests::submit_overtime(pool.get_ref(), employee_id, &req, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OvertimeFilter {
    /// Approver roles only; other callers always see their own requests
    pub employee_id: Option<String>,
    pub status: Option<RequestStatus>,
}

/// Overtime requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/overtime/requests",
    params(OvertimeFilter),
    responses(
        (status = 200, description = "Requests", body = Vec<crate::model::overtime::OvertimeRequest>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn list(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<OvertimeFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.require_approver().is_ok() {
        query.employee_id.clone()
    } else {
        match auth.employee_id.clone() {
            Some(id) => Some(id),
            None => return Ok(HttpResponse::Ok().json(Vec::<serde_json::Value>::new())),
        }
    };

    let requests =
        requests::list_overtime(pool.get_ref(), employee_id.as_deref(), query.status).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Approve or reject a pending overtime request
#[utoipa::path(
    post,
    path = "/api/v1/overtime/{request_id}/approve",
    params(("request_id" = String, Path, description = "Request to decide")),
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Decided request", body = crate::model::overtime::OvertimeRequest),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn decide(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<DecideRequest>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = requests::decide_overtime(
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
