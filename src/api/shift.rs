use crate::auth::auth::AuthUser;
use crate::engine::requests::parse_hhmm;
use crate::engine::shifts;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateShift {
    #[schema(example = "Morning")]
    pub name: String,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "18:00")]
    pub end_time: String,
    #[schema(example = "#0F62FE")]
    pub color: Option<String>,
}

/// Create a shift (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/shifts",
    request_body = CreateShift,
    responses(
        (status = 200, description = "Created shift", body = crate::model::shift::Shift),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn create(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let shift = shifts::create_shift(
        pool.get_ref(),
        &payload.name,
        parse_hhmm(&payload.start_time)?,
        parse_hhmm(&payload.end_time)?,
        payload.color.as_deref().unwrap_or("#0F62FE"),
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(shift))
}

/// List shifts
#[utoipa::path(
    get,
    path = "/api/v1/shifts",
    responses(
        (status = 200, description = "All shifts", body = Vec<crate::model::shift::Shift>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let shifts = shifts::list_shifts(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(shifts))
}

/// Update a shift (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/shifts/{shift_id}",
    params(("shift_id" = String, Path, description = "Shift to update")),
    request_body = CreateShift,
    responses(
        (status = 200, description = "Updated shift", body = crate::model::shift::Shift),
        (status = 404, description = "Not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn update(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<CreateShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let shift = shifts::update_shift(
        pool.get_ref(),
        &path.into_inner(),
        &payload.name,
        parse_hhmm(&payload.start_time)?,
        parse_hhmm(&payload.end_time)?,
        payload.color.as_deref().unwrap_or("#0F62FE"),
    )
    .await?;
    Ok(HttpResponse::Ok().json(shift))
}

/// Delete an unassigned shift (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/shifts/{shift_id}",
    params(("shift_id" = String, Path, description = "Shift to delete")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Shift still assigned"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn delete(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    shifts::delete_shift(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Shift deleted" })))
}

#[derive(Deserialize, ToSchema)]
pub struct AssignShift {
    pub employee_id: String,
    pub shift_id: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub effective_from: NaiveDate,
    /// Open-ended when absent
    #[schema(example = "2026-06-30", format = "date", value_type = Option<String>)]
    pub effective_to: Option<NaiveDate>,
}

/// Assign a shift to an employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/shifts/assign",
    request_body = AssignShift,
    responses(
        (status = 200, description = "Created assignment", body = crate::model::shift::ShiftAssignment),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "Shift not found"),
        (status = 409, description = "Overlaps an existing assignment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn assign(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<AssignShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let assignment = shifts::assign(
        pool.get_ref(),
        &payload.employee_id,
        &payload.shift_id,
        payload.effective_from,
        payload.effective_to,
    )
    .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// List shift assignments
#[utoipa::path(
    get,
    path = "/api/v1/shifts/assignments",
    responses(
        (status = 200, description = "All assignments", body = Vec<crate::model::shift::ShiftAssignment>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn assignments(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let assignments = shifts::list_assignments(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(assignments))
}
