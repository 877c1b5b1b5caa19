use crate::auth::auth::AuthUser;
use crate::engine::face;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterFace {
    /// 128-dimensional face descriptor produced by the capture client
    pub embedding: Vec<f32>,
}

/// Register (or replace) the caller's face template
#[utoipa::path(
    post,
    path = "/api/v1/face/register",
    request_body = RegisterFace,
    responses(
        (status = 200, description = "Template stored", body = Object, example = json!({
            "message": "Face registered"
        })),
        (status = 400, description = "Wrong embedding dimensionality"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Face"
)]
pub async fn register(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<RegisterFace>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    face::register(pool.get_ref(), employee_id, &payload.embedding, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Face registered"
    })))
}

/// Whether the caller has a registered template
#[utoipa::path(
    get,
    path = "/api/v1/face/check",
    responses(
        (status = 200, description = "Registration flag", body = Object, example = json!({
            "registered": true
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Face"
)]
pub async fn check(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let Some(employee_id) = auth.employee_id.as_deref() else {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "registered": false })));
    };

    let registered = face::is_registered(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "registered": registered })))
}

/// The caller's stored template, for client-side verification
#[utoipa::path(
    get,
    path = "/api/v1/face/template",
    responses(
        (status = 200, description = "Stored embedding"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 422, description = "No template registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Face"
)]
pub async fn template(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let template = face::template(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "embedding": template.embedding })))
}
