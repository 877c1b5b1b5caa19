use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Every fallible engine operation returns one of these. The four classes
/// map straight onto HTTP statuses so a caller can always distinguish
/// malformed input, stale client state, a business-rule rejection, and a
/// missing approval level.
#[derive(Debug, Error)]
pub enum EngineError {
    // Validation: recoverable by resubmitting corrected input.
    #[error("evidence reference is required")]
    MissingEvidence,
    #[error("latitude and longitude are required")]
    MissingLocation,
    #[error("invalid date or time range")]
    InvalidRange,
    #[error("a reason is required when rejecting")]
    MissingReason,
    #[error("embedding must have {0} dimensions")]
    InvalidEmbedding(usize),

    // Conflict: stale client state, refetch and retry.
    #[error("already clocked in today")]
    DuplicateClockIn,
    #[error("no open clock-in found for today")]
    NoPriorClockIn,
    #[error("request is not pending")]
    NotPending,
    #[error("date range overlaps an existing pending or approved request")]
    OverlappingRequest,
    #[error("employee already has a shift assignment covering this range")]
    OverlappingAssignment,
    #[error("shift is still assigned to employees")]
    ShiftInUse,

    // Policy: business-rule rejection, surfaced verbatim to the end user.
    #[error("requested {requested} day(s) exceeds the maximum of {max}")]
    ExceedsMaxDays { requested: i64, max: i64 },
    #[error("must be submitted at least {min_lead_days} day(s) before the start date")]
    LeadTimeViolation { min_lead_days: i64 },
    #[error("insufficient leave balance: {remaining} day(s) remaining")]
    InsufficientBalance { remaining: i64 },
    #[error("outside office geofence: {distance_m:.0}m from the nearest office")]
    OutsideGeofence { distance_m: f64 },
    #[error("client address is required for client-visit mode")]
    MissingClientAddress,
    #[error("face does not match the registered template")]
    FaceMismatch,
    #[error("no face template registered")]
    NoTemplateRegistered,

    // Authorization: never retried automatically.
    #[error("not allowed to decide this request")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl EngineError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MissingEvidence => "missing_evidence",
            EngineError::MissingLocation => "missing_location",
            EngineError::InvalidRange => "invalid_range",
            EngineError::MissingReason => "missing_reason",
            EngineError::InvalidEmbedding(_) => "invalid_embedding",
            EngineError::DuplicateClockIn => "duplicate_clock_in",
            EngineError::NoPriorClockIn => "no_prior_clock_in",
            EngineError::NotPending => "not_pending",
            EngineError::OverlappingRequest => "overlapping_request",
            EngineError::OverlappingAssignment => "overlapping_assignment",
            EngineError::ShiftInUse => "shift_in_use",
            EngineError::ExceedsMaxDays { .. } => "exceeds_max_days",
            EngineError::LeadTimeViolation { .. } => "lead_time_violation",
            EngineError::InsufficientBalance { .. } => "insufficient_balance",
            EngineError::OutsideGeofence { .. } => "outside_geofence",
            EngineError::MissingClientAddress => "missing_client_address",
            EngineError::FaceMismatch => "face_mismatch",
            EngineError::NoTemplateRegistered => "no_template_registered",
            EngineError::Unauthorized => "unauthorized",
            EngineError::NotFound => "not_found",
            EngineError::Db(_) => "internal",
        }
    }
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::MissingEvidence
            | EngineError::MissingLocation
            | EngineError::InvalidRange
            | EngineError::MissingReason
            | EngineError::InvalidEmbedding(_) => StatusCode::BAD_REQUEST,

            EngineError::DuplicateClockIn
            | EngineError::NoPriorClockIn
            | EngineError::NotPending
            | EngineError::OverlappingRequest
            | EngineError::OverlappingAssignment
            | EngineError::ShiftInUse => StatusCode::CONFLICT,

            EngineError::ExceedsMaxDays { .. }
            | EngineError::LeadTimeViolation { .. }
            | EngineError::InsufficientBalance { .. }
            | EngineError::OutsideGeofence { .. }
            | EngineError::MissingClientAddress
            | EngineError::FaceMismatch
            | EngineError::NoTemplateRegistered => StatusCode::UNPROCESSABLE_ENTITY,

            EngineError::Unauthorized => StatusCode::FORBIDDEN,
            EngineError::NotFound => StatusCode::NOT_FOUND,
            EngineError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Db(e) = self {
            tracing::error!(error = %e, "Storage error");
            return HttpResponse::InternalServerError().json(json!({
                "error": "internal",
                "message": "Internal Server Error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.to_string()
        }))
    }
}
