use chrono::NaiveTime;
use dotenvy::dotenv;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Circular geofence around an office coordinate, used to validate
/// office-mode clock events.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OfficeLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius_m: f64,
    pub is_default: bool,
}

static DEFAULT_OFFICES: Lazy<Vec<OfficeLocation>> = Lazy::new(|| {
    vec![OfficeLocation {
        id: "office-main".to_string(),
        name: "Head Office".to_string(),
        latitude: -6.161777101062483,
        longitude: 106.87519933469652,
        radius_m: 100.0,
        is_default: true,
    }]
});

/// Attendance rules the engine evaluates clock events against.
#[derive(Debug, Clone)]
pub struct WorkPolicy {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub late_tolerance_min: i64,
    pub offices: Vec<OfficeLocation>,
    /// Maximum Euclidean distance between a submitted embedding and the
    /// stored template for the two faces to count as the same person.
    pub face_match_threshold: f32,
    /// When true, a failed (or impossible) face match blocks clocking
    /// instead of only being logged.
    pub face_enforced: bool,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub policy: WorkPolicy,
}

fn parse_time(var: &str, default: &str) -> NaiveTime {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .unwrap_or_else(|_| panic!("{} must be HH:MM", var))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let offices = match env::var("OFFICE_LOCATIONS") {
            Ok(raw) => serde_json::from_str(&raw).expect("OFFICE_LOCATIONS must be a JSON array"),
            Err(_) => DEFAULT_OFFICES.clone(),
        };

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            policy: WorkPolicy {
                work_start: parse_time("WORK_START", "09:00"),
                work_end: parse_time("WORK_END", "18:00"),
                late_tolerance_min: env::var("LATE_TOLERANCE_MIN")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap(),
                offices,
                face_match_threshold: env::var("FACE_MATCH_THRESHOLD")
                    .unwrap_or_else(|_| "0.6".to_string())
                    .parse()
                    .unwrap(),
                face_enforced: env::var("FACE_ENFORCED")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            },
        }
    }
}

#[cfg(test)]
impl WorkPolicy {
    /// Fixed policy used across the engine tests: 09:00 start, 15 minute
    /// tolerance, one office with a 100 m radius.
    pub fn test_default() -> Self {
        WorkPolicy {
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            late_tolerance_min: 15,
            offices: DEFAULT_OFFICES.clone(),
            face_match_threshold: 0.6,
            face_enforced: false,
        }
    }
}
