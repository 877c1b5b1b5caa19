use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exactly zero or one per employee; re-registration silently replaces the
/// prior template. The embedding is produced client-side and stored as a
/// JSON-encoded vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceTemplate {
    pub employee_id: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}
