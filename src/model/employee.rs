use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Roster entry. Provisioning lives in the employee-management surface;
/// the engine only reads ids and the active flag (for the absentee sweep).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: String,
    pub full_name: String,
    pub status: String,
}
