use crate::model::role::Role;
use serde::Serialize;
use utoipa::ToSchema;

/// The principal behind a lifecycle call. Handlers build this from the
/// verified bearer token; the engine never reads ambient auth state.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub employee_id: Option<String>,
    pub role: Role,
}

/// Minimum role required to decide a leave type's requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalLevel {
    Manager,
    Hr,
}

/// Managers decide manager-level requests; HR and Admin decide everything.
pub fn can_decide(role: Role, level: ApprovalLevel) -> bool {
    match level {
        ApprovalLevel::Manager => matches!(role, Role::Manager | Role::Hr | Role::Admin),
        ApprovalLevel::Hr => matches!(role, Role::Hr | Role::Admin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_level_decidable_by_manager_and_up() {
        assert!(can_decide(Role::Manager, ApprovalLevel::Manager));
        assert!(can_decide(Role::Hr, ApprovalLevel::Manager));
        assert!(can_decide(Role::Admin, ApprovalLevel::Manager));
        assert!(!can_decide(Role::Employee, ApprovalLevel::Manager));
    }

    #[test]
    fn hr_level_excludes_managers() {
        assert!(!can_decide(Role::Manager, ApprovalLevel::Hr));
        assert!(can_decide(Role::Hr, ApprovalLevel::Hr));
        assert!(can_decide(Role::Admin, ApprovalLevel::Hr));
    }
}
