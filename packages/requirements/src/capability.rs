// ABOUTME: Role capability predicates for the review workflow
// ABOUTME: Single source of truth for who may review, accept, and override assignments

use casebook_users::UserRole;

use crate::types::Actor;

/// Roles allowed to review requirements and decide acceptance
pub const REVIEWER_ROLES: [UserRole; 3] = [UserRole::Admin, UserRole::Pm, UserRole::QaLead];

pub fn can_review(actor: &Actor) -> bool {
    REVIEWER_ROLES.contains(&actor.role)
}

pub fn can_accept(actor: &Actor) -> bool {
    REVIEWER_ROLES.contains(&actor.role)
}

/// Admins may act on requirements assigned to someone else
pub fn is_admin(actor: &Actor) -> bool {
    actor.role == UserRole::Admin
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UserRole::Admin, true, true)]
    #[case(UserRole::Pm, true, false)]
    #[case(UserRole::QaLead, true, false)]
    #[case(UserRole::Tester, false, false)]
    #[case(UserRole::Developer, false, false)]
    #[case(UserRole::Viewer, false, false)]
    fn test_role_capabilities(#[case] role: UserRole, #[case] reviewer: bool, #[case] admin: bool) {
        let actor = Actor::new("usr-1", role);
        assert_eq!(can_review(&actor), reviewer);
        assert_eq!(can_accept(&actor), reviewer);
        assert_eq!(is_admin(&actor), admin);
    }
}
