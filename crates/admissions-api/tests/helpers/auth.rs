use admissions_api::auth::jwt::issue_token;
use admissions_api::auth::Role;
use uuid::Uuid;

/// Shared secret for test tokens (must match the test config).
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

pub struct TestUser {
    pub user_id: Uuid,
    pub role: Role,
    pub token: String,
}

impl TestUser {
    pub fn applicant(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Applicant)
    }

    pub fn reviewer() -> Self {
        Self::new(Uuid::new_v4(), Role::Reviewer)
    }

    fn new(user_id: Uuid, role: Role) -> Self {
        let token = issue_token(TEST_JWT_SECRET, user_id, role, chrono::Duration::hours(1))
            .expect("Failed to issue test token");
        Self {
            user_id,
            role,
            token,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
