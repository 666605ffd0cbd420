use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{UserRole, VerificationStatus};

/// Marketplace account, either a customer browsing listings or an owner publishing them
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub verification_status: Option<VerificationStatus>,
    #[sqlx(json)]
    pub verification_documents: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_owner(&self) -> bool {
        self.role == UserRole::Owner
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            name: self.name.clone(),
        }
    }
}

/// What auth endpoints hand back about the signed-in user
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub name: Option<String>,
}

/// Public view of another party (owner, customer, chat participant)
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct UserSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}
