// models/src/medical/user.rs
// Accounts are stored with the password hash only. Hashing itself lives in the
// security crate; this module never sees a plaintext password after intake.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::identifiers::UserId;

/// Input for self-registration and for administrator-created accounts.
/// It temporarily holds the plaintext password for hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// When absent for administrator-created accounts a password is generated.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub requires_support_activation: bool,
}

/// Stored account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: String,
    pub national_id: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub requires_support_activation: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_new_user(new_user: NewUser, password_hash: String, now: DateTime<Utc>) -> Self {
        User {
            id: UserId::generate(),
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_string(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: new_user.role,
            phone_number: new_user.phone_number,
            national_id: new_user.national_id,
            date_of_birth: new_user.date_of_birth,
            gender: new_user.gender,
            is_active: true,
            is_verified: false,
            requires_support_activation: new_user.requires_support_activation,
            password_hash,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// "First Last", falling back to the username when no name was given.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// An open support-activation request counts toward the pending queue.
    pub fn awaiting_activation(&self) -> bool {
        self.requires_support_activation && !self.is_verified
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            phone_number: self.phone_number.clone(),
            national_id: self.national_id.clone(),
            date_of_birth: self.date_of_birth,
            gender: self.gender.clone(),
            is_active: self.is_active,
            is_verified: self.is_verified,
            requires_support_activation: self.requires_support_activation,
        }
    }
}

/// Public projection of an account; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: String,
    pub national_id: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub requires_support_activation: bool,
}

/// Administrator edits to an existing account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub role: Option<Role>,
    /// `true` verifies the account and closes its support-activation request.
    #[serde(default)]
    pub activate: Option<bool>,
}

/// Response for administrator-created accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generated_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String, // Plaintext password for login attempt
}
