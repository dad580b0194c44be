// lib/src/engine/directory.rs
use chrono::Utc;
use log::{debug, warn};

use simrs_models::{
    CreatedUser, HospitalError, HospitalResult, Login, NewUser, Role, User, UserId, UserProfile, UserUpdate,
};
use simrs_security::{generate_password, hash_password, verify_password, Actor, AuthError, Permission};

use super::state::{Changeset, HospitalState, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;

const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_new_user(new_user: &NewUser) -> HospitalResult<()> {
    if new_user.username.trim().is_empty() {
        return Err(HospitalError::InvalidData("username is required".into()));
    }
    let email = new_user.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(HospitalError::InvalidData(format!("'{}' is not an email address", email)));
    }
    if let Some(password) = &new_user.password {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(HospitalError::InvalidData(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
    }
    Ok(())
}

fn ensure_unique_identity(state: &HospitalState, username: &str, email: &str) -> HospitalResult<()> {
    if state.find_user_by_username(username).is_some() {
        return Err(HospitalError::Conflict(format!("Username '{}' is already taken", username.trim())));
    }
    if state.find_user_by_email(email).is_some() {
        return Err(HospitalError::Conflict(format!("Email '{}' is already registered", email.trim())));
    }
    Ok(())
}

/// Argon2 is CPU-bound; both directions run on the blocking pool.
async fn hash_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(format!("Password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, password_hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AuthError::PasswordHash(format!("Password verification task failed: {}", e)))?
}

impl HospitalEngine {
    async fn insert_user(&self, new_user: NewUser, password: &str, verified: bool) -> HospitalResult<User> {
        {
            let state = self.state.read().await;
            ensure_unique_identity(&state, &new_user.username, &new_user.email)?;
        }
        let password_hash = hash_blocking(password.to_string()).await?;

        let mut state = self.state.write().await;
        ensure_unique_identity(&state, &new_user.username, &new_user.email)?;
        let mut user = User::from_new_user(new_user, password_hash, Utc::now());
        user.is_verified = verified;
        let event = EngineEvent::UserCreated { user: user.id, role: user.role };
        self.commit(&mut state, Changeset::new().put(Record::User(user.clone())), event)
            .await?;
        Ok(user)
    }

    /// Self-registration. Always produces a PATIENT account.
    pub async fn register(&self, mut new_user: NewUser) -> HospitalResult<UserProfile> {
        validate_new_user(&new_user)?;
        let password = new_user
            .password
            .take()
            .ok_or_else(|| HospitalError::InvalidData("password is required".into()))?;
        if new_user.role != Role::Patient {
            debug!("Self-registration for {} requested role {}; using PATIENT", new_user.username, new_user.role);
            new_user.role = Role::Patient;
        }
        let user = self.insert_user(new_user, &password, false).await?;
        Ok(user.profile())
    }

    /// Checks credentials and records the login time.
    pub async fn authenticate(&self, login: Login) -> HospitalResult<UserProfile> {
        let (user_id, password_hash) = {
            let state = self.state.read().await;
            let user = state.find_user_by_username(&login.username).ok_or_else(|| {
                debug!("Login attempt for unknown username {}", login.username);
                HospitalError::from(AuthError::InvalidCredentials)
            })?;
            (user.id, user.password_hash.clone())
        };
        if let Err(e) = verify_blocking(login.password, password_hash).await {
            warn!("Failed login for user {}: {}", user_id, e);
            return Err(e.into());
        }

        let mut state = self.state.write().await;
        let mut user = state.user(user_id)?.clone();
        if !user.is_active {
            return Err(AuthError::InactiveAccount.into());
        }
        user.last_login = Some(Utc::now());
        let event = EngineEvent::UserLoggedIn { user: user.id };
        self.commit(&mut state, Changeset::new().put(Record::User(user.clone())), event)
            .await?;
        Ok(user.profile())
    }

    /// Turns a token subject into an actor carrying the account's current role.
    pub async fn resolve_actor(&self, user_id: UserId) -> HospitalResult<Actor> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| HospitalError::Unauthorized("Account no longer exists".into()))?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount.into());
        }
        Ok(Actor::new(user.id, user.role))
    }

    pub async fn me(&self, actor: &Actor) -> HospitalResult<UserProfile> {
        let state = self.state.read().await;
        Ok(state.user(actor.user_id)?.profile())
    }

    pub async fn list_users(&self, actor: &Actor, role: Option<Role>) -> HospitalResult<Vec<UserProfile>> {
        self.authorize(actor, Permission::ViewDirectory)?;
        let state = self.state.read().await;
        let mut users: Vec<UserProfile> = state
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .map(User::profile)
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    /// Administrator-created account of any role. Without a password one is
    /// generated and returned once.
    pub async fn create_user(&self, actor: &Actor, mut new_user: NewUser) -> HospitalResult<CreatedUser> {
        self.authorize(actor, Permission::ManageUsers)?;
        if new_user.role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
            return Err(HospitalError::Forbidden("only a super admin may create super admins".into()));
        }
        validate_new_user(&new_user)?;
        let (password, generated_password) = match new_user.password.take() {
            Some(password) => (password, None),
            None => {
                let generated = generate_password();
                (generated.clone(), Some(generated))
            }
        };
        let user = self.insert_user(new_user, &password, false).await?;
        Ok(CreatedUser { profile: user.profile(), generated_password })
    }

    pub async fn update_user(&self, actor: &Actor, id: UserId, update: UserUpdate) -> HospitalResult<UserProfile> {
        self.authorize(actor, Permission::ManageUsers)?;
        let mut state = self.state.write().await;
        let mut user = state.user(id)?.clone();
        if actor.role != Role::SuperAdmin
            && (user.role == Role::SuperAdmin || update.role == Some(Role::SuperAdmin))
        {
            return Err(HospitalError::Forbidden("only a super admin may manage super admins".into()));
        }
        if actor.is(id) && update.is_active == Some(false) {
            return Err(HospitalError::InvalidData("an administrator cannot deactivate their own account".into()));
        }

        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if update.activate == Some(true) {
            user.is_verified = true;
            user.requires_support_activation = false;
        }
        user.updated_at = Utc::now();
        let event = EngineEvent::UserUpdated { user: id };
        self.commit(&mut state, Changeset::new().put(Record::User(user.clone())), event)
            .await?;
        Ok(user.profile())
    }

    /// Bootstrap path used by the `create-admin` command; no actor exists yet.
    pub async fn create_superuser(&self, username: &str, email: &str, password: &str) -> HospitalResult<UserProfile> {
        let new_user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: Some(password.to_string()),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::SuperAdmin,
            phone_number: String::new(),
            national_id: String::new(),
            date_of_birth: None,
            gender: String::new(),
            requires_support_activation: false,
        };
        validate_new_user(&new_user)?;
        let user = self.insert_user(new_user, password, true).await?;
        Ok(user.profile())
    }
}
