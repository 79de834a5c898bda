use std::future::Future;

use color_eyre::Result;

use crate::db::models::AuthUser;
use crate::db::Db;

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> impl Future<Output = Result<i32>> + Send;

    fn create_user_session(&self, user_id: i32) -> impl Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<AuthUser>>> + Send;

    fn delete_user_session(&self, session_id: &str) -> impl Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Db::email_exists(self, email).await
    }

    async fn create_user(&self, email: &str, password: &str, is_admin: bool) -> Result<i32> {
        Db::create_user(self, email, password, is_admin).await
    }

    async fn create_user_session(&self, user_id: i32) -> Result<String> {
        Db::create_user_session(self, user_id).await
    }

    async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, email, password).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_email(self, email).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }
}

#[derive(Debug)]
pub enum RegisterOutcome {
    /// User created and session started. Contains the session token.
    LoggedIn(String),
    InvalidEmail,
    /// Shorter than [`MIN_PASSWORD_LENGTH`].
    WeakPassword,
    PasswordMismatch,
    EmailTaken,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success(String),
    /// Unknown email or wrong password; callers must not tell which.
    InvalidCredentials,
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace; good enough to catch typos.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
    admin_emails: Vec<String>,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            admin_emails: self.admin_emails.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R, admin_emails: Vec<String>) -> Self {
        Self {
            repo,
            admin_emails: admin_emails.iter().map(|e| normalize_email(e)).collect(),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == email)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !self.repo.verify_user_password(&email, password).await? {
            tracing::info!("failed login attempt for {email}");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| color_eyre::eyre::eyre!("user not found after password verification"))?;

        let session_token = self.repo.create_user_session(user.id).await?;
        Ok(LoginOutcome::Success(session_token))
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<RegisterOutcome> {
        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Ok(RegisterOutcome::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Ok(RegisterOutcome::WeakPassword);
        }
        if password != confirm_password {
            return Ok(RegisterOutcome::PasswordMismatch);
        }
        if self.repo.email_exists(&email).await? {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let is_admin = self.is_admin_email(&email);
        let user_id = self.repo.create_user(&email, password, is_admin).await?;
        let session_token = self.repo.create_user_session(user_id).await?;

        Ok(RegisterOutcome::LoggedIn(session_token))
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }
}
