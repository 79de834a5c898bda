use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::Result;
use libsql::params;
use serde::Deserialize;
use ulid::Ulid;

use super::helpers::{query_one, query_optional};
use super::models::{AuthUser, AuthUserRow};
use super::Db;

#[derive(Deserialize)]
struct InsertedId {
    id: i32,
}

impl Db {
    pub async fn create_user(&self, email: &str, password: &str, is_admin: bool) -> Result<i32> {
        let password_hash = hash_password(password)?;
        let conn = self.connect().await?;

        let inserted: InsertedId = query_one(
            &conn,
            "INSERT INTO users (email, password_hash, is_admin) VALUES (?, ?, ?) RETURNING id",
            params![email, password_hash, i64::from(is_admin)],
        )
        .await?;

        tracing::info!(
            "new user created: id={}, email={email}, admin={is_admin}",
            inserted.id
        );
        Ok(inserted.id)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect().await?;
        let row: Option<AuthUserRow> = query_optional(
            &conn,
            "SELECT id, email, is_admin FROM users WHERE email = ?",
            params![email],
        )
        .await?;

        Ok(row.map(AuthUser::from))
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT password_hash FROM users WHERE email = ?",
                params![email],
            )
            .await?
            .next()
            .await?;

        match row {
            Some(row) => {
                let stored_hash = row.get::<String>(0)?;
                Ok(verify_password(password, &stored_hash))
            }
            None => Ok(false),
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.connect().await?;
        let row = conn
            .query("SELECT 1 FROM users WHERE email = ?", params![email])
            .await?
            .next()
            .await?;
        Ok(row.is_some())
    }

    pub async fn create_user_session(&self, user_id: i32) -> Result<String> {
        let session = Ulid::new().to_string();
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO user_sessions (id, user_id) VALUES (?, ?)",
            params![session.clone(), user_id],
        )
        .await?;

        tracing::info!("new user session created for user_id={user_id}");
        Ok(session)
    }

    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect().await?;
        let row: Option<AuthUserRow> = query_optional(
            &conn,
            r#"
            SELECT u.id, u.email, u.is_admin
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ?
            "#,
            params![session_id],
        )
        .await?;

        Ok(row.map(AuthUser::from))
    }

    pub async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        let conn = self.connect().await?;
        conn.execute(
            "DELETE FROM user_sessions WHERE id = ?",
            params![session_id],
        )
        .await?;
        Ok(())
    }

    /// Grant the admin role to every listed email that already has an account.
    pub async fn promote_admins(&self, emails: &[String]) -> Result<u64> {
        let conn = self.connect().await?;
        let mut promoted = 0;
        for email in emails {
            promoted += conn
                .execute(
                    "UPDATE users SET is_admin = 1 WHERE email = ? AND is_admin = 0",
                    params![email.as_str()],
                )
                .await?;
        }

        if promoted > 0 {
            tracing::info!("promoted {promoted} users to admin");
        }
        Ok(promoted)
    }
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}
