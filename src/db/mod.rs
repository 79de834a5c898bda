use std::{sync::Arc, time::Duration};

use color_eyre::{eyre::OptionExt, Result};

pub mod models;
pub use attempt::ATTEMPT_MAX_AGE;
pub use models::*;

mod attempt;
mod book;
mod helpers;
mod migrations;
mod quiz;
mod score;
mod user;

/// How long a local connection waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
    local: bool,
}

impl Db {
    /// Open a local database for `file:` urls, a remote one otherwise.
    pub async fn new(url: String, auth_token: Option<String>) -> Result<Self> {
        let local = url.starts_with("file:");
        let db = match url.strip_prefix("file:") {
            Some(path) => libsql::Builder::new_local(path).build().await?,
            None => {
                libsql::Builder::new_remote(url.clone(), auth_token.unwrap_or_default())
                    .build()
                    .await?
            }
        };

        let conn = db.connect()?;

        let one = conn
            .query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("connection check failed")?
            .get::<i32>(0)?;
        color_eyre::eyre::ensure!(one == 1, "connection check returned {one}");

        migrations::run(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(Self {
            db: Arc::new(db),
            local,
        })
    }

    /// A fresh connection; local ones wait on locked writes instead of failing.
    async fn connect(&self) -> Result<libsql::Connection> {
        let conn = self.db.connect()?;
        if self.local {
            conn.query(
                &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT.as_millis()),
                (),
            )
            .await?;
        }
        Ok(conn)
    }
}
