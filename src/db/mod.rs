//! Local cache store backed by SQLite.
//!
//! One table per entity (`animals`, `vaccines`, `dashboard_kpis`,
//! `vaccine_types`). Batch writes run inside a single transaction so a
//! failed batch leaves the previous state untouched.

mod animal_repo;
mod kpi_repo;
mod vaccine_repo;
mod vaccine_type_repo;

pub use animal_repo::AnimalRepository;
pub use kpi_repo::KpiRepository;
pub use vaccine_repo::VaccineRepository;
pub use vaccine_type_repo::VaccineTypeRepository;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Outcome of replacing the synchronized rows of a table with a remote set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    /// Remote records written (inserted or overwritten).
    pub applied: usize,
    /// Remote records skipped because the local row has unsynchronized edits.
    pub kept_local: usize,
    /// Synchronized local rows removed because the server no longer has them.
    pub removed: usize,
}

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

fn decode_error<E>(e: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    sqlx::Error::Decode(e.into())
}

fn parse_uuid(s: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(decode_error)
}

fn parse_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>, sqlx::Error> {
    s.map(parse_uuid).transpose()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(decode_error)
}

fn parse_date(s: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(decode_error)
}

fn parse_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>, sqlx::Error> {
    s.map(parse_date).transpose()
}

fn parse_enum<T: FromStr<Err = String>>(s: &str) -> Result<T, sqlx::Error> {
    T::from_str(s).map_err(decode_error)
}
