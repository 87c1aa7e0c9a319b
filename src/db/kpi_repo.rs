use sqlx::SqlitePool;

use super::parse_timestamp;
use crate::models::DashboardKpis;

/// Fixed key of the single snapshot row.
const SNAPSHOT_ID: &str = "current";

#[derive(Clone)]
pub struct KpiRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct KpiRow {
    total_animals: i64,
    average_weight: f64,
    males: i64,
    females: i64,
    in_treatment: i64,
    updated_at: String,
}

impl KpiRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Overwrites the cached snapshot.
    pub async fn save(&self, kpis: &DashboardKpis) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO dashboard_kpis
                (id, total_animals, average_weight, males, females, in_treatment, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(SNAPSHOT_ID)
        .bind(kpis.total_animals)
        .bind(kpis.average_weight)
        .bind(kpis.males)
        .bind(kpis.females)
        .bind(kpis.in_treatment)
        .bind(kpis.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<DashboardKpis>, sqlx::Error> {
        let row: Option<KpiRow> = sqlx::query_as(
            "SELECT total_animals, average_weight, males, females, in_treatment, updated_at FROM dashboard_kpis WHERE id = ?",
        )
        .bind(SNAPSHOT_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(DashboardKpis {
                total_animals: row.total_animals,
                average_weight: row.average_weight,
                males: row.males,
                females: row.females,
                in_treatment: row.in_treatment,
                updated_at: parse_timestamp(&row.updated_at)?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use chrono::Utc;
    use tempfile::TempDir;

    fn snapshot(total: i64) -> DashboardKpis {
        DashboardKpis {
            total_animals: total,
            average_weight: 420.5,
            males: 1,
            females: total - 1,
            in_treatment: 0,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = KpiRepository::new(init_db(&temp_dir.path().join("t.db")).await.unwrap());
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_single_row() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("t.db")).await.unwrap();
        let repo = KpiRepository::new(pool.clone());

        repo.save(&snapshot(10)).await.unwrap();
        let latest = snapshot(12);
        repo.save(&latest).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded, latest);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dashboard_kpis")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
