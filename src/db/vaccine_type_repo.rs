use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::VaccineType;

#[derive(Clone)]
pub struct VaccineTypeRepository {
    pool: SqlitePool,
}

impl VaccineTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<VaccineType>, sqlx::Error> {
        let rows: Vec<(String, bool)> =
            sqlx::query_as("SELECT name, synchronized FROM vaccine_types ORDER BY name COLLATE NOCASE")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name, synchronized)| VaccineType { name, synchronized })
            .collect())
    }

    pub async fn list_unsynced(&self) -> Result<Vec<VaccineType>, sqlx::Error> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|t| !t.synchronized)
            .collect())
    }

    /// Adds a name to the catalog. Returns false if it already exists
    /// (compared ignoring case).
    pub async fn add(&self, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO vaccine_types (name, synchronized, created_at) VALUES (?, 0, ?)",
        )
        .bind(name.trim())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Records names the server now holds. Existing rows, whatever their
    /// case, are flagged synchronized; names added locally in the meantime
    /// are left alone.
    pub async fn save_synced(&self, types: &[VaccineType]) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for entry in types {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO vaccine_types (name, synchronized, created_at) VALUES (?, 1, ?)
                ON CONFLICT(name) DO UPDATE SET synchronized = 1
                "#,
            )
            .bind(name)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (VaccineTypeRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("t.db")).await.unwrap();
        (VaccineTypeRepository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_add_ignores_case_duplicates() {
        let (repo, _temp) = setup().await;

        assert!(repo.add("Aftosa").await.unwrap());
        assert!(!repo.add("AFTOSA").await.unwrap());
        assert!(repo.add("  Rabies ").await.unwrap());

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Aftosa", "Rabies"]);
        assert_eq!(repo.list_unsynced().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_synced_keeps_local_additions() {
        let (repo, _temp) = setup().await;
        repo.add("aftosa").await.unwrap();
        repo.add("Local Only").await.unwrap();

        repo.save_synced(&[VaccineType::new("Aftosa"), VaccineType::new("Clostridial")])
            .await
            .unwrap();

        let types = repo.list().await.unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["aftosa", "Clostridial", "Local Only"]);

        let unsynced = repo.list_unsynced().await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].name, "Local Only");
    }
}
