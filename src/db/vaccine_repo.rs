use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use super::{parse_date, parse_opt_date, parse_timestamp, parse_uuid, ReplaceStats};
use crate::models::Vaccine;

#[derive(Clone)]
pub struct VaccineRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct VaccineRow {
    id: String,
    server_id: Option<i64>,
    animal_id: String,
    name: String,
    applied_on: String,
    dose: Option<String>,
    lot: Option<String>,
    veterinarian: Option<String>,
    next_dose_on: Option<String>,
    notes: Option<String>,
    synchronized: bool,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<VaccineRow> for Vaccine {
    type Error = sqlx::Error;

    fn try_from(row: VaccineRow) -> Result<Self, Self::Error> {
        Ok(Vaccine {
            id: parse_uuid(&row.id)?,
            server_id: row.server_id,
            animal_id: parse_uuid(&row.animal_id)?,
            name: row.name,
            applied_on: parse_date(&row.applied_on)?,
            dose: row.dose,
            lot: row.lot,
            veterinarian: row.veterinarian,
            next_dose_on: parse_opt_date(row.next_dose_on.as_deref())?,
            notes: row.notes,
            synchronized: row.synchronized,
            active: row.active,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn rows_into(rows: Vec<VaccineRow>) -> Result<Vec<Vaccine>, sqlx::Error> {
    rows.into_iter().map(Vaccine::try_from).collect()
}

async fn write_vaccine<'e, E>(executor: E, vaccine: &Vaccine) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO vaccines (id, server_id, animal_id, name, applied_on, dose, lot, veterinarian,
                              next_dose_on, notes, synchronized, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            server_id = excluded.server_id,
            animal_id = excluded.animal_id,
            name = excluded.name,
            applied_on = excluded.applied_on,
            dose = excluded.dose,
            lot = excluded.lot,
            veterinarian = excluded.veterinarian,
            next_dose_on = excluded.next_dose_on,
            notes = excluded.notes,
            synchronized = excluded.synchronized,
            active = excluded.active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(vaccine.id.to_string())
    .bind(vaccine.server_id)
    .bind(vaccine.animal_id.to_string())
    .bind(&vaccine.name)
    .bind(vaccine.applied_on.to_string())
    .bind(&vaccine.dose)
    .bind(&vaccine.lot)
    .bind(&vaccine.veterinarian)
    .bind(vaccine.next_dose_on.map(|d| d.to_string()))
    .bind(&vaccine.notes)
    .bind(vaccine.synchronized)
    .bind(vaccine.active)
    .bind(vaccine.created_at.to_rfc3339())
    .bind(vaccine.updated_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

impl VaccineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, vaccine: &Vaccine) -> Result<(), sqlx::Error> {
        write_vaccine(&self.pool, vaccine).await
    }

    pub async fn upsert_many(&self, vaccines: &[Vaccine]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for vaccine in vaccines {
            write_vaccine(&mut *tx, vaccine).await?;
        }
        tx.commit().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Vaccine>, sqlx::Error> {
        let row: Option<VaccineRow> = sqlx::query_as("SELECT * FROM vaccines WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Vaccine::try_from).transpose()
    }

    pub async fn get_by_server_id(&self, server_id: i64) -> Result<Option<Vaccine>, sqlx::Error> {
        let row: Option<VaccineRow> = sqlx::query_as("SELECT * FROM vaccines WHERE server_id = ?")
            .bind(server_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Vaccine::try_from).transpose()
    }

    /// Active vaccines of one animal, most recent application first.
    pub async fn list_for_animal(&self, animal_id: Uuid) -> Result<Vec<Vaccine>, sqlx::Error> {
        let rows: Vec<VaccineRow> = sqlx::query_as(
            "SELECT * FROM vaccines WHERE animal_id = ? AND active = 1 ORDER BY applied_on DESC",
        )
        .bind(animal_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }

    pub async fn list_active(&self) -> Result<Vec<Vaccine>, sqlx::Error> {
        let rows: Vec<VaccineRow> =
            sqlx::query_as("SELECT * FROM vaccines WHERE active = 1 ORDER BY applied_on DESC")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    pub async fn list_all(&self) -> Result<Vec<Vaccine>, sqlx::Error> {
        let rows: Vec<VaccineRow> = sqlx::query_as("SELECT * FROM vaccines ORDER BY applied_on")
            .fetch_all(&self.pool)
            .await?;
        rows_into(rows)
    }

    pub async fn list_unsynced(&self) -> Result<Vec<Vaccine>, sqlx::Error> {
        let rows: Vec<VaccineRow> =
            sqlx::query_as("SELECT * FROM vaccines WHERE synchronized = 0 ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    /// See [`AnimalRepository::mark_synced`](super::AnimalRepository::mark_synced).
    pub async fn mark_synced(
        &self,
        id: Uuid,
        server_id: i64,
        uploaded_version: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vaccines SET server_id = ?, synchronized = 1 WHERE id = ? AND updated_at = ?",
        )
        .bind(server_id)
        .bind(id.to_string())
        .bind(uploaded_version.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        sqlx::query("UPDATE vaccines SET server_id = ? WHERE id = ?")
            .bind(server_id)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(false)
    }

    /// Soft-deleted vaccines, most recently deleted first.
    pub async fn list_deleted(&self) -> Result<Vec<Vaccine>, sqlx::Error> {
        let rows: Vec<VaccineRow> =
            sqlx::query_as("SELECT * FROM vaccines WHERE active = 0 ORDER BY updated_at DESC")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.set_active(id, false).await
    }

    pub async fn restore(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vaccines SET active = ?, synchronized = 0, updated_at = ? WHERE id = ? AND active = ?",
        )
        .bind(active)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(!active)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vaccines WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Same contract as [`AnimalRepository::replace_synced`](super::AnimalRepository::replace_synced).
    pub async fn replace_synced(&self, remote: &[Vaccine]) -> Result<ReplaceStats, sqlx::Error> {
        let mut stats = ReplaceStats::default();
        let mut keep = HashSet::with_capacity(remote.len());
        let mut tx = self.pool.begin().await?;

        for vaccine in remote {
            let id = vaccine.id.to_string();
            keep.insert(id.clone());

            let existing: Option<(bool,)> =
                sqlx::query_as("SELECT synchronized FROM vaccines WHERE id = ?")
                    .bind(&id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some((false,)) = existing {
                stats.kept_local += 1;
                continue;
            }

            write_vaccine(&mut *tx, vaccine).await?;
            stats.applied += 1;
        }

        let synced: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM vaccines WHERE synchronized = 1")
                .fetch_all(&mut *tx)
                .await?;
        for (id,) in synced {
            if keep.contains(&id) {
                continue;
            }
            sqlx::query("DELETE FROM vaccines WHERE id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            stats.removed += 1;
        }

        tx.commit().await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, AnimalRepository};
    use crate::models::{Animal, Category, Sex};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct TestContext {
        animals: AnimalRepository,
        repo: VaccineRepository,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            animals: AnimalRepository::new(pool.clone()),
            repo: VaccineRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_list_for_animal() {
        let ctx = setup().await;
        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        ctx.animals.upsert(&cow).await.unwrap();

        let first = Vaccine::new(cow.id, "Brucellosis", date(1)).with_dose("2 ml");
        let second = Vaccine::new(cow.id, "Aftosa", date(10)).with_veterinarian("Dr. Ruiz");
        ctx.repo.upsert_many(&[first.clone(), second.clone()]).await.unwrap();

        let listed = ctx.repo.list_for_animal(cow.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], second);
        assert_eq!(listed[1], first);
    }

    #[tokio::test]
    async fn test_vaccine_requires_existing_animal() {
        let ctx = setup().await;
        let orphan = Vaccine::new(Uuid::new_v4(), "Rabies", date(1));
        assert!(ctx.repo.upsert(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_purging_animal_cascades() {
        let ctx = setup().await;
        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        ctx.animals.upsert(&cow).await.unwrap();
        let vaccine = Vaccine::new(cow.id, "Rabies", date(2));
        ctx.repo.upsert(&vaccine).await.unwrap();

        ctx.animals.purge(cow.id).await.unwrap();

        assert!(ctx.repo.get_by_id(vaccine.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_and_mark_synced() {
        let ctx = setup().await;
        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        ctx.animals.upsert(&cow).await.unwrap();
        let vaccine = Vaccine::new(cow.id, "Clostridial", date(3));
        ctx.repo.upsert(&vaccine).await.unwrap();

        let pending = ctx.repo.list_unsynced().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(ctx
            .repo
            .mark_synced(vaccine.id, 11, pending[0].updated_at)
            .await
            .unwrap());
        assert_eq!(
            ctx.repo.get_by_server_id(11).await.unwrap().unwrap().id,
            vaccine.id
        );

        assert!(ctx.repo.soft_delete(vaccine.id).await.unwrap());
        assert!(ctx.repo.list_active().await.unwrap().is_empty());
        let stored = ctx.repo.get_by_id(vaccine.id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert!(!stored.synchronized);

        assert!(ctx.repo.purge(vaccine.id).await.unwrap());
        assert!(ctx.repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_synced_keeps_pending_rows() {
        let ctx = setup().await;
        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        ctx.animals.upsert(&cow).await.unwrap();

        let mut gone = Vaccine::new(cow.id, "Old", date(1));
        gone.server_id = Some(1);
        gone.synchronized = true;
        let pending = Vaccine::new(cow.id, "Pending", date(2));
        ctx.repo.upsert_many(&[gone.clone(), pending.clone()]).await.unwrap();

        let mut fresh = Vaccine::new(cow.id, "Fresh", date(3));
        fresh.server_id = Some(2);
        fresh.synchronized = true;

        let stats = ctx.repo.replace_synced(&[fresh.clone()]).await.unwrap();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.removed, 1);

        let names: Vec<String> = ctx
            .repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Pending", "Fresh"]);
    }

    #[tokio::test]
    async fn test_restore_from_trash() {
        let ctx = setup().await;
        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        ctx.animals.upsert(&cow).await.unwrap();
        let mut vaccine = Vaccine::new(cow.id, "Rabies", date(5));
        vaccine.server_id = Some(3);
        vaccine.synchronized = true;
        ctx.repo.upsert(&vaccine).await.unwrap();

        assert!(!ctx.repo.restore(vaccine.id).await.unwrap());
        ctx.repo.soft_delete(vaccine.id).await.unwrap();

        let trash = ctx.repo.list_deleted().await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, vaccine.id);

        assert!(ctx.repo.restore(vaccine.id).await.unwrap());
        assert!(ctx.repo.list_deleted().await.unwrap().is_empty());
        let restored = ctx.repo.get_by_id(vaccine.id).await.unwrap().unwrap();
        assert!(restored.active);
        assert!(!restored.synchronized);
        assert_eq!(restored.server_id, Some(3));
    }

    #[tokio::test]
    async fn test_pull_keeps_pending_vaccine_of_vanished_animal() {
        let ctx = setup().await;
        let mut cow = Animal::new("COW", Sex::Female, Category::Cow);
        cow.server_id = Some(77);
        cow.synchronized = true;
        ctx.animals.upsert(&cow).await.unwrap();
        let pending = Vaccine::new(cow.id, "Aftosa", date(6));
        ctx.repo.upsert(&pending).await.unwrap();

        let stats = ctx.animals.replace_synced(&[]).await.unwrap();
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.kept_local, 1);

        assert_eq!(ctx.repo.get_by_id(pending.id).await.unwrap(), Some(pending));
        let cow_now = ctx.animals.get_by_id(cow.id).await.unwrap().unwrap();
        assert_eq!(cow_now.server_id, None);
        assert!(!cow_now.synchronized);
    }
}
