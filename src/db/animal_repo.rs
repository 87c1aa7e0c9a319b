use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use super::{
    parse_enum, parse_opt_date, parse_opt_uuid, parse_timestamp, parse_uuid, ReplaceStats,
};
use crate::models::{Animal, ParentRef};

#[derive(Clone)]
pub struct AnimalRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct AnimalRow {
    id: String,
    server_id: Option<i64>,
    tag: String,
    breed: String,
    sex: String,
    category: String,
    birth_date: Option<String>,
    intake_date: Option<String>,
    weight_kg: Option<f64>,
    health_status: String,
    notes: String,
    mother_id: Option<String>,
    mother_tag: Option<String>,
    father_id: Option<String>,
    father_tag: Option<String>,
    synchronized: bool,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AnimalRow> for Animal {
    type Error = sqlx::Error;

    fn try_from(row: AnimalRow) -> Result<Self, Self::Error> {
        Ok(Animal {
            id: parse_uuid(&row.id)?,
            server_id: row.server_id,
            tag: row.tag,
            breed: row.breed,
            sex: parse_enum(&row.sex)?,
            category: parse_enum(&row.category)?,
            birth_date: parse_opt_date(row.birth_date.as_deref())?,
            intake_date: parse_opt_date(row.intake_date.as_deref())?,
            weight_kg: row.weight_kg,
            health_status: parse_enum(&row.health_status)?,
            notes: row.notes,
            mother: parent_ref(row.mother_id.as_deref(), row.mother_tag)?,
            father: parent_ref(row.father_id.as_deref(), row.father_tag)?,
            synchronized: row.synchronized,
            active: row.active,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn parent_ref(id: Option<&str>, tag: Option<String>) -> Result<Option<ParentRef>, sqlx::Error> {
    Ok(match (parse_opt_uuid(id)?, tag) {
        (Some(animal_id), tag) => Some(ParentRef::new(animal_id, tag.unwrap_or_default())),
        (None, _) => None,
    })
}

fn rows_into(rows: Vec<AnimalRow>) -> Result<Vec<Animal>, sqlx::Error> {
    rows.into_iter().map(Animal::try_from).collect()
}

async fn write_animal<'e, E>(executor: E, animal: &Animal) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO animals (id, server_id, tag, breed, sex, category, birth_date, intake_date,
                             weight_kg, health_status, notes, mother_id, mother_tag, father_id,
                             father_tag, synchronized, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            server_id = excluded.server_id,
            tag = excluded.tag,
            breed = excluded.breed,
            sex = excluded.sex,
            category = excluded.category,
            birth_date = excluded.birth_date,
            intake_date = excluded.intake_date,
            weight_kg = excluded.weight_kg,
            health_status = excluded.health_status,
            notes = excluded.notes,
            mother_id = excluded.mother_id,
            mother_tag = excluded.mother_tag,
            father_id = excluded.father_id,
            father_tag = excluded.father_tag,
            synchronized = excluded.synchronized,
            active = excluded.active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(animal.id.to_string())
    .bind(animal.server_id)
    .bind(&animal.tag)
    .bind(&animal.breed)
    .bind(animal.sex.to_string())
    .bind(animal.category.to_string())
    .bind(animal.birth_date.map(|d| d.to_string()))
    .bind(animal.intake_date.map(|d| d.to_string()))
    .bind(animal.weight_kg)
    .bind(animal.health_status.to_string())
    .bind(&animal.notes)
    .bind(animal.mother.as_ref().map(|p| p.animal_id.to_string()))
    .bind(animal.mother.as_ref().map(|p| p.tag.clone()))
    .bind(animal.father.as_ref().map(|p| p.animal_id.to_string()))
    .bind(animal.father.as_ref().map(|p| p.tag.clone()))
    .bind(animal.synchronized)
    .bind(animal.active)
    .bind(animal.created_at.to_rfc3339())
    .bind(animal.updated_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

/// Removes an animal row, first detaching any children that point at it.
/// Its vaccines go with it (ON DELETE CASCADE).
async fn remove_animal(
    conn: &mut sqlx::SqliteConnection,
    id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query("UPDATE animals SET mother_id = NULL WHERE mother_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE animals SET father_id = NULL WHERE father_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM animals WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether an unsynchronized vaccine or child animal points at `id`.
async fn has_pending_dependents(
    conn: &mut sqlx::SqliteConnection,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT (SELECT COUNT(*) FROM vaccines WHERE animal_id = ? AND synchronized = 0)
             + (SELECT COUNT(*) FROM animals
                WHERE (mother_id = ? OR father_id = ?) AND synchronized = 0)
        "#,
    )
    .bind(id)
    .bind(id)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

/// Drops the server key so the next push creates the record again.
async fn detach_from_server(
    conn: &mut sqlx::SqliteConnection,
    id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE animals SET server_id = NULL, synchronized = 0 WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl AnimalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the animal or replaces every field of the existing row.
    pub async fn upsert(&self, animal: &Animal) -> Result<(), sqlx::Error> {
        write_animal(&self.pool, animal).await
    }

    /// Writes all animals in one transaction.
    pub async fn upsert_many(&self, animals: &[Animal]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for animal in animals {
            write_animal(&mut *tx, animal).await?;
        }
        tx.commit().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Animal>, sqlx::Error> {
        let row: Option<AnimalRow> = sqlx::query_as("SELECT * FROM animals WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Animal::try_from).transpose()
    }

    pub async fn get_by_server_id(&self, server_id: i64) -> Result<Option<Animal>, sqlx::Error> {
        let row: Option<AnimalRow> = sqlx::query_as("SELECT * FROM animals WHERE server_id = ?")
            .bind(server_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Animal::try_from).transpose()
    }

    /// Looks up an animal by identification tag, ignoring case. Active
    /// records win over deleted ones carrying the same tag.
    pub async fn get_by_tag(&self, tag: &str) -> Result<Option<Animal>, sqlx::Error> {
        let row: Option<AnimalRow> = sqlx::query_as(
            "SELECT * FROM animals WHERE LOWER(tag) = LOWER(?) ORDER BY active DESC, updated_at DESC LIMIT 1",
        )
        .bind(tag.trim())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Animal::try_from).transpose()
    }

    pub async fn list_active(&self) -> Result<Vec<Animal>, sqlx::Error> {
        let rows: Vec<AnimalRow> =
            sqlx::query_as("SELECT * FROM animals WHERE active = 1 ORDER BY tag")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    /// Soft-deleted animals (the recycle bin).
    pub async fn list_deleted(&self) -> Result<Vec<Animal>, sqlx::Error> {
        let rows: Vec<AnimalRow> =
            sqlx::query_as("SELECT * FROM animals WHERE active = 0 ORDER BY updated_at DESC")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    pub async fn list_all(&self) -> Result<Vec<Animal>, sqlx::Error> {
        let rows: Vec<AnimalRow> = sqlx::query_as("SELECT * FROM animals ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;
        rows_into(rows)
    }

    /// Records waiting for upload, oldest first so parents usually precede
    /// their offspring.
    pub async fn list_unsynced(&self) -> Result<Vec<Animal>, sqlx::Error> {
        let rows: Vec<AnimalRow> =
            sqlx::query_as("SELECT * FROM animals WHERE synchronized = 0 ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        rows_into(rows)
    }

    /// Adopts `server_id` and flags the row synchronized.
    ///
    /// The flag is only set if the row still carries `uploaded_version` as
    /// its `updated_at`; an edit made while the upload was in flight keeps the
    /// row pending. Returns whether the flag was set.
    pub async fn mark_synced(
        &self,
        id: Uuid,
        server_id: i64,
        uploaded_version: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE animals
            SET server_id = ?, synchronized = 1
            WHERE id = ? AND updated_at = ?
            "#,
        )
        .bind(server_id)
        .bind(id.to_string())
        .bind(uploaded_version.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        sqlx::query("UPDATE animals SET server_id = ? WHERE id = ?")
            .bind(server_id)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(false)
    }

    /// Marks the animal inactive. The row stays in storage and is queued for
    /// upload so the server learns about the deletion.
    pub async fn soft_delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.set_active(id, false).await
    }

    pub async fn restore(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE animals SET active = ?, synchronized = 0, updated_at = ? WHERE id = ? AND active = ?",
        )
        .bind(active)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(!active)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Physically removes the animal and its vaccines. Irreversible.
    pub async fn purge(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let removed = remove_animal(&mut tx, &id.to_string()).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Purges every soft-deleted animal. Returns how many were removed.
    pub async fn purge_deleted(&self) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM animals WHERE active = 0")
            .fetch_all(&mut *tx)
            .await?;
        for (id,) in &ids {
            remove_animal(&mut tx, id).await?;
        }
        tx.commit().await?;
        Ok(ids.len())
    }

    /// Updates the cached parent tag on every child of `parent_id`.
    pub async fn refresh_parent_tag(&self, parent_id: Uuid, tag: &str) -> Result<(), sqlx::Error> {
        let id = parent_id.to_string();
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE animals SET mother_tag = ? WHERE mother_id = ?")
            .bind(tag)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE animals SET father_tag = ? WHERE father_id = ?")
            .bind(tag)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// Replaces the synchronized rows with `remote`, in one transaction.
    ///
    /// Rows with pending local edits are never overwritten or removed.
    /// Synchronized rows missing from `remote` are purged, unless a pending
    /// vaccine or child still references them; those lose their server key
    /// and count as `kept_local`.
    pub async fn replace_synced(&self, remote: &[Animal]) -> Result<ReplaceStats, sqlx::Error> {
        let mut stats = ReplaceStats::default();
        let mut keep = HashSet::with_capacity(remote.len());
        let mut tx = self.pool.begin().await?;

        for animal in remote {
            let id = animal.id.to_string();
            keep.insert(id.clone());

            let existing: Option<(bool,)> =
                sqlx::query_as("SELECT synchronized FROM animals WHERE id = ?")
                    .bind(&id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some((false,)) = existing {
                stats.kept_local += 1;
                continue;
            }

            write_animal(&mut *tx, animal).await?;
            stats.applied += 1;
        }

        let synced: Vec<(String,)> = sqlx::query_as("SELECT id FROM animals WHERE synchronized = 1")
            .fetch_all(&mut *tx)
            .await?;
        let mut gone: Vec<String> = synced
            .into_iter()
            .map(|(id,)| id)
            .filter(|id| !keep.contains(id))
            .collect();

        // A vanished animal still referenced by pending rows is queued for
        // re-creation instead. Demoting one can expose its own parent, so
        // repeat until nothing changes.
        loop {
            let mut still_gone = Vec::with_capacity(gone.len());
            for id in gone.iter() {
                if has_pending_dependents(&mut tx, id).await? {
                    detach_from_server(&mut tx, id).await?;
                    stats.kept_local += 1;
                } else {
                    still_gone.push(id.clone());
                }
            }
            let settled = still_gone.len() == gone.len();
            gone = still_gone;
            if settled {
                break;
            }
        }

        for id in &gone {
            if remove_animal(&mut tx, id).await? {
                stats.removed += 1;
            }
        }

        tx.commit().await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::{Category, HealthStatus, Sex};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct TestContext {
        repo: AnimalRepository,
        _temp_dir: TempDir,
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path).await.unwrap();
        TestContext {
            repo: AnimalRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn synced(mut animal: Animal, server_id: i64) -> Animal {
        animal.server_id = Some(server_id);
        animal.synchronized = true;
        animal
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let cow = Animal::new("COW-1", Sex::Female, Category::Cow);
        let calf = Animal::new("CALF-1", Sex::Male, Category::Calf)
            .with_breed("Angus")
            .with_birth_date(NaiveDate::from_ymd_opt(2025, 2, 14).unwrap())
            .with_weight(42.5)
            .with_health_status(HealthStatus::InTreatment)
            .with_mother(ParentRef::of(&cow));

        repo.upsert(&cow).await.unwrap();
        repo.upsert(&calf).await.unwrap();

        let fetched = repo.get_by_id(calf.id).await.unwrap().unwrap();
        assert_eq!(fetched, calf);
        assert_eq!(fetched.mother.unwrap().tag, "COW-1");
    }

    #[tokio::test]
    async fn test_upsert_replaces_fields() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let mut animal = Animal::new("A-1", Sex::Female, Category::Heifer);
        repo.upsert(&animal).await.unwrap();

        animal.weight_kg = Some(310.0);
        animal.category = Category::Cow;
        repo.upsert(&animal).await.unwrap();

        let fetched = repo.get_by_id(animal.id).await.unwrap().unwrap();
        assert_eq!(fetched.weight_kg, Some(310.0));
        assert_eq!(fetched.category, Category::Cow);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_many_is_atomic() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let first = synced(Animal::new("A-1", Sex::Female, Category::Cow), 7);
        // Same server id on a different row violates the UNIQUE constraint.
        let clash = synced(Animal::new("A-2", Sex::Female, Category::Cow), 7);

        let result = repo.upsert_many(&[first, clash]).await;
        assert!(result.is_err());
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_server_id_and_tag() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let animal = synced(Animal::new("Tag-9", Sex::Male, Category::Steer), 99);
        repo.upsert(&animal).await.unwrap();

        let by_server = repo.get_by_server_id(99).await.unwrap().unwrap();
        assert_eq!(by_server.id, animal.id);

        let by_tag = repo.get_by_tag("tag-9").await.unwrap().unwrap();
        assert_eq!(by_tag.id, animal.id);

        assert!(repo.get_by_server_id(100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_but_keeps_row() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let animal = synced(Animal::new("A-1", Sex::Female, Category::Cow), 1);
        repo.upsert(&animal).await.unwrap();

        assert!(repo.soft_delete(animal.id).await.unwrap());

        assert!(repo.list_active().await.unwrap().is_empty());
        let deleted = repo.list_deleted().await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(!deleted[0].active);
        assert!(!deleted[0].synchronized);

        // Second delete is a no-op
        assert!(!repo.soft_delete(animal.id).await.unwrap());

        assert!(repo.restore(animal.id).await.unwrap());
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_is_permanent_and_detaches_children() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let cow = Animal::new("COW", Sex::Female, Category::Cow);
        let calf = Animal::new("CALF", Sex::Female, Category::Calf).with_mother(ParentRef::of(&cow));
        repo.upsert_many(&[cow.clone(), calf.clone()]).await.unwrap();

        repo.soft_delete(cow.id).await.unwrap();
        assert_eq!(repo.purge_deleted().await.unwrap(), 1);

        assert!(repo.get_by_id(cow.id).await.unwrap().is_none());
        let calf = repo.get_by_id(calf.id).await.unwrap().unwrap();
        assert!(calf.mother.is_none());
        assert!(!repo.purge(cow.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_unsynced_and_mark_synced() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let pending = Animal::new("P-1", Sex::Male, Category::Bull);
        let done = synced(Animal::new("D-1", Sex::Male, Category::Bull), 3);
        repo.upsert_many(&[pending.clone(), done]).await.unwrap();

        let unsynced = repo.list_unsynced().await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, pending.id);

        let flagged = repo
            .mark_synced(pending.id, 42, unsynced[0].updated_at)
            .await
            .unwrap();
        assert!(flagged);

        let fetched = repo.get_by_id(pending.id).await.unwrap().unwrap();
        assert_eq!(fetched.server_id, Some(42));
        assert!(fetched.synchronized);
        assert_eq!(fetched.tag, "P-1");
        assert!(repo.list_unsynced().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_synced_keeps_concurrent_edit_pending() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let mut animal = Animal::new("E-1", Sex::Female, Category::Cow);
        repo.upsert(&animal).await.unwrap();
        let uploaded = repo.get_by_id(animal.id).await.unwrap().unwrap();

        // Edit lands while the upload is in flight
        animal.notes = "edited".to_string();
        animal.updated_at = uploaded.updated_at + chrono::Duration::seconds(1);
        repo.upsert(&animal).await.unwrap();

        let flagged = repo
            .mark_synced(animal.id, 5, uploaded.updated_at)
            .await
            .unwrap();
        assert!(!flagged);

        let fetched = repo.get_by_id(animal.id).await.unwrap().unwrap();
        assert_eq!(fetched.server_id, Some(5));
        assert!(!fetched.synchronized);
    }

    #[tokio::test]
    async fn test_replace_synced() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let stale = synced(Animal::new("STALE", Sex::Female, Category::Cow), 1);
        let mut edited = synced(Animal::new("EDITED", Sex::Female, Category::Cow), 2);
        edited.synchronized = false;
        let local_only = Animal::new("LOCAL", Sex::Male, Category::Calf);
        let kept = synced(Animal::new("KEPT", Sex::Male, Category::Bull), 3);
        repo.upsert_many(&[stale.clone(), edited.clone(), local_only.clone(), kept.clone()])
            .await
            .unwrap();

        let mut remote_edited = edited.clone();
        remote_edited.notes = "server version".to_string();
        remote_edited.synchronized = true;
        let mut remote_kept = kept.clone();
        remote_kept.weight_kg = Some(800.0);
        let new_remote = synced(Animal::new("NEW", Sex::Female, Category::Heifer), 4);

        let stats = repo
            .replace_synced(&[remote_edited, remote_kept, new_remote.clone()])
            .await
            .unwrap();

        assert_eq!(stats.applied, 2);
        assert_eq!(stats.kept_local, 1);
        assert_eq!(stats.removed, 1);

        assert!(repo.get_by_id(stale.id).await.unwrap().is_none());
        let edited_now = repo.get_by_id(edited.id).await.unwrap().unwrap();
        assert_eq!(edited_now.notes, "");
        assert!(!edited_now.synchronized);
        assert!(repo.get_by_id(local_only.id).await.unwrap().is_some());
        assert_eq!(
            repo.get_by_id(kept.id).await.unwrap().unwrap().weight_kg,
            Some(800.0)
        );
        assert!(repo.get_by_id(new_remote.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replace_synced_keeps_parents_of_pending_children() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let grandmother = synced(Animal::new("G", Sex::Female, Category::Cow), 1);
        let mother = synced(
            Animal::new("M", Sex::Female, Category::Cow).with_mother(ParentRef::of(&grandmother)),
            77,
        );
        let calf = Animal::new("C", Sex::Male, Category::Calf).with_mother(ParentRef::of(&mother));
        let unrelated = synced(Animal::new("U", Sex::Male, Category::Steer), 5);
        repo.upsert_many(&[grandmother.clone(), mother.clone(), calf.clone(), unrelated.clone()])
            .await
            .unwrap();

        let stats = repo.replace_synced(&[]).await.unwrap();
        assert_eq!(stats.kept_local, 2);
        assert_eq!(stats.removed, 1);

        let calf_now = repo.get_by_id(calf.id).await.unwrap().unwrap();
        assert_eq!(calf_now, calf);

        for parent in [&mother, &grandmother] {
            let stored = repo.get_by_id(parent.id).await.unwrap().unwrap();
            assert_eq!(stored.server_id, None);
            assert!(!stored.synchronized);
        }
        let mother_now = repo.get_by_id(mother.id).await.unwrap().unwrap();
        assert_eq!(mother_now.mother.map(|p| p.animal_id), Some(grandmother.id));
        assert!(repo.get_by_id(unrelated.id).await.unwrap().is_none());
    }
}
