//! Embedded libSQL content store.
//!
//! The [`ContentStore`] wraps a libSQL database holding every persisted
//! pipeline result (the `posts` table). It is the single owner of record
//! identity: ids are assigned here, increase monotonically, and are never
//! reused after a delete.
//!
//! **Write discipline:** all writes go through one async mutex, so id
//! assignment is serialized and a write is durable before it is acknowledged.
//! Reads do not take the lock.

mod migrations;

use std::path::Path;

use chrono::{Local, NaiveDate};
use contentcrew_shared::{
    ContentCrewError, ContentRecord, ContentSummary, ListOrder, RecordId, Result,
};
use libsql::{Connection, Database, params};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// ISO-8601 calendar date format used in the `date` column.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable content store backed by a libSQL database.
pub struct ContentStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    write_lock: Mutex<()>,
}

impl ContentStore {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ContentCrewError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let store = Self {
            db,
            conn,
            write_lock: Mutex::new(()),
        };
        store.run_migrations().await?;
        info!(path = %path.display(), "content store opened");
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ContentCrewError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Record operations
    // -----------------------------------------------------------------------

    /// Persist a new record stamped with today's date. Returns the assigned id.
    pub async fn create(&self, topic: &str, content: &str) -> Result<RecordId> {
        self.create_on(topic, content, Local::now().date_naive()).await
    }

    /// Persist a new record stamped with `date`, for callers that need the
    /// record date to match something else they write (e.g. a file name).
    #[instrument(skip_all, fields(topic = %topic, %date))]
    pub async fn create_on(&self, topic: &str, content: &str, date: NaiveDate) -> Result<RecordId> {
        let date_text = date.format(DATE_FORMAT).to_string();

        let _guard = self.write_lock.lock().await;
        self.conn
            .execute(
                "INSERT INTO posts (topic, date, content) VALUES (?1, ?2, ?3)",
                params![topic, date_text.as_str(), content],
            )
            .await
            .map_err(storage_err)?;
        let id = RecordId(self.conn.last_insert_rowid());

        info!(%id, %date, bytes = content.len(), "content record created");
        Ok(id)
    }

    /// List records without their content bodies.
    pub async fn list(&self, order: ListOrder) -> Result<Vec<ContentSummary>> {
        let sql = match order {
            ListOrder::Inserted => "SELECT id, topic, date FROM posts ORDER BY id ASC",
            ListOrder::Newest => {
                "SELECT id, topic, date FROM posts ORDER BY date DESC, id DESC"
            }
        };
        let mut rows = self.conn.query(sql, params![]).await.map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(ContentSummary {
                id: RecordId(row.get::<i64>(0).map_err(storage_err)?),
                topic: row.get::<String>(1).map_err(storage_err)?,
                date: parse_date(&row.get::<String>(2).map_err(storage_err)?)?,
            });
        }
        debug!(count = results.len(), ?order, "listed content records");
        Ok(results)
    }

    /// Fetch one full record.
    pub async fn get(&self, id: RecordId) -> Result<ContentRecord> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, date, content FROM posts WHERE id = ?1",
                params![id.0],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(ContentRecord {
                id: RecordId(row.get::<i64>(0).map_err(storage_err)?),
                topic: row.get::<String>(1).map_err(storage_err)?,
                date: parse_date(&row.get::<String>(2).map_err(storage_err)?)?,
                content: row.get::<String>(3).map_err(storage_err)?,
            }),
            None => Err(ContentCrewError::NotFound { id: id.0 }),
        }
    }

    /// Fetch only the content body of a record.
    pub async fn get_content(&self, id: RecordId) -> Result<String> {
        Ok(self.get(id).await?.content)
    }

    /// Permanently remove a record. Remaining ids are not renumbered.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let affected = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id.0])
            .await
            .map_err(storage_err)?;

        if affected == 0 {
            return Err(ContentCrewError::NotFound { id: id.0 });
        }
        info!(%id, "content record deleted");
        Ok(())
    }
}

fn storage_err(e: libsql::Error) -> ContentCrewError {
    ContentCrewError::Storage(e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ContentCrewError::Storage(format!("invalid date '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file store for testing.
    async fn test_store() -> ContentStore {
        let tmp = std::env::temp_dir().join(format!("cc_test_{}.db", Uuid::now_v7()));
        ContentStore::open(&tmp).await.expect("open test db")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = test_store().await;
        assert_eq!(store.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("cc_test_{}.db", Uuid::now_v7()));
        let s1 = ContentStore::open(&tmp).await.expect("first open");
        s1.create("kept", "survives reopen").await.unwrap();
        drop(s1);
        let s2 = ContentStore::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
        assert_eq!(s2.list(ListOrder::Inserted).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_then_get_roundtrips_content() {
        let store = test_store().await;
        let content = "# Title\n\nLine with “quotes”, émojis 🚲 and trailing spaces  \n";
        let id = store.create("electric bikes", content).await.expect("create");

        let record = store.get(id).await.expect("get");
        assert_eq!(record.id, id);
        assert_eq!(record.topic, "electric bikes");
        assert_eq!(record.content, content);
        assert_eq!(record.date, Local::now().date_naive());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = test_store().await;
        let id = store.create("topic", "content").await.unwrap();

        store.delete(id).await.expect("delete");
        let err = store.get(id).await.unwrap_err();
        assert!(matches!(err, ContentCrewError::NotFound { id: missing } if missing == id.0));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = test_store().await;
        let err = store.delete(RecordId(999)).await.unwrap_err();
        assert!(matches!(err, ContentCrewError::NotFound { id: 999 }));
    }

    #[tokio::test]
    async fn ids_increase_and_are_never_reused() {
        let store = test_store().await;
        let a = store.create("a", "1").await.unwrap();
        let b = store.create("b", "2").await.unwrap();
        assert!(b > a);

        store.delete(b).await.unwrap();
        let c = store.create("c", "3").await.unwrap();
        assert!(c > b, "id {c} reused or lower than deleted id {b}");

        // Remaining ids are not renumbered.
        assert_eq!(store.get(a).await.unwrap().topic, "a");
    }

    #[tokio::test]
    async fn list_returns_insertion_order_without_content() {
        let store = test_store().await;
        let ids = [
            store.create("first", "x").await.unwrap(),
            store.create("second", "y").await.unwrap(),
            store.create("third", "z").await.unwrap(),
        ];

        let listed = store.list(ListOrder::Inserted).await.expect("list");
        assert_eq!(listed.len(), 3);
        let listed_ids: Vec<RecordId> = listed.iter().map(|s| s.id).collect();
        assert_eq!(listed_ids, ids);
        assert_eq!(listed[1].topic, "second");

        let newest = store.list(ListOrder::Newest).await.unwrap();
        assert_eq!(newest[0].topic, "third");
    }

    #[tokio::test]
    async fn create_on_stamps_given_date() {
        let store = test_store().await;
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let id = store.create_on("leap", "day", date).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().date, date);
    }

    #[tokio::test]
    async fn newest_orders_by_date_then_id() {
        let store = test_store().await;
        let day = |d| NaiveDate::from_ymd_opt(2026, 10, d).unwrap();
        store.create_on("mid", "x", day(15)).await.unwrap();
        store.create_on("late", "x", day(20)).await.unwrap();
        store.create_on("early", "x", day(1)).await.unwrap();
        store.create_on("late again", "x", day(20)).await.unwrap();

        let topics: Vec<String> = store
            .list(ListOrder::Newest)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.topic)
            .collect();
        assert_eq!(topics, ["late again", "late", "mid", "early"]);

        let inserted = store.list(ListOrder::Inserted).await.unwrap();
        assert_eq!(inserted[0].topic, "mid");
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = test_store().await;
        let (a, b, c, d) = tokio::join!(
            store.create("t1", "c1"),
            store.create("t2", "c2"),
            store.create("t3", "c3"),
            store.create("t4", "c4"),
        );
        let mut ids = vec![a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        for id in ids {
            let record = store.get(id).await.unwrap();
            assert_eq!(record.topic.replace('t', "c"), record.content);
        }
    }

    #[tokio::test]
    async fn get_content_returns_body() {
        let store = test_store().await;
        let id = store.create("topic", "only the body").await.unwrap();
        assert_eq!(store.get_content(id).await.unwrap(), "only the body");
    }
}
