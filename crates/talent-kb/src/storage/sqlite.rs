//! SQLite-backed attribute store

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::data::{
    entities::{decode_list, encode_list, Candidate, CandidateProfile},
    errors::StateStoreError,
    filters::{BrowseFilter, PageRequest},
    identifiers::CandidateId,
};
use crate::storage::{escape_like, migrations};
use crate::traits::AttributeStore;

const SELECT_COLUMNS: &str = "SELECT id, full_name, location, willing_to_travel, phone, email, bio, \
     languages_spoken, education, experience FROM candidates";

const IN_MEMORY: &str = ":memory:";

/// Attribute store over a single SQLite database file.
///
/// The connection pool is opened by [`AttributeStore::initialize`]. Before
/// that, reads behave as an empty store and writes fail with
/// `NotInitialized`.
pub struct SqliteAttributeStore {
    path: PathBuf,
    max_connections: u32,
    pool: RwLock<Option<SqlitePool>>,
}

impl SqliteAttributeStore {
    pub fn new(path: impl Into<PathBuf>, max_connections: u32) -> Self {
        Self {
            path: path.into(),
            max_connections: max_connections.max(1),
            pool: RwLock::new(None),
        }
    }

    /// Private in-memory database, mainly for tests.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY, 1)
    }

    async fn connect(&self) -> Result<SqlitePool, StateStoreError> {
        let in_memory = self.path.as_os_str() == IN_MEMORY;
        let options = if in_memory {
            "sqlite::memory:"
                .parse::<SqliteConnectOptions>()
                .map_err(|e| StateStoreError::ConnectionError(e.to_string()))?
        } else {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
        };

        // An in-memory database lives only as long as its one connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.max_connections)
        };

        pool_options
            .connect_with(options)
            .await
            .map_err(|e| StateStoreError::ConnectionError(format!("Failed to open {}: {}", self.path.display(), e)))
    }

    async fn pool(&self) -> Option<SqlitePool> {
        self.pool.read().await.clone()
    }

    async fn writable_pool(&self) -> Result<SqlitePool, StateStoreError> {
        self.pool().await.ok_or_else(|| {
            StateStoreError::NotInitialized(format!("{} has not been initialized", self.path.display()))
        })
    }
}

fn map_row(row: &SqliteRow) -> Result<Candidate, StateStoreError> {
    let languages: Option<String> = row.try_get("languages_spoken")?;
    let education: Option<String> = row.try_get("education")?;
    let experience: Option<String> = row.try_get("experience")?;
    let decode_err = |e: serde_json::Error| StateStoreError::MappingError(e.to_string());

    Ok(Candidate {
        id: CandidateId(row.try_get("id")?),
        profile: CandidateProfile {
            full_name: row.try_get("full_name")?,
            location: row.try_get("location")?,
            willing_to_travel: row.try_get("willing_to_travel")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            bio: row.try_get("bio")?,
            languages_spoken: decode_list(languages.as_deref()).map_err(decode_err)?,
            education: decode_list(education.as_deref()).map_err(decode_err)?,
            experience: decode_list(experience.as_deref()).map_err(decode_err)?,
        },
    })
}

/// Appends the WHERE clause for `filter`, if any predicate is set.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &BrowseFilter) {
    let mut keyword = " WHERE ";

    if let Some(location) = filter.location_pattern() {
        builder
            .push(keyword)
            .push("location LIKE ")
            .push_bind(format!("%{}%", escape_like(location)))
            .push(" ESCAPE '\\'");
        keyword = " AND ";
    }

    if let Some(title) = filter.title_pattern() {
        builder
            .push(keyword)
            .push(
                "EXISTS (SELECT 1 FROM json_each(CASE WHEN json_valid(candidates.experience) \
                 THEN candidates.experience ELSE '[]' END) AS exp \
                 WHERE LOWER(COALESCE(json_extract(exp.value, '$.title'), '')) LIKE ",
            )
            .push_bind(format!("%{}%", escape_like(&title.to_ascii_lowercase())))
            .push(" ESCAPE '\\')");
        keyword = " AND ";
    }

    if let Some(travel) = filter.travel {
        builder.push(keyword).push("willing_to_travel = ").push_bind(travel);
    }
}

#[async_trait]
impl AttributeStore for SqliteAttributeStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn initialize(&self, wipe: bool) -> Result<(), StateStoreError> {
        let mut guard = self.pool.write().await;
        let pool = match guard.as_ref() {
            Some(pool) => pool.clone(),
            None => {
                let pool = self.connect().await?;
                *guard = Some(pool.clone());
                pool
            }
        };

        if wipe {
            sqlx::query(migrations::DROP_SCHEMA).execute(&pool).await?;
            info!("Discarded all candidate records");
        }

        for (name, sql) in migrations::generate_migrations() {
            debug!(migration = name, "Applying schema statement");
            sqlx::query(sql).execute(&pool).await?;
        }

        Ok(())
    }

    #[instrument(skip(self, profile), fields(full_name = %profile.full_name))]
    async fn insert(&self, profile: &CandidateProfile) -> Result<CandidateId, StateStoreError> {
        let pool = self.writable_pool().await?;
        let encode_err = |e: serde_json::Error| StateStoreError::InvalidInput(e.to_string());

        let result = sqlx::query(
            "INSERT INTO candidates (full_name, location, willing_to_travel, phone, email, bio, \
             languages_spoken, education, experience) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&profile.full_name)
        .bind(&profile.location)
        .bind(profile.willing_to_travel)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(&profile.bio)
        .bind(encode_list(&profile.languages_spoken).map_err(encode_err)?)
        .bind(encode_list(&profile.education).map_err(encode_err)?)
        .bind(encode_list(&profile.experience).map_err(encode_err)?)
        .execute(&pool)
        .await?;

        let id = CandidateId(result.last_insert_rowid());
        debug!(candidate_id = %id, "Inserted candidate record");
        Ok(id)
    }

    async fn get(&self, id: CandidateId) -> Result<Option<Candidate>, StateStoreError> {
        let Some(pool) = self.pool().await else {
            return Ok(None);
        };

        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql).bind(id.get()).fetch_optional(&pool).await?;
        row.as_ref().map(map_row).transpose()
    }

    async fn get_many(
        &self,
        ids: &[CandidateId],
    ) -> Result<HashMap<CandidateId, Candidate>, StateStoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let Some(pool) = self.pool().await else {
            return Ok(HashMap::new());
        };

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.get());
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&pool).await?;
        let mut found = HashMap::with_capacity(rows.len());
        for row in &rows {
            let candidate = map_row(row)?;
            found.insert(candidate.id, candidate);
        }
        Ok(found)
    }

    async fn count(&self) -> Result<u64, StateStoreError> {
        let Some(pool) = self.pool().await else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM candidates")
            .fetch_one(&pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        filter: &BrowseFilter,
        page: PageRequest,
    ) -> Result<Vec<Candidate>, StateStoreError> {
        let Some(pool) = self.pool().await else {
            return Ok(Vec::new());
        };

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = builder.build().fetch_all(&pool).await?;
        rows.iter().map(map_row).collect()
    }

    async fn count_filtered(&self, filter: &BrowseFilter) -> Result<u64, StateStoreError> {
        let Some(pool) = self.pool().await else {
            return Ok(0);
        };

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM candidates");
        push_filter(&mut builder, filter);
        let count: i64 = builder.build_query_scalar::<i64>().fetch_one(&pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn ids(&self) -> Result<Vec<CandidateId>, StateStoreError> {
        let Some(pool) = self.pool().await else {
            return Ok(Vec::new());
        };

        let ids: Vec<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM candidates ORDER BY id ASC")
            .fetch_all(&pool)
            .await?;
        Ok(ids.into_iter().map(CandidateId).collect())
    }
}
