pub mod models;
pub mod schema;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{Fly, Jar, NewFly, NewJar, NewUser, User};
use tracing::{debug, trace};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// An insert hit a unique constraint.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Handle to the SQLite database.
///
/// Cloning is cheap and shares the connection pool. Connections are closed
/// once the last clone is dropped.
#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;
        let store = Store { pool };

        // Tables are created on first start; later starts are no-ops.
        store
            .run(|conn| {
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await?;

        Ok(store)
    }

    /// Runs `op` on a pooled connection inside the blocking thread pool.
    async fn run<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            op(&mut *conn)
        })
        .await?
    }

    // Users

    pub async fn create_user(&self, name: &str, password_hash: &str) -> Result<i32, StorageError> {
        use schema::users;
        let name = name.to_string();
        let hash = password_hash.to_string();
        self.run(move |conn| {
            let new_user = NewUser {
                username: &name,
                password: &hash,
            };
            let res = diesel::insert_into(users::table)
                .values(&new_user)
                .returning(users::id)
                .get_result::<i32>(conn);
            match res {
                Ok(id) => Ok(id),
                Err(diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    info,
                )) => Err(StorageError::Conflict(info.message().to_string())),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    pub async fn find_user_by_username(&self, name: &str) -> Result<Option<User>, StorageError> {
        use schema::users::dsl::*;
        let name = name.to_string();
        self.run(move |conn| {
            Ok(users
                .filter(username.eq(&name))
                .first::<User>(conn)
                .optional()?)
        })
        .await
    }

    pub async fn find_user_by_token(&self, token_: &str) -> Result<Option<User>, StorageError> {
        use schema::users::dsl::*;
        let t = token_.to_string();
        self.run(move |conn| {
            Ok(users
                .filter(token.eq(&t))
                .first::<User>(conn)
                .optional()?)
        })
        .await
    }

    /// Replaces the user's session token. Any previous token stops resolving.
    pub async fn set_user_token(&self, user_id: i32, token_: &str) -> Result<(), StorageError> {
        use schema::users::dsl::*;
        let t = token_.to_string();
        self.run(move |conn| {
            diesel::update(users.filter(id.eq(user_id)))
                .set(token.eq(Some(t.as_str())))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn set_user_pokemon(
        &self,
        user_id: i32,
        pokemon_: Option<&str>,
    ) -> Result<(), StorageError> {
        use schema::users::dsl::*;
        let p = pokemon_.map(|s| s.to_string());
        self.run(move |conn| {
            diesel::update(users.filter(id.eq(user_id)))
                .set(pokemon.eq(p.as_deref()))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    // Jars

    pub async fn create_jar(&self, owner: i32, name: &str) -> Result<Jar, StorageError> {
        use schema::jars;
        let name = name.to_string();
        self.run(move |conn| {
            let new_jar = NewJar {
                user_id: owner,
                name: &name,
            };
            let jar = diesel::insert_into(jars::table)
                .values(&new_jar)
                .returning(Jar::as_returning())
                .get_result(conn)?;
            trace!(jar_id = jar.id, user_id = owner, "jar created");
            Ok(jar)
        })
        .await
    }

    pub async fn list_jars(&self, owner: i32) -> Result<Vec<Jar>, StorageError> {
        use schema::jars::dsl::*;
        self.run(move |conn| {
            Ok(jars
                .filter(user_id.eq(owner))
                .order(id.asc())
                .load::<Jar>(conn)?)
        })
        .await
    }

    /// Ownership is part of the predicate: another user's jar reads as `None`.
    pub async fn get_jar(&self, owner: i32, jar: i32) -> Result<Option<Jar>, StorageError> {
        use schema::jars::dsl::*;
        self.run(move |conn| {
            Ok(jars
                .filter(id.eq(jar))
                .filter(user_id.eq(owner))
                .first::<Jar>(conn)
                .optional()?)
        })
        .await
    }

    pub async fn rename_jar(&self, owner: i32, jar: i32, new_name: &str) -> Result<usize, StorageError> {
        use schema::jars::dsl::*;
        let new_name = new_name.to_string();
        self.run(move |conn| {
            let updated = diesel::update(jars.filter(id.eq(jar)).filter(user_id.eq(owner)))
                .set(name.eq(&new_name))
                .execute(conn)?;
            debug!(jar_id = jar, user_id = owner, updated, "rename_jar");
            Ok(updated)
        })
        .await
    }

    /// Deletes the jar only. Its flies are left in place.
    pub async fn delete_jar(&self, owner: i32, jar: i32) -> Result<usize, StorageError> {
        use schema::jars::dsl::*;
        self.run(move |conn| {
            let deleted =
                diesel::delete(jars.filter(id.eq(jar)).filter(user_id.eq(owner))).execute(conn)?;
            debug!(jar_id = jar, user_id = owner, deleted, "delete_jar");
            Ok(deleted)
        })
        .await
    }

    // Flies. None of these check who owns the jar.

    pub async fn create_fly(&self, jar: i32, color: &str) -> Result<Fly, StorageError> {
        use schema::flies;
        let color = color.to_string();
        self.run(move |conn| {
            let new_fly = NewFly {
                jar_id: jar,
                body_color: &color,
            };
            Ok(diesel::insert_into(flies::table)
                .values(&new_fly)
                .returning(Fly::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_flies(&self, jar: i32) -> Result<Vec<Fly>, StorageError> {
        use schema::flies::dsl::*;
        self.run(move |conn| {
            Ok(flies
                .filter(jar_id.eq(jar))
                .order(id.asc())
                .load::<Fly>(conn)?)
        })
        .await
    }

    pub async fn delete_fly(&self, jar: i32, fly: i32) -> Result<usize, StorageError> {
        use schema::flies::dsl::*;
        self.run(move |conn| {
            let deleted =
                diesel::delete(flies.filter(id.eq(fly)).filter(jar_id.eq(jar))).execute(conn)?;
            debug!(jar_id = jar, fly_id = fly, deleted, "delete_fly");
            Ok(deleted)
        })
        .await
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    Ok(())
}
