//! # jotter-db
//!
//! PostgreSQL database layer for jotter.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes and sessions
//! - Schema migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::Database;
//! use jotter_core::{NewNote, NoteRepository, Priority};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/jotter").await?;
//!
//!     let note = db.notes.insert(NewNote {
//!         owner_id: uuid::Uuid::new_v4(),
//!         title: "Hello".to_string(),
//!         content: "Hello, world!".to_string(),
//!         priority: Priority::Minor,
//!         category: None,
//!         tags: vec![],
//!         reminder: None,
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod sessions;

pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use sessions::PgSessionRepository;

// Re-export core types
pub use jotter_core::*;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for CRUD operations.
    pub notes: PgNoteRepository,
    /// Read-side session store (written by the external auth collaborator).
    pub sessions: PgSessionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Config(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Close the connection pool. Call at process exit for a clean shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
