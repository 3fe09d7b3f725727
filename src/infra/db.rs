//! SQLite connection, migrations and first-boot seed.

use crate::auth::password;
use crate::error::AppError;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct DbPool(pub Mutex<Connection>);

impl DbPool {
    /// Flush and close the underlying connection at shutdown.
    pub fn close(self) -> Result<(), AppError> {
        let conn = self.0.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| AppError::Db(e.to_string()))
    }
}

/// Credentials and cost used when seeding the admin account.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Lowest cost bcrypt accepts; keeps test seeding fast.
pub const TEST_BCRYPT_COST: u32 = 4;

const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("tech", "技术", "Technology", "编程与技术笔记"),
    ("life", "生活", "Life", "日常随笔"),
    ("travel", "旅行", "Travel", "旅行见闻"),
    ("reading", "阅读", "Reading", "读书笔记"),
];

/// Initialize DB at path, run migrations, seed, return managed pool.
pub fn init_db(db_path: &Path, seed: &SeedOptions) -> Result<DbPool, AppError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    run_migrations(&mut conn)?;
    seed_defaults(&mut conn, seed)?;
    Ok(DbPool(Mutex::new(conn)))
}

/// In-memory database with the full schema and seed (admin / admin123).
pub fn init_test_db() -> DbPool {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    run_migrations(&mut conn).expect("migrations");
    let seed = SeedOptions {
        bcrypt_cost: TEST_BCRYPT_COST,
        ..SeedOptions::default()
    };
    seed_defaults(&mut conn, &seed).expect("seed");
    DbPool(Mutex::new(conn))
}

fn run_migrations(conn: &mut Connection) -> Result<(), AppError> {
    let tx = conn.transaction()?;

    // Ensure schema_migrations exists (first run)
    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL DEFAULT (datetime('now')))",
        [],
    )?;

    let applied: Vec<i32> = tx
        .prepare("SELECT version FROM schema_migrations ORDER BY version")?
        .query_map([], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("../../migrations/0001_init.sql"))];

    for (version, sql) in MIGRATIONS {
        if applied.contains(version) {
            continue;
        }
        log::info!("applying migration {}", version);
        // The script's own schema_migrations INSERT is skipped; it is recorded below.
        let statements = sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !s.contains("INSERT INTO schema_migrations"));
        for stmt in statements {
            tx.execute(stmt, [])?;
        }
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Idempotent: existing rows are left alone.
fn seed_defaults(conn: &mut Connection, seed: &SeedOptions) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;

    let has_admin: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [&seed.admin_username],
        |r| r.get(0),
    )?;
    if !has_admin {
        let hash = password::hash_password(&seed.admin_password, seed.bcrypt_cost)?;
        tx.execute(
            "INSERT INTO users (username, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, 'admin', ?4)",
            params![&seed.admin_username, &seed.admin_email, hash, &now],
        )?;
        log::info!("seeded admin user '{}'", seed.admin_username);
    }

    for (order, (slug, name_zh, name_en, description)) in DEFAULT_CATEGORIES.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO categories (slug, name_zh, name_en, description, sort_order) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![slug, name_zh, name_en, description, order as i64],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Get connection from pool (for use in use cases).
pub fn get_connection(pool: &DbPool) -> MutexGuard<'_, Connection> {
    pool.0.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_recorded_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn seeding_twice_keeps_one_admin() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let seed = SeedOptions {
            bcrypt_cost: TEST_BCRYPT_COST,
            ..SeedOptions::default()
        };
        seed_defaults(&mut conn, &seed).unwrap();
        seed_defaults(&mut conn, &seed).unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        let cats: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(users, 1);
        assert_eq!(cats, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_db_seeds_admin_at_test_cost() {
        let pool = init_test_db();
        let conn = get_connection(&pool);
        let hash: String = conn
            .query_row("SELECT password_hash FROM users WHERE username = 'admin'", [], |r| r.get(0))
            .unwrap();
        assert!(hash.starts_with("$2b$04$"), "unexpected hash prefix: {}", hash);
        assert!(password::verify_password("admin123", &hash));
    }

    #[test]
    fn file_db_is_created_with_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("blog.db");
        let seed = SeedOptions {
            bcrypt_cost: TEST_BCRYPT_COST,
            ..SeedOptions::default()
        };
        let pool = init_db(&path, &seed).unwrap();
        assert!(path.exists());
        pool.close().unwrap();
    }
}
