//! Infrastructure: SQLite connection, migrations, upload storage.

pub mod db;
pub mod storage;

pub(crate) use db::get_connection;
pub use db::{init_db, init_test_db, DbPool, SeedOptions, TEST_BCRYPT_COST};
pub use storage::MediaStore;
