use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn build_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .expect("Failed to build the database pool")
}

/// Applies `database.sql` (idempotent CREATE TABLE IF NOT EXISTS
/// statements) on startup. Any failure here aborts the process before the
/// server binds.
pub fn initialize_database(pool: &DbPool) {
    let sql = std::fs::read_to_string("database.sql").expect("Couldn't read database.sql");

    let conn = pool
        .get()
        .expect("Couldn't get a connection for schema setup");

    conn.batch_execute(&sql)
        .expect("Failed to initialize the database schema");
}
