//! Common test utilities
//!
//! Tests share one database and each test wipes it on setup, so run the
//! suite with --test-threads=1.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use paytrack::users::UserDirectory;
use paytrack::Role;

/// Baseline accounts seeded for every test.
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const VIEWER_USER: &str = "viewer1";
pub const VIEWER_PASSWORD: &str = "viewer123";

/// Setup test database - truncate tables and seed baseline accounts.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE payments, users RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    let directory = UserDirectory::new(pool.clone());
    directory
        .create(ADMIN_USER, ADMIN_PASSWORD, Role::Admin)
        .await
        .expect("Failed to seed admin");
    directory
        .create(VIEWER_USER, VIEWER_PASSWORD, Role::Viewer)
        .await
        .expect("Failed to seed viewer");

    pool
}
