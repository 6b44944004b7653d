//! Account bootstrap utility
//!
//! Creates an account directly in the database, bypassing the API. Used to
//! seed the first admin before any token can be issued.
//!
//! Usage: create_user <username> <password> [viewer|admin]

use sqlx::postgres::PgPoolOptions;

use paytrack::users::UserDirectory;
use paytrack::{db, Config, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let (username, password) = match (args.next(), args.next()) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            eprintln!("usage: create_user <username> <password> [viewer|admin]");
            std::process::exit(2);
        }
    };
    let role: Role = args.next().unwrap_or_else(|| "viewer".to_string()).parse()?;

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;

    let directory = UserDirectory::new(pool.clone());
    let user = directory.create(&username, &password, role).await?;

    println!(
        "created user {} (id {}, role {})",
        user.username, user.id, user.role
    );

    pool.close().await;
    Ok(())
}
