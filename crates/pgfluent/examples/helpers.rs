//! Field-map helpers and raw SQL
//!
//! Run with: cargo run --example helpers -p pgfluent

use pgfluent::{Database, DbConfig, DbError, Value, insert, query, remove, row, update};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DbError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pgfluent=debug")),
        )
        .with_target(true)
        .compact()
        .init();

    let config = DbConfig::from_env().include_original_errors(true);
    let db = Database::connect(&config);

    query(
        &db,
        "CREATE TABLE IF NOT EXISTS pgfluent_users (id serial PRIMARY KEY, email text UNIQUE, meta jsonb)",
        &[],
    )
    .await?;

    let alice = insert(
        &db,
        "pgfluent_users",
        row! { "email" => "alice@example.com", "meta" => row! { "plan" => "pro" } },
    )
    .await?;
    println!("inserted: {alice:?}");

    // Unique violation keeps the server's SQLSTATE and detail.
    match insert(&db, "pgfluent_users", row! { "email" => "alice@example.com" }).await {
        Err(err) if err.is_unique_violation() => {
            let info = err.to_info(config.include_original_errors);
            println!("duplicate: code={} detail={:?}", info.code, info.detail);
        }
        other => println!("unexpected: {other:?}"),
    }

    let updated = update(
        &db,
        "pgfluent_users",
        row! { "meta" => row! { "plan" => "free" } },
        row! { "email" => "alice@example.com" },
    )
    .await?;
    println!("updated: {updated:?}");

    let counts = query(
        &db,
        "SELECT count(*) AS n FROM pgfluent_users WHERE email LIKE $1",
        &[Value::from("%@example.com")],
    )
    .await?;
    println!("count: {:?}", counts.first().and_then(|r| r.get("n")));

    let deleted = remove(&db, "pgfluent_users", row! { "email" => "alice@example.com" }).await?;
    println!("deleted {} row(s)", deleted.len());

    // Empty filters are refused before any I/O.
    if let Err(err) = remove(&db, "pgfluent_users", row! {}).await {
        println!("{}: {err}", err.code());
    }

    query(&db, "DROP TABLE pgfluent_users", &[]).await?;
    Ok(())
}
