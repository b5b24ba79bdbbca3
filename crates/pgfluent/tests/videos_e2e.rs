#![cfg(feature = "pool")]

use chrono::{Duration, TimeZone, Utc};
use pgfluent::{Database, DbConfig, DbResult, PgDatabase, Value, insert, query, remove, row, update};
use std::time::{SystemTime, UNIX_EPOCH};

fn database_url(test: &str) -> Option<String> {
    match std::env::var("DATABASE_URL") {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{nanos}", std::process::id())
}

async fn create_videos_table(db: &PgDatabase, table: &str) -> DbResult<()> {
    query(
        db,
        &format!(
            r#"CREATE TABLE "{table}" (
                id serial PRIMARY KEY,
                slug text NOT NULL UNIQUE,
                title text NOT NULL,
                tags text[] NOT NULL DEFAULT '{{}}',
                "isPublished" boolean NOT NULL,
                "createdAt" timestamptz NOT NULL
            )"#
        ),
        &[],
    )
    .await?;
    Ok(())
}

async fn drop_table(db: &PgDatabase, table: &str) {
    let _ = query(db, &format!(r#"DROP TABLE IF EXISTS "{table}""#), &[]).await;
}

#[tokio::test]
async fn published_videos_are_paginated_newest_first() -> DbResult<()> {
    let Some(url) = database_url("published_videos_are_paginated_newest_first") else {
        return Ok(());
    };
    let db = Database::connect(&DbConfig::new().database_url(url));
    let table = unique_table("videos_e2e");
    create_videos_table(&db, &table).await?;

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..70 {
        let published = i < 60;
        insert(
            &db,
            &table,
            row! {
                "slug" => format!("video-{i}"),
                "title" => format!("Video {i}"),
                "tags" => vec!["Pilates", "core"],
                "isPublished" => published,
                "createdAt" => base + Duration::minutes(i),
            },
        )
        .await?;
    }

    let result = db
        .table(&table)
        .select(r#"id, slug, "createdAt", "isPublished""#)
        .eq("isPublished", true)
        .order("createdAt", false)
        .range(0, 49)
        .execute()
        .await;
    drop_table(&db, &table).await;
    let rows = result?;

    assert_eq!(rows.len(), 50);
    assert!(rows.iter().all(|r| r["isPublished"] == Value::Bool(true)));
    let created: Vec<&str> = rows
        .iter()
        .map(|r| r["createdAt"].as_str().expect("createdAt is text"))
        .collect();
    assert!(created.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(rows[0]["slug"], Value::from("video-59"));
    Ok(())
}

#[tokio::test]
async fn writes_roundtrip_and_classify_errors() -> DbResult<()> {
    let Some(url) = database_url("writes_roundtrip_and_classify_errors") else {
        return Ok(());
    };
    let db = Database::connect(&DbConfig::new().database_url(url));
    let table = unique_table("videos_writes");
    create_videos_table(&db, &table).await?;

    let outcome: DbResult<()> = async {
        let stored = insert(
            &db,
            &table,
            row! {
                "slug" => "core-1",
                "title" => "Core",
                "tags" => vec!["a", "b"],
                "isPublished" => false,
                "createdAt" => Utc::now(),
            },
        )
        .await?
        .expect("insert returns the stored row");
        assert_eq!(stored["tags"], Value::from(vec!["a", "b"]));

        let found = db
            .table(&table)
            .contains_case_insensitive("tags", "A")
            .single()
            .await?;
        assert_eq!(found["slug"], Value::from("core-1"));

        let dup = insert(
            &db,
            &table,
            row! {
                "slug" => "core-1",
                "title" => "Again",
                "isPublished" => false,
                "createdAt" => Utc::now(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(dup.code(), "23505");

        let err = db
            .table(&table)
            .update(row! { "title" => "nope" })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MISSING_WHERE_CLAUSE");

        let updated = update(
            &db,
            &table,
            row! { "isPublished" => true },
            row! { "slug" => "core-1" },
        )
        .await?
        .expect("one row updated");
        assert_eq!(updated["isPublished"], Value::Bool(true));

        let missing = db.table(&table).eq("slug", "nope").single().await.unwrap_err();
        assert_eq!(missing.code(), "PGRST116");

        let deleted = remove(&db, &table, row! { "slug" => "core-1" }).await?;
        assert_eq!(deleted.len(), 1);
        Ok(())
    }
    .await;

    drop_table(&db, &table).await;
    outcome
}

#[tokio::test]
async fn missing_url_is_not_initialized() {
    let db = Database::connect(&DbConfig::new());
    let err = db.table("videos").execute().await.unwrap_err();
    assert_eq!(err.code(), "CLIENT_NOT_INITIALIZED");
    let resp = db.respond(Err::<(), _>(err));
    assert_eq!(resp.error.unwrap().code, "CLIENT_NOT_INITIALIZED");
}
