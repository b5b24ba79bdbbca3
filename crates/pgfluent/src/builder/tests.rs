use super::*;
use crate::client::mock::RecordingClient;
use crate::error::DriverError;
use crate::row;

fn db() -> Database<RecordingClient> {
    Database::new(RecordingClient::new())
}

#[test]
fn test_simple_select() {
    let db = db();
    let q = db.table("videos").compile_select().unwrap();
    assert_eq!(q.sql, r#"SELECT * FROM "videos""#);
    assert!(q.values.is_empty());
}

#[test]
fn test_select_columns_are_quoted() {
    let db = db();
    let q = db
        .table("videos")
        .select(r#"id, title, "createdAt", author.name"#)
        .compile_select()
        .unwrap();
    assert_eq!(
        q.sql,
        r#"SELECT "id", "title", "createdAt", "author"."name" FROM "videos""#
    );
}

#[test]
fn test_select_star_verbatim() {
    let db = db();
    let q = db.table("videos").select(" * ").compile_select().unwrap();
    assert_eq!(q.sql, r#"SELECT * FROM "videos""#);
}

#[test]
fn test_select_rejects_expressions() {
    let db = db();
    let err = db.table("videos").select("count(*)").compile_select().unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");
}

#[test]
fn test_conditions_are_and_joined_in_call_order() {
    let db = db();
    let q = db
        .table("videos")
        .eq("isPublished", true)
        .neq("status", "draft")
        .gt("views", 10)
        .gte("durationSec", 60)
        .lt("rating", 5.0)
        .lte("level", 3)
        .like("slug", "core-%")
        .ilike("title", "%pilates%")
        .compile_select()
        .unwrap();
    assert_eq!(
        q.sql,
        concat!(
            r#"SELECT * FROM "videos" WHERE "isPublished" = $1 AND "status" != $2"#,
            r#" AND "views" > $3 AND "durationSec" >= $4 AND "rating" < $5"#,
            r#" AND "level" <= $6 AND "slug" LIKE $7 AND "title" ILIKE $8"#
        )
    );
    assert_eq!(
        q.values,
        vec![
            Value::Bool(true),
            Value::Text("draft".into()),
            Value::Int(10),
            Value::Int(60),
            Value::Float(5.0),
            Value::Int(3),
            Value::Text("core-%".into()),
            Value::Text("%pilates%".into()),
        ]
    );
}

#[test]
fn test_in_and_or_groups_take_fresh_slots() {
    let db = db();
    let q = db
        .table("videos")
        .in_list("level", ["beginner", "advanced"])
        .or("title.ilike.core,description.ilike.%core%")
        .contains_case_insensitive("tags", "Pilates")
        .compile_select()
        .unwrap();
    assert_eq!(
        q.sql,
        concat!(
            r#"SELECT * FROM "videos" WHERE "level" IN ($1, $2)"#,
            r#" AND ("title" ILIKE $3 OR "description" ILIKE $4)"#,
            r#" AND EXISTS (SELECT 1 FROM unnest("tags") AS elem WHERE lower(elem) = lower($5))"#
        )
    );
    assert_eq!(q.values.len(), 5);
    assert_eq!(q.values[2], Value::Text("%core%".into()));
    assert_eq!(q.values[3], Value::Text("%core%".into()));
}

#[test]
fn test_empty_in_list_fails() {
    let db = db();
    let err = db
        .table("videos")
        .in_list("id", Vec::<i64>::new())
        .compile_select()
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");
}

#[test]
fn test_order_last_call_wins() {
    let db = db();
    let q = db
        .table("videos")
        .order("title", true)
        .order("createdAt", false)
        .compile_select()
        .unwrap();
    assert_eq!(q.sql, r#"SELECT * FROM "videos" ORDER BY "createdAt" DESC"#);
}

#[test]
fn test_range_equals_offset_and_limit() {
    let db = db();
    let ranged = db.table("videos").range(10, 19).compile_select().unwrap();
    let manual = db.table("videos").offset(10).limit(10).compile_select().unwrap();
    assert_eq!(ranged, manual);
    assert_eq!(ranged.sql, r#"SELECT * FROM "videos" LIMIT $1 OFFSET $2"#);
    assert_eq!(ranged.values, vec![Value::Int(10), Value::Int(10)]);
}

#[test]
fn test_limit_after_range_overrides() {
    let db = db();
    let q = db.table("videos").range(0, 49).limit(5).compile_select().unwrap();
    assert_eq!(q.values, vec![Value::Int(5), Value::Int(0)]);
}

#[test]
fn test_limit_zero_is_emitted() {
    let db = db();
    let q = db.table("videos").limit(0).compile_select().unwrap();
    assert_eq!(q.sql, r#"SELECT * FROM "videos" LIMIT $1"#);
}

#[test]
fn test_range_rejects_reversed_bounds() {
    let db = db();
    let err = db.table("videos").range(5, 4).compile_select().unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");
}

#[test]
fn test_range_over_whole_usize_is_invalid_not_a_panic() {
    let db = db();
    let err = db.table("videos").range(0, usize::MAX).compile_select().unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");

    let err = db.table("videos").range(1, usize::MAX).compile_select().unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");
}

#[test]
fn test_pagination_follows_conditions_and_order() {
    let db = db();
    let q = db
        .table("videos")
        .eq("isPublished", true)
        .order("createdAt", false)
        .range(0, 49)
        .compile_select()
        .unwrap();
    assert_eq!(
        q.sql,
        r#"SELECT * FROM "videos" WHERE "isPublished" = $1 ORDER BY "createdAt" DESC LIMIT $2 OFFSET $3"#
    );
    assert_eq!(
        q.values,
        vec![Value::Bool(true), Value::Int(50), Value::Int(0)]
    );
}

#[test]
fn test_invalid_identifiers_fail_before_io() {
    let db = db();
    assert!(db.table("videos; drop table x").compile_select().is_err());
    assert!(db.table("videos").eq("a b", 1).compile_select().is_err());
    assert!(db.table("videos").order("x--", true).compile_select().is_err());
}

#[test]
fn test_first_build_error_wins() {
    let db = db();
    let err = db
        .table("videos")
        .or("views.gt.1")
        .range(3, 1)
        .compile_select()
        .unwrap_err();
    assert!(err.to_string().contains("unsupported operator"));
}

#[test]
fn test_insert_serializes_arrays() {
    let db = db();
    let q = db
        .table("videos")
        .compile_insert(&row! { "title" => "Core", "tags" => vec!["a", "b"] })
        .unwrap();
    assert_eq!(
        q.sql,
        r#"INSERT INTO "videos" ("tags", "title") VALUES ($1, $2) RETURNING *"#
    );
    assert_eq!(
        q.values,
        vec![Value::Text(r#"["a","b"]"#.into()), Value::Text("Core".into())]
    );
}

#[test]
fn test_insert_empty_row_uses_default_values() {
    let db = db();
    let q = db.table("videos").compile_insert(&row! {}).unwrap();
    assert_eq!(q.sql, r#"INSERT INTO "videos" DEFAULT VALUES RETURNING *"#);
}

#[test]
fn test_update_set_then_where() {
    let db = db();
    let q = db
        .table("videos")
        .eq("id", 7)
        .compile_update(&row! { "title" => "New", "meta" => row! { "k" => 1 } })
        .unwrap();
    assert_eq!(
        q.sql,
        r#"UPDATE "videos" SET "meta" = $1, "title" = $2 WHERE "id" = $3 RETURNING *"#
    );
    assert_eq!(
        q.values,
        vec![
            Value::Text(r#"{"k":1}"#.into()),
            Value::Text("New".into()),
            Value::Int(7),
        ]
    );
}

#[test]
fn test_update_requires_conditions_and_columns() {
    let db = db();
    let err = db
        .table("videos")
        .compile_update(&row! { "title" => "x" })
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_WHERE_CLAUSE");

    let err = db.table("videos").eq("id", 1).compile_update(&row! {}).unwrap_err();
    assert_eq!(err.code(), "INVALID_QUERY");
}

#[test]
fn test_delete_requires_conditions() {
    let db = db();
    assert_eq!(
        db.table("videos").compile_delete().unwrap_err().code(),
        "MISSING_WHERE_CLAUSE"
    );
    let q = db.table("videos").eq("id", 1).compile_delete().unwrap();
    assert_eq!(q.sql, r#"DELETE FROM "videos" WHERE "id" = $1 RETURNING *"#);
}

// ── Execution ──

#[tokio::test]
async fn test_execute_sends_one_statement() {
    let client = RecordingClient::returning(vec![row! { "id" => 1 }, row! { "id" => 2 }]);
    let db = Database::new(client);
    let rows = db
        .table("videos")
        .eq("isPublished", true)
        .limit(2)
        .execute()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let client = db.client().unwrap();
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let literals: Vec<&str> = calls[0].literals().collect();
    assert_eq!(
        literals,
        vec![
            r#"SELECT * FROM "videos" WHERE "isPublished" = "#,
            " LIMIT ",
            ""
        ]
    );
}

#[tokio::test]
async fn test_single_returns_first_row() {
    let db = Database::new(RecordingClient::returning(vec![
        row! { "id" => 1 },
        row! { "id" => 2 },
    ]));
    let row = db.table("videos").single().await.unwrap();
    assert_eq!(row["id"], Value::Int(1));
}

#[tokio::test]
async fn test_single_without_rows_is_pgrst116() {
    let db = db();
    let err = db.table("videos").eq("id", 404).single().await.unwrap_err();
    assert!(err.is_no_rows());
    assert_eq!(err.code(), "PGRST116");
    assert_eq!(err.to_info(false).message, "No rows returned");
}

#[tokio::test]
async fn test_update_without_conditions_makes_no_driver_call() {
    let db = db();
    let err = db
        .table("videos")
        .update(row! { "title" => "x" })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_WHERE_CLAUSE");
    assert!(db.client().unwrap().calls().is_empty());
}

#[tokio::test]
async fn test_insert_returns_stored_row() {
    let stored = row! { "id" => 1, "tags" => vec!["a", "b"] };
    let db = Database::new(RecordingClient::returning(vec![stored.clone()]));
    let inserted = db
        .table("videos")
        .insert(row! { "tags" => vec!["a", "b"] })
        .await
        .unwrap();
    assert_eq!(inserted, Some(stored));
    assert_eq!(
        db.client().unwrap().last_sql().as_deref(),
        Some(r#"INSERT INTO "videos" ("tags") VALUES ($1) RETURNING *"#)
    );
}

#[tokio::test]
async fn test_driver_errors_are_classified() {
    let db = Database::new(RecordingClient::failing(
        DriverError::new("duplicate key value violates unique constraint").with_code("23505"),
    ));
    let err = db
        .table("videos")
        .insert(row! { "slug" => "core-1" })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "23505");
    assert!(err.is_unique_violation());
}
