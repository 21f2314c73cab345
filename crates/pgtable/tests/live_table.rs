//! Round trips against a real database. Skipped unless `DATABASE_URL` is set
//! (a `.env` file is honoured).

use pgtable::prelude::*;

async fn try_connect() -> Option<Connection<tokio_postgres::Client>> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let conn = Connection::connect(&database_url)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    conn.client()
        .batch_execute(
            "CREATE TEMP TABLE users (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                age INT4,
                email TEXT,
                price NUMERIC(10, 2)
            )",
        )
        .await
        .expect("create temp table");
    Some(conn)
}

#[tokio::test]
async fn users_crud_round_trip() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    users.save(record! { "name" => "ali", "age" => "18" }).await?;
    users.save(record! { "name" => "veli", "age" => "18" }).await?;

    let adults = users
        .find_with_and(record! { "age" => "18" })
        .await?
        .expect("two adults");
    assert_eq!(adults.count(), 2);
    assert!(adults.first()?.get("id").is_some());

    let veli = users.find("name", "veli").await?;
    assert_eq!(veli.count(), 1);
    assert!(matches!(
        veli.first().unwrap_err(),
        OrmError::InsufficientRows { needed: 2, got: 1 }
    ));
    veli.delete(RowScope::First).await?;

    assert_eq!(users.total().await?, 1);
    assert_eq!(users.total_field("name", "ali").await?, 1);
    Ok(())
}

#[tokio::test]
async fn save_updates_when_primary_key_is_set() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    users.save(record! { "name" => "ali", "age" => 18 }).await?;
    let mut ali = users.get_first().await?.to_record();
    ali.set("age", 19);
    assert_eq!(users.save(ali).await?, 1);

    let row = users.get_last().await?;
    assert_eq!(row.get("age"), Some(&Value::Int(19)));
    assert_eq!(users.total().await?, 1);
    Ok(())
}

#[tokio::test]
async fn text_values_are_escaped_on_write() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    users
        .save(record! { "name" => "<script>x</script>", "email" => "ali@example.com" })
        .await?;
    let row = users.get_first().await?;
    assert_eq!(
        row.get("name"),
        Some(&Value::from("&lt;script&gt;x&lt;/script&gt;"))
    );
    assert_eq!(row.get("email"), Some(&Value::from("ali@example.com")));
    Ok(())
}

#[tokio::test]
async fn numeric_columns_round_trip_as_text() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    users.save(record! { "name" => "a", "price" => "9.99" }).await?;
    users.save(record! { "name" => "b", "price" => 12.5 }).await?;
    users.save(record! { "name" => "c", "price" => 3 }).await?;

    let all = users.get_all().await?.expect("rows");
    let by_name = all.group_by(["name"]);
    for (name, price) in [("a", "9.99"), ("b", "12.50"), ("c", "3.00")] {
        assert_eq!(by_name[name][0].get("price"), Some(&Value::from(price)));
    }
    assert_eq!(users.total_field("price", "9.99").await?, 1);
    Ok(())
}

#[tokio::test]
async fn grouping_pagination_and_bulk_update() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    for (name, age) in [("a", 18), ("b", 18), ("c", 30)] {
        users.save(record! { "name" => name, "age" => age }).await?;
    }

    let grouped = users.get_grouped("age").await?.expect("groups");
    assert_eq!(grouped.count(), 2);

    let page = users.get_paginated(2, 1).await?.expect("page");
    assert_eq!(page.count(), 2);

    let all = users.get_all().await?.expect("rows");
    let by_age = all.group_by(["age"]);
    assert_eq!(by_age["18"].len(), 2);
    assert_eq!(all.filter("age", "30").map(|s| s.count()), Some(1));

    assert_eq!(users.update_field("age", 40, ApplyToAll).await?, 3);
    assert_eq!(users.total_field("age", 40).await?, 3);

    users.truncate().await?;
    assert!(users.get_all().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn result_set_update_all() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    for name in ["a", "b", "c"] {
        users.save(record! { "name" => name, "age" => 1 }).await?;
    }
    let one = users
        .find_with_or(record! { "name" => "a", "age" => 99 })
        .await?
        .expect("one match");
    assert_eq!(one.count(), 1);

    let all = users.get_all().await?.expect("rows");
    assert_eq!(all.update(record! { "age" => 2 }, RowScope::All).await?, 3);
    assert_eq!(users.total_field("age", 2).await?, 3);
    Ok(())
}

#[tokio::test]
async fn transaction_commit_and_rollback() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let users = Table::new(&conn, "users", "id")?;

    users
        .transaction(async |tx| {
            tx.save(record! { "name" => "ali", "age" => 18 }).await?;
            Ok(())
        })
        .await?;
    assert_eq!(users.total().await?, 1);

    let err = users
        .transaction(async |tx| {
            tx.save(record! { "name" => "veli", "age" => 18 }).await?;
            Err::<(), _>(OrmError::validation("abort"))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Transaction { .. }));
    assert_eq!(users.total().await?, 1);
    Ok(())
}

#[tokio::test]
async fn engine_errors_name_the_operation() -> OrmResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let missing = Table::new(&conn, "no_such_table", "id")?;

    let err = missing.get_all().await.unwrap_err();
    assert!(err.to_string().starts_with("GetAll function error:"), "{err}");

    conn.disconnect();
    let users = Table::new(&conn, "users", "id")?;
    assert!(users.total().await.unwrap_err().is_connection_closed());
    Ok(())
}
