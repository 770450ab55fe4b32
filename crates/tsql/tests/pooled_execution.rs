//! Compile-only checks for the pooled execution and transaction APIs.

#![allow(dead_code)]

use tsql::{
    ColumnType, Database, GenericClient, QueryError, QueryResult, Schema, Single, TableDef,
};

fn schema() -> Schema {
    Schema::new().table(
        TableDef::new("accounts")
            .generated("id", ColumnType::Int8)
            .column("owner", ColumnType::Text)
            .column("balance", ColumnType::Int8),
    )
}

#[cfg(feature = "pool")]
async fn _transaction_commits_on_ok(db: &Database) -> QueryResult<u64> {
    db.transaction()
        .execute(async |tx| {
            db.update_table("accounts")?
                .set("balance", 0i64)?
                .where_eq("id", 1i64)?
                .execute(tx)
                .await
        })
        .await
}

#[cfg(feature = "pool")]
async fn _transaction_rolls_back_on_callback_error(db: &Database) -> QueryResult<()> {
    let result: QueryResult<u64> = db
        .transaction()
        .execute(async |tx| {
            db.insert_into("accounts")?
                .value("owner", "alice")?
                .execute(tx)
                .await?;
            // Any callback error rolls the whole transaction back.
            Err(QueryError::Other("abort".to_string()))
        })
        .await;
    assert!(result.is_err());
    Ok(())
}

#[cfg(feature = "pool")]
async fn _pool_exhaustion_surfaces_as_pool_timeout(db: &Database) -> QueryResult<()> {
    // Holding the only connection makes the next checkout wait, then fail
    // with PoolTimeout once the configured wait timeout elapses.
    let _held = db.client().await?;
    match db.client().await {
        Err(e) if e.is_pool_timeout() => Ok(()),
        Err(e) => Err(e),
        Ok(_) => Ok(()),
    }
}

#[cfg(feature = "pool")]
async fn _builders_accept_any_generic_client(db: &Database) -> QueryResult<()> {
    let pooled = db.client().await?;
    let id: Option<Single<i64>> = db
        .select_from("accounts")?
        .select(&["id"])?
        .where_eq("owner", "alice")?
        .execute_take_first(&pooled)
        .await?;
    let _ = id;
    Ok(())
}

async fn _builders_accept_raw_clients(
    db: &Database,
    client: &tokio_postgres::Client,
) -> QueryResult<Vec<Single<String>>> {
    db.select_from("accounts")?
        .select(&["owner"])?
        .execute(client)
        .await
}

#[cfg(feature = "pool")]
async fn _dynamic_rows_follow_the_configured_key_case(db: &Database) -> QueryResult<()> {
    let rows = db
        .execute_json(&db.select_from("accounts")?.limit(10))
        .await?;
    let _ = rows.first().map(|row| row.contains_key("balance"));
    Ok(())
}

fn _generic_client_futures_are_send<C: GenericClient>(client: &'static C) {
    fn assert_send<T: Send>(_: T) {}
    assert_send(client.query("SELECT 1", &[]));
}
