use crate::db::{connect_with_config, DatabaseConfig, DATABASE_URL};
use crate::errors::ModelError;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use anyhow::Result;

/// Test connection with pool settings from `configs`
#[tokio::test]
async fn test_custom_config_connection() -> Result<()> {
    if super::setup_test_db().await.is_none() {
        return Ok(());
    }

    let config = DatabaseConfig {
        url: DATABASE_URL.clone(),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 10,
        ..Default::default()
    };
    let db = connect_with_config(&config).await?;

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1 as test".to_string());
    let row = db.query_one(stmt).await?.expect("one row");
    let test_value: i32 = row.try_get("", "test")?;
    assert_eq!(test_value, 1);
    Ok(())
}

#[test]
fn non_unique_db_errors_map_to_db_variant() {
    let err: ModelError = sea_orm::DbErr::Custom("boom".into()).into();
    assert!(matches!(err, ModelError::Db(msg) if msg.contains("boom")));
}
