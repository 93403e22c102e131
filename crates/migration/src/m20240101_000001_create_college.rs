//! Create `college` table.
//!
//! The unique name lets the default college be created idempotently.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(College::Table)
                    .if_not_exists()
                    .col(uuid(College::Id).primary_key())
                    .col(string_len(College::Name, 128).unique_key().not_null())
                    .col(string_len(College::GradingScale, 16).not_null())
                    .col(timestamp_with_time_zone(College::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(College::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum College { Table, Id, Name, GradingScale, CreatedAt }
