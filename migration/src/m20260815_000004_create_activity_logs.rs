use sea_orm_migration::prelude::*;

use super::m20260815_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(ActivityLogs::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ActivityLogs::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(ActivityLogs::ActingAccountId)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(ActivityLogs::SubjectAccountId)
              .big_integer()
              .not_null(),
          )
          .col(ColumnDef::new(ActivityLogs::Message).string().not_null())
          .col(ColumnDef::new(ActivityLogs::LogType).string().not_null())
          .col(ColumnDef::new(ActivityLogs::TransactionType).string().null())
          .col(
            ColumnDef::new(ActivityLogs::ReferTransactionType).string().null(),
          )
          .col(
            ColumnDef::new(ActivityLogs::IsDeleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(ActivityLogs::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_activity_logs_acting_account")
              .from(ActivityLogs::Table, ActivityLogs::ActingAccountId)
              .to(Accounts::Table, Accounts::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_activity_logs_acting_account")
          .table(ActivityLogs::Table)
          .col(ActivityLogs::ActingAccountId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ActivityLogs {
  Table,
  Id,
  ActingAccountId,
  SubjectAccountId,
  Message,
  LogType,
  TransactionType,
  ReferTransactionType,
  IsDeleted,
  CreatedAt,
}
