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
          .table(Transactions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Transactions::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Transactions::Reference)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Transactions::UserId).big_integer().not_null())
          .col(ColumnDef::new(Transactions::ToUserId).big_integer().not_null())
          .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
          .col(ColumnDef::new(Transactions::TxType).string().not_null())
          .col(ColumnDef::new(Transactions::Status).string().not_null())
          .col(ColumnDef::new(Transactions::Message).string().null())
          .col(
            ColumnDef::new(Transactions::IsDeleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Transactions::DeletedAt).date_time().null())
          .col(ColumnDef::new(Transactions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_transactions_user")
              .from(Transactions::Table, Transactions::UserId)
              .to(Accounts::Table, Accounts::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_transactions_to_user")
              .from(Transactions::Table, Transactions::ToUserId)
              .to(Accounts::Table, Accounts::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_transactions_user")
          .table(Transactions::Table)
          .col(Transactions::UserId)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_transactions_to_user")
          .table(Transactions::Table)
          .col(Transactions::ToUserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Transactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Transactions {
  Table,
  Id,
  Reference,
  UserId,
  ToUserId,
  Amount,
  TxType,
  Status,
  Message,
  IsDeleted,
  DeletedAt,
  CreatedAt,
}
