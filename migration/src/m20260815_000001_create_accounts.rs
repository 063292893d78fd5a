use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Accounts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Accounts::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Accounts::Username)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Accounts::Role).string().not_null())
          .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
          .col(ColumnDef::new(Accounts::PinHash).string().null())
          .col(ColumnDef::new(Accounts::PinPasswordHash).string().null())
          .col(ColumnDef::new(Accounts::Name).string().null())
          .col(ColumnDef::new(Accounts::Phone).string().null())
          .col(ColumnDef::new(Accounts::Email).string().null())
          .col(ColumnDef::new(Accounts::Address).string().null())
          .col(
            ColumnDef::new(Accounts::WalletBalance)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Accounts::RefId).big_integer().null())
          .col(ColumnDef::new(Accounts::ParentId).big_integer().null())
          .col(
            ColumnDef::new(Accounts::Subordinates)
              .json()
              .not_null()
              .default("[]"),
          )
          .col(
            ColumnDef::new(Accounts::TransactionIds)
              .json()
              .not_null()
              .default("[]"),
          )
          .col(
            ColumnDef::new(Accounts::ReferralTransactionIds)
              .json()
              .not_null()
              .default("[]"),
          )
          .col(
            ColumnDef::new(Accounts::ActivityLogIds)
              .json()
              .not_null()
              .default("[]"),
          )
          .col(
            ColumnDef::new(Accounts::GameConfigIds)
              .json()
              .not_null()
              .default("[]"),
          )
          .col(
            ColumnDef::new(Accounts::UserStatus)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(Accounts::IsDeleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Accounts::DeletedAt).date_time().null())
          .col(ColumnDef::new(Accounts::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Accounts::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_accounts_ref_id")
          .table(Accounts::Table)
          .col(Accounts::RefId)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_accounts_role")
          .table(Accounts::Table)
          .col(Accounts::Role)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Accounts::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Accounts {
  Table,
  Id,
  Username,
  Role,
  PasswordHash,
  PinHash,
  PinPasswordHash,
  Name,
  Phone,
  Email,
  Address,
  WalletBalance,
  RefId,
  ParentId,
  Subordinates,
  TransactionIds,
  ReferralTransactionIds,
  ActivityLogIds,
  GameConfigIds,
  UserStatus,
  IsDeleted,
  DeletedAt,
  CreatedAt,
  UpdatedAt,
}
