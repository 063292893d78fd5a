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
          .table(ReferralTransactions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ReferralTransactions::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(ReferralTransactions::ReferredBy)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(ReferralTransactions::ReferredUser)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(ReferralTransactions::CommissionAmount)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(ReferralTransactions::Status).string().not_null())
          .col(
            ColumnDef::new(ReferralTransactions::IsDeleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(ReferralTransactions::DeletedAt).date_time().null(),
          )
          .col(
            ColumnDef::new(ReferralTransactions::CreatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_referral_transactions_referred_by")
              .from(
                ReferralTransactions::Table,
                ReferralTransactions::ReferredBy,
              )
              .to(Accounts::Table, Accounts::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_referral_transactions_referred_user")
              .from(
                ReferralTransactions::Table,
                ReferralTransactions::ReferredUser,
              )
              .to(Accounts::Table, Accounts::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_referral_transactions_referred_by")
          .table(ReferralTransactions::Table)
          .col(ReferralTransactions::ReferredBy)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ReferralTransactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ReferralTransactions {
  Table,
  Id,
  ReferredBy,
  ReferredUser,
  CommissionAmount,
  Status,
  IsDeleted,
  DeletedAt,
  CreatedAt,
}
