use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(RoleCounters::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(RoleCounters::Role)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(RoleCounters::NextSeq)
              .big_integer()
              .not_null()
              .default(0),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(RoleCounters::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum RoleCounters {
  Table,
  Role,
  NextSeq,
}
