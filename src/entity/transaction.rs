use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
  #[sea_orm(string_value = "transfer")]
  #[default]
  Transfer,
  #[sea_orm(string_value = "credit")]
  Credit,
  #[sea_orm(string_value = "debit")]
  Debit,
  #[sea_orm(string_value = "adjusted")]
  Adjusted,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "completed")]
  Completed,
}

/// Immutable ledger record. Only `status` and the soft-delete fields may
/// change after insertion; amount and parties never do.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  #[sea_orm(unique)]
  pub reference: String,
  pub user_id: i64,
  pub to_user_id: i64,
  pub amount: i64,
  pub tx_type: TransactionType,
  pub status: TxStatus,
  pub message: Option<String>,
  pub is_deleted: bool,
  pub deleted_at: Option<DateTime>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::UserId",
    to = "account::Column::Id"
  )]
  Sender,
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ToUserId",
    to = "account::Column::Id"
  )]
  Receiver,
}

impl Related<account::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sender.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
