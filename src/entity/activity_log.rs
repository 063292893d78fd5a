use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub acting_account_id: i64,
  pub subject_account_id: i64,
  pub message: String,
  pub log_type: String,
  pub transaction_type: Option<String>,
  pub refer_transaction_type: Option<String>,
  pub is_deleted: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ActingAccountId",
    to = "account::Column::Id"
  )]
  ActingAccount,
}

impl Related<account::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::ActingAccount.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
