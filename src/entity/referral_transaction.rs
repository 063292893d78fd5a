use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

/// Created exactly once per distinct referrer link; settlement of the
/// commission happens out of band.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_transactions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub referred_by: i64,
  pub referred_user: i64,
  pub commission_amount: i64,
  pub status: ReferralStatus,
  pub is_deleted: bool,
  pub deleted_at: Option<DateTime>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ReferredBy",
    to = "account::Column::Id"
  )]
  Referrer,
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ReferredUser",
    to = "account::Column::Id"
  )]
  Referred,
}

impl Related<account::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Referrer.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
