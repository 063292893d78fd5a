use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-role username sequence, keyed by the role's string value.
/// Bumped with a single in-transaction UPDATE, never read-then-write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_counters")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub role: String,
  pub next_seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
