use json as serde_json;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered tiers of the reseller hierarchy, root first. Side roles
/// (gift/loan/otc) sit outside the chain and never own subordinates
/// below them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[sea_orm(string_value = "superadmin")]
  Superadmin,
  #[sea_orm(string_value = "admin")]
  Admin,
  #[sea_orm(string_value = "superareamanager")]
  Superareamanager,
  #[sea_orm(string_value = "areamanager")]
  Areamanager,
  #[sea_orm(string_value = "master")]
  Master,
  #[sea_orm(string_value = "player")]
  Player,
  #[sea_orm(string_value = "gift")]
  Gift,
  #[sea_orm(string_value = "loan")]
  Loan,
  #[sea_orm(string_value = "otc")]
  Otc,
}

impl Role {
  /// The linear chain walked by descendant queries, root first.
  pub const TIERS: [Role; 6] = [
    Role::Superadmin,
    Role::Admin,
    Role::Superareamanager,
    Role::Areamanager,
    Role::Master,
    Role::Player,
  ];

  /// Position in the tier chain; `None` for side roles.
  pub fn tier(self) -> Option<usize> {
    Self::TIERS.iter().position(|role| *role == self)
  }

  pub fn is_side_role(self) -> bool {
    matches!(self, Role::Gift | Role::Loan | Role::Otc)
  }

  /// Root-tier accounts settle ledger operations immediately.
  pub fn is_root_tier(self) -> bool {
    matches!(self, Role::Superadmin | Role::Admin)
  }

  /// Whether an account of this role may create an account of `target`.
  /// Tiered targets require a strictly higher caller tier; side roles
  /// are created by the root tiers only.
  pub fn can_create(self, target: Role) -> bool {
    match (self.tier(), target.tier()) {
      (Some(caller), Some(child)) => caller < child,
      (Some(_), None) => self.is_root_tier(),
      (None, _) => false,
    }
  }

  /// Whether this role may oversee (toggle, delete, adjust) `target`.
  pub fn oversees(self, target: Role) -> bool {
    self.can_create(target)
  }

  /// Tiers below admin carry identity/contact fields at creation.
  pub fn requires_contact_fields(self) -> bool {
    self.tier().is_some_and(|tier| tier >= 2)
  }

  /// The stored string value, also the role-counter key.
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Superadmin => "superadmin",
      Role::Admin => "admin",
      Role::Superareamanager => "superareamanager",
      Role::Areamanager => "areamanager",
      Role::Master => "master",
      Role::Player => "player",
      Role::Gift => "gift",
      Role::Loan => "loan",
      Role::Otc => "otc",
    }
  }

  pub fn username_prefix(self) -> &'static str {
    match self {
      Role::Superadmin => "SA",
      Role::Admin => "AD",
      Role::Superareamanager => "SAM",
      Role::Areamanager => "AM",
      Role::Master => "MS",
      Role::Player => "PL",
      Role::Gift => "GF",
      Role::Loan => "LN",
      Role::Otc => "OTC",
    }
  }
}

/// Weak back-reference id list stored as a JSON column. The referenced
/// rows stay authoritative; these lists exist for display and for the
/// subordinate-link invariant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, FromJsonQueryResult)]
pub struct IdList(pub Vec<i64>);

impl IdList {
  pub fn push(&mut self, id: i64) {
    if !self.0.contains(&id) {
      self.0.push(id);
    }
  }

  pub fn pull(&mut self, id: i64) {
    self.0.retain(|held| *held != id);
  }

  pub fn contains(&self, id: i64) -> bool {
    self.0.contains(&id)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  #[sea_orm(unique)]
  pub username: String,
  pub role: Role,
  pub password_hash: String,
  pub pin_hash: Option<String>,
  pub pin_password_hash: Option<String>,
  pub name: Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub address: Option<String>,
  pub wallet_balance: i64,
  pub ref_id: Option<i64>,
  pub parent_id: Option<i64>,
  #[sea_orm(column_type = "Json")]
  pub subordinates: IdList,
  #[sea_orm(column_type = "Json")]
  pub transaction_ids: IdList,
  #[sea_orm(column_type = "Json")]
  pub referral_transaction_ids: IdList,
  #[sea_orm(column_type = "Json")]
  pub activity_log_ids: IdList,
  #[sea_orm(column_type = "Json")]
  pub game_config_ids: IdList,
  pub user_status: bool,
  pub is_deleted: bool,
  pub deleted_at: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
