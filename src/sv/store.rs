use sea_orm::sea_query::Expr;
use serde::Deserialize;

use crate::{
  entity::{IdList, Role, account, role_counter},
  prelude::*,
  sv::credential,
};

/// Account Store: sole owner of wallet-balance and hierarchy-link
/// writes. Every read filters `is_deleted = false` unless the `_any`
/// variant is used explicitly.
pub struct Store<'a> {
  db: &'a DatabaseConnection,
}

/// Fields accepted at account creation. Which of them are required
/// varies by role; the Hierarchy Manager validates before insertion.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewAccount {
  pub password: String,
  pub pin: Option<String>,
  pub name: Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub address: Option<String>,
}

/// Partial update; only `Some` fields overwrite stored values.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AccountPatch {
  pub password: Option<String>,
  pub pin: Option<String>,
  pub name: Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub address: Option<String>,
}

impl AccountPatch {
  pub fn is_empty(&self) -> bool {
    self.password.is_none()
      && self.pin.is_none()
      && self.name.is_none()
      && self.phone.is_none()
      && self.email.is_none()
      && self.address.is_none()
  }
}

/// The JSON id-list columns on an account.
#[derive(Copy, Clone, Debug)]
pub enum ListField {
  Subordinates,
  Transactions,
  ReferralTransactions,
  ActivityLogs,
  GameConfigs,
}

impl<'a> Store<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn find_by_id(&self, id: i64) -> Result<account::Model> {
    find_active(self.db, id).await
  }

  /// Includes soft-deleted rows; for lifecycle/diagnostic paths only.
  pub async fn find_by_id_any(&self, id: i64) -> Result<account::Model> {
    find_any(self.db, id).await
  }

  pub async fn find_by_role(&self, role: Role) -> Result<Vec<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::Role.eq(role))
        .filter(account::Column::IsDeleted.eq(false))
        .order_by_asc(account::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Active accounts whose `ref_id` points at `parent_id`.
  pub async fn find_children(
    &self,
    parent_id: i64,
  ) -> Result<Vec<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::RefId.eq(parent_id))
        .filter(account::Column::IsDeleted.eq(false))
        .order_by_asc(account::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn count_active_children(&self, parent_id: i64) -> Result<u64> {
    Ok(
      account::Entity::find()
        .filter(account::Column::RefId.eq(parent_id))
        .filter(account::Column::IsDeleted.eq(false))
        .count(self.db)
        .await?,
    )
  }

  pub async fn count_by_role(&self, role: Role) -> Result<u64> {
    Ok(
      account::Entity::find()
        .filter(account::Column::Role.eq(role))
        .filter(account::Column::IsDeleted.eq(false))
        .count(self.db)
        .await?,
    )
  }

  pub async fn update_fields(
    &self,
    id: i64,
    patch: &AccountPatch,
  ) -> Result<account::Model> {
    let account = find_active(self.db, id).await?;
    apply_patch(self.db, account, patch).await
  }
}

pub async fn find_active<C: ConnectionTrait>(
  conn: &C,
  id: i64,
) -> Result<account::Model> {
  account::Entity::find_by_id(id)
    .filter(account::Column::IsDeleted.eq(false))
    .one(conn)
    .await?
    .ok_or(Error::NotFound)
}

pub async fn find_any<C: ConnectionTrait>(
  conn: &C,
  id: i64,
) -> Result<account::Model> {
  account::Entity::find_by_id(id).one(conn).await?.ok_or(Error::NotFound)
}

pub async fn username_taken<C: ConnectionTrait>(
  conn: &C,
  username: &str,
) -> Result<bool> {
  let count = account::Entity::find()
    .filter(account::Column::Username.eq(username))
    .filter(account::Column::IsDeleted.eq(false))
    .count(conn)
    .await?;
  Ok(count > 0)
}

/// Uniqueness key for tiers that carry contact fields: phone+email of an
/// active account. `exclude` skips the record being updated.
pub async fn contact_taken<C: ConnectionTrait>(
  conn: &C,
  phone: &str,
  email: Option<&str>,
  exclude: Option<i64>,
) -> Result<bool> {
  let mut query = account::Entity::find()
    .filter(account::Column::Phone.eq(phone))
    .filter(account::Column::IsDeleted.eq(false));

  query = match email {
    Some(email) => query.filter(account::Column::Email.eq(email)),
    None => query.filter(account::Column::Email.is_null()),
  };

  if let Some(id) = exclude {
    query = query.filter(account::Column::Id.ne(id));
  }

  Ok(query.count(conn).await? > 0)
}

/// Bumps the per-role counter with a single row-locked UPDATE and reads
/// the new sequence back inside the same transaction. Concurrent creates
/// of one role therefore never share a username.
pub async fn next_username<C: ConnectionTrait>(
  conn: &C,
  role: Role,
) -> Result<String> {
  let updated = role_counter::Entity::update_many()
    .col_expr(
      role_counter::Column::NextSeq,
      Expr::col(role_counter::Column::NextSeq).add(1),
    )
    .filter(role_counter::Column::Role.eq(role.as_str()))
    .exec(conn)
    .await?;

  if updated.rows_affected == 0 {
    // First account of this role. A concurrent first-create loses the
    // primary-key race and surfaces as a retryable conflict.
    role_counter::ActiveModel {
      role: Set(role.as_str().to_string()),
      next_seq: Set(1),
    }
    .insert(conn)
    .await
    .map_err(|_| Error::Conflict)?;
  }

  let counter = role_counter::Entity::find_by_id(role.as_str())
    .one(conn)
    .await?
    .ok_or(Error::Conflict)?;

  Ok(format!("{}{:06}", role.username_prefix(), counter.next_seq))
}

/// Inserts a new account with a generated, role-prefixed sequential
/// username. Must run inside the caller's transaction so the counter
/// bump and the insert commit together.
pub async fn create_with_generated_username<C: ConnectionTrait>(
  conn: &C,
  role: Role,
  fields: &NewAccount,
  ref_id: Option<i64>,
) -> Result<account::Model> {
  let username = next_username(conn, role).await?;
  let now = Utc::now().naive_utc();

  let account = account::ActiveModel {
    id: NotSet,
    username: Set(username),
    role: Set(role),
    password_hash: Set(credential::digest(&fields.password)),
    pin_hash: Set(fields.pin.as_deref().map(credential::digest)),
    pin_password_hash: Set(
      fields
        .pin
        .as_deref()
        .map(|pin| credential::combined_digest(pin, &fields.password)),
    ),
    name: Set(fields.name.clone()),
    phone: Set(fields.phone.clone()),
    email: Set(fields.email.clone()),
    address: Set(fields.address.clone()),
    wallet_balance: Set(0),
    ref_id: Set(ref_id),
    parent_id: Set(None),
    subordinates: Set(IdList::default()),
    transaction_ids: Set(IdList::default()),
    referral_transaction_ids: Set(IdList::default()),
    activity_log_ids: Set(IdList::default()),
    game_config_ids: Set(IdList::default()),
    user_status: Set(true),
    is_deleted: Set(false),
    deleted_at: Set(None),
    created_at: Set(now),
    updated_at: Set(now),
  };

  Ok(account.insert(conn).await?)
}

/// Explicit merge: only `Some` fields overwrite. A changed pin or
/// password invalidates the stored pin+password digest unless both are
/// supplied together.
pub async fn apply_patch<C: ConnectionTrait>(
  conn: &C,
  account: account::Model,
  patch: &AccountPatch,
) -> Result<account::Model> {
  let mut active: account::ActiveModel = account.into();

  match (&patch.pin, &patch.password) {
    (Some(pin), Some(password)) => {
      active.pin_hash = Set(Some(credential::digest(pin)));
      active.password_hash = Set(credential::digest(password));
      active.pin_password_hash =
        Set(Some(credential::combined_digest(pin, password)));
    }
    (Some(pin), None) => {
      active.pin_hash = Set(Some(credential::digest(pin)));
      active.pin_password_hash = Set(None);
    }
    (None, Some(password)) => {
      active.password_hash = Set(credential::digest(password));
      active.pin_password_hash = Set(None);
    }
    (None, None) => {}
  }

  if let Some(name) = &patch.name {
    active.name = Set(Some(name.clone()));
  }
  if let Some(phone) = &patch.phone {
    active.phone = Set(Some(phone.clone()));
  }
  if let Some(email) = &patch.email {
    active.email = Set(Some(email.clone()));
  }
  if let Some(address) = &patch.address {
    active.address = Set(Some(address.clone()));
  }

  active.updated_at = Set(Utc::now().naive_utc());
  Ok(active.update(conn).await?)
}

pub async fn append_to_list<C: ConnectionTrait>(
  conn: &C,
  id: i64,
  field: ListField,
  value: i64,
) -> Result<()> {
  let account = find_any(conn, id).await?;
  let mut list = list_of(&account, field);
  list.push(value);
  write_list(conn, account, field, list).await
}

pub async fn pull_from_list<C: ConnectionTrait>(
  conn: &C,
  id: i64,
  field: ListField,
  value: i64,
) -> Result<()> {
  let account = find_any(conn, id).await?;
  let mut list = list_of(&account, field);
  list.pull(value);
  write_list(conn, account, field, list).await
}

fn list_of(account: &account::Model, field: ListField) -> IdList {
  match field {
    ListField::Subordinates => account.subordinates.clone(),
    ListField::Transactions => account.transaction_ids.clone(),
    ListField::ReferralTransactions => {
      account.referral_transaction_ids.clone()
    }
    ListField::ActivityLogs => account.activity_log_ids.clone(),
    ListField::GameConfigs => account.game_config_ids.clone(),
  }
}

async fn write_list<C: ConnectionTrait>(
  conn: &C,
  account: account::Model,
  field: ListField,
  list: IdList,
) -> Result<()> {
  let mut active: account::ActiveModel = account.into();

  match field {
    ListField::Subordinates => active.subordinates = Set(list),
    ListField::Transactions => active.transaction_ids = Set(list),
    ListField::ReferralTransactions => {
      active.referral_transaction_ids = Set(list)
    }
    ListField::ActivityLogs => active.activity_log_ids = Set(list),
    ListField::GameConfigs => active.game_config_ids = Set(list),
  }

  active.updated_at = Set(Utc::now().naive_utc());
  active.update(conn).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use futures::future::join_all;

  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn generated_usernames_are_role_prefixed_and_sequential() {
    let db = test_db::setup().await;

    let first =
      create_with_generated_username(&db, Role::Master, &new_fields(), None)
        .await
        .unwrap();
    let second =
      create_with_generated_username(&db, Role::Master, &new_fields(), None)
        .await
        .unwrap();
    let player =
      create_with_generated_username(&db, Role::Player, &new_fields(), None)
        .await
        .unwrap();

    assert_eq!(first.username, "MS000001");
    assert_eq!(second.username, "MS000002");
    assert_eq!(player.username, "PL000001");
  }

  #[tokio::test]
  async fn concurrent_creates_never_share_a_username() {
    let db = test_db::setup().await;

    // Seed the counter row so the parallel runs hit the UPDATE path.
    create_with_generated_username(&db, Role::Player, &new_fields(), None)
      .await
      .unwrap();

    let creates = (0..8).map(|_| {
      let db = db.clone();
      async move {
        let txn = db.begin().await.unwrap();
        let account = create_with_generated_username(
          &txn,
          Role::Player,
          &new_fields(),
          None,
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();
        account.username
      }
    });

    let mut usernames: Vec<String> = join_all(creates).await;
    usernames.sort();
    usernames.dedup();
    assert_eq!(usernames.len(), 8);
  }

  #[tokio::test]
  async fn default_reads_exclude_soft_deleted() {
    let db = test_db::setup().await;
    let account = test_db::account(&db, Role::Master, 0).await;

    let mut active: account::ActiveModel = account.clone().into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(Utc::now().naive_utc()));
    active.update(&db).await.unwrap();

    let store = Store::new(&db);
    assert!(matches!(
      store.find_by_id(account.id).await,
      Err(Error::NotFound)
    ));
    assert!(store.find_by_id_any(account.id).await.is_ok());
    assert_eq!(store.count_by_role(Role::Master).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn patch_merges_only_provided_fields() {
    let db = test_db::setup().await;
    let account = test_db::account(&db, Role::Master, 0).await;
    let store = Store::new(&db);

    let before_password = account.password_hash.clone();
    let patch = AccountPatch {
      name: Some("Updated Name".into()),
      ..Default::default()
    };
    let updated = store.update_fields(account.id, &patch).await.unwrap();

    assert_eq!(updated.name.as_deref(), Some("Updated Name"));
    assert_eq!(updated.phone, account.phone);
    assert_eq!(updated.password_hash, before_password);
  }

  #[tokio::test]
  async fn list_appends_and_pulls_round_trip() {
    let db = test_db::setup().await;
    let account = test_db::account(&db, Role::Areamanager, 0).await;

    append_to_list(&db, account.id, ListField::Subordinates, 42)
      .await
      .unwrap();
    append_to_list(&db, account.id, ListField::Subordinates, 42)
      .await
      .unwrap();

    let loaded = find_any(&db, account.id).await.unwrap();
    assert_eq!(loaded.subordinates.len(), 1);

    pull_from_list(&db, account.id, ListField::Subordinates, 42)
      .await
      .unwrap();
    let loaded = find_any(&db, account.id).await.unwrap();
    assert!(loaded.subordinates.is_empty());
  }

  fn new_fields() -> NewAccount {
    NewAccount {
      password: "hunter2".into(),
      pin: Some("4321".into()),
      name: Some("Some Agent".into()),
      phone: Some("555-0100".into()),
      email: None,
      address: Some("1 Test Way".into()),
    }
  }
}
