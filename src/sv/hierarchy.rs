use crate::{
  entity::{ReferralStatus, Role, account, referral_transaction},
  prelude::*,
  sv::{
    audit::{self, AuditEvent},
    store::{self, AccountPatch, ListField, NewAccount, Store},
  },
};

/// Hierarchy Manager: role placement, referral links and tree walks.
/// Ledger balances are never touched here.
pub struct Hierarchy<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Hierarchy<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates an account in the caller's permitted scope. With a
  /// referrer, the account row, the ReferralTransaction and both link
  /// updates commit as one transaction, so `referrer.subordinates` and
  /// the new account's `parent_id` can never diverge.
  pub async fn create_account(
    &self,
    caller_id: i64,
    role: Role,
    fields: NewAccount,
    ref_id: Option<i64>,
  ) -> Result<account::Model> {
    let caller = store::find_active(self.db, caller_id).await?;
    if !caller.user_status {
      return Err(Error::Validation("caller account is inactive".into()));
    }
    if !caller.role.can_create(role) {
      return Err(Error::Unauthorized);
    }

    validate_new_fields(role, &fields)?;

    let txn = self.db.begin().await?;

    // Checked inside the transaction: a pre-check on the pool could race
    // another create committing the same contact key in between.
    if role.requires_contact_fields()
      && let Some(phone) = fields.phone.as_deref()
      && store::contact_taken(&txn, phone, fields.email.as_deref(), None)
        .await?
    {
      return Err(Error::DuplicateAccount);
    }

    let referrer = match ref_id {
      Some(rid) => {
        Some(store::find_active(&txn, rid).await.map_err(as_referrer_err)?)
      }
      None => None,
    };

    let mut created =
      store::create_with_generated_username(&txn, role, &fields, ref_id)
        .await?;

    if let Some(referrer) = &referrer {
      link_referral(&txn, referrer, created.id).await?;
      created = store::find_any(&txn, created.id).await?;
    }

    txn.commit().await?;

    let mut event = AuditEvent::new(
      caller.id,
      created.id,
      format!("account {} created", created.username),
      "account",
    );
    if referrer.is_some() {
      event = event.refer_transaction_type("referral");
    }
    audit::emit(self.db, event).await;

    info!(
      account = created.id,
      username = %created.username,
      "account created"
    );
    Ok(created)
  }

  /// Partial update. An unchanged `ref_id` is a no-op; a changed one is
  /// treated as a fresh referral and re-links atomically.
  pub async fn update_account(
    &self,
    caller_id: i64,
    id: i64,
    patch: AccountPatch,
    ref_id: Option<i64>,
  ) -> Result<account::Model> {
    let caller = store::find_active(self.db, caller_id).await?;
    let target = store::find_active(self.db, id).await?;

    if caller.id != target.id && !caller.role.oversees(target.role) {
      return Err(Error::Unauthorized);
    }

    if let Some(pin) = &patch.pin {
      validate_pin(pin)?;
    }

    let txn = self.db.begin().await?;

    if patch.phone.is_some() || patch.email.is_some() {
      let phone = patch.phone.clone().or_else(|| target.phone.clone());
      let email = patch.email.clone().or_else(|| target.email.clone());
      if let Some(phone) = phone.as_deref()
        && store::contact_taken(&txn, phone, email.as_deref(), Some(id))
          .await?
      {
        return Err(Error::DuplicateAccount);
      }
    }

    let mut updated = store::apply_patch(&txn, target.clone(), &patch).await?;

    if let Some(rid) = ref_id
      && target.ref_id != Some(rid)
    {
      if rid == id {
        return Err(Error::Validation("account cannot refer itself".into()));
      }

      let referrer =
        store::find_active(&txn, rid).await.map_err(as_referrer_err)?;

      if let Some(old) = target.ref_id {
        match store::pull_from_list(&txn, old, ListField::Subordinates, id)
          .await
        {
          Ok(()) | Err(Error::NotFound) => {}
          Err(other) => return Err(other),
        }
      }

      link_referral(&txn, &referrer, id).await?;
      updated = store::find_any(&txn, id).await?;
    }

    txn.commit().await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        id,
        format!("account {} updated", updated.username),
        "account",
      ),
    )
    .await;

    Ok(updated)
  }

  /// Operator on/off switch, independent of soft deletion. The caller
  /// must itself be an active, non-deleted account of an overseeing
  /// role.
  pub async fn toggle_status(
    &self,
    caller_id: i64,
    id: i64,
    active: bool,
  ) -> Result<account::Model> {
    let caller = store::find_active(self.db, caller_id).await?;
    if !caller.user_status {
      return Err(Error::NotFound);
    }

    let target = store::find_active(self.db, id).await?;
    if !caller.role.oversees(target.role) {
      return Err(Error::Unauthorized);
    }

    let username = target.username.clone();
    let mut model: account::ActiveModel = target.into();
    model.user_status = Set(active);
    model.updated_at = Set(Utc::now().naive_utc());
    let updated = model.update(self.db).await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        id,
        format!(
          "account {username} {}",
          if active { "activated" } else { "deactivated" }
        ),
        "status",
      ),
    )
    .await;

    Ok(updated)
  }

  /// Role-filtered subtree, walked one tier at a time down the ordered
  /// role chain. "Players under an admin" is four hops; "players under
  /// a master" is one.
  pub async fn descendants(
    &self,
    root_id: i64,
    target_role: Role,
  ) -> Result<Vec<account::Model>> {
    let root = store::find_active(self.db, root_id).await?;

    match (root.role.tier(), target_role.tier()) {
      // Side roles hang directly off their creator.
      (_, None) => self.children_of(vec![root_id], target_role).await,
      (None, Some(_)) => Err(Error::Validation(
        "side-role accounts have no tiered descendants".into(),
      )),
      (Some(root_tier), Some(target_tier)) => {
        if target_tier <= root_tier {
          return Err(Error::Validation(format!(
            "{target_role:?} is not below {:?}",
            root.role
          )));
        }

        let mut frontier = vec![root_id];
        for tier in root_tier + 1..=target_tier {
          if frontier.is_empty() {
            return Ok(vec![]);
          }
          let level =
            self.children_of(frontier, Role::TIERS[tier]).await?;
          if tier == target_tier {
            return Ok(level);
          }
          frontier = level.iter().map(|account| account.id).collect();
        }

        Ok(vec![])
      }
    }
  }

  pub async fn count_by_role(&self, role: Role) -> Result<u64> {
    Store::new(self.db).count_by_role(role).await
  }

  /// Associates an opaque PercentageConfig reference with an admin-tier
  /// account. Game semantics live elsewhere; only the id is stored.
  pub async fn assign_game_config(
    &self,
    caller_id: i64,
    id: i64,
    config_id: i64,
  ) -> Result<()> {
    let caller = store::find_active(self.db, caller_id).await?;
    if !caller.role.is_root_tier() {
      return Err(Error::Unauthorized);
    }

    let target = store::find_active(self.db, id).await?;
    if target.role != Role::Admin {
      return Err(Error::Validation(
        "game configs attach to admin accounts only".into(),
      ));
    }

    store::append_to_list(self.db, id, ListField::GameConfigs, config_id)
      .await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        id,
        format!("game config {config_id} assigned"),
        "game_config",
      ),
    )
    .await;

    Ok(())
  }

  async fn children_of(
    &self,
    parents: Vec<i64>,
    role: Role,
  ) -> Result<Vec<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::RefId.is_in(parents))
        .filter(account::Column::Role.eq(role))
        .filter(account::Column::IsDeleted.eq(false))
        .order_by_asc(account::Column::Id)
        .all(self.db)
        .await?,
    )
  }
}

/// Creates the ReferralTransaction and both hierarchy links inside the
/// caller's transaction.
pub async fn link_referral<C: ConnectionTrait>(
  conn: &C,
  referrer: &account::Model,
  account_id: i64,
) -> Result<referral_transaction::Model> {
  let referral = referral_transaction::ActiveModel {
    id: NotSet,
    referred_by: Set(referrer.id),
    referred_user: Set(account_id),
    commission_amount: Set(0),
    status: Set(ReferralStatus::Pending),
    is_deleted: Set(false),
    deleted_at: Set(None),
    created_at: Set(Utc::now().naive_utc()),
  }
  .insert(conn)
  .await?;

  store::append_to_list(
    conn,
    referrer.id,
    ListField::Subordinates,
    account_id,
  )
  .await?;
  store::append_to_list(
    conn,
    referrer.id,
    ListField::ReferralTransactions,
    referral.id,
  )
  .await?;

  let account = store::find_any(conn, account_id).await?;
  let mut model: account::ActiveModel = account.into();
  model.ref_id = Set(Some(referrer.id));
  model.parent_id = Set(Some(referrer.id));
  model.updated_at = Set(Utc::now().naive_utc());
  model.update(conn).await?;

  Ok(referral)
}

fn as_referrer_err(err: Error) -> Error {
  match err {
    Error::NotFound => Error::ReferrerNotFound,
    other => other,
  }
}

fn validate_pin(pin: &str) -> Result<()> {
  if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
    return Err(Error::Validation("pin must be numeric".into()));
  }
  Ok(())
}

fn validate_new_fields(role: Role, fields: &NewAccount) -> Result<()> {
  if fields.password.trim().is_empty() {
    return Err(Error::Validation("password is required".into()));
  }

  if let Some(pin) = &fields.pin {
    validate_pin(pin)?;
  }

  if role.requires_contact_fields() {
    for (label, value) in [
      ("name", &fields.name),
      ("phone", &fields.phone),
      ("address", &fields.address),
    ] {
      if value.as_deref().is_none_or(|value| value.trim().is_empty()) {
        return Err(Error::Validation(format!(
          "{label} is required for {role:?} accounts"
        )));
      }
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use futures::future::join_all;

  use super::*;
  use crate::sv::test_utils::test_db;

  fn fields() -> NewAccount {
    NewAccount {
      password: "hunter2".into(),
      pin: Some("4321".into()),
      name: Some("Some Agent".into()),
      phone: Some("555-0100".into()),
      email: Some("agent@example.com".into()),
      address: Some("1 Test Way".into()),
    }
  }

  #[tokio::test]
  async fn referral_create_links_both_directions() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;
    let area = test_db::account(&db, Role::Areamanager, 0).await;

    let master = Hierarchy::new(&db)
      .create_account(root.id, Role::Master, fields(), Some(area.id))
      .await
      .unwrap();

    assert_eq!(master.parent_id, Some(area.id));
    assert_eq!(master.ref_id, Some(area.id));

    let area = store::find_any(&db, area.id).await.unwrap();
    assert!(area.subordinates.contains(master.id));
    assert_eq!(area.referral_transaction_ids.len(), 1);

    let referrals =
      referral_transaction::Entity::find().all(&db).await.unwrap();
    assert_eq!(referrals.len(), 1);
    assert_eq!(referrals[0].referred_by, area.id);
    assert_eq!(referrals[0].referred_user, master.id);
  }

  #[tokio::test]
  async fn missing_referrer_fails_without_creating_anything() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;

    let result = Hierarchy::new(&db)
      .create_account(root.id, Role::Master, fields(), Some(999))
      .await;
    assert!(matches!(result, Err(Error::ReferrerNotFound)));

    // Only the seeded root exists.
    let count = account::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn creation_scope_is_enforced() {
    let db = test_db::setup().await;
    let player = test_db::account(&db, Role::Player, 0).await;

    let result = Hierarchy::new(&db)
      .create_account(player.id, Role::Master, fields(), None)
      .await;
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn duplicate_contact_is_rejected() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;

    let hierarchy = Hierarchy::new(&db);
    hierarchy
      .create_account(root.id, Role::Master, fields(), None)
      .await
      .unwrap();

    let result =
      hierarchy.create_account(root.id, Role::Master, fields(), None).await;
    assert!(matches!(result, Err(Error::DuplicateAccount)));
  }

  #[tokio::test]
  async fn concurrent_duplicate_contacts_admit_one() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;

    let hierarchy = Hierarchy::new(&db);
    let attempts = (0..2)
      .map(|_| hierarchy.create_account(root.id, Role::Master, fields(), None));

    let results = join_all(attempts).await;
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(
      results
        .iter()
        .any(|r| matches!(r, Err(Error::DuplicateAccount)))
    );

    // Root plus exactly one master.
    let count = account::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 2);
  }

  #[tokio::test]
  async fn game_configs_attach_to_admins_only() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;
    let admin = test_db::account(&db, Role::Admin, 0).await;
    let master = test_db::account(&db, Role::Master, 0).await;

    let hierarchy = Hierarchy::new(&db);
    hierarchy.assign_game_config(root.id, admin.id, 7).await.unwrap();
    hierarchy.assign_game_config(root.id, admin.id, 9).await.unwrap();

    let admin = store::find_any(&db, admin.id).await.unwrap();
    assert!(admin.game_config_ids.contains(7));
    assert!(admin.game_config_ids.contains(9));
    assert_eq!(admin.game_config_ids.len(), 2);

    assert!(matches!(
      hierarchy.assign_game_config(root.id, master.id, 7).await,
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      hierarchy.assign_game_config(master.id, admin.id, 7).await,
      Err(Error::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn unchanged_ref_id_update_is_idempotent() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;
    let area = test_db::account(&db, Role::Areamanager, 0).await;

    let hierarchy = Hierarchy::new(&db);
    let master = hierarchy
      .create_account(root.id, Role::Master, fields(), Some(area.id))
      .await
      .unwrap();

    // Same ref_id twice: no second ReferralTransaction.
    for _ in 0..2 {
      hierarchy
        .update_account(
          root.id,
          master.id,
          AccountPatch::default(),
          Some(area.id),
        )
        .await
        .unwrap();
    }

    let referrals =
      referral_transaction::Entity::find().count(&db).await.unwrap();
    assert_eq!(referrals, 1);

    let area = store::find_any(&db, area.id).await.unwrap();
    assert_eq!(area.subordinates.len(), 1);
  }

  #[tokio::test]
  async fn changed_ref_id_relinks_and_pulls_old_referrer() {
    let db = test_db::setup().await;
    let root = test_db::account(&db, Role::Superadmin, 0).await;
    let first = test_db::account(&db, Role::Areamanager, 0).await;
    let second = test_db::account(&db, Role::Areamanager, 0).await;

    let hierarchy = Hierarchy::new(&db);
    let master = hierarchy
      .create_account(root.id, Role::Master, fields(), Some(first.id))
      .await
      .unwrap();

    let updated = hierarchy
      .update_account(
        root.id,
        master.id,
        AccountPatch::default(),
        Some(second.id),
      )
      .await
      .unwrap();

    assert_eq!(updated.parent_id, Some(second.id));

    let first = store::find_any(&db, first.id).await.unwrap();
    let second = store::find_any(&db, second.id).await.unwrap();
    assert!(!first.subordinates.contains(master.id));
    assert!(second.subordinates.contains(master.id));

    let referrals =
      referral_transaction::Entity::find().count(&db).await.unwrap();
    assert_eq!(referrals, 2);
  }

  #[tokio::test]
  async fn descendants_walk_the_tier_chain() {
    let db = test_db::setup().await;
    let admin = test_db::account(&db, Role::Admin, 0).await;

    let hierarchy = Hierarchy::new(&db);
    let sam = hierarchy
      .create_account(admin.id, Role::Superareamanager, fields(), Some(admin.id))
      .await
      .unwrap();

    let mut am_fields = fields();
    am_fields.phone = Some("555-0101".into());
    let am = hierarchy
      .create_account(admin.id, Role::Areamanager, am_fields, Some(sam.id))
      .await
      .unwrap();

    let mut ms_fields = fields();
    ms_fields.phone = Some("555-0102".into());
    let master = hierarchy
      .create_account(admin.id, Role::Master, ms_fields, Some(am.id))
      .await
      .unwrap();

    let mut pl_fields = fields();
    pl_fields.phone = Some("555-0103".into());
    let player = hierarchy
      .create_account(admin.id, Role::Player, pl_fields, Some(master.id))
      .await
      .unwrap();

    // Four hops from admin down to player.
    let players =
      hierarchy.descendants(admin.id, Role::Player).await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].id, player.id);

    // One hop from master.
    let players =
      hierarchy.descendants(master.id, Role::Player).await.unwrap();
    assert_eq!(players.len(), 1);

    // Upward queries are invalid.
    assert!(matches!(
      hierarchy.descendants(master.id, Role::Admin).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn toggle_status_requires_overseeing_caller() {
    let db = test_db::setup().await;
    let admin = test_db::account(&db, Role::Admin, 0).await;
    let master = test_db::account(&db, Role::Master, 0).await;

    let hierarchy = Hierarchy::new(&db);
    let updated =
      hierarchy.toggle_status(admin.id, master.id, false).await.unwrap();
    assert!(!updated.user_status);

    // A player cannot toggle a master.
    let player = test_db::account(&db, Role::Player, 0).await;
    assert!(matches!(
      hierarchy.toggle_status(player.id, master.id, true).await,
      Err(Error::Unauthorized)
    ));
  }
}
