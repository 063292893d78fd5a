use sea_orm::sea_query::Expr;

use crate::{
  entity::{account, activity_log, referral_transaction, transaction},
  prelude::*,
  sv::{
    audit::{self, AuditEvent},
    store::{self, ListField},
  },
};

/// Soft-Delete/Lifecycle Manager. Deletion never removes rows; it marks
/// them and cascades the mark to everything the account owns, in one
/// transaction.
pub struct Lifecycle<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Lifecycle<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Soft-deletes an account with no active subordinates. The account
  /// flag, its transactions, referral transactions, activity logs and
  /// the parent's subordinate-list pull commit together, so a crash can
  /// never leave the parent referencing a deleted child.
  pub async fn delete_account(&self, caller_id: i64, id: i64) -> Result<()> {
    let caller = store::find_active(self.db, caller_id).await?;
    let target = store::find_active(self.db, id).await?;

    if !caller.role.oversees(target.role) {
      return Err(Error::Unauthorized);
    }

    let dependents = account::Entity::find()
      .filter(account::Column::RefId.eq(id))
      .filter(account::Column::IsDeleted.eq(false))
      .count(self.db)
      .await?;
    if dependents > 0 {
      return Err(Error::HasDependents);
    }

    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    let mut model: account::ActiveModel = target.clone().into();
    model.is_deleted = Set(true);
    model.deleted_at = Set(Some(now));
    model.updated_at = Set(now);
    model.update(&txn).await?;

    transaction::Entity::update_many()
      .col_expr(transaction::Column::IsDeleted, Expr::value(true))
      .col_expr(transaction::Column::DeletedAt, Expr::value(now))
      .filter(
        transaction::Column::UserId
          .eq(id)
          .or(transaction::Column::ToUserId.eq(id)),
      )
      .filter(transaction::Column::IsDeleted.eq(false))
      .exec(&txn)
      .await?;

    referral_transaction::Entity::update_many()
      .col_expr(referral_transaction::Column::IsDeleted, Expr::value(true))
      .col_expr(referral_transaction::Column::DeletedAt, Expr::value(now))
      .filter(
        referral_transaction::Column::ReferredBy
          .eq(id)
          .or(referral_transaction::Column::ReferredUser.eq(id)),
      )
      .filter(referral_transaction::Column::IsDeleted.eq(false))
      .exec(&txn)
      .await?;

    activity_log::Entity::update_many()
      .col_expr(activity_log::Column::IsDeleted, Expr::value(true))
      .filter(activity_log::Column::ActingAccountId.eq(id))
      .filter(activity_log::Column::IsDeleted.eq(false))
      .exec(&txn)
      .await?;

    if let Some(ref_id) = target.ref_id {
      // The referrer may itself be gone already; a missing row is fine.
      match store::pull_from_list(&txn, ref_id, ListField::Subordinates, id)
        .await
      {
        Ok(()) | Err(Error::NotFound) => {}
        Err(other) => return Err(other),
      }
    }

    txn.commit().await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        id,
        format!("account {} deleted", target.username),
        "account",
      ),
    )
    .await;

    info!(account = id, "account soft-deleted");
    Ok(())
  }
}
