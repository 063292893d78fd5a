use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{Role, TransactionType, TxStatus, account, transaction},
  prelude::*,
  sv::{
    audit::{self, AuditEvent},
    credential::StepUpCredential,
    store::{self, ListField},
  },
};

/// Which role tiers settle immediately. Balances always move in the
/// same transaction as the record; `status` is purely a settlement and
/// display flag.
#[derive(Clone, Debug)]
pub struct SettlementPolicy {
  immediate: HashSet<Role>,
}

impl Default for SettlementPolicy {
  fn default() -> Self {
    Self { immediate: HashSet::from([Role::Superadmin, Role::Admin]) }
  }
}

impl SettlementPolicy {
  pub fn status_for(&self, role: Role) -> TxStatus {
    if self.immediate.contains(&role) {
      TxStatus::Completed
    } else {
      TxStatus::Pending
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustKind {
  Debit,
  Credit,
}

impl From<AdjustKind> for TransactionType {
  fn from(kind: AdjustKind) -> Self {
    match kind {
      AdjustKind::Debit => TransactionType::Debit,
      AdjustKind::Credit => TransactionType::Credit,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct LedgerOutcome {
  pub sender: account::Model,
  pub receiver: account::Model,
  pub transaction: transaction::Model,
}

/// Ledger Engine: validates and applies credit movement between two
/// accounts. Never writes a balance without producing a Transaction
/// record in the same database transaction.
pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
  policy: SettlementPolicy,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, policy: SettlementPolicy::default() }
  }

  pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Moves `amount` from sender to receiver. Precondition order is
  /// fixed: amount, account resolution, sender status, step-up
  /// credential, balance.
  pub async fn transfer(
    &self,
    caller_id: i64,
    sender_id: i64,
    receiver_id: i64,
    amount: i64,
    credential: &StepUpCredential,
  ) -> Result<LedgerOutcome> {
    if amount <= 0 {
      return Err(Error::Validation("amount must be positive".into()));
    }

    let caller = store::find_active(self.db, caller_id).await?;
    let sender = store::find_active(self.db, sender_id).await?;
    store::find_active(self.db, receiver_id).await?;

    if sender_id == receiver_id {
      return Err(Error::Validation(
        "sender and receiver must differ".into(),
      ));
    }
    if !sender.user_status {
      return Err(Error::Validation("sender account is inactive".into()));
    }

    credential.verify(&caller)?;

    if sender.wallet_balance < amount {
      return Err(Error::InsufficientBalance);
    }

    let status = self.policy.status_for(caller.role);
    let record = self
      .apply(
        sender_id,
        receiver_id,
        sender_id,
        receiver_id,
        amount,
        TransactionType::Transfer,
        status,
        None,
      )
      .await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        receiver_id,
        format!("transfer of {amount} from {sender_id} to {receiver_id}"),
        "ledger",
      )
      .transaction_type("transfer"),
    )
    .await;

    self.outcome(sender_id, receiver_id, record).await
  }

  /// Operator-initiated adjustment. `Debit` moves sender to receiver
  /// and requires sender balance; `Credit` claws the amount back from
  /// the receiver and requires receiver balance.
  pub async fn adjust(
    &self,
    caller_id: i64,
    sender_id: i64,
    receiver_id: i64,
    amount: i64,
    kind: AdjustKind,
    credential: &StepUpCredential,
    message: Option<String>,
  ) -> Result<LedgerOutcome> {
    if amount <= 0 {
      return Err(Error::Validation("amount must be positive".into()));
    }

    let caller = store::find_active(self.db, caller_id).await?;
    let sender = store::find_active(self.db, sender_id).await?;
    let receiver = store::find_active(self.db, receiver_id).await?;

    if sender_id == receiver_id {
      return Err(Error::Validation(
        "sender and receiver must differ".into(),
      ));
    }

    let (debited, credited) = match kind {
      AdjustKind::Debit => (&sender, &receiver),
      AdjustKind::Credit => (&receiver, &sender),
    };

    if !debited.user_status {
      return Err(Error::Validation("debited account is inactive".into()));
    }

    credential.verify(&caller)?;

    if debited.wallet_balance < amount {
      return Err(Error::InsufficientBalance);
    }

    let status = self.policy.status_for(caller.role);
    let record = self
      .apply(
        debited.id,
        credited.id,
        sender_id,
        receiver_id,
        amount,
        kind.into(),
        status,
        message,
      )
      .await?;

    audit::emit(
      self.db,
      AuditEvent::new(
        caller.id,
        receiver_id,
        format!("{kind:?} adjustment of {amount}").to_lowercase(),
        "ledger",
      )
      .transaction_type(match kind {
        AdjustKind::Debit => "debit",
        AdjustKind::Credit => "credit",
      }),
    )
    .await;

    self.outcome(sender_id, receiver_id, record).await
  }

  /// The atomic unit: guarded debit, credit, Transaction insert and
  /// both history appends commit or roll back together.
  #[allow(clippy::too_many_arguments)]
  async fn apply(
    &self,
    debit_id: i64,
    credit_id: i64,
    user_id: i64,
    to_user_id: i64,
    amount: i64,
    tx_type: TransactionType,
    status: TxStatus,
    message: Option<String>,
  ) -> Result<transaction::Model> {
    let txn = self.db.begin().await?;

    guarded_debit(&txn, debit_id, amount).await?;
    credit(&txn, credit_id, amount).await?;

    let record = transaction::ActiveModel {
      id: NotSet,
      reference: Set(Uuid::new_v4().to_string()),
      user_id: Set(user_id),
      to_user_id: Set(to_user_id),
      amount: Set(amount),
      tx_type: Set(tx_type),
      status: Set(status),
      message: Set(message),
      is_deleted: Set(false),
      deleted_at: Set(None),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    store::append_to_list(&txn, user_id, ListField::Transactions, record.id)
      .await?;
    store::append_to_list(
      &txn,
      to_user_id,
      ListField::Transactions,
      record.id,
    )
    .await?;

    txn.commit().await?;
    Ok(record)
  }

  async fn outcome(
    &self,
    sender_id: i64,
    receiver_id: i64,
    transaction: transaction::Model,
  ) -> Result<LedgerOutcome> {
    Ok(LedgerOutcome {
      sender: store::find_active(self.db, sender_id).await?,
      receiver: store::find_active(self.db, receiver_id).await?,
      transaction,
    })
  }
}

/// Decrement guarded by the balance floor in the WHERE clause, so two
/// concurrent debits can never both pass a stale balance check.
async fn guarded_debit<C: ConnectionTrait>(
  conn: &C,
  id: i64,
  amount: i64,
) -> Result<()> {
  let result = account::Entity::update_many()
    .col_expr(
      account::Column::WalletBalance,
      Expr::col(account::Column::WalletBalance).sub(amount),
    )
    .col_expr(
      account::Column::UpdatedAt,
      Expr::value(Utc::now().naive_utc()),
    )
    .filter(account::Column::Id.eq(id))
    .filter(account::Column::IsDeleted.eq(false))
    .filter(account::Column::WalletBalance.gte(amount))
    .exec(conn)
    .await?;

  if result.rows_affected == 0 {
    // Pre-check passed on a stale snapshot; tell overdraw apart from a
    // concurrent delete.
    let current = store::find_active(conn, id).await?;
    return Err(if current.wallet_balance < amount {
      Error::InsufficientBalance
    } else {
      Error::Conflict
    });
  }

  Ok(())
}

async fn credit<C: ConnectionTrait>(
  conn: &C,
  id: i64,
  amount: i64,
) -> Result<()> {
  let result = account::Entity::update_many()
    .col_expr(
      account::Column::WalletBalance,
      Expr::col(account::Column::WalletBalance).add(amount),
    )
    .col_expr(
      account::Column::UpdatedAt,
      Expr::value(Utc::now().naive_utc()),
    )
    .filter(account::Column::Id.eq(id))
    .filter(account::Column::IsDeleted.eq(false))
    .exec(conn)
    .await?;

  if result.rows_affected == 0 {
    return Err(Error::NotFound);
  }

  Ok(())
}
