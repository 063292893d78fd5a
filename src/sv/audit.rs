use async_trait::async_trait;

use crate::{
  entity::activity_log,
  prelude::*,
  sv::store::{self, ListField},
};

/// Structured tuple handed to the audit subsystem after a core
/// operation commits.
#[derive(Clone, Debug)]
pub struct AuditEvent {
  pub acting_account_id: i64,
  pub subject_account_id: i64,
  pub message: String,
  pub log_type: String,
  pub transaction_type: Option<String>,
  pub refer_transaction_type: Option<String>,
}

impl AuditEvent {
  pub fn new(
    acting_account_id: i64,
    subject_account_id: i64,
    message: impl Into<String>,
    log_type: impl Into<String>,
  ) -> Self {
    Self {
      acting_account_id,
      subject_account_id,
      message: message.into(),
      log_type: log_type.into(),
      transaction_type: None,
      refer_transaction_type: None,
    }
  }

  pub fn transaction_type(mut self, tx_type: impl Into<String>) -> Self {
    self.transaction_type = Some(tx_type.into());
    self
  }

  pub fn refer_transaction_type(mut self, tx_type: impl Into<String>) -> Self {
    self.refer_transaction_type = Some(tx_type.into());
    self
  }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
  async fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Default sink: an `activity_logs` row plus a back-reference on the
/// acting account.
pub struct DbSink<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> DbSink<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }
}

#[async_trait]
impl AuditSink for DbSink<'_> {
  async fn record(&self, event: AuditEvent) -> Result<()> {
    let log = activity_log::ActiveModel {
      id: NotSet,
      acting_account_id: Set(event.acting_account_id),
      subject_account_id: Set(event.subject_account_id),
      message: Set(event.message),
      log_type: Set(event.log_type),
      transaction_type: Set(event.transaction_type),
      refer_transaction_type: Set(event.refer_transaction_type),
      is_deleted: Set(false),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(self.db)
    .await?;

    store::append_to_list(
      self.db,
      event.acting_account_id,
      ListField::ActivityLogs,
      log.id,
    )
    .await
  }
}

/// Fire-and-forget emission: a sink failure is logged and never alters
/// the outcome of the triggering operation.
pub async fn emit(db: &DatabaseConnection, event: AuditEvent) {
  if let Err(err) = DbSink::new(db).record(event).await {
    warn!("audit sink failure: {err}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{Role, account},
    sv::test_utils::test_db,
  };

  #[tokio::test]
  async fn emitted_events_land_in_activity_logs() {
    let db = test_db::setup().await;
    let actor = test_db::account(&db, Role::Admin, 0).await;
    let subject = test_db::account(&db, Role::Master, 0).await;

    emit(
      &db,
      AuditEvent::new(actor.id, subject.id, "status toggled", "account")
        .transaction_type("transfer"),
    )
    .await;

    let logs = activity_log::Entity::find().all(&db).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].acting_account_id, actor.id);
    assert_eq!(logs[0].transaction_type.as_deref(), Some("transfer"));

    let actor = account::Entity::find_by_id(actor.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert!(actor.activity_log_ids.contains(logs[0].id));
  }

  #[tokio::test]
  async fn sink_failure_does_not_panic_or_propagate() {
    let db = test_db::setup().await;

    // Acting account does not exist; the append fails inside the sink.
    emit(&db, AuditEvent::new(999, 999, "orphan", "account")).await;
  }
}
