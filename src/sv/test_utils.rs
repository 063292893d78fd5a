//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbBackend, Schema, Set,
  };

  use crate::{
    entity::*,
    sv::store::{self, NewAccount},
  };

  /// Creates an in-memory SQLite database with all required tables.
  /// The pool is pinned to one connection: every pooled connection to
  /// `sqlite::memory:` would otherwise be a separate empty database.
  pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(account::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(transaction::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(referral_transaction::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(activity_log::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(role_counter::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  /// Seeds an active account directly, bypassing scope checks. The
  /// step-up secrets are password "secret" and pin "1234".
  pub async fn account(
    db: &DatabaseConnection,
    role: Role,
    balance: i64,
  ) -> account::Model {
    let fields = NewAccount {
      password: "secret".into(),
      pin: Some("1234".into()),
      name: Some("Seed Account".into()),
      phone: None,
      email: None,
      address: None,
    };

    let created = store::create_with_generated_username(db, role, &fields, None)
      .await
      .unwrap();

    if balance == 0 {
      return created;
    }

    let mut model: account::ActiveModel = created.into();
    model.wallet_balance = Set(balance);
    model.update(db).await.unwrap()
  }
}
