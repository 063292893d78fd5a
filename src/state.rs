use migration::Migrator;

use crate::{prelude::*, sv::SettlementPolicy};

pub struct AppState {
  pub db: DatabaseConnection,
  pub policy: SettlementPolicy,
  pub op_timeout: Duration,
}

impl AppState {
  pub async fn new(db_url: &str, op_timeout: Duration) -> Self {
    let db =
      Database::connect(db_url).await.expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Migration failed");

    Self { db, policy: SettlementPolicy::default(), op_timeout }
  }
}
