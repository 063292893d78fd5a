pub use sea_orm_migration::prelude::*;

mod m20260815_000001_create_accounts;
mod m20260815_000002_create_transactions;
mod m20260815_000003_create_referral_transactions;
mod m20260815_000004_create_activity_logs;
mod m20260815_000005_create_role_counters;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260815_000001_create_accounts::Migration),
      Box::new(m20260815_000002_create_transactions::Migration),
      Box::new(m20260815_000003_create_referral_transactions::Migration),
      Box::new(m20260815_000004_create_activity_logs::Migration),
      Box::new(m20260815_000005_create_role_counters::Migration),
    ]
  }
}
