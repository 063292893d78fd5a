use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{entity::account, prelude::*};

/// Secret re-checked at the moment of a sensitive ledger operation,
/// beyond session authentication. The caller supplies one opaque secret;
/// it authorizes if it matches the stored pin, the stored password, or
/// the stored pin+password combination.
#[derive(Clone, Debug, Deserialize)]
pub struct StepUpCredential {
  pub secret: String,
}

#[derive(Copy, Clone)]
enum Strategy {
  Pin,
  Password,
  PinPassword,
}

impl StepUpCredential {
  pub fn new(secret: impl Into<String>) -> Self {
    Self { secret: secret.into() }
  }

  /// Strategies are tried in sequence; the first match authorizes.
  pub fn verify(&self, account: &account::Model) -> Result<()> {
    let supplied = digest(&self.secret);

    for strategy in
      [Strategy::Pin, Strategy::Password, Strategy::PinPassword]
    {
      let stored = match strategy {
        Strategy::Pin => account.pin_hash.as_deref(),
        Strategy::Password => Some(account.password_hash.as_str()),
        Strategy::PinPassword => account.pin_password_hash.as_deref(),
      };

      if stored == Some(supplied.as_str()) {
        return Ok(());
      }
    }

    Err(Error::Unauthorized)
  }
}

pub fn digest(secret: &str) -> String {
  hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Digest of the pin concatenated in front of the password.
pub fn combined_digest(pin: &str, password: &str) -> String {
  digest(&format!("{pin}{password}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entity::{IdList, Role};

  fn account_with_secrets() -> account::Model {
    let now = Utc::now().naive_utc();
    account::Model {
      id: 1,
      username: "MS000001".into(),
      role: Role::Master,
      password_hash: digest("hunter2"),
      pin_hash: Some(digest("4321")),
      pin_password_hash: Some(combined_digest("4321", "hunter2")),
      name: None,
      phone: None,
      email: None,
      address: None,
      wallet_balance: 0,
      ref_id: None,
      parent_id: None,
      subordinates: IdList::default(),
      transaction_ids: IdList::default(),
      referral_transaction_ids: IdList::default(),
      activity_log_ids: IdList::default(),
      game_config_ids: IdList::default(),
      user_status: true,
      is_deleted: false,
      deleted_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn any_single_criterion_authorizes() {
    let account = account_with_secrets();

    assert!(StepUpCredential::new("4321").verify(&account).is_ok());
    assert!(StepUpCredential::new("hunter2").verify(&account).is_ok());
    assert!(StepUpCredential::new("4321hunter2").verify(&account).is_ok());
  }

  #[test]
  fn wrong_secret_is_unauthorized() {
    let account = account_with_secrets();

    assert!(matches!(
      StepUpCredential::new("1234").verify(&account),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn missing_pin_falls_through_to_password() {
    let mut account = account_with_secrets();
    account.pin_hash = None;
    account.pin_password_hash = None;

    assert!(StepUpCredential::new("hunter2").verify(&account).is_ok());
    assert!(StepUpCredential::new("4321").verify(&account).is_err());
  }
}
