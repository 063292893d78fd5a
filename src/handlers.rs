use std::future::Future;

use axum::{
  Json,
  extract::{FromRequestParts, Path, Query, State},
  http::request::Parts,
};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{Role, account},
  prelude::*,
  state::AppState,
  sv::{
    Hierarchy, Ledger, Lifecycle, Store,
    credential::StepUpCredential,
    ledger::{AdjustKind, LedgerOutcome},
    store::{AccountPatch, NewAccount},
  },
};

/// Caller identity established by the external auth subsystem and
/// forwarded by the gateway. The step-up secret for ledger operations
/// travels in the request body instead.
pub struct AuthContext {
  pub caller_account_id: i64,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
    parts
      .headers
      .get("x-caller-id")
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.parse().ok())
      .map(|caller_account_id| AuthContext { caller_account_id })
      .ok_or(Error::Unauthorized)
  }
}

#[derive(Serialize)]
pub struct Reply<T> {
  success: bool,
  msg: Option<String>,
  data: Option<T>,
}

impl<T> Reply<T> {
  fn ok(data: T) -> Json<Self> {
    Json(Self { success: true, msg: None, data: Some(data) })
  }
}

impl Reply<()> {
  fn msg(msg: impl Into<String>) -> Json<Self> {
    Json(Self { success: true, msg: Some(msg.into()), data: None })
  }
}

/// Bounded per-operation deadline; `Timeout` is retryable for reads and
/// for writes that never reached the commit phase.
async fn bounded<T>(
  state: &AppState,
  fut: impl Future<Output = Result<T>>,
) -> Result<T> {
  tokio::time::timeout(state.op_timeout, fut)
    .await
    .map_err(|_| Error::Timeout)?
}

pub async fn health() -> &'static str {
  "ok"
}

#[derive(Deserialize)]
pub struct CreateAccountReq {
  pub role: Role,
  pub ref_id: Option<i64>,
  #[serde(flatten)]
  pub fields: NewAccount,
}

pub async fn create_account(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Json(req): Json<CreateAccountReq>,
) -> Result<Json<Reply<account::Model>>> {
  let account = bounded(
    &state,
    Hierarchy::new(&state.db).create_account(
      auth.caller_account_id,
      req.role,
      req.fields,
      req.ref_id,
    ),
  )
  .await?;

  Ok(Reply::ok(account))
}

#[derive(Deserialize)]
pub struct UpdateAccountReq {
  pub ref_id: Option<i64>,
  #[serde(flatten)]
  pub patch: AccountPatch,
}

pub async fn update_account(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Json(req): Json<UpdateAccountReq>,
) -> Result<Json<Reply<account::Model>>> {
  let account = bounded(
    &state,
    Hierarchy::new(&state.db).update_account(
      auth.caller_account_id,
      id,
      req.patch,
      req.ref_id,
    ),
  )
  .await?;

  Ok(Reply::ok(account))
}

pub async fn delete_account(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> Result<Json<Reply<()>>> {
  bounded(
    &state,
    Lifecycle::new(&state.db).delete_account(auth.caller_account_id, id),
  )
  .await?;

  Ok(Reply::msg("account deleted"))
}

pub async fn get_account(
  State(state): State<Arc<AppState>>,
  _auth: AuthContext,
  Path(id): Path<i64>,
) -> Result<Json<Reply<account::Model>>> {
  let account = bounded(&state, Store::new(&state.db).find_by_id(id)).await?;
  Ok(Reply::ok(account))
}

#[derive(Deserialize)]
pub struct ToggleStatusReq {
  pub active: bool,
}

pub async fn toggle_status(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Json(req): Json<ToggleStatusReq>,
) -> Result<Json<Reply<account::Model>>> {
  let account = bounded(
    &state,
    Hierarchy::new(&state.db).toggle_status(
      auth.caller_account_id,
      id,
      req.active,
    ),
  )
  .await?;

  Ok(Reply::ok(account))
}

#[derive(Deserialize)]
pub struct DescendantsQuery {
  pub role: Role,
}

pub async fn descendants(
  State(state): State<Arc<AppState>>,
  _auth: AuthContext,
  Path(id): Path<i64>,
  Query(query): Query<DescendantsQuery>,
) -> Result<Json<Reply<Vec<account::Model>>>> {
  let accounts =
    bounded(&state, Hierarchy::new(&state.db).descendants(id, query.role))
      .await?;

  Ok(Reply::ok(accounts))
}

pub async fn role_count(
  State(state): State<Arc<AppState>>,
  _auth: AuthContext,
  Path(role): Path<Role>,
) -> Result<Json<Reply<u64>>> {
  let count =
    bounded(&state, Hierarchy::new(&state.db).count_by_role(role)).await?;
  Ok(Reply::ok(count))
}

#[derive(Deserialize)]
pub struct AssignGameConfigReq {
  pub config_id: i64,
}

pub async fn assign_game_config(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Json(req): Json<AssignGameConfigReq>,
) -> Result<Json<Reply<()>>> {
  bounded(
    &state,
    Hierarchy::new(&state.db).assign_game_config(
      auth.caller_account_id,
      id,
      req.config_id,
    ),
  )
  .await?;

  Ok(Reply::msg("game config assigned"))
}

#[derive(Deserialize)]
pub struct TransferReq {
  pub sender_id: i64,
  pub receiver_id: i64,
  pub amount: i64,
  pub secret: String,
}

pub async fn transfer(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Json(req): Json<TransferReq>,
) -> Result<Json<Reply<LedgerOutcome>>> {
  let outcome = bounded(
    &state,
    Ledger::new(&state.db).with_policy(state.policy.clone()).transfer(
      auth.caller_account_id,
      req.sender_id,
      req.receiver_id,
      req.amount,
      &StepUpCredential::new(req.secret),
    ),
  )
  .await?;

  Ok(Reply::ok(outcome))
}

#[derive(Deserialize)]
pub struct AdjustReq {
  pub sender_id: i64,
  pub receiver_id: i64,
  pub amount: i64,
  pub kind: AdjustKind,
  pub secret: String,
  pub message: Option<String>,
}

pub async fn adjust(
  State(state): State<Arc<AppState>>,
  auth: AuthContext,
  Json(req): Json<AdjustReq>,
) -> Result<Json<Reply<LedgerOutcome>>> {
  let outcome = bounded(
    &state,
    Ledger::new(&state.db).with_policy(state.policy.clone()).adjust(
      auth.caller_account_id,
      req.sender_id,
      req.receiver_id,
      req.amount,
      req.kind,
      &StepUpCredential::new(req.secret),
      req.message,
    ),
  )
  .await?;

  Ok(Reply::ok(outcome))
}
