//! Plan service orchestration
//!
//! Thin layer the API boundary talks to: tries the AI path when a client is
//! configured, falls back to the rule-based generator on any failure, and
//! always logs the outcome to the coach's history before returning. The
//! engine tag in the response is the only caller-visible trace of which
//! path ran.

use thiserror::Error;

use crate::db::DbPool;
use crate::generator;
use crate::llm::OpenAiClient;
use crate::models::{Engine, HistoryEntry, PlanResponse, Profile, ProfileUpdate, Template, TrainingRequestParams};
use crate::store::{self, StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("only coaches can generate plans")]
  NotCoach,

  #[error(transparent)]
  Store(#[from] StoreError),
}

pub struct PlanService {
  db: DbPool,
  llm: Option<OpenAiClient>,
}

impl PlanService {
  /// Build the service, picking up the AI client from the environment when
  /// configured; without a key the rule-based path serves every request
  pub fn new(db: DbPool) -> Self {
    let llm = match OpenAiClient::from_env() {
      Ok(client) => Some(client),
      Err(e) => {
        tracing::warn!(error = %e, "AI path disabled, serving rule-based plans only");
        None
      }
    };

    Self { db, llm }
  }

  /// Build the service with an explicit (possibly absent) AI client
  pub fn with_client(db: DbPool, llm: Option<OpenAiClient>) -> Self {
    Self { db, llm }
  }

  /// ---------------------------------------------------------------------
  /// Plan generation
  /// ---------------------------------------------------------------------

  /// Generate a plan for a coach and log it to their history
  ///
  /// Only the history write-back can fail; AI problems degrade silently to
  /// the rule engine and show up solely as `engine: "rule"`.
  pub async fn generate_plan(
    &self,
    user_id: &str,
    params: TrainingRequestParams,
  ) -> Result<PlanResponse, ServiceError> {
    let profile = store::get_or_create_profile(&self.db, user_id).await?;
    if !profile.is_coach() {
      return Err(ServiceError::NotCoach);
    }

    let (plan, engine) = match &self.llm {
      Some(client) => match client.generate_plan(&params).await {
        Ok(text) => (text, Engine::Gpt),
        Err(e) => {
          tracing::warn!(user_id, error = %e, "AI generation failed, falling back to rule engine");
          (generator::generate(&self.db, user_id, &params).await, Engine::Rule)
        }
      },
      None => (generator::generate(&self.db, user_id, &params).await, Engine::Rule),
    };

    let mut logged_params = serde_json::to_value(&params).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(map) = logged_params.as_object_mut() {
      map.insert("engine".to_string(), serde_json::json!(engine.as_str()));
    }

    store::append_entry(&self.db, user_id, "plan", &logged_params, &plan).await?;

    tracing::info!(user_id, engine = engine.as_str(), "plan generated");

    Ok(PlanResponse { plan, engine })
  }

  /// ---------------------------------------------------------------------
  /// Profile, history and templates (mini-app surface)
  /// ---------------------------------------------------------------------

  pub async fn get_profile(&self, user_id: &str) -> Result<Profile, ServiceError> {
    Ok(store::get_or_create_profile(&self.db, user_id).await?)
  }

  pub async fn update_profile(
    &self,
    user_id: &str,
    update: &ProfileUpdate,
  ) -> Result<Profile, ServiceError> {
    Ok(store::update_profile(&self.db, user_id, update).await?)
  }

  pub async fn history(&self, user_id: &str, limit: i64) -> Result<Vec<HistoryEntry>, ServiceError> {
    Ok(store::get_recent_entries(&self.db, user_id, limit).await?)
  }

  pub async fn save_template(
    &self,
    user_id: &str,
    name: &str,
    plan: &str,
    params: &serde_json::Value,
  ) -> Result<(), ServiceError> {
    Ok(store::save_template(&self.db, user_id, name, plan, params).await?)
  }

  pub async fn list_templates(&self, user_id: &str) -> Result<Vec<Template>, ServiceError> {
    Ok(store::list_templates(&self.db, user_id).await?)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
