//! Backend core for the KukkiDo coaching mini-app
//!
//! A taekwondo coach asks for a session plan; the plan service tries the
//! OpenAI path and falls back to a deterministic rule-based generator when
//! the AI is unconfigured or failing, then logs every plan to the coach's
//! history. The generator avoids stations handed out in the last two weeks
//! by scraping station titles back out of previously logged plan text.
//!
//! The Telegram bot and the mini-app front end live elsewhere; this crate
//! owns the data access, the generation logic and the orchestration.

pub mod db;
pub mod generator;
pub mod llm;
pub mod models;
pub mod recent;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use db::{initialize_db, AppState, DbPool};
pub use models::{PlanResponse, TrainingRequestParams};
pub use service::{PlanService, ServiceError};

/// Load environment configuration and open the store
///
/// Call once at service start; the returned state owns the pool until
/// `AppState::shutdown`.
pub async fn init() -> Result<AppState, Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let pool = db::initialize_db().await?;
  Ok(AppState { db: pool })
}
