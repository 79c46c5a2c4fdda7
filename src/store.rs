//! Profile, history-log and template access on top of the SQLite pool
//!
//! The log is append-only per user; reads come back newest first. Every
//! append prunes the user's log to the most recent 500 rows so the table
//! stays bounded without a separate maintenance job.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::db::DbPool;
use crate::models::{HistoryEntry, Profile, ProfileUpdate, Template};

/// Rows kept per user after each append
const LOG_RETENTION_PER_USER: i64 = 500;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("database error: {0}")]
  Db(#[from] sqlx::Error),
}

/// ---------------------------------------------------------------------------
/// Profiles
/// ---------------------------------------------------------------------------

/// Fetch a profile, creating the default athlete row on first contact
pub async fn get_or_create_profile(db: &DbPool, user_id: &str) -> Result<Profile, StoreError> {
  let existing: Option<Profile> = sqlx::query_as(
    "SELECT user_id, role, age, height, weight FROM profiles WHERE user_id = ?1",
  )
  .bind(user_id)
  .fetch_optional(db)
  .await?;

  if let Some(profile) = existing {
    return Ok(profile);
  }

  sqlx::query("INSERT INTO profiles (user_id, role) VALUES (?1, 'athlete')")
    .bind(user_id)
    .execute(db)
    .await?;

  Ok(Profile {
    user_id: user_id.to_string(),
    role: "athlete".to_string(),
    age: 0,
    height: 0,
    weight: 0.0,
  })
}

/// Update the writable profile fields; unset fields keep their stored value
pub async fn update_profile(
  db: &DbPool,
  user_id: &str,
  update: &ProfileUpdate,
) -> Result<Profile, StoreError> {
  // Make sure the row exists before the partial update
  get_or_create_profile(db, user_id).await?;

  sqlx::query(
    r#"
    UPDATE profiles SET
      role = COALESCE(?1, role),
      age = COALESCE(?2, age),
      height = COALESCE(?3, height),
      weight = COALESCE(?4, weight)
    WHERE user_id = ?5
    "#,
  )
  .bind(&update.role)
  .bind(update.age)
  .bind(update.height)
  .bind(update.weight)
  .bind(user_id)
  .execute(db)
  .await?;

  get_or_create_profile(db, user_id).await
}

/// ---------------------------------------------------------------------------
/// History Log
/// ---------------------------------------------------------------------------

/// Append one log entry for a user, then prune that user's log
pub async fn append_entry(
  db: &DbPool,
  user_id: &str,
  entry_type: &str,
  params: &serde_json::Value,
  plan: &str,
) -> Result<(), StoreError> {
  let dt = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
  let params_json = params.to_string();

  sqlx::query(
    r#"
    INSERT INTO logs (user_id, dt, type, params, plan)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
  )
  .bind(user_id)
  .bind(&dt)
  .bind(entry_type)
  .bind(&params_json)
  .bind(plan)
  .execute(db)
  .await?;

  let pruned = sqlx::query(
    r#"
    DELETE FROM logs WHERE user_id = ?1 AND id NOT IN (
      SELECT id FROM logs WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
    )
    "#,
  )
  .bind(user_id)
  .bind(LOG_RETENTION_PER_USER)
  .execute(db)
  .await?;

  if pruned.rows_affected() > 0 {
    tracing::info!(user_id, pruned = pruned.rows_affected(), "pruned old log rows");
  }

  Ok(())
}

/// Fetch the most recent log entries for a user, newest first
pub async fn get_recent_entries(
  db: &DbPool,
  user_id: &str,
  limit: i64,
) -> Result<Vec<HistoryEntry>, StoreError> {
  let rows: Vec<(String, String, String, String)> = sqlx::query_as(
    r#"
    SELECT dt, type, params, plan FROM logs
    WHERE user_id = ?1
    ORDER BY id DESC
    LIMIT ?2
    "#,
  )
  .bind(user_id)
  .bind(limit)
  .fetch_all(db)
  .await?;

  let entries = rows
    .into_iter()
    .map(|(dt, entry_type, params_json, plan)| HistoryEntry {
      dt,
      entry_type,
      // A corrupt blob reads back as an empty map, not an error
      params: serde_json::from_str(&params_json).unwrap_or_else(|_| serde_json::json!({})),
      plan,
    })
    .collect();

  Ok(entries)
}

/// ---------------------------------------------------------------------------
/// Templates
/// ---------------------------------------------------------------------------

/// Save a plan template, replacing any previous one with the same name
pub async fn save_template(
  db: &DbPool,
  user_id: &str,
  name: &str,
  plan: &str,
  params: &serde_json::Value,
) -> Result<(), StoreError> {
  let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);

  sqlx::query(
    r#"
    INSERT OR REPLACE INTO templates (user_id, name, plan, params, created)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
  )
  .bind(user_id)
  .bind(name)
  .bind(plan)
  .bind(params.to_string())
  .bind(&created)
  .execute(db)
  .await?;

  Ok(())
}

/// List a user's templates, newest first
pub async fn list_templates(db: &DbPool, user_id: &str) -> Result<Vec<Template>, StoreError> {
  let rows: Vec<(String, String, String, String)> = sqlx::query_as(
    r#"
    SELECT name, plan, params, created FROM templates
    WHERE user_id = ?1
    ORDER BY created DESC
    "#,
  )
  .bind(user_id)
  .fetch_all(db)
  .await?;

  let templates = rows
    .into_iter()
    .map(|(name, plan, params_json, created)| Template {
      name,
      plan,
      params: serde_json::from_str(&params_json).unwrap_or_else(|_| serde_json::json!({})),
      created,
    })
    .collect();

  Ok(templates)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
