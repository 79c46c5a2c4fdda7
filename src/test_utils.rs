//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Profile and log seeding
//! - Mock data factories

use chrono::{Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::llm::OpenAiClient;
use crate::models::TrainingRequestParams;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  use std::str::FromStr;

  // Match SQLite's default of not enforcing foreign keys; sqlx turns the
  // pragma on unless told otherwise
  let opts = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")
    .expect("Failed to parse in-memory database URL")
    .foreign_keys(false);

  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect_with(opts)
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed a profile with the coach role so plan generation is allowed
pub async fn seed_coach_profile(pool: &SqlitePool, user_id: &str) {
  sqlx::query(
    r#"
    INSERT INTO profiles (user_id, role) VALUES (?1, 'coach')
    ON CONFLICT(user_id) DO UPDATE SET role = 'coach'
    "#,
  )
  .bind(user_id)
  .execute(pool)
  .await
  .expect("Failed to seed coach profile");
}

/// Seed one plan log entry timestamped `days_ago` days in the past
pub async fn seed_plan_entry(pool: &SqlitePool, user_id: &str, days_ago: i64, plan: &str) {
  let dt = (Utc::now() - Duration::days(days_ago)).to_rfc3339_opts(SecondsFormat::Secs, false);

  sqlx::query("INSERT INTO logs (user_id, dt, type, params, plan) VALUES (?1, ?2, 'plan', '{}', ?3)")
    .bind(user_id)
    .bind(dt)
    .bind(plan)
    .execute(pool)
    .await
    .expect("Failed to seed plan entry");
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// A typical coach request for testing
pub fn mock_request_params() -> TrainingRequestParams {
  TrainingRequestParams {
    goal: "Сила".to_string(),
    duration: 45,
    age_band: "U13".to_string(),
    group_size: 12,
    ..Default::default()
  }
}

/// An OpenAI client pointed at a local mock server
pub fn mock_openai_client(base_url: &str) -> OpenAiClient {
  OpenAiClient::for_tests(base_url)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('profiles', 'logs', 'templates')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3, "Expected 3 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seeded_coach_can_be_read_back() {
    let pool = setup_test_db().await;

    seed_coach_profile(&pool, "55").await;
    let role: String = sqlx::query_scalar("SELECT role FROM profiles WHERE user_id = '55'")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(role, "coach");

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seeded_entry_lands_in_log() {
    let pool = setup_test_db().await;

    seed_plan_entry(&pool, "55", 3, "Станция A — Проба: x").await;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE user_id = '55'")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let params = mock_request_params();
    assert_eq!(params.goal, "Сила");
    assert!(params.duration > 0);
  }
}
