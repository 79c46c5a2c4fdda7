//! Recently-used station lookup
//!
//! Walks a coach's plan-generation log and collects the station titles that
//! already appeared in recent plans, so the rule-based generator can avoid
//! handing out the same drills twice in a row. Parsing is deliberately
//! forgiving: a broken timestamp or a non-plan row is skipped, a dead store
//! yields an empty set, and the caller always gets an answer.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::db::DbPool;
use crate::store;

/// How far back a station counts as "recently used"
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// How many plan entries are inspected before the walk stops
pub const DEFAULT_MAX_PLAN_ENTRIES: usize = 10;

/// Raw rows fetched from the log; stays well under the store's 500-row
/// retention so pruning never changes the result
const RAW_FETCH_LIMIT: i64 = 100;

/// The station-line grammar shared by the generator's formatter and this
/// extractor: "Станция <letter> — <title>: <instruction>". The two sides
/// must stay in lockstep or future-plan deduplication silently breaks.
pub fn station_line_regex() -> &'static Regex {
  static STATION_LINE: OnceLock<Regex> = OnceLock::new();
  STATION_LINE.get_or_init(|| Regex::new(r"Станция\s+[A-Z]\s*—\s*([^:\n]+):").expect("valid regex"))
}

/// Pull station titles out of one plan text, trimmed and lower-cased,
/// preserving first-seen order without duplicates
pub fn extract_station_titles(plan: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut titles = Vec::new();

  for caps in station_line_regex().captures_iter(plan) {
    let title = caps[1].trim().to_lowercase();
    if !title.is_empty() && seen.insert(title.clone()) {
      titles.push(title);
    }
  }

  titles
}

/// Collect the set of station titles used in this coach's recent plans
///
/// Scans the newest log entries first. Entries older than `window_days` are
/// not mined for titles, but they still count toward `max_plan_entries`, so
/// the walk terminates after a bounded number of plan rows either way.
pub async fn recent_blocks(
  db: &DbPool,
  user_id: &str,
  window_days: i64,
  max_plan_entries: usize,
) -> HashSet<String> {
  let entries = match store::get_recent_entries(db, user_id, RAW_FETCH_LIMIT).await {
    Ok(entries) => entries,
    Err(e) => {
      tracing::warn!(user_id, error = %e, "history unavailable, skipping repetition check");
      return HashSet::new();
    }
  };

  let now = Utc::now();
  let mut blocks = HashSet::new();
  let mut inspected = 0usize;

  for entry in entries {
    if entry.entry_type != "plan" {
      continue;
    }

    inspected += 1;
    if inspected > max_plan_entries {
      break;
    }

    // Unparseable timestamps keep the entry in play rather than erroring
    let within_window = match parse_entry_timestamp(&entry.dt) {
      Some(dt) => (now - dt).num_days() <= window_days,
      None => true,
    };

    if within_window {
      for title in extract_station_titles(&entry.plan) {
        blocks.insert(title);
      }
    }
  }

  blocks
}

/// Lenient timestamp parse covering the formats the log has carried over time
fn parse_entry_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ"))
    .or_else(|_| DateTime::parse_from_str(&format!("{}+00:00", raw), "%Y-%m-%d %H:%M:%S%:z"))
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use chrono::Duration;

  #[test]
  fn test_extract_titles_from_station_lines() {
    let plan = "Разминка (RAMP) — 8 мин\n\
                Станция A — Взрывные выпады: серия прыжков (~8 мин)\n\
                Станция B — Бой с тенью: два раунда (~8 мин)\n\
                Заминка — 5 мин";
    let titles = extract_station_titles(plan);
    assert_eq!(titles, vec!["взрывные выпады", "бой с тенью"]);
  }

  #[test]
  fn test_extract_dedups_preserving_order() {
    let plan = "Станция A — Лапы: x\nСтанция B — Щит: y\nСтанция C — Лапы: z";
    let titles = extract_station_titles(plan);
    assert_eq!(titles, vec!["лапы", "щит"]);
  }

  #[test]
  fn test_extract_ignores_prose_without_marker() {
    let titles = extract_station_titles("Сегодня без станций, только спарринг.");
    assert!(titles.is_empty());
  }

  #[test]
  fn test_timestamp_parse_accepts_known_formats() {
    assert!(parse_entry_timestamp("2026-08-30T10:00:00+00:00").is_some());
    assert!(parse_entry_timestamp("2026-08-30T10:00:00Z").is_some());
    assert!(parse_entry_timestamp("2026-08-30 10:00:00").is_some());
    assert!(parse_entry_timestamp("вчера").is_none());
  }

  async fn insert_plan_entry(pool: &DbPool, user_id: &str, dt: &str, plan: &str) {
    sqlx::query("INSERT INTO logs (user_id, dt, type, params, plan) VALUES (?1, ?2, 'plan', '{}', ?3)")
      .bind(user_id)
      .bind(dt)
      .bind(plan)
      .execute(pool)
      .await
      .unwrap();
  }

  fn days_ago_iso(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
  }

  #[tokio::test]
  async fn test_window_boundary() {
    let pool = setup_test_db().await;

    seed_plan_entry(&pool, "1", 15, "Станция A — Старая работа: x").await;
    seed_plan_entry(&pool, "1", 13, "Станция A — Свежая работа: y").await;

    let blocks = recent_blocks(&pool, "1", DEFAULT_WINDOW_DAYS, DEFAULT_MAX_PLAN_ENTRIES).await;
    assert!(blocks.contains("свежая работа"));
    assert!(!blocks.contains("старая работа"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_non_plan_entries_are_skipped() {
    let pool = setup_test_db().await;

    sqlx::query("INSERT INTO logs (user_id, dt, type, params, plan) VALUES ('1', ?1, 'note', '{}', 'Станция A — Заметка: x')")
      .bind(days_ago_iso(1))
      .execute(&pool)
      .await
      .unwrap();

    let blocks = recent_blocks(&pool, "1", DEFAULT_WINDOW_DAYS, DEFAULT_MAX_PLAN_ENTRIES).await;
    assert!(blocks.is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_bad_timestamp_still_scanned() {
    let pool = setup_test_db().await;

    insert_plan_entry(&pool, "1", "мусор вместо даты", "Станция A — Без даты: x").await;

    let blocks = recent_blocks(&pool, "1", DEFAULT_WINDOW_DAYS, DEFAULT_MAX_PLAN_ENTRIES).await;
    assert!(blocks.contains("без даты"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_max_plan_entries_caps_the_walk() {
    let pool = setup_test_db().await;

    // Oldest row first so it ends up beyond the inspection cap
    seed_plan_entry(&pool, "1", 2, "Станция A — За горизонтом: x").await;
    for i in 0..DEFAULT_MAX_PLAN_ENTRIES {
      seed_plan_entry(&pool, "1", 1, &format!("Станция A — Недавняя {}: x", i)).await;
    }

    let blocks = recent_blocks(&pool, "1", DEFAULT_WINDOW_DAYS, DEFAULT_MAX_PLAN_ENTRIES).await;
    assert_eq!(blocks.len(), DEFAULT_MAX_PLAN_ENTRIES);
    assert!(!blocks.contains("за горизонтом"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_unreachable_store_yields_empty_set() {
    let pool = setup_test_db().await;
    pool.close().await;

    let blocks = recent_blocks(&pool, "1", DEFAULT_WINDOW_DAYS, DEFAULT_MAX_PLAN_ENTRIES).await;
    assert!(blocks.is_empty());
  }
}
