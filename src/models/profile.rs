use serde::{Deserialize, Serialize};

/// A user profile as exposed to the mini-app (`notes` stays server-side)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
  pub user_id: String,
  pub role: String,
  pub age: i64,
  pub height: i64,
  pub weight: f64,
}

impl Profile {
  pub fn is_coach(&self) -> bool {
    self.role == "coach"
  }
}

/// Writable profile fields; `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub role: Option<String>,
  pub age: Option<i64>,
  pub height: Option<i64>,
  pub weight: Option<f64>,
}
