use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Training Request Parameters
/// ---------------------------------------------------------------------------

/// Parameters for one plan-generation request
///
/// These arrive from the mini-app as a loose JSON map; every field has a
/// default so that missing or malformed input degrades to a usable request
/// instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingRequestParams {
  /// Primary quality to develop ("Сила", "Скорость", ... or English names)
  pub goal: String,

  /// Session length in minutes
  #[serde(alias = "duration_minutes")]
  pub duration: u32,

  /// Where the session takes place
  pub location: String,

  /// Whether any equipment is available
  pub inventory: bool,

  /// Equipment tags ("лапы", "резина", "скакалка", ...)
  pub inventory_list: Vec<String>,

  /// Age band of the group ("U9", "U13", "U17", "Adult")
  pub age_band: String,

  /// Number of athletes in the session
  pub group_size: u32,

  /// Free-form coach remarks, forwarded to the AI path only
  pub additional_comments: String,
}

impl Default for TrainingRequestParams {
  fn default() -> Self {
    Self {
      goal: "Общая".to_string(),
      duration: 45,
      location: "Зал".to_string(),
      inventory: false,
      inventory_list: Vec::new(),
      age_band: "U13".to_string(),
      group_size: 10,
      additional_comments: String::new(),
    }
  }
}

impl TrainingRequestParams {
  /// Decode from an untyped JSON map; any shape problem falls back to the
  /// full default request
  pub fn from_value(value: serde_json::Value) -> Self {
    serde_json::from_value(value).unwrap_or_default()
  }

  /// Session length with the positive-duration invariant enforced
  pub fn effective_duration(&self) -> u32 {
    if self.duration == 0 {
      Self::default().duration
    } else {
      self.duration
    }
  }

  /// Group size with a floor of one athlete
  pub fn effective_group_size(&self) -> u32 {
    self.group_size.max(1)
  }

  /// True when the given equipment tag is usable in this session
  pub fn has_inventory(&self, tag: &str) -> bool {
    self.inventory
      && self
        .inventory_list
        .iter()
        .any(|t| t.to_lowercase() == tag.to_lowercase())
  }
}

/// ---------------------------------------------------------------------------
/// Goal
/// ---------------------------------------------------------------------------

/// The quality a session develops; selects the exercise pool
///
/// Parsing is lenient: both Russian and English names are recognized and
/// anything else maps to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
  Speed,
  Strength,
  Endurance,
  Flexibility,
  Agility,
  General,
}

impl Goal {
  pub fn from_param(raw: &str) -> Self {
    match raw.trim().to_lowercase().as_str() {
      "скорость" | "speed" => Goal::Speed,
      "сила" | "strength" => Goal::Strength,
      "выносливость" | "endurance" => Goal::Endurance,
      "гибкость" | "flexibility" => Goal::Flexibility,
      "ловкость" | "agility" => Goal::Agility,
      _ => Goal::General,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Goal::Speed => "Скорость",
      Goal::Strength => "Сила",
      Goal::Endurance => "Выносливость",
      Goal::Flexibility => "Гибкость",
      Goal::Agility => "Ловкость",
      Goal::General => "Общая",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Age Band
/// ---------------------------------------------------------------------------

/// Coarse athlete age bucket used to pick the methodological emphasis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBand {
  /// Up to ~9 years: coordination, reaction, playful low-volume work
  Youngest,
  /// ~10-13 years: speed-strength and agility, moderate volume
  Middle,
  /// ~14-17 years: strength-power, speed, dosed interval endurance
  OlderYouth,
  /// 18+ or unrecognized: individualized load
  Adult,
}

impl AgeBand {
  /// Lenient parse; unrecognized bands fall through to `Adult`
  pub fn from_param(raw: &str) -> Self {
    match raw.trim().to_uppercase().as_str() {
      "U7" | "U9" => AgeBand::Youngest,
      "U11" | "U13" => AgeBand::Middle,
      "U15" | "U17" => AgeBand::OlderYouth,
      _ => AgeBand::Adult,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Plan Response
/// ---------------------------------------------------------------------------

/// Which generation path produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
  Gpt,
  Rule,
}

impl Engine {
  pub fn as_str(&self) -> &'static str {
    match self {
      Engine::Gpt => "gpt",
      Engine::Rule => "rule",
    }
  }
}

/// What the plan service returns to the API boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
  pub plan: String,
  pub engine: Engine,
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_params_from_empty_map() {
    let params = TrainingRequestParams::from_value(json!({}));
    assert_eq!(params.goal, "Общая");
    assert_eq!(params.duration, 45);
    assert_eq!(params.location, "Зал");
    assert_eq!(params.age_band, "U13");
    assert_eq!(params.group_size, 10);
    assert!(!params.inventory);
    assert!(params.inventory_list.is_empty());
  }

  #[test]
  fn test_params_from_garbage_value() {
    let params = TrainingRequestParams::from_value(json!("not a map"));
    assert_eq!(params.duration, 45);
  }

  #[test]
  fn test_params_partial_map_keeps_defaults() {
    let params = TrainingRequestParams::from_value(json!({
      "goal": "Сила",
      "duration": 60,
    }));
    assert_eq!(params.goal, "Сила");
    assert_eq!(params.duration, 60);
    assert_eq!(params.age_band, "U13");
  }

  #[test]
  fn test_effective_duration_rejects_zero() {
    let params = TrainingRequestParams {
      duration: 0,
      ..Default::default()
    };
    assert_eq!(params.effective_duration(), 45);
  }

  #[test]
  fn test_goal_parses_both_languages() {
    assert_eq!(Goal::from_param("Сила"), Goal::Strength);
    assert_eq!(Goal::from_param("strength"), Goal::Strength);
    assert_eq!(Goal::from_param("  Скорость "), Goal::Speed);
    assert_eq!(Goal::from_param("что-то странное"), Goal::General);
    assert_eq!(Goal::from_param(""), Goal::General);
  }

  #[test]
  fn test_age_band_fallback_is_adult() {
    assert_eq!(AgeBand::from_param("U13"), AgeBand::Middle);
    assert_eq!(AgeBand::from_param("u9"), AgeBand::Youngest);
    assert_eq!(AgeBand::from_param("U17"), AgeBand::OlderYouth);
    assert_eq!(AgeBand::from_param("veterans"), AgeBand::Adult);
    assert_eq!(AgeBand::from_param(""), AgeBand::Adult);
  }

  #[test]
  fn test_has_inventory_requires_flag_and_tag() {
    let params = TrainingRequestParams {
      inventory: true,
      inventory_list: vec!["Резина".to_string(), "лапы".to_string()],
      ..Default::default()
    };
    assert!(params.has_inventory("резина"));
    assert!(params.has_inventory("ЛАПЫ"));
    assert!(!params.has_inventory("скакалка"));

    let no_flag = TrainingRequestParams {
      inventory: false,
      inventory_list: vec!["резина".to_string()],
      ..Default::default()
    };
    assert!(!no_flag.has_inventory("резина"));
  }

  #[test]
  fn test_engine_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Engine::Gpt).unwrap(), "\"gpt\"");
    assert_eq!(Engine::Rule.as_str(), "rule");
  }
}
