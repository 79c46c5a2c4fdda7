//! LLM integration for plan generation
//!
//! This module handles communication with the OpenAI chat-completions API
//! for generating full training plans. Any error here is recoverable: the
//! plan service falls back to the rule-based generator.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TrainingRequestParams;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.6;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// OpenAI API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
  model: String,
  temperature: f32,
  messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
  role: String,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// OpenAI Client
/// ---------------------------------------------------------------------------

pub struct OpenAiClient {
  client: Client,
  api_key: String,
  model: String,
  temperature: f32,
  base_url: String,
}

impl OpenAiClient {
  /// Create a client from the environment
  ///
  /// `OPENAI_API_KEY` is required; `MODEL_NAME` and `TEMPERATURE` override
  /// the defaults.
  pub fn from_env() -> Result<Self, LlmError> {
    let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;

    let model = std::env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let temperature = std::env::var("TEMPERATURE")
      .ok()
      .and_then(|t| t.parse().ok())
      .unwrap_or(DEFAULT_TEMPERATURE);

    Ok(Self {
      client: Client::new(),
      api_key,
      model,
      temperature,
      base_url: OPENAI_API_URL.to_string(),
    })
  }

  /// Point the client at a different API root (tests use a local mock)
  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = base_url.trim_end_matches('/').to_string();
    self
  }

  /// Client wired to a mock server, bypassing the environment
  #[cfg(test)]
  pub(crate) fn for_tests(base_url: &str) -> Self {
    Self {
      client: Client::new(),
      api_key: "test-key".to_string(),
      model: DEFAULT_MODEL.to_string(),
      temperature: DEFAULT_TEMPERATURE,
      base_url: OPENAI_API_URL.to_string(),
    }
    .with_base_url(base_url)
  }

  /// Call the chat-completions endpoint with a system prompt and user message
  pub async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
    let request = ChatRequest {
      model: self.model.clone(),
      temperature: self.temperature,
      messages: vec![
        ChatMessage {
          role: "system".to_string(),
          content: system_prompt.to_string(),
        },
        ChatMessage {
          role: "user".to_string(),
          content: user_message.to_string(),
        },
      ],
    };

    let response = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      // Try to parse error response
      if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let chat_response: ChatResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text = chat_response
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    if text.trim().is_empty() {
      return Err(LlmError::Parse("empty completion".to_string()));
    }

    Ok(text)
  }

  /// Generate a full training plan for the given request parameters
  pub async fn generate_plan(&self, params: &TrainingRequestParams) -> Result<String, LlmError> {
    let system_prompt = include_str!("prompts/coach_system.txt");
    let user_message = build_plan_prompt(params);

    let text = self.complete(system_prompt, &user_message).await?;

    // Strip a possible debug prefix left over from earlier experiments
    Ok(text.replace("🧠 GPT\n", "").trim().to_string())
  }
}

/// Build the user prompt from the request parameters
fn build_plan_prompt(params: &TrainingRequestParams) -> String {
  let inventory_status = if params.inventory && !params.inventory_list.is_empty() {
    format!("ДА. Доступный инвентарь: {}", params.inventory_list.join(", "))
  } else {
    "НЕТ.".to_string()
  };

  let mut prompt = format!(
    "Составь подробный и структурированный план тренировки по тхэквондо.\n\
     \n\
     Требования к плану:\n\
     1. Структура: Разминка (общая и специальная), Основная часть, Заключительная часть.\n\
     2. Основная часть ДОЛЖНА быть направлена на развитие основного качества.\n\
     3. План должен занимать ровно {} минут, укажи примерное время каждого этапа.\n\
     \n\
     Параметры тренировки:\n\
     - Возрастная группа: {}\n\
     - Количество участников: {} человек\n\
     - Основное развиваемое качество: {}\n\
     - Длительность: {} минут\n\
     - Место проведения: {}\n\
     - Наличие инвентаря: {}\n",
    params.effective_duration(),
    params.age_band,
    params.effective_group_size(),
    params.goal,
    params.effective_duration(),
    params.location,
    inventory_status,
  );

  if !params.additional_comments.trim().is_empty() {
    prompt.push_str(&format!(
      "\nДополнительные комментарии от тренера: {}. УЧТИ ИХ.\n",
      params.additional_comments.trim()
    ));
  }

  prompt.push_str("\nСоставь план тренировки:");
  prompt
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
