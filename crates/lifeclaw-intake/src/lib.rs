//! # LifeClaw Intake
//!
//! Free-text extraction oracle: turns raw user input ("my passport expires
//! June 3rd, renew it or I can't travel") into candidate obligations, tasks,
//! and reminders via an OpenAI-compatible chat-completions endpoint.
//!
//! The oracle is best effort and never trusted: malformed candidates are
//! dropped here, and everything that survives still passes the same
//! validation as manual entry before the lifecycle manager persists it.

use async_trait::async_trait;

use lifeclaw_core::config::ExtractorConfig;
use lifeclaw_core::error::{LifeClawError, Result};
use lifeclaw_core::traits::PlanExtractor;
use lifeclaw_core::types::{ExtractedPlan, ObligationDraft, ReminderDraft, TaskDraft};

const SYSTEM_PROMPT: &str = "You are a life-admin assistant. Extract real-world \
obligations, preparation tasks, and reminders from the user's text. Respond with \
ONLY a JSON object of the form {\"obligations\": [], \"tasks\": [], \"reminders\": []}. \
An obligation has: title, category (education|finance|work|personal|health|other), \
kind (one_time|recurring), due_date (RFC 3339 instant), optional frequency \
(daily|weekly|monthly|yearly, only for recurring), optional risk_level \
(low|medium|high), optional consequence. A task has: title, description, optional \
priority (low|medium|high|urgent). A reminder has: title, description, remind_at \
(RFC 3339 instant). Omit anything you are not reasonably sure about.";

/// Extraction client for any OpenAI-compatible API.
pub struct OpenAiExtractor {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl OpenAiExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl PlanExtractor for OpenAiExtractor {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedPlan> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": raw_text },
            ],
            "temperature": 0.3,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LifeClawError::Extraction(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LifeClawError::Extraction(format!(
                "oracle returned {status}: {body}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LifeClawError::Extraction(format!("bad response body: {e}")))?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LifeClawError::Extraction("no completion content".into()))?;

        parse_plan(content)
    }
}

/// Parse oracle output into a plan. Tolerates markdown code fences and drops
/// individually malformed candidates instead of failing the whole plan.
pub fn parse_plan(content: &str) -> Result<ExtractedPlan> {
    let stripped = strip_code_fences(content);
    let value: serde_json::Value = serde_json::from_str(stripped.trim())
        .map_err(|e| LifeClawError::Extraction(format!("oracle emitted non-JSON: {e}")))?;

    Ok(ExtractedPlan {
        obligations: collect_candidates::<ObligationDraft>(&value["obligations"], "obligation"),
        tasks: collect_candidates::<TaskDraft>(&value["tasks"], "task"),
        reminders: collect_candidates::<ReminderDraft>(&value["reminders"], "reminder"),
    })
}

fn collect_candidates<T: serde::de::DeserializeOwned>(
    value: &serde_json::Value,
    label: &str,
) -> Vec<T> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::warn!("⚠️ Dropping malformed {label} candidate: {e}");
                None
            }
        })
        .collect()
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the fence line
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
