//! Advisory collaborator.
//!
//! Turns a patient's most recent health logs into a short
//! improving/stable/worsening message via an external text-generation
//! service. The service is treated as unreliable: every failure is
//! absorbed into a fixed apology string and never reaches the caller
//! as an error.

pub mod client;
pub mod gemini;
pub mod trend;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::models::HealthLog;

pub use client::{AdvisoryClient, DisabledAdvisoryClient, MockAdvisoryClient};
pub use gemini::GeminiClient;
pub use trend::Trend;

/// Number of recent logs summarised for the collaborator.
pub const ADVISORY_LOG_WINDOW: u32 = 5;

pub const FALLBACK_MESSAGE: &str =
    "Sorry, we couldn't generate health advice right now. Please try again later.";
pub const QUOTA_FALLBACK_MESSAGE: &str =
    "Our AI assistant has reached its usage limit for now. Please check back later.";
pub const NO_LOGS_MESSAGE: &str =
    "Log your symptoms and medication to receive personalised advice.";

/// Lowercase markers that identify a quota / rate-limit failure in a message body.
const QUOTA_MARKERS: &[&str] = &["quota", "rate limit", "resource_exhausted"];

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Advisory service is not configured")]
    NotConfigured,

    #[error("Advisory service unreachable at {0}")]
    Connection(String),

    #[error("Advisory service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Advisory service returned no text")]
    EmptyResponse,
}

impl AdvisoryError {
    /// Quota exhaustion shows up either as a 429 or as a marker in the
    /// upstream message body.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            AdvisoryError::Upstream { status: 429, .. } => true,
            AdvisoryError::Upstream { body, .. } => mentions_quota(body),
            AdvisoryError::HttpClient(message) => mentions_quota(message),
            _ => false,
        }
    }
}

fn mentions_quota(text: &str) -> bool {
    let text = text.to_lowercase();
    QUOTA_MARKERS.iter().any(|m| text.contains(m))
}

/// Advisory message plus the chart series derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub message: String,
    pub trend: Trend,
    pub trend_series: [u8; 7],
}

impl Advisory {
    fn from_message(message: String) -> Self {
        let trend = Trend::from_advice(&message);
        Self {
            message,
            trend,
            trend_series: trend.series(),
        }
    }
}

/// One line per log: `- <date>: symptoms: <s>; medication: <m>`.
pub fn format_logs(logs: &[HealthLog]) -> String {
    logs.iter()
        .map(|log| {
            format!(
                "- {}: symptoms: {}; medication: {}",
                log.date.format("%Y-%m-%d %H:%M"),
                log.symptoms.trim(),
                log.medication.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed prompt asking for a three-way classification and one suggestion.
pub fn build_prompt(log_block: &str) -> String {
    format!(
        "You are assisting a telemedicine care team. Below are a patient's most recent \
         health log entries (newest first).\n\n\
         {log_block}\n\n\
         In one or two short sentences addressed to the patient, say whether their \
         condition is improving, stable, or worsening, using exactly one of those three \
         words, and give one short practical suggestion. Do not diagnose and do not \
         prescribe medication."
    )
}

/// Ask the collaborator about `logs` (newest first; only the first
/// `ADVISORY_LOG_WINDOW` are used). Never fails.
pub async fn advise(client: &dyn AdvisoryClient, logs: &[HealthLog]) -> Advisory {
    let window = &logs[..logs.len().min(ADVISORY_LOG_WINDOW as usize)];
    if window.is_empty() {
        return Advisory::from_message(NO_LOGS_MESSAGE.to_string());
    }

    let prompt = build_prompt(&format_logs(window));
    match client.generate(&prompt).await {
        Ok(text) => Advisory::from_message(text),
        Err(e) if e.is_quota_exceeded() => {
            tracing::warn!(error = %e, "Advisory quota exceeded");
            Advisory::from_message(QUOTA_FALLBACK_MESSAGE.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Advisory request failed");
            Advisory::from_message(FALLBACK_MESSAGE.to_string())
        }
    }
}

/// Build the configured collaborator; disabled when no API key is set.
pub fn client_from_config(config: &ServerConfig) -> Result<Arc<dyn AdvisoryClient>, AdvisoryError> {
    match &config.gemini_api_key {
        Some(key) => {
            let client =
                GeminiClient::hosted(key, &config.gemini_model, config.advisory_timeout_secs)?;
            tracing::info!(model = %client.model(), "Advisory collaborator enabled");
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, advisory collaborator disabled");
            Ok(Arc::new(DisabledAdvisoryClient))
        }
    }
}
