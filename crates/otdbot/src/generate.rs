use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Credentials, Tunables};
use crate::events::HistoricalEvent;

pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard platform limit the candidate is asked (and repaired) to fit.
pub const MAX_POST_CHARS: usize = 280;

// Fixed generation parameters.
const TEMPERATURE: f64 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f64 = 0.9;
const MAX_OUTPUT_TOKENS: u32 = 300;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no events to summarize")]
    NoEvents,
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation service responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("generation service returned no completion")]
    EmptyCompletion,
}

/// Ask the generation service for a post candidate covering three of the
/// given events. Makes no network call when `events` is empty.
pub async fn generate_post(
    client: &Client,
    credentials: &Credentials,
    tunables: &Tunables,
    date: NaiveDate,
    events: &[HistoricalEvent],
) -> Result<String, GenerateError> {
    if events.is_empty() {
        return Err(GenerateError::NoEvents);
    }

    let request = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: build_prompt(date, events),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    };

    let response = client
        .post(&tunables.gemini_url)
        .header("X-goog-api-key", &credentials.gemini_api_key)
        .json(&request)
        .timeout(GENERATE_TIMEOUT)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(GenerateError::Status(response.status()));
    }

    let payload: GenerateResponse = response.json().await?;
    let text = payload
        .first_text()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(GenerateError::EmptyCompletion)?;

    let candidate = repair_length(&text);
    info!(chars = candidate.chars().count(), "generated post candidate");
    Ok(candidate)
}

/// Formats a date as e.g. "Aug 14th".
pub fn date_label(date: NaiveDate) -> String {
    let day = date.day();
    format!("{} {}{}", date.format("%b"), day, ordinal_suffix(day))
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (10..=20).contains(&(day % 100)) {
        "th"
    } else {
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    }
}

fn build_prompt(date: NaiveDate, events: &[HistoricalEvent]) -> String {
    let label = date_label(date);
    let events_text = events
        .iter()
        .map(|event| format!("{}: {}", event.year, event.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create a Twitter post about historical events that happened on this day.

EXACT FORMAT REQUIRED:
📅 {label} in history:
• YEAR — Brief description of event
• YEAR — Brief description of event
• YEAR — Brief description of event
#OTD #History

RULES:
- Start with \"📅 {label} in history:\"
- Use bullet points with • symbol
- Format each event as \"YEAR — description\"
- Select 3 interesting but lesser-known events (avoid the most famous ones)
- Keep descriptions very brief to fit under 280 characters total
- End with \"#OTD #History\"
- Make sure the entire tweet is under 280 characters

Historical events for today:
{events_text}

Generate only the tweet text in the exact format shown above:"
    )
}

/// Best-effort shortening of an over-length candidate.
///
/// A candidate over 280 chars with at least four lines is rebuilt from the
/// first three lines plus the last (header, two bullets, hashtag footer);
/// if that is still too long it is hard-truncated to 277 chars plus an
/// ellipsis. A shorter over-length completion passes through unchanged.
pub fn repair_length(text: &str) -> String {
    let length = text.chars().count();
    if length <= MAX_POST_CHARS {
        return text.to_string();
    }
    warn!(chars = length, "candidate over limit, repairing");

    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 4 {
        return text.to_string();
    }

    let mut kept: Vec<&str> = lines[..3].to_vec();
    kept.push(lines[lines.len() - 1]);
    let rebuilt = kept.join("\n");
    if rebuilt.chars().count() <= MAX_POST_CHARS {
        return rebuilt;
    }

    let truncated: String = rebuilt.chars().take(MAX_POST_CHARS - 3).collect();
    format!("{truncated}...")
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}
