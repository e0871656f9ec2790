use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Tunables;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalEvent {
    pub year: i32,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("event feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("event feed responded with {0}")]
    Status(reqwest::StatusCode),
}

/// Fetch the feed's historical events for the given calendar date.
///
/// Provider order is preserved. Entries without a usable year or
/// description are skipped rather than failing the whole fetch.
pub async fn fetch_events(
    client: &Client,
    tunables: &Tunables,
    date: NaiveDate,
) -> Result<Vec<HistoricalEvent>, FetchError> {
    let url = format!(
        "{}/{}/{}/events.json",
        tunables.events_base_url,
        date.month(),
        date.day()
    );

    let response = client.get(&url).timeout(FETCH_TIMEOUT).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let payload: EventsResponse = response.json().await?;
    let total = payload.events.len();
    let events = decode_events(payload);
    if events.len() < total {
        debug!(
            skipped = total - events.len(),
            "dropped malformed feed entries"
        );
    }

    info!(
        count = events.len(),
        month = date.month(),
        day = date.day(),
        "fetched events"
    );
    Ok(events)
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<EventPayload>,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    year: Option<YearValue>,
    #[serde(default)]
    description: Option<String>,
}

/// The feed serializes years both as JSON numbers and as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YearValue {
    Int(i32),
    Text(String),
}

impl YearValue {
    fn as_i32(&self) -> Option<i32> {
        match self {
            YearValue::Int(value) => Some(*value),
            YearValue::Text(value) => value.trim().parse::<i32>().ok(),
        }
    }
}

fn decode_events(payload: EventsResponse) -> Vec<HistoricalEvent> {
    payload
        .events
        .into_iter()
        .filter_map(|entry| {
            let year = entry.year.as_ref().and_then(YearValue::as_i32)?;
            let description = entry.description.filter(|text| !text.trim().is_empty())?;
            Some(HistoricalEvent { year, description })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Vec<HistoricalEvent> {
        let payload: EventsResponse = serde_json::from_str(raw).expect("valid fixture");
        decode_events(payload)
    }

    #[test]
    fn accepts_numeric_and_string_years() {
        let events = decode(
            r#"{"events": [
                {"year": "1040", "description": "first"},
                {"year": 1848, "description": "second"}
            ]}"#,
        );

        assert_eq!(
            events,
            vec![
                HistoricalEvent {
                    year: 1040,
                    description: "first".to_string()
                },
                HistoricalEvent {
                    year: 1848,
                    description: "second".to_string()
                },
            ]
        );
    }

    #[test]
    fn skips_entries_missing_fields() {
        let events = decode(
            r#"{"events": [
                {"description": "no year"},
                {"year": "1901"},
                {"year": "1901", "description": "   "},
                {"year": "not a year", "description": "bad year"},
                {"year": "1967", "description": "kept"}
            ]}"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].year, 1967);
        assert_eq!(events[0].description, "kept");
    }

    #[test]
    fn empty_feed_decodes_to_empty_list() {
        assert!(decode(r#"{"events": []}"#).is_empty());
        assert!(decode(r#"{}"#).is_empty());
    }
}
