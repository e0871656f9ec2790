use std::env;

use clap::Parser;

use crate::error::BotError;

/// CLI surface for the bot. A run takes no arguments; scheduling repeat
/// invocations is the deployment environment's job.
#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "Post a daily on-this-day history summary")]
pub struct CliArgs {}

/// Secrets required before the pipeline is allowed to start.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
    pub gemini_api_key: String,
    /// Accepted for parity with the platform client setup; the OAuth 1.0a
    /// signing path does not use it.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Tunables {
    pub events_base_url: String,
    pub gemini_url: String,
    pub post_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub tunables: Tunables,
}

impl CliArgs {
    pub fn resolve(self) -> Result<AppConfig, BotError> {
        Ok(AppConfig {
            credentials: Credentials::from_env()?,
            tunables: Tunables::from_env(),
        })
    }
}

pub const DEFAULT_EVENTS_BASE_URL: &str = "https://byabbe.se/on-this-day";
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
pub const DEFAULT_POST_URL: &str = "https://api.twitter.com/2/tweets";

impl Credentials {
    /// Loads the credential set, reporting every missing variable at once
    /// so an operator can fix the deployment in one pass.
    pub fn from_env() -> Result<Self, BotError> {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| -> String {
            match env::var(name) {
                Ok(value) if !value.trim().is_empty() => value,
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let api_key = required("API_KEY");
        let api_secret = required("API_SECRET");
        let access_token = required("ACCESS_TOKEN");
        let access_secret = required("ACCESS_SECRET");
        let gemini_api_key = required("GEMINI_API_KEY");

        if !missing.is_empty() {
            return Err(BotError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            api_key,
            api_secret,
            access_token,
            access_secret,
            gemini_api_key,
            bearer_token: env::var("BEARER_TOKEN").ok(),
        })
    }
}

impl Tunables {
    pub fn from_env() -> Self {
        Self {
            events_base_url: env::var("OTD_EVENTS_URL")
                .unwrap_or_else(|_| DEFAULT_EVENTS_BASE_URL.to_string()),
            gemini_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            post_url: env::var("POST_CREATE_URL")
                .unwrap_or_else(|_| DEFAULT_POST_URL.to_string()),
        }
    }
}
