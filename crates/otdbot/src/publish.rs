use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use thiserror::Error;
use tracing::info;

use crate::config::{Credentials, Tunables};

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone)]
pub struct PublishResult {
    pub id: String,
    pub url: String,
}

/// Failure classification is for operator diagnosis only; every variant
/// is terminal and none is retried.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no text provided for the post")]
    EmptyText,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("access forbidden, check credentials")]
    Forbidden,
    #[error("post creation failed with {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("post creation request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Submit the post text as a single create call. Makes no network call
/// when `text` is empty.
pub async fn publish_post(
    client: &Client,
    credentials: &Credentials,
    tunables: &Tunables,
    text: &str,
) -> Result<PublishResult, PublishError> {
    if text.trim().is_empty() {
        return Err(PublishError::EmptyText);
    }

    let authorization = oauth1_authorization("POST", &tunables.post_url, credentials);
    let response = client
        .post(&tunables.post_url)
        .header(AUTHORIZATION, authorization)
        .json(&CreatePost { text })
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(PublishError::RateLimited);
    }
    if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        return Err(PublishError::Forbidden);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Api { status, body });
    }

    let payload: CreateResponse = response.json().await?;
    let id = payload.data.id;
    let url = format!("https://twitter.com/user/status/{id}");
    info!(%url, "post published");
    Ok(PublishResult { id, url })
}

#[derive(Debug, Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    data: CreatedPost,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// Builds an OAuth 1.0a user-context `Authorization` header for a request
/// with no query or form parameters (a JSON body does not participate in
/// the signature base string).
fn oauth1_authorization(method: &str, url: &str, credentials: &Credentials) -> String {
    let nonce = generate_nonce();
    let timestamp = Utc::now().timestamp().to_string();
    build_authorization(method, url, credentials, &nonce, &timestamp)
}

fn build_authorization(
    method: &str,
    url: &str,
    credentials: &Credentials,
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params = [
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];
    let signature = sign(
        method,
        url,
        &oauth_params,
        &credentials.api_secret,
        &credentials.access_secret,
    );

    let mut fields: Vec<String> = oauth_params
        .iter()
        .map(|(key, value)| (*key, percent_encode(value)))
        .chain(std::iter::once((
            "oauth_signature",
            percent_encode(&signature),
        )))
        .map(|(key, value)| format!("{key}=\"{value}\""))
        .collect();
    fields.sort();

    format!("OAuth {}", fields.join(", "))
}

/// HMAC-SHA1 over the RFC 5849 signature base string: encoded parameters
/// sorted by encoded key, then method, URL and parameter string joined
/// with '&', keyed by `consumer_secret&token_secret`.
fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();
    let parameter_string = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(signing_key.as_bytes()).expect("hmac accepts any key length");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// RFC 3986 percent-encoding (everything but unreserved characters).
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; 24];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
