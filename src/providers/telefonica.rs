use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::Error;

use super::provider::{ClientAuth, OAuthProvider};

/// Number Verification provider; endpoints and scope come from the
/// environment rather than constants because the sandbox URLs rotate.
#[derive(Debug, Clone)]
pub struct TelefonicaProvider {
    pub authorize_url: String,
    pub token_url: String,
    pub scope: String,
}

impl OAuthProvider for TelefonicaProvider {
    fn id(&self) -> &str {
        "telefonica"
    }

    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn token_url(&self) -> &str {
        &self.token_url
    }

    fn default_scope(&self) -> &str {
        &self.scope
    }

    fn client_auth(&self) -> ClientAuth {
        ClientAuth::Basic
    }
}

/// Verification verdict plus the raw payload for the diagnostic page.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub raw: Value,
}

/// The verify API requires E.164-style numbers; a missing leading `+` is
/// prepended, anything else passes through untouched.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    }
}

/// Posts the phone number to the verification endpoint and interprets the
/// boolean `devicePhoneNumberVerified` field. Any other shape is an error
/// carrying the raw payload.
pub async fn verify_number(
    http: &Client,
    verify_url: &str,
    access_token: &str,
    phone_number: &str,
) -> Result<VerificationOutcome, Error> {
    debug!(verify_url, phone_number, "calling number verification");
    let response = http
        .post(verify_url)
        .bearer_auth(access_token)
        .json(&json!({ "phoneNumber": phone_number }))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), %body, "verify endpoint responded");

    if !status.is_success() {
        warn!(status = status.as_u16(), "number verification failed");
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let raw: Value = serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
        message: err.to_string(),
        body: body.clone(),
    })?;

    let verified = raw
        .get("devicePhoneNumberVerified")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::InvalidResponse {
            message: "missing devicePhoneNumberVerified field".to_string(),
            body,
        })?;

    Ok(VerificationOutcome { verified, raw })
}
