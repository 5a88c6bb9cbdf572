use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::provider::{ClientAuth, OAuthProvider};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

// contacts.readonly is what unlocks the /connections phone fallback.
const DEFAULT_SCOPE: &str = "email profile https://www.googleapis.com/auth/contacts.readonly";

const AUTHORIZE_PARAMS: &[(&str, &str)] = &[("access_type", "offline"), ("prompt", "consent")];

const PEOPLE_API_BASE: &str = "https://people.googleapis.com";
const PROFILE_PATH: &str = "/v1/people/me?personFields=phoneNumbers";
const CONNECTIONS_PATH: &str = "/v1/people/me/connections?personFields=phoneNumbers,names&pageSize=100";

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleProvider;

impl OAuthProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn authorize_url(&self) -> &str {
        AUTHORIZE_URL
    }

    fn token_url(&self) -> &str {
        TOKEN_URL
    }

    fn default_scope(&self) -> &str {
        DEFAULT_SCOPE
    }

    fn authorize_params(&self) -> Vec<(String, String)> {
        AUTHORIZE_PARAMS
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn client_auth(&self) -> ClientAuth {
        ClientAuth::Form
    }
}

/// Identity fields of interest from the ID token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    pub name: Option<String>,
    pub email: Option<String>,
    pub sub: Option<String>,
    pub email_verified: Option<bool>,
}

/// Decodes the middle segment of a three-part ID token without verifying the
/// signature. Failure is logged and yields `None`; the flow continues with
/// identity fields absent.
pub fn decode_id_token_claims(id_token: &str) -> Option<IdTokenClaims> {
    let parts: Vec<&str> = id_token.split('.').collect();
    if parts.len() != 3 {
        warn!("id_token does not look like a standard JWT");
        return None;
    }

    // base64url segments come unpadded; pad back to a multiple of 4.
    let mut payload = parts[1].trim_end_matches('=').to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let decoded = match URL_SAFE.decode(payload.as_bytes()) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "failed to base64-decode id_token payload");
            return None;
        }
    };

    match serde_json::from_slice(&decoded) {
        Ok(claims) => Some(claims),
        Err(err) => {
            warn!(%err, "failed to parse id_token payload as JSON");
            None
        }
    }
}

/// Best-effort phone lookup: the user's own profile record first, then the
/// first contact in the connections list exposing a phone number. Any failure
/// or empty result yields `None` without aborting the flow.
pub async fn discover_phone(http: &Client, access_token: &str) -> Option<String> {
    discover_phone_at(http, PEOPLE_API_BASE, access_token).await
}

pub(crate) async fn discover_phone_at(
    http: &Client,
    base_url: &str,
    access_token: &str,
) -> Option<String> {
    if let Some(phone) = fetch_json(http, &format!("{base_url}{PROFILE_PATH}"), access_token)
        .await
        .as_ref()
        .and_then(profile_phone)
    {
        info!(%phone, "phone number found on profile record");
        return Some(phone);
    }

    debug!("no phone on profile record, scanning connections");
    let phone = fetch_json(http, &format!("{base_url}{CONNECTIONS_PATH}"), access_token)
        .await
        .as_ref()
        .and_then(first_connection_phone);

    match &phone {
        Some(phone) => info!(%phone, "phone number found in connections"),
        None => warn!("no phone number available from Google"),
    }
    phone
}

async fn fetch_json(http: &Client, url: &str, access_token: &str) -> Option<Value> {
    let response = match http.get(url).bearer_auth(access_token).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(%err, url, "People API request failed");
            return None;
        }
    };
    if !response.status().is_success() {
        warn!(status = response.status().as_u16(), url, "People API returned an error");
        return None;
    }
    response.json().await.ok()
}

pub(crate) fn profile_phone(value: &Value) -> Option<String> {
    value
        .get("phoneNumbers")?
        .get(0)?
        .get("value")?
        .as_str()
        .map(str::to_string)
}

pub(crate) fn first_connection_phone(value: &Value) -> Option<String> {
    value
        .get("connections")?
        .as_array()?
        .iter()
        .find_map(|connection| {
            connection
                .get("phoneNumbers")?
                .get(0)?
                .get("value")?
                .as_str()
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encode_id_token(payload: &Value) -> String {
        use base64::Engine as _;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn decodes_unpadded_id_token_payload() {
        let token = encode_id_token(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "sub": "12345",
            "email_verified": true
        }));
        let claims = decode_id_token_claims(&token).unwrap();
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.sub.as_deref(), Some("12345"));
        assert_eq!(claims.email_verified, Some(true));
    }

    #[test]
    fn malformed_id_token_yields_none() {
        assert!(decode_id_token_claims("not-a-jwt").is_none());
        assert!(decode_id_token_claims("a.!!!.c").is_none());
    }

    #[test]
    fn profile_phone_reads_first_entry() {
        let value = json!({"phoneNumbers": [{"value": "+34600111222"}, {"value": "+34999999999"}]});
        assert_eq!(profile_phone(&value).as_deref(), Some("+34600111222"));
        assert_eq!(profile_phone(&json!({"phoneNumbers": []})), None);
        assert_eq!(profile_phone(&json!({})), None);
    }

    #[test]
    fn first_connection_with_phone_wins_in_list_order() {
        let value = json!({"connections": [
            {"names": [{"displayName": "No Phone"}]},
            {"phoneNumbers": [{"value": "+34660360318"}]},
            {"phoneNumbers": [{"value": "+34111111111"}]}
        ]});
        assert_eq!(
            first_connection_phone(&value).as_deref(),
            Some("+34660360318")
        );
    }

    #[tokio::test]
    async fn falls_back_from_profile_to_connections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/people/me"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/people/me/connections"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "connections": [
                    {"names": [{"displayName": "No Phone"}]},
                    {"phoneNumbers": [{"value": "+34660360318"}]}
                ]
            })))
            .mount(&server)
            .await;

        let phone = discover_phone_at(&Client::new(), &server.uri(), "tok").await;
        assert_eq!(phone.as_deref(), Some("+34660360318"));
    }

    #[tokio::test]
    async fn discovery_failures_are_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let phone = discover_phone_at(&Client::new(), &server.uri(), "tok").await;
        assert_eq!(phone, None);
    }
}
