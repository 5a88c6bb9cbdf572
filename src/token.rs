use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::Error;

/// A bearer token obtained from an OAuth token endpoint.
///
/// Tokens live only for the duration of the request that acquired them; there
/// is no caching or refresh.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientCredentialsResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    scope: Option<String>,
}

/// Exchanges client credentials for a bearer token
/// (`grant_type=client_credentials`, credentials via HTTP Basic auth).
///
/// Non-200 responses and 200 responses without a usable `access_token` are
/// both surfaced immediately; there is no retry.
pub async fn acquire(
    http: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken, Error> {
    debug!(token_url, client_id, "requesting client-credentials token");
    let response = http
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), %body, "token endpoint responded");

    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ClientCredentialsResponse =
        serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
            message: err.to_string(),
            body: body.clone(),
        })?;

    if parsed.access_token.is_empty() {
        return Err(Error::NoAccessToken { body });
    }

    Ok(AccessToken {
        token: parsed.access_token,
        scope: parsed.scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn token_server(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn returns_token_on_success() {
        let server = token_server(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "abc", "scope": "default"})),
        )
        .await;
        let token = acquire(
            &Client::new(),
            &format!("{}/token", server.uri()),
            "key",
            "secret",
        )
        .await
        .unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.scope.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn empty_access_token_is_an_error() {
        let server =
            token_server(ResponseTemplate::new(200).set_body_json(json!({"access_token": ""})))
                .await;
        let err = acquire(
            &Client::new(),
            &format!("{}/token", server.uri()),
            "key",
            "secret",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NoAccessToken { .. }));
    }

    #[tokio::test]
    async fn missing_access_token_is_an_error() {
        let server = token_server(ResponseTemplate::new(200).set_body_json(json!({}))).await;
        let err = acquire(
            &Client::new(),
            &format!("{}/token", server.uri()),
            "key",
            "secret",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NoAccessToken { .. }));
    }

    #[tokio::test]
    async fn non_200_carries_status_and_body() {
        let server =
            token_server(ResponseTemplate::new(401).set_body_string("invalid credentials")).await;
        let err = acquire(
            &Client::new(),
            &format!("{}/token", server.uri()),
            "key",
            "secret",
        )
        .await
        .unwrap_err();
        match err {
            Error::HttpStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
