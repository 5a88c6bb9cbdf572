use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Error;
use crate::providers::{ClientAuth, OAuthProvider};

/// Client id/secret plus the redirect the provider sends the browser back to.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Tokens returned by an authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    pub id_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Authorization-code client shared by both providers; the only per-provider
/// variation in the token step is how the client credentials travel
/// ([`ClientAuth`]).
#[derive(Debug, Clone)]
pub struct AuthCodeClient<P: OAuthProvider> {
    provider: P,
    credentials: ClientCredentials,
    http: Client,
}

impl<P: OAuthProvider> AuthCodeClient<P> {
    pub fn new(provider: P, credentials: ClientCredentials, http: Client) -> Self {
        Self {
            provider,
            credentials,
            http,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Builds the authorize redirect URL:
    /// `response_type=code&client_id=...&redirect_uri=...&scope=...[&state=...]`
    /// plus any provider-specific extras.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String, Error> {
        let mut url = Url::parse(self.provider.authorize_url())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", &self.credentials.client_id);
            pairs.append_pair("redirect_uri", &self.credentials.redirect_uri);
            pairs.append_pair("scope", self.provider.default_scope());
            if let Some(state) = state {
                pairs.append_pair("state", state);
            }
            for (key, value) in self.provider.authorize_params() {
                pairs.append_pair(&key, &value);
            }
        }
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for tokens. A 200 without a usable
    /// `access_token` is an error, same as the client-credentials grant.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let mut payload: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.credentials.redirect_uri),
        ];

        let mut request = self.http.post(self.provider.token_url());
        match self.provider.client_auth() {
            ClientAuth::Basic => {
                request = request.basic_auth(
                    &self.credentials.client_id,
                    Some(&self.credentials.client_secret),
                );
            }
            ClientAuth::Form => {
                payload.push(("client_id", &self.credentials.client_id));
                payload.push(("client_secret", &self.credentials.client_secret));
            }
        }

        debug!(
            provider = self.provider.id(),
            token_url = self.provider.token_url(),
            "exchanging authorization code"
        );
        let response = request.form(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            provider = self.provider.id(),
            status = status.as_u16(),
            %body,
            "token endpoint responded"
        );

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: TokenResponse =
            serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
                message: err.to_string(),
                body: body.clone(),
            })?;

        if tokens.access_token.is_empty() {
            return Err(Error::NoAccessToken { body });
        }

        Ok(tokens)
    }
}
