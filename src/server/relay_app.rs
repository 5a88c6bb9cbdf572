//! Flow A: the gateway relay UI. One session per server process; each send
//! acquires a fresh token, relays the prompt, and moves exactly one counter.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;
use tracing::{error, warn};

use crate::Error;
use crate::config::{ProviderConfig, RelayConfig};
use crate::counters::SessionCounters;
use crate::pages;
use crate::relay::{RelayOutcome, relay};
use crate::token::acquire;

pub const DEFAULT_QUESTION: &str = "Who are you?";

/// UI session state: counters plus the last response per provider. Reset by
/// restarting the server.
#[derive(Debug, Default)]
pub struct RelaySession {
    pub counters: SessionCounters,
    pub last_response: BTreeMap<String, String>,
}

#[derive(Clone)]
struct RelayState {
    config: Arc<RelayConfig>,
    session: Arc<Mutex<RelaySession>>,
}

pub fn relay_router(config: RelayConfig) -> Router {
    let session = RelaySession {
        counters: SessionCounters::new(config.provider_keys()),
        last_response: BTreeMap::new(),
    };
    let state = RelayState {
        config: Arc::new(config),
        session: Arc::new(Mutex::new(session)),
    };
    Router::new()
        .route("/", get(index))
        .route("/send", post(send))
        .with_state(state)
}

async fn index(State(state): State<RelayState>) -> Html<String> {
    let providers = state.config.provider_keys();
    let selected = providers.first().cloned().unwrap_or_default();
    Html(render(&state, &providers, &selected, DEFAULT_QUESTION))
}

#[derive(Debug, Deserialize)]
struct SendForm {
    provider: String,
    prompt: String,
}

async fn send(State(state): State<RelayState>, Form(form): Form<SendForm>) -> Html<String> {
    let providers = state.config.provider_keys();
    let Some(provider) = state.config.providers.get(&form.provider).cloned() else {
        return Html(pages::error_page(
            "AI Gateway Relay",
            &format!("Unknown provider: {}", form.provider),
            None,
        ));
    };

    let result = run_relay(&provider, &form.prompt).await;
    {
        let mut session = state.session.lock().expect("relay session lock poisoned");
        apply_result(&mut session, &form.provider, result);
    }

    Html(render(&state, &providers, &form.provider, &form.prompt))
}

fn render(state: &RelayState, providers: &[String], selected: &str, prompt: &str) -> String {
    let session = state.session.lock().expect("relay session lock poisoned");
    pages::relay_page(
        providers,
        &session.counters,
        selected,
        prompt,
        session.last_response.get(selected).map(String::as_str),
    )
}

async fn run_relay(provider: &ProviderConfig, prompt: &str) -> Result<RelayOutcome, Error> {
    if provider.insecure_skip_tls_verify {
        warn!("TLS certificate verification disabled for this provider");
    }
    let http = reqwest::Client::builder()
        .danger_accept_invalid_certs(provider.insecure_skip_tls_verify)
        .build()?;

    let token = acquire(
        &http,
        &provider.token_url,
        &provider.consumer_key,
        &provider.consumer_secret,
    )
    .await?;

    relay(
        &http,
        &provider.gateway_url,
        &token.token,
        prompt,
        &provider.model,
    )
    .await
}

/// Maps a finished call onto the session: a completed gateway call moves
/// exactly one counter; a clean token rejection (non-200 or a 200 without a
/// token) halts the request without touching either counter; anything that
/// throws mid-flight, an unparseable token body included, counts as an error.
fn apply_result(session: &mut RelaySession, provider: &str, result: Result<RelayOutcome, Error>) {
    let text = match result {
        Ok(RelayOutcome::Success { text }) => {
            session.counters.record_success(provider);
            text
        }
        Ok(RelayOutcome::Failure { text }) => {
            session.counters.record_error(provider);
            text
        }
        Err(Error::HttpStatus { status, body }) => {
            error!(status, "token request failed");
            format!("Error obtaining token. Status: {status}\nServer response: {body}")
        }
        Err(Error::NoAccessToken { body }) => {
            error!("token endpoint returned no access token");
            format!("Could not obtain access token.\nServer response: {body}")
        }
        Err(err) => {
            error!(%err, "request failed in flight");
            session.counters.record_error(provider);
            format!("Error making API request: {err}")
        }
    };
    session.last_response.insert(provider.to_string(), text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> RelaySession {
        RelaySession {
            counters: SessionCounters::new(["openai".to_string()]),
            last_response: BTreeMap::new(),
        }
    }

    #[test]
    fn success_moves_only_the_success_counter() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Ok(RelayOutcome::Success {
                text: "hi".to_string(),
            }),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (1, 0));
        assert_eq!(session.last_response["openai"], "hi");
    }

    #[test]
    fn gateway_failure_moves_only_the_error_counter() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Ok(RelayOutcome::Failure {
                text: "blocked".to_string(),
            }),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (0, 1));
    }

    #[test]
    fn token_rejection_touches_no_counter() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Err(Error::HttpStatus {
                status: 401,
                body: "denied".to_string(),
            }),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (0, 0));
        assert!(session.last_response["openai"].contains("Status: 401"));
    }

    #[test]
    fn missing_token_touches_no_counter() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Err(Error::NoAccessToken {
                body: "{}".to_string(),
            }),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (0, 0));
        assert!(session.last_response["openai"].contains("Could not obtain access token."));
    }

    #[test]
    fn unparseable_token_body_counts_as_error() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Err(Error::InvalidResponse {
                message: "expected value at line 1 column 1".to_string(),
                body: "<html>gateway timeout</html>".to_string(),
            }),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (0, 1));
        assert!(session.last_response["openai"].starts_with("Error making API request:"));
    }

    #[test]
    fn transport_error_counts_as_error() {
        let mut session = session();
        apply_result(
            &mut session,
            "openai",
            Err(Error::Config("connection reset".to_string())),
        );
        let tally = session.counters.tally("openai");
        assert_eq!((tally.success, tally.error), (0, 1));
        assert!(session.last_response["openai"].starts_with("Error making API request:"));
    }
}
