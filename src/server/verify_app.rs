//! Flow B: Google Sign-In chained into the Number Verification flow. The home
//! route doubles as the telecom OAuth redirect target, so it dispatches on
//! callback query parameters before rendering the landing page.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use reqwest::Client;
use tracing::{error, info};

use crate::config::VerifyConfig;
use crate::oauth::{AuthCodeClient, CallbackOutcome, ClientCredentials, is_callback};
use crate::pages;
use crate::providers::{
    GoogleProvider, TelefonicaProvider, decode_id_token_claims, discover_phone, normalize_phone,
    verify_number,
};

/// Tokens and the discovered phone number survive between the Google callback
/// and the verification redirect, nothing longer.
#[derive(Debug, Default)]
pub struct VerifySession {
    pub google_token: Option<String>,
    pub google_phone: Option<String>,
}

#[derive(Clone)]
struct VerifyState {
    config: Arc<VerifyConfig>,
    http: Client,
    session: Arc<Mutex<VerifySession>>,
}

impl VerifyState {
    fn google_client(&self) -> AuthCodeClient<GoogleProvider> {
        AuthCodeClient::new(
            GoogleProvider,
            ClientCredentials {
                client_id: self.config.google_client_id.clone(),
                client_secret: self.config.google_client_secret.clone(),
                redirect_uri: self.config.google_redirect_uri.clone(),
            },
            self.http.clone(),
        )
    }

    fn telefonica_client(&self) -> AuthCodeClient<TelefonicaProvider> {
        AuthCodeClient::new(
            TelefonicaProvider {
                authorize_url: self.config.nv_authorize_url.clone(),
                token_url: self.config.nv_token_url.clone(),
                scope: self.config.nv_scope.clone(),
            },
            ClientCredentials {
                client_id: self.config.nv_client_id.clone(),
                client_secret: self.config.nv_client_secret.clone(),
                redirect_uri: self.config.nv_redirect_uri.clone(),
            },
            self.http.clone(),
        )
    }
}

pub fn verify_router(config: VerifyConfig) -> Router {
    let state = VerifyState {
        config: Arc::new(config),
        http: Client::new(),
        session: Arc::new(Mutex::new(VerifySession::default())),
    };
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/auth/google", get(google_auth))
        .route("/oauth2callback", get(google_callback))
        .route("/auth/number-verification-auto", get(verification_auto))
        .route("/frontend/number-verification", get(manual_verification))
        .route("/test-js", get(test_js))
        .route("/test/telefonica-authorize", get(telefonica_probe))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn google_auth(State(state): State<VerifyState>) -> Response {
    match state.google_client().authorization_url(None) {
        Ok(url) => {
            info!(%url, "redirecting to Google OAuth");
            Redirect::to(&url).into_response()
        }
        Err(err) => page(
            StatusCode::BAD_REQUEST,
            pages::error_page("Google Error", &format!("Could not build authorize URL: {err}"), None),
        ),
    }
}

async fn google_callback(
    State(state): State<VerifyState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    info!(?params, "Google callback received");
    let code = match CallbackOutcome::classify(&params) {
        CallbackOutcome::Denied { error, description } => {
            error!(%error, "Google denied the authorization");
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Google Error",
                    &format!("Google error: {error}"),
                    description.as_deref(),
                ),
            );
        }
        CallbackOutcome::Malformed => {
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page("Google Error", "Missing code parameter in callback.", None),
            );
        }
        CallbackOutcome::Code { code, .. } => code,
    };

    let tokens = match state.google_client().exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(%err, "Google token exchange failed");
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page("Google Error", &format!("Token error: {err}"), err.body()),
            );
        }
    };

    let claims = tokens
        .id_token
        .as_deref()
        .and_then(decode_id_token_claims)
        .unwrap_or_default();

    let phone = discover_phone(&state.http, &tokens.access_token).await;
    {
        let mut session = state.session.lock().expect("verify session lock poisoned");
        session.google_token = Some(tokens.access_token.clone());
        session.google_phone = phone.clone();
    }
    info!("Google login complete, token stored in session");

    page(
        StatusCode::OK,
        pages::google_success_page(
            &claims,
            phone.as_deref(),
            tokens.id_token.as_deref(),
            &tokens.access_token,
        ),
    )
}

async fn verification_auto(State(state): State<VerifyState>) -> Response {
    let phone = {
        let session = state.session.lock().expect("verify session lock poisoned");
        session.google_phone.clone()
    };
    let Some(phone) = phone else {
        return page(
            StatusCode::BAD_REQUEST,
            pages::error_page(
                "Error",
                "No phone number available from Google. Please use manual verification.",
                None,
            ),
        );
    };

    info!(%phone, "starting automatic verification");
    match state.telefonica_client().authorization_url(Some(&phone)) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => page(
            StatusCode::BAD_REQUEST,
            pages::error_page(
                "Number Verification Error",
                &format!("Could not build authorize URL: {err}"),
                None,
            ),
        ),
    }
}

async fn manual_verification(State(state): State<VerifyState>) -> Html<String> {
    Html(pages::manual_verification_page(
        &state.config.nv_client_id,
        &state.config.nv_scope,
        &state.config.nv_redirect_uri,
        &state.config.nv_authorize_url,
        &state.config.default_phone_number,
    ))
}

async fn test_js(State(state): State<VerifyState>) -> Html<String> {
    // Same client-side construction as the manual page, kept as a separate
    // scratch route for debugging redirect behavior.
    Html(pages::manual_verification_page(
        &state.config.nv_client_id,
        &state.config.nv_scope,
        &state.config.nv_redirect_uri,
        &state.config.nv_authorize_url,
        &state.config.default_phone_number,
    ))
}

/// Diagnostic: call the authorize endpoint directly (redirects disabled) and
/// dump whatever comes back.
async fn telefonica_probe(State(state): State<VerifyState>) -> Response {
    let url = match state
        .telefonica_client()
        .authorization_url(Some(&state.config.default_phone_number))
    {
        Ok(url) => url,
        Err(err) => {
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Test Error",
                    &format!("Could not build authorize URL: {err}"),
                    None,
                ),
            );
        }
    };

    let probe = match Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            return page(
                StatusCode::INTERNAL_SERVER_ERROR,
                pages::error_page("Test Error", &format!("Error: {err}"), None),
            );
        }
    };

    match probe.get(&url).header("accept", "application/json").send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let headers = format!("{:#?}", response.headers());
            let body = response.text().await.unwrap_or_default();
            info!(status, "authorize probe responded");
            page(
                StatusCode::OK,
                pages::authorize_probe_page(&url, status, &headers, &body),
            )
        }
        Err(err) => {
            error!(%err, "authorize probe failed");
            page(
                StatusCode::INTERNAL_SERVER_ERROR,
                pages::error_page("Test Error", &format!("Error: {err}"), None),
            )
        }
    }
}

async fn home(
    State(state): State<VerifyState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if is_callback(&params) {
        verification_callback(state, params).await
    } else {
        Html(pages::home_page().to_string()).into_response()
    }
}

async fn verification_callback(state: VerifyState, params: HashMap<String, String>) -> Response {
    info!(?params, "Number Verification callback received");
    let (code, state_param) = match CallbackOutcome::classify(&params) {
        CallbackOutcome::Denied { error, description } => {
            error!(%error, "Number Verification authorization failed");
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Number Verification Error",
                    &format!("Operator error: {error}"),
                    description.as_deref(),
                ),
            );
        }
        CallbackOutcome::Malformed => {
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Number Verification Error",
                    "Missing code parameter in callback.",
                    None,
                ),
            );
        }
        CallbackOutcome::Code { code, state } => (code, state),
    };

    let tokens = match state.telefonica_client().exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(%err, "Number Verification token exchange failed");
            return page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Number Verification Error",
                    &format!("Token error: {err}"),
                    err.body(),
                ),
            );
        }
    };

    // The phone number rides in the OAuth state parameter.
    let phone = normalize_phone(
        state_param
            .as_deref()
            .unwrap_or(&state.config.default_phone_number),
    );

    match verify_number(&state.http, &state.config.nv_verify_url, &tokens.access_token, &phone)
        .await
    {
        Ok(outcome) => page(StatusCode::OK, pages::verification_page(&phone, &outcome)),
        Err(err) => {
            error!(%err, "verification call failed");
            page(
                StatusCode::BAD_REQUEST,
                pages::error_page(
                    "Number Verification Error",
                    &format!("Verification error: {err}"),
                    err.body(),
                ),
            )
        }
    }
}

fn page(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}
