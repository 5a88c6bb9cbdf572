//! Two proof-of-concept demos sharing one OAuth toolbox.
//!
//! Flow A relays chat prompts to an LLM gateway behind an OAuth2
//! client-credentials grant and tracks per-provider success/error counters.
//! Flow B chains a Google Sign-In (authorization code, form-embedded secret)
//! into a telecom Number Verification flow (authorization code, Basic auth),
//! rendering raw diagnostics at every step.

mod config;
mod counters;
mod error;
mod oauth;
mod pages;
mod providers;
mod relay;
mod server;
mod token;

pub use config::{ProviderConfig, REQUIRED_PROVIDER_FIELDS, RelayConfig, VerifyConfig};
pub use counters::{ProviderTally, SessionCounters};
pub use error::Error;
pub use oauth::{AuthCodeClient, CallbackOutcome, ClientCredentials, TokenResponse, is_callback};
pub use providers::{
    ClientAuth, GoogleProvider, IdTokenClaims, OAuthProvider, TelefonicaProvider,
    VerificationOutcome, decode_id_token_claims, discover_phone, normalize_phone, verify_number,
};
pub use relay::{BLOCK_REASON_EXTRACTORS, POLICY_BLOCK_CODE, RelayOutcome, block_reason, relay};
pub use server::{RelaySession, VerifySession, relay_router, verify_router};
pub use token::{AccessToken, acquire};
