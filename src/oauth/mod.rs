mod callback;
mod client;

pub use callback::{CallbackOutcome, is_callback};
pub use client::{AuthCodeClient, ClientCredentials, TokenResponse};
