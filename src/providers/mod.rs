mod google;
mod provider;
mod telefonica;

pub use google::{GoogleProvider, IdTokenClaims, decode_id_token_claims, discover_phone};
pub use provider::{ClientAuth, OAuthProvider};
pub use telefonica::{TelefonicaProvider, VerificationOutcome, normalize_phone, verify_number};
