mod relay_app;
mod verify_app;

pub use relay_app::{RelaySession, relay_router};
pub use verify_app::{VerifySession, verify_router};
