/// How client credentials travel on the token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// `Authorization: Basic <id:secret>` header.
    Basic,
    /// `client_id`/`client_secret` as form fields.
    Form,
}

pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &str;
    fn authorize_url(&self) -> &str;
    fn token_url(&self) -> &str;
    fn default_scope(&self) -> &str;

    fn authorize_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn client_auth(&self) -> ClientAuth {
        ClientAuth::Basic
    }
}
