use std::collections::HashMap;

/// What an authorization redirect brought back.
///
/// `error` takes priority over `code`; a callback with neither is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Denied {
        error: String,
        description: Option<String>,
    },
    Code {
        code: String,
        state: Option<String>,
    },
    Malformed,
}

impl CallbackOutcome {
    pub fn classify(params: &HashMap<String, String>) -> Self {
        if let Some(error) = non_empty(params, "error") {
            return Self::Denied {
                error,
                description: non_empty(params, "error_description"),
            };
        }
        match non_empty(params, "code") {
            Some(code) => Self::Code {
                code,
                state: non_empty(params, "state"),
            },
            None => Self::Malformed,
        }
    }
}

/// True when the query parameters look like an OAuth redirect; the home route
/// doubles as the telecom redirect target and dispatches on this.
pub fn is_callback(params: &HashMap<String, String>) -> bool {
    non_empty(params, "code").is_some() || non_empty(params, "error").is_some()
}

fn non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
}
