use std::collections::BTreeMap;

/// Success/error tally for a single provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderTally {
    pub success: u64,
    pub error: u64,
}

/// Per-provider call counters, scoped to one UI session.
///
/// Exactly one of the two tallies moves per completed gateway call; the
/// counters reset only when the session (server process) restarts.
#[derive(Debug, Clone, Default)]
pub struct SessionCounters {
    counts: BTreeMap<String, ProviderTally>,
}

impl SessionCounters {
    /// Pre-seeds a zero tally for every known provider so the UI can render
    /// counters before the first call.
    pub fn new(providers: impl IntoIterator<Item = String>) -> Self {
        Self {
            counts: providers
                .into_iter()
                .map(|key| (key, ProviderTally::default()))
                .collect(),
        }
    }

    pub fn record_success(&mut self, provider: &str) {
        self.counts.entry(provider.to_string()).or_default().success += 1;
    }

    pub fn record_error(&mut self, provider: &str) {
        self.counts.entry(provider.to_string()).or_default().error += 1;
    }

    pub fn tally(&self, provider: &str) -> ProviderTally {
        self.counts.get(provider).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ProviderTally)> {
        self.counts.iter().map(|(key, tally)| (key.as_str(), *tally))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_increments_exactly_one_counter() {
        let mut counters = SessionCounters::new(["openai".to_string()]);
        counters.record_success("openai");
        assert_eq!(
            counters.tally("openai"),
            ProviderTally {
                success: 1,
                error: 0
            }
        );
    }

    #[test]
    fn error_increments_exactly_one_counter() {
        let mut counters = SessionCounters::new(["openai".to_string()]);
        counters.record_error("openai");
        counters.record_error("openai");
        assert_eq!(
            counters.tally("openai"),
            ProviderTally {
                success: 0,
                error: 2
            }
        );
    }

    #[test]
    fn providers_are_isolated() {
        let mut counters =
            SessionCounters::new(["openai".to_string(), "mistral".to_string()]);
        counters.record_success("openai");
        assert_eq!(counters.tally("mistral"), ProviderTally::default());
    }

    #[test]
    fn unknown_provider_reads_as_zero() {
        let counters = SessionCounters::new(Vec::new());
        assert_eq!(counters.tally("nope"), ProviderTally::default());
    }
}
