use thiserror::Error;

/// Error taxonomy for a discovery run.
///
/// Only [`DiscoveryError::Configuration`] is fatal to a whole run. Everything
/// else is scoped to a single probe or query: validation failures reject that
/// one call, and timeouts/transport failures degrade to empty results inside
/// the components themselves, so they rarely surface through a `Result` at
/// all.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport Error: {0}")]
    Transport(String),
}

impl DiscoveryError {
    /// Whether this error should abort the whole run rather than just the
    /// call that produced it.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, DiscoveryError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_are_run_fatal() {
        assert!(DiscoveryError::Configuration("no interface".into()).is_run_fatal());
        assert!(!DiscoveryError::Validation("bad address".into()).is_run_fatal());
        assert!(!DiscoveryError::Timeout("ping".into()).is_run_fatal());
        assert!(!DiscoveryError::Transport("spawn failed".into()).is_run_fatal());
    }
}
