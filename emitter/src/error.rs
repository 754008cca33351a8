/// Error returned when a subscription is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// The event already holds `max` listeners.
    MaxListenersExceeded { event: String, max: usize },
}

impl std::fmt::Display for EmitterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitterError::MaxListenersExceeded { event, max } => {
                write!(f, "Max listeners ({max}) reached for event '{event}'")
            }
        }
    }
}

impl std::error::Error for EmitterError {}
