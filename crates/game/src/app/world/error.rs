use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum WorldError {
    #[error("{kind} not found: {name}")]
    ResourceNotFound { kind: &'static str, name: String },
    #[error("malformed definition in {origin}: {message}")]
    MalformedDefinition { origin: String, message: String },
    #[error("transition to map '{target}' failed: {source}")]
    InvalidTransition {
        target: String,
        #[source]
        source: Box<WorldError>,
    },
}

impl WorldError {
    pub(crate) fn malformed(origin: &str, message: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            origin: origin.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn transition(target: &str, source: WorldError) -> Self {
        Self::InvalidTransition {
            target: target.to_string(),
            source: Box::new(source),
        }
    }
}
