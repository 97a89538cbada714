use thiserror::Error;

use crate::{backend::RegistrationId, service_id::ServiceId};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("argument `{name}` is required")]
    MissingArgument { name: &'static str },

    #[error("registration {0} is unknown or has already been completed")]
    UnknownRegistration(RegistrationId),

    #[error("interceptors were attached to registration {0} before interception was enabled")]
    InterceptionNotEnabled(RegistrationId),

    #[error("a scope has already been applied to registration {0}")]
    ScopeAlreadyApplied(RegistrationId),

    #[error("registration {0} cannot be bound under an empty name")]
    EmptyName(RegistrationId),

    #[error("the name `{name}` is already bound for {service}")]
    DuplicateName { name: String, service: ServiceId },

    #[error("the registration backend lock was poisoned")]
    BackendPoisoned,

    #[error("unable to load config: {0}")]
    ConfigLoadError(#[from] config::ConfigError),

    #[error("unable to initialize tracing subscriber: {0}")]
    TracingSubscriberInitError(#[from] Box<dyn std::error::Error + Send + Sync>),
}
