//! Fluent registration configuration for dependency-injection backends.
//!
//! A [`RegistrationConfig`] collects the interceptor chain and the
//! [`Lifetime`] of a component, then issues the registration against any
//! [`RegistrationBackend`]:
//!
//! ```
//! use ferrule_registration::{
//!     ComponentRegistry, Lifetime, MemorySink, RegistrationExt, SharedTraceSink,
//! };
//! use std::sync::Arc;
//!
//! trait Widget {}
//! struct WidgetImpl;
//! struct LoggingInterceptor;
//! struct CachingInterceptor;
//!
//! let registry = ComponentRegistry::default();
//! let trace: SharedTraceSink = Arc::new(MemorySink::new());
//!
//! registry
//!     .intercepted_by::<LoggingInterceptor>()
//!     .and::<CachingInterceptor>()
//!     .with_lifetime(Lifetime::Singleton)
//!     .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
//!     .unwrap();
//!
//! assert!(registry.resolve_named_of::<dyn Widget>("primary").is_some());
//! ```
//!
//! [`ComponentRegistry`] is an in-memory backend that records registrations.
//! For `more-di` service collections, [`activation::activated`] applies a
//! [`Lifetime`] and runs post-activation hooks such as logger injection.

pub mod activation;
pub mod backend;
pub mod builder;
pub mod error;
pub mod lifetime;
pub mod log;
pub mod registry;
pub mod service_id;
pub mod settings;
pub mod trace;
pub mod util;

pub use backend::{ComponentRegistration, RegistrationBackend, RegistrationId};
pub use builder::{RegistrationConfig, RegistrationExt};
pub use error::RegistrationError;
pub use lifetime::{InstanceScope, Lifetime};
pub use registry::ComponentRegistry;
pub use service_id::ServiceId;
pub use trace::{MemorySink, SharedTraceSink, TraceSink, TracingSink};
