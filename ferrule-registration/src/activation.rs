use std::sync::RwLock;

use di::{
    Ref, ServiceDescriptor, ServiceProvider, scoped, singleton_as_self,
    transient_as_self,
};

use crate::{lifetime::Lifetime, log::Level};

/// Logger handed to services that can accept one.
pub trait Logger: Send + Sync {
    fn name(&self) -> &str;

    fn log(&self, level: Level, message: &str);
}

/// Forwards messages to `tracing`, tagged with the logger's name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Logger for TracingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: Level, message: &str) {
        let logger = self.name.as_str();
        match level {
            Level::Trace => tracing::trace!(logger, "{message}"),
            Level::Debug => tracing::debug!(logger, "{message}"),
            Level::Info => tracing::info!(logger, "{message}"),
            Level::Warn => tracing::warn!(logger, "{message}"),
            Level::Error => tracing::error!(logger, "{message}"),
            Level::Off => {}
        }
    }
}

/// Capability of accepting a logger after activation.
pub trait SetLogger {
    fn set_logger(&self, logger: Ref<dyn Logger>);
}

/// Implemented by services created through [`activated`]. Override the
/// capability queries for the capabilities the service has.
pub trait Activated: Send + Sync + 'static {
    fn as_set_logger(&self) -> Option<&dyn SetLogger> {
        None
    }
}

/// Holds the logger of a service. The latest logger set wins.
#[derive(Default)]
pub struct LoggerSlot {
    logger: RwLock<Option<Ref<dyn Logger>>>,
}

impl LoggerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Ref<dyn Logger>> {
        self.logger.read().ok().and_then(|logger| logger.clone())
    }

    /// Logs through the held logger; does nothing until one is set.
    pub fn log(&self, level: Level, message: &str) {
        if let Some(logger) = self.get() {
            logger.log(level, message);
        }
    }
}

impl SetLogger for LoggerSlot {
    fn set_logger(&self, logger: Ref<dyn Logger>) {
        if let Ok(mut slot) = self.logger.write() {
            *slot = Some(logger);
        }
    }
}

impl std::fmt::Debug for LoggerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerSlot")
            .field("logger", &self.get().map(|logger| logger.name().to_string()))
            .finish()
    }
}

pub type ActivationHook = Box<dyn Fn(&dyn Activated, &ServiceProvider) + Send + Sync>;

/// Hooks run against every instance created through [`activated`]. Set them up
/// once, next to the service collection, and share them between descriptors.
#[derive(Default)]
pub struct ActivationHooks {
    hooks: Vec<ActivationHook>,
}

impl ActivationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives every instance that can accept a logger the `dyn Logger`
    /// registered in the resolving provider. Instances are left alone when no
    /// logger is registered.
    #[must_use]
    pub fn with_logger_injection(mut self) -> Self {
        self.add(Box::new(|instance: &dyn Activated, provider: &ServiceProvider| {
            let Some(target) = instance.as_set_logger() else {
                return;
            };
            match provider.get::<dyn Logger>() {
                Some(logger) => target.set_logger(logger),
                None => tracing::debug!("no logger registered; skipping logger injection"),
            }
        }));
        self
    }

    pub fn add(&mut self, hook: ActivationHook) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook, in the order they were added.
    pub fn run(&self, instance: &dyn Activated, provider: &ServiceProvider) {
        for hook in &self.hooks {
            hook(instance, provider);
        }
    }
}

/// Describes `T` for a `more-di` service collection with the given lifetime.
/// Each instance the factory creates is passed through `hooks` before it is
/// handed out.
///
/// # Example
/// ```
/// use di::{Ref, ServiceCollection, singleton};
/// use ferrule_registration::{
///     activation::{activated, ActivationHooks, Activated, Logger, LoggerSlot, SetLogger, TracingLogger},
///     lifetime::Lifetime,
/// };
///
/// #[derive(Default)]
/// struct Orders {
///     logger: LoggerSlot,
/// }
///
/// impl Activated for Orders {
///     fn as_set_logger(&self) -> Option<&dyn SetLogger> {
///         Some(&self.logger)
///     }
/// }
///
/// let hooks = Ref::new(ActivationHooks::new().with_logger_injection());
/// let mut services = ServiceCollection::new();
/// services.add(singleton::<dyn Logger, TracingLogger>().from(|_| Ref::new(TracingLogger::new("orders"))));
/// services.add(activated::<Orders>(Lifetime::Singleton, hooks, |_| Orders::default()));
///
/// let provider = services.build_provider().unwrap();
/// let orders = provider.get_required::<Orders>();
/// assert!(orders.logger.get().is_some());
/// ```
pub fn activated<T>(
    lifetime: Lifetime,
    hooks: Ref<ActivationHooks>,
    factory: impl Fn(&ServiceProvider) -> T + Send + Sync + 'static,
) -> ServiceDescriptor
where
    T: Activated,
{
    let create = move |provider: &ServiceProvider| -> Ref<T> {
        let instance = Ref::new(factory(provider));
        hooks.run(&*instance, provider);
        instance
    };
    match lifetime {
        Lifetime::PerRequest => transient_as_self::<T>().from(create),
        Lifetime::PerScope => scoped::<T, T>().from(create),
        Lifetime::Singleton => singleton_as_self::<T>().from(create),
    }
}
