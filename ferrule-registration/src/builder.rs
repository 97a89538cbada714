use std::sync::Arc;

use crate::{
    backend::RegistrationBackend,
    lifetime::Lifetime,
    service_id::ServiceId,
    settings::RegistrationSettings,
    trace::{SharedTraceSink, format_register_line},
};

/// Accumulates a registration request (interceptor chain and lifetime) and
/// resolves it against a backend when one of the `register_*` methods is
/// called.
///
/// Every mutator works on the same configuration and returns it again, so
/// calls chain:
///
/// ```
/// use ferrule_registration::{
///     builder::RegistrationConfig, registry::ComponentRegistry,
///     trace::{MemorySink, SharedTraceSink},
/// };
/// use std::sync::Arc;
///
/// trait Widget {}
/// struct WidgetImpl;
/// struct LoggingInterceptor;
/// struct CachingInterceptor;
///
/// let registry = ComponentRegistry::default();
/// let sink = Arc::new(MemorySink::new());
/// let trace: SharedTraceSink = sink.clone();
///
/// RegistrationConfig::for_interceptor::<LoggingInterceptor>(&registry)
///     .add_interceptor::<CachingInterceptor>()
///     .per_scope()
///     .register_as::<WidgetImpl, dyn Widget>(None, &trace)
///     .unwrap();
///
/// assert_eq!(sink.len(), 1);
/// ```
///
/// The `register_*` methods borrow the configuration, so one configuration may
/// register several components with the same interceptors and lifetime.
pub struct RegistrationConfig<'a, B: ?Sized + RegistrationBackend> {
    backend: &'a B,
    interceptors: Vec<ServiceId>,
    lifetime: Lifetime,
}

impl<'a, B: ?Sized + RegistrationBackend> RegistrationConfig<'a, B> {
    /// A configuration with no interceptors and a per-request lifetime.
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            interceptors: Vec::new(),
            lifetime: Lifetime::default(),
        }
    }

    pub fn for_interceptor<T: ?Sized + 'static>(backend: &'a B) -> Self {
        Self::with_interceptor(backend, ServiceId::of::<T>())
    }

    pub fn with_interceptor(backend: &'a B, interceptor: ServiceId) -> Self {
        Self::with_interceptors(backend, [interceptor])
    }

    pub fn with_interceptors(
        backend: &'a B,
        interceptors: impl IntoIterator<Item = ServiceId>,
    ) -> Self {
        Self {
            backend,
            interceptors: interceptors.into_iter().collect(),
            lifetime: Lifetime::default(),
        }
    }

    /// Same backend, an independent copy of the interceptors, and the lifetime
    /// reset to [`Lifetime::PerRequest`].
    #[must_use]
    pub fn copy_resetting_lifetime(&self) -> Self {
        Self::with_interceptors(self.backend, self.interceptors.iter().copied())
    }

    /// Same backend, an independent copy of the interceptors, same lifetime.
    #[must_use]
    pub fn copy_keeping_lifetime(&self) -> Self {
        let mut copy = self.copy_resetting_lifetime();
        copy.lifetime = self.lifetime;
        copy
    }

    pub fn add_interceptor<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.add_interceptor_id(ServiceId::of::<T>())
    }

    /// Alias of [`add_interceptor`](Self::add_interceptor) that reads well in
    /// a chain.
    pub fn and<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.add_interceptor::<T>()
    }

    pub fn add_interceptor_id(&mut self, interceptor: ServiceId) -> &mut Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn add_interceptors(
        &mut self,
        interceptors: impl IntoIterator<Item = ServiceId>,
    ) -> &mut Self {
        self.interceptors.extend(interceptors);
        self
    }

    pub fn with_lifetime(&mut self, lifetime: Lifetime) -> &mut Self {
        self.lifetime = lifetime;
        self
    }

    pub fn per_request(&mut self) -> &mut Self {
        self.with_lifetime(Lifetime::PerRequest)
    }

    pub fn per_scope(&mut self) -> &mut Self {
        self.with_lifetime(Lifetime::PerScope)
    }

    pub fn single_instance(&mut self) -> &mut Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    pub fn backend(&self) -> &'a B {
        self.backend
    }

    pub fn interceptors(&self) -> &[ServiceId] {
        &self.interceptors
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Registers component `C` as service `I`, optionally also under `name`.
    /// Returns the backend so further registrations can follow.
    pub fn register_as<C, I>(
        &self,
        name: Option<&str>,
        trace: &SharedTraceSink,
    ) -> Result<&'a B, B::Error>
    where
        C: 'static,
        I: ?Sized + 'static,
    {
        self.register_component(
            ServiceId::of::<C>(),
            Some(ServiceId::of::<I>()),
            name,
            trace,
        )
    }

    /// Registers component `C` as itself.
    pub fn register_as_self<C: 'static>(&self, trace: &SharedTraceSink) -> Result<&'a B, B::Error> {
        self.register_component(ServiceId::of::<C>(), None, None, trace)
    }

    /// Registers `component`, exposed as `service` or as itself when no service
    /// is given. An empty `name` counts as no name. Backend errors are
    /// returned as-is and nothing already issued is undone.
    pub fn register_component(
        &self,
        component: ServiceId,
        service: Option<ServiceId>,
        name: Option<&str>,
        trace: &SharedTraceSink,
    ) -> Result<&'a B, B::Error> {
        tracing::debug!(
            %component,
            service = service.map(|s| s.name()),
            name,
            interceptors = self.interceptors.len(),
            lifetime = %self.lifetime,
            "registering component"
        );

        let backend = self.backend;
        let id = backend.begin(component)?;
        if let Some(service) = service {
            backend.bind_service(id, service)?;
        }
        backend.enable_interception(id)?;
        backend.intercept_with(id, &self.interceptors)?;

        let sink = Arc::clone(trace);
        backend.on_registered(
            id,
            Box::new(move |registration| sink.write_line(&format_register_line(registration))),
        )?;

        if let Some(scope) = self.lifetime.scope() {
            backend.apply_scope(id, scope)?;
        }
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            backend.bind_name(id, name, service.unwrap_or(component))?;
        }
        backend.complete(id)?;
        Ok(backend)
    }
}

impl<B: ?Sized + RegistrationBackend> Clone for RegistrationConfig<'_, B> {
    fn clone(&self) -> Self {
        self.copy_keeping_lifetime()
    }
}

impl<B: ?Sized + RegistrationBackend> std::fmt::Debug for RegistrationConfig<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationConfig")
            .field("interceptors", &self.interceptors)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Entry points for building registrations directly off a backend.
pub trait RegistrationExt: RegistrationBackend {
    fn registration(&self) -> RegistrationConfig<'_, Self> {
        RegistrationConfig::new(self)
    }

    fn intercepted_by<T: ?Sized + 'static>(&self) -> RegistrationConfig<'_, Self> {
        RegistrationConfig::for_interceptor::<T>(self)
    }

    fn intercepted_by_with_lifetime<T: ?Sized + 'static>(
        &self,
        lifetime: Lifetime,
    ) -> RegistrationConfig<'_, Self> {
        let mut config = RegistrationConfig::for_interceptor::<T>(self);
        config.with_lifetime(lifetime);
        config
    }

    /// A configuration with no interceptors and the configured default lifetime.
    fn configured(&self, settings: &RegistrationSettings) -> RegistrationConfig<'_, Self> {
        let mut config = RegistrationConfig::new(self);
        config.with_lifetime(settings.default_lifetime());
        config
    }
}

impl<B: ?Sized + RegistrationBackend> RegistrationExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log::Level, registry::ComponentRegistry, trace::MemorySink};

    trait Widget {}
    struct WidgetImpl;
    struct LoggingInterceptor;
    struct CachingInterceptor;
    struct AuditInterceptor;

    fn id<T: ?Sized + 'static>() -> ServiceId {
        ServiceId::of::<T>()
    }

    fn memory_trace() -> (Arc<MemorySink>, SharedTraceSink) {
        let sink = Arc::new(MemorySink::new());
        let trace: SharedTraceSink = sink.clone();
        (sink, trace)
    }

    #[test]
    fn construction_defaults() {
        let registry = ComponentRegistry::default();
        let plain = RegistrationConfig::new(&registry);
        assert!(plain.interceptors().is_empty());
        assert_eq!(plain.lifetime(), Lifetime::PerRequest);

        let single = RegistrationConfig::for_interceptor::<LoggingInterceptor>(&registry);
        assert_eq!(single.interceptors(), &[id::<LoggingInterceptor>()]);
        assert_eq!(single.lifetime(), Lifetime::PerRequest);
    }

    #[test]
    fn interceptors_are_appended_in_call_order() {
        let registry = ComponentRegistry::default();
        let mut config =
            RegistrationConfig::with_interceptors(&registry, [id::<AuditInterceptor>()]);
        config
            .add_interceptor::<LoggingInterceptor>()
            .add_interceptors([id::<CachingInterceptor>(), id::<LoggingInterceptor>()])
            .and::<AuditInterceptor>();

        assert_eq!(
            config.interceptors(),
            &[
                id::<AuditInterceptor>(),
                id::<LoggingInterceptor>(),
                id::<CachingInterceptor>(),
                id::<LoggingInterceptor>(),
                id::<AuditInterceptor>(),
            ]
        );
    }

    #[test]
    fn last_lifetime_wins() {
        let registry = ComponentRegistry::default();
        let mut config = registry.registration();
        config.single_instance().per_scope().with_lifetime(Lifetime::Singleton);
        assert_eq!(config.lifetime(), Lifetime::Singleton);
        config.per_request();
        assert_eq!(config.lifetime(), Lifetime::PerRequest);
    }

    #[test]
    fn copies_do_not_share_interceptors() {
        let registry = ComponentRegistry::default();
        let mut original = registry.intercepted_by::<LoggingInterceptor>();
        original.per_scope();

        let mut copy = original.copy_resetting_lifetime();
        assert_eq!(copy.interceptors(), original.interceptors());
        assert_eq!(copy.lifetime(), Lifetime::PerRequest);

        copy.add_interceptor::<CachingInterceptor>();
        original.add_interceptor::<AuditInterceptor>();
        assert_eq!(
            original.interceptors(),
            &[id::<LoggingInterceptor>(), id::<AuditInterceptor>()]
        );
        assert_eq!(
            copy.interceptors(),
            &[id::<LoggingInterceptor>(), id::<CachingInterceptor>()]
        );
        assert!(std::ptr::eq(copy.backend(), original.backend()));
    }

    #[test]
    fn copy_keeping_lifetime_carries_lifetime() {
        let registry = ComponentRegistry::default();
        let original = registry.intercepted_by_with_lifetime::<LoggingInterceptor>(Lifetime::Singleton);
        assert_eq!(original.copy_keeping_lifetime().lifetime(), Lifetime::Singleton);
        assert_eq!(original.clone().lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn configured_uses_the_default_lifetime() {
        let registry = ComponentRegistry::default();
        let settings = RegistrationSettings::new(Lifetime::PerScope, Level::Off);
        let config = registry.configured(&settings);
        assert_eq!(config.lifetime(), Lifetime::PerScope);
        assert!(config.interceptors().is_empty());
    }

    #[test]
    fn register_as_records_the_accumulated_state() {
        let registry = ComponentRegistry::default();
        let (sink, trace) = memory_trace();

        let backend = registry
            .intercepted_by::<LoggingInterceptor>()
            .and::<CachingInterceptor>()
            .single_instance()
            .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
            .unwrap();
        assert!(std::ptr::eq(backend, &registry));

        let registration = registry.resolve_named_of::<dyn Widget>("primary").unwrap();
        assert_eq!(registration.component(), id::<WidgetImpl>());
        assert!(registration.interception_enabled());
        assert_eq!(
            registration.interceptors(),
            &[id::<LoggingInterceptor>(), id::<CachingInterceptor>()]
        );
        assert_eq!(
            registration.scope(),
            Some(crate::lifetime::InstanceScope::SingleInstance)
        );

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("<<<REGISTER>>> "));
        assert!(lines[0].contains("WidgetImpl"));
    }

    #[test]
    fn register_as_self_exposes_the_component() {
        let registry = ComponentRegistry::default();
        let (sink, trace) = memory_trace();
        registry
            .registration()
            .register_as_self::<WidgetImpl>(&trace)
            .unwrap();

        let registration = registry.resolve_of::<WidgetImpl>().unwrap();
        assert_eq!(registration.services(), &[id::<WidgetImpl>()]);
        assert!(registration.interceptors().is_empty());
        assert_eq!(registration.scope(), None);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn empty_name_is_treated_as_absent() {
        let registry = ComponentRegistry::default();
        let (_, trace) = memory_trace();
        registry
            .registration()
            .register_as::<WidgetImpl, dyn Widget>(Some(""), &trace)
            .unwrap();
        let registration = registry.resolve_of::<dyn Widget>().unwrap();
        assert!(registration.names().is_empty());
    }

    #[test]
    fn one_configuration_can_register_several_components() {
        struct GadgetImpl;
        let registry = ComponentRegistry::default();
        let (sink, trace) = memory_trace();
        let mut config = registry.intercepted_by::<AuditInterceptor>();
        config.per_scope();
        config
            .register_as::<WidgetImpl, dyn Widget>(None, &trace)
            .unwrap();
        config.register_as_self::<GadgetImpl>(&trace).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(sink.len(), 2);
        for registration in registry.registrations() {
            assert_eq!(registration.interceptors(), &[id::<AuditInterceptor>()]);
        }
    }

    #[test]
    fn backend_errors_are_returned_unchanged() {
        let registry = ComponentRegistry::default();
        let (sink, trace) = memory_trace();
        registry
            .registration()
            .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
            .unwrap();

        let err = registry
            .registration()
            .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::RegistrationError::DuplicateName { .. }
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn failed_registrations_do_not_hold_the_trace_sink() {
        let registry = ComponentRegistry::default();
        let (sink, trace) = memory_trace();
        let config = registry.registration();
        config
            .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
            .unwrap();

        for _ in 0..5 {
            config
                .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)
                .unwrap_err();
        }

        // `sink` and `trace` are the only owners left
        assert_eq!(Arc::strong_count(&sink), 2);
        assert_eq!(sink.len(), 1);
    }
}
