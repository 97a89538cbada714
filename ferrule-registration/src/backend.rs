use std::fmt;

use crate::{lifetime::InstanceScope, service_id::ServiceId};

/// Handle to a registration that has been started on a backend but not yet
/// completed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Invoked by the backend once a registration has been completed.
pub type RegisteredCallback = Box<dyn FnOnce(&ComponentRegistration) + Send + Sync>;

/// A registration system that components can be bound into.
///
/// A [`RegistrationConfig`](crate::builder::RegistrationConfig) drives one
/// registration through these operations in a fixed order:
///
/// 1. [`begin`](Self::begin)
/// 2. [`bind_service`](Self::bind_service), when a service interface is given
/// 3. [`enable_interception`](Self::enable_interception)
/// 4. [`intercept_with`](Self::intercept_with)
/// 5. [`on_registered`](Self::on_registered)
/// 6. [`apply_scope`](Self::apply_scope), unless the lifetime is per-request
/// 7. [`bind_name`](Self::bind_name), when a name is given
/// 8. [`complete`](Self::complete)
///
/// Operations take `&self`. Many configurations may share a backend handle, so
/// any state the backend keeps lives behind its own interior mutability.
pub trait RegistrationBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts a registration for the given component.
    fn begin(&self, component: ServiceId) -> Result<RegistrationId, Self::Error>;

    /// Exposes the component as `service`.
    fn bind_service(&self, id: RegistrationId, service: ServiceId) -> Result<(), Self::Error>;

    fn enable_interception(&self, id: RegistrationId) -> Result<(), Self::Error>;

    /// Attaches interceptors. Their order is the order they are applied in.
    fn intercept_with(
        &self,
        id: RegistrationId,
        interceptors: &[ServiceId],
    ) -> Result<(), Self::Error>;

    fn on_registered(
        &self,
        id: RegistrationId,
        callback: RegisteredCallback,
    ) -> Result<(), Self::Error>;

    fn apply_scope(&self, id: RegistrationId, scope: InstanceScope) -> Result<(), Self::Error>;

    /// Additionally makes the component resolvable as `service` under `name`.
    fn bind_name(
        &self,
        id: RegistrationId,
        name: &str,
        service: ServiceId,
    ) -> Result<(), Self::Error>;

    /// Commits the registration. Completion callbacks run before this returns.
    fn complete(&self, id: RegistrationId) -> Result<(), Self::Error>;
}

/// Description of a registration as recorded by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRegistration {
    id: RegistrationId,
    component: ServiceId,
    services: Vec<ServiceId>,
    interception_enabled: bool,
    interceptors: Vec<ServiceId>,
    scope: Option<InstanceScope>,
    names: Vec<(String, ServiceId)>,
}

impl ComponentRegistration {
    pub fn new(id: RegistrationId, component: ServiceId) -> Self {
        Self {
            id,
            component,
            services: Vec::new(),
            interception_enabled: false,
            interceptors: Vec::new(),
            scope: None,
            names: Vec::new(),
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn component(&self) -> ServiceId {
        self.component
    }

    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    pub fn interception_enabled(&self) -> bool {
        self.interception_enabled
    }

    pub fn interceptors(&self) -> &[ServiceId] {
        &self.interceptors
    }

    pub fn scope(&self) -> Option<InstanceScope> {
        self.scope
    }

    /// Names the component is bound under, with the service each name exposes.
    pub fn names(&self) -> &[(String, ServiceId)] {
        &self.names
    }

    pub fn exposes(&self, service: ServiceId) -> bool {
        self.services.contains(&service)
    }

    pub fn is_named(&self, name: &str, service: ServiceId) -> bool {
        self.names.iter().any(|(n, s)| n == name && *s == service)
    }

    pub(crate) fn add_service(&mut self, service: ServiceId) {
        if !self.services.contains(&service) {
            self.services.push(service);
        }
    }

    pub(crate) fn enable_interception(&mut self) {
        self.interception_enabled = true;
    }

    pub(crate) fn extend_interceptors(&mut self, interceptors: &[ServiceId]) {
        self.interceptors.extend_from_slice(interceptors);
    }

    pub(crate) fn set_scope(&mut self, scope: InstanceScope) {
        self.scope = Some(scope);
    }

    pub(crate) fn add_name(&mut self, name: String, service: ServiceId) {
        self.names.push((name, service));
    }
}

impl fmt::Display for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Activator = {}, Services = [", self.component)?;
        write_joined(f, self.services.iter())?;
        let (lifetime, sharing) = match self.scope {
            None => ("PerRequest", "None"),
            Some(InstanceScope::LifetimeScope) => ("CurrentScope", "Shared"),
            Some(InstanceScope::SingleInstance) => ("RootScope", "Shared"),
        };
        write!(f, "], Lifetime = {lifetime}, Sharing = {sharing}")?;
        if self.interception_enabled {
            f.write_str(", Interceptors = [")?;
            write_joined(f, self.interceptors.iter())?;
            f.write_str("]")?;
        }
        if !self.names.is_empty() {
            f.write_str(", Names = [")?;
            write_joined(f, self.names.iter().map(|(name, _)| name))?;
            f.write_str("]")?;
        }
        Ok(())
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (index, item) in items.enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WidgetImpl;
    trait Widget {}
    struct LoggingInterceptor;

    #[test]
    fn description_lists_services_and_interceptors() {
        let mut registration =
            ComponentRegistration::new(RegistrationId::new(7), ServiceId::of::<WidgetImpl>());
        registration.add_service(ServiceId::of::<dyn Widget>());
        registration.enable_interception();
        registration.extend_interceptors(&[ServiceId::of::<LoggingInterceptor>()]);
        registration.set_scope(InstanceScope::SingleInstance);
        registration.add_name("primary".to_string(), ServiceId::of::<dyn Widget>());

        let description = registration.to_string();
        assert!(description.starts_with("Activator = "));
        assert!(description.contains("WidgetImpl"));
        assert!(description.contains("Services = [dyn "));
        assert!(description.contains("Lifetime = RootScope, Sharing = Shared"));
        assert!(description.contains("LoggingInterceptor]"));
        assert!(description.ends_with("Names = [primary]"));
    }

    #[test]
    fn services_are_not_duplicated() {
        let mut registration =
            ComponentRegistration::new(RegistrationId::new(1), ServiceId::of::<WidgetImpl>());
        registration.add_service(ServiceId::of::<dyn Widget>());
        registration.add_service(ServiceId::of::<dyn Widget>());
        assert_eq!(registration.services().len(), 1);
        assert!(registration.exposes(ServiceId::of::<dyn Widget>()));
        assert!(!registration.exposes(ServiceId::of::<WidgetImpl>()));
    }

    #[test]
    fn registration_id_displays_with_hash() {
        assert_eq!(RegistrationId::new(3).to_string(), "#3");
    }
}
