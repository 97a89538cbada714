use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use typed_builder::TypedBuilder;

use crate::{
    backend::{ComponentRegistration, RegisteredCallback, RegistrationBackend, RegistrationId},
    error::RegistrationError,
    lifetime::InstanceScope,
    service_id::ServiceId,
};

/// In-memory [`RegistrationBackend`] that records registrations and answers
/// lookups by service and by name. It never constructs instances.
///
/// # Example
/// ```
/// use ferrule_registration::{
///     builder::RegistrationExt, registry::ComponentRegistry, service_id::ServiceId,
///     trace::{MemorySink, SharedTraceSink},
/// };
/// use std::sync::Arc;
///
/// trait Widget {}
/// struct WidgetImpl;
/// struct LoggingInterceptor;
///
/// let registry = ComponentRegistry::builder().build();
/// let trace: SharedTraceSink = Arc::new(MemorySink::new());
/// registry
///     .intercepted_by::<LoggingInterceptor>()
///     .per_scope()
///     .register_as::<WidgetImpl, dyn Widget>(None, &trace)
///     .unwrap();
///
/// let widget = registry.resolve(ServiceId::of::<dyn Widget>()).unwrap();
/// assert_eq!(widget.component(), ServiceId::of::<WidgetImpl>());
/// ```
#[derive(TypedBuilder)]
pub struct ComponentRegistry {
    /// Whether the same name may be bound twice for one service. When allowed,
    /// the latest binding wins.
    #[builder(default = false)]
    allow_duplicate_names: bool,

    #[builder(default, setter(skip))]
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    pending: HashMap<RegistrationId, PendingRegistration>,
    components: Vec<ComponentRegistration>,
    by_service: HashMap<ServiceId, Vec<usize>>,
    by_name: HashMap<(String, ServiceId), usize>,
}

impl RegistryState {
    /// Drops a registration that failed before completion, along with its
    /// callbacks.
    fn discard(&mut self, id: RegistrationId) {
        if self.pending.remove(&id).is_some() {
            tracing::debug!(%id, "registration discarded");
        }
    }
}

struct PendingRegistration {
    registration: ComponentRegistration,
    callbacks: Vec<RegisteredCallback>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("allow_duplicate_names", &self.allow_duplicate_names)
            .finish_non_exhaustive()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ComponentRegistry {
    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>, RegistrationError> {
        self.state
            .read()
            .map_err(|_| RegistrationError::BackendPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>, RegistrationError> {
        self.state
            .write()
            .map_err(|_| RegistrationError::BackendPoisoned)
    }

    fn with_pending<R>(
        &self,
        id: RegistrationId,
        f: impl FnOnce(&mut PendingRegistration) -> Result<R, RegistrationError>,
    ) -> Result<R, RegistrationError> {
        let mut state = self.write()?;
        let pending = state
            .pending
            .get_mut(&id)
            .ok_or(RegistrationError::UnknownRegistration(id))?;
        let result = f(pending);
        if result.is_err() {
            state.discard(id);
        }
        result
    }

    /// The most recent completed registration exposing `service`.
    pub fn resolve(&self, service: ServiceId) -> Option<ComponentRegistration> {
        let state = self.read().ok()?;
        let index = *state.by_service.get(&service)?.last()?;
        state.components.get(index).cloned()
    }

    pub fn resolve_of<T: ?Sized + 'static>(&self) -> Option<ComponentRegistration> {
        self.resolve(ServiceId::of::<T>())
    }

    pub fn resolve_named(&self, name: &str, service: ServiceId) -> Option<ComponentRegistration> {
        let state = self.read().ok()?;
        let index = *state.by_name.get(&(name.to_string(), service))?;
        state.components.get(index).cloned()
    }

    pub fn resolve_named_of<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Option<ComponentRegistration> {
        self.resolve_named(name, ServiceId::of::<T>())
    }

    /// Every completed registration exposing `service`, oldest first.
    pub fn registrations_for(&self, service: ServiceId) -> Vec<ComponentRegistration> {
        let Ok(state) = self.read() else {
            return Vec::new();
        };
        state
            .by_service
            .get(&service)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|index| state.components.get(*index).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every completed registration in completion order.
    pub fn registrations(&self) -> Vec<ComponentRegistration> {
        self.read()
            .map(|state| state.components.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|state| state.components.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistrationBackend for ComponentRegistry {
    type Error = RegistrationError;

    fn begin(&self, component: ServiceId) -> Result<RegistrationId, Self::Error> {
        let mut state = self.write()?;
        state.next_id += 1;
        let id = RegistrationId::new(state.next_id);
        state.pending.insert(
            id,
            PendingRegistration {
                registration: ComponentRegistration::new(id, component),
                callbacks: Vec::new(),
            },
        );
        tracing::trace!(%id, %component, "registration started");
        Ok(id)
    }

    fn bind_service(&self, id: RegistrationId, service: ServiceId) -> Result<(), Self::Error> {
        self.with_pending(id, |pending| {
            pending.registration.add_service(service);
            Ok(())
        })
    }

    fn enable_interception(&self, id: RegistrationId) -> Result<(), Self::Error> {
        self.with_pending(id, |pending| {
            pending.registration.enable_interception();
            Ok(())
        })
    }

    fn intercept_with(
        &self,
        id: RegistrationId,
        interceptors: &[ServiceId],
    ) -> Result<(), Self::Error> {
        self.with_pending(id, |pending| {
            if !pending.registration.interception_enabled() {
                return Err(RegistrationError::InterceptionNotEnabled(id));
            }
            pending.registration.extend_interceptors(interceptors);
            Ok(())
        })
    }

    fn on_registered(
        &self,
        id: RegistrationId,
        callback: RegisteredCallback,
    ) -> Result<(), Self::Error> {
        self.with_pending(id, |pending| {
            pending.callbacks.push(callback);
            Ok(())
        })
    }

    fn apply_scope(&self, id: RegistrationId, scope: InstanceScope) -> Result<(), Self::Error> {
        self.with_pending(id, |pending| {
            if pending.registration.scope().is_some() {
                return Err(RegistrationError::ScopeAlreadyApplied(id));
            }
            pending.registration.set_scope(scope);
            Ok(())
        })
    }

    fn bind_name(
        &self,
        id: RegistrationId,
        name: &str,
        service: ServiceId,
    ) -> Result<(), Self::Error> {
        let mut state = self.write()?;
        if !state.pending.contains_key(&id) {
            return Err(RegistrationError::UnknownRegistration(id));
        }
        if name.is_empty() {
            state.discard(id);
            return Err(RegistrationError::EmptyName(id));
        }
        if !self.allow_duplicate_names {
            let committed = state.by_name.contains_key(&(name.to_string(), service));
            let pending = state
                .pending
                .values()
                .any(|pending| pending.registration.is_named(name, service));
            if committed || pending {
                state.discard(id);
                return Err(RegistrationError::DuplicateName {
                    name: name.to_string(),
                    service,
                });
            }
        }
        let pending = state
            .pending
            .get_mut(&id)
            .ok_or(RegistrationError::UnknownRegistration(id))?;
        pending.registration.add_name(name.to_string(), service);
        Ok(())
    }

    fn complete(&self, id: RegistrationId) -> Result<(), Self::Error> {
        let (registration, callbacks) = {
            let mut state = self.write()?;
            let PendingRegistration {
                mut registration,
                callbacks,
            } = state
                .pending
                .remove(&id)
                .ok_or(RegistrationError::UnknownRegistration(id))?;
            if registration.services().is_empty() {
                let component = registration.component();
                registration.add_service(component);
            }

            let index = state.components.len();
            for service in registration.services() {
                state.by_service.entry(*service).or_default().push(index);
            }
            for (name, service) in registration.names() {
                state.by_name.insert((name.clone(), *service), index);
            }
            state.components.push(registration.clone());
            (registration, callbacks)
        };

        tracing::trace!(%id, callbacks = callbacks.len(), "registration completed");
        // callbacks may query the registry, so the lock is released first
        for callback in callbacks {
            callback(&registration);
        }
        Ok(())
    }
}
