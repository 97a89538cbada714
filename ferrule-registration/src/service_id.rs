use std::{
    any::{Any, TypeId},
    fmt,
};

/// Identity of a type taking part in a registration: a component, the service
/// it is exposed as, or an interceptor marker.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ServiceId {
    id: TypeId,
    name: &'static str,
}

impl ServiceId {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + Any>() -> Self {
        ServiceId {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, e.g. `dyn app::widgets::Widget`.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name)
    }
}
