use std::path::Path;

use di::{Ref, ServiceCollection, singleton};
use ferrule_registration::{
    ComponentRegistry, RegistrationExt,
    activation::{Activated, ActivationHooks, Logger, LoggerSlot, SetLogger, TracingLogger, activated},
    log::{Level, LoggingSettings, init_logging},
    settings::{RegistrationSettings, Settings},
};

trait Widget {}
struct WidgetImpl;
struct GadgetImpl;
struct LoggingInterceptor;
struct CachingInterceptor;

#[derive(Default)]
struct OrderService {
    logger: LoggerSlot,
}

impl Activated for OrderService {
    fn as_set_logger(&self) -> Option<&dyn SetLogger> {
        Some(&self.logger)
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/etc")),
        Some("FERRULE"),
        "__",
    )?;
    init_logging(&settings.get::<LoggingSettings>()?)?;

    let registration = settings.get::<RegistrationSettings>()?;
    let trace = registration.trace_sink();

    let registry = ComponentRegistry::default();
    registry
        .intercepted_by::<LoggingInterceptor>()
        .and::<CachingInterceptor>()
        .per_scope()
        .register_as::<WidgetImpl, dyn Widget>(Some("primary"), &trace)?;
    registry
        .configured(&registration)
        .register_as_self::<GadgetImpl>(&trace)?;
    tracing::info!(registrations = registry.len(), "components registered");

    let hooks = Ref::new(ActivationHooks::new().with_logger_injection());
    let mut services = ServiceCollection::new();
    services.add(
        singleton::<dyn Logger, TracingLogger>()
            .from(|_| Ref::new(TracingLogger::new("orders"))),
    );
    services.add(activated::<OrderService>(
        registration.default_lifetime(),
        hooks,
        |_| OrderService::default(),
    ));

    let provider = services.build_provider()?;
    let scope = provider.create_scope();
    let orders = scope.get_required::<OrderService>();
    orders.logger.log(Level::Info, "order service activated");
    Ok(())
}
