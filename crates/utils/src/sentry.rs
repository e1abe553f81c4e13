use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;
use tracing_subscriber::registry::LookupSpan;

/// Start the Sentry client when a DSN is configured. The returned guard must
/// be held for the lifetime of the process so queued events are flushed.
pub fn init(dsn: Option<&str>, environment: &str) -> Option<::sentry::ClientInitGuard> {
    let dsn = dsn.map(str::trim).filter(|dsn| !dsn.is_empty())?;

    let guard = ::sentry::init((
        dsn,
        ::sentry::ClientOptions {
            release: ::sentry::release_name!(),
            environment: Some(environment.to_string().into()),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    Some(guard)
}

/// Tracing layer forwarding `error!` events to Sentry and keeping `warn!`
/// events as breadcrumbs. Inert when [`init`] was not called.
pub fn sentry_layer<S>() -> SentryLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR => EventFilter::Event,
        Level::WARN => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    })
}
