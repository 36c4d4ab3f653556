use crate::components::sync::Reconciler;
use crate::components::{
    AppointmentSource, CalendarBackend, DisabledNotifier, GoogleCalendarClient, Notifier,
    PortalScraper, PushoverNotifier,
};
use crate::config::Config;
use crate::error::Error;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the portal, calendar and notifier into a reconciler
pub fn build_reconciler(config: Config) -> miette::Result<Reconciler> {
    let source: Arc<dyn AppointmentSource> = Arc::new(PortalScraper::new(config.portal)?);
    let backend: Arc<dyn CalendarBackend> = Arc::new(GoogleCalendarClient::new(config.google)?);

    let notifier: Arc<dyn Notifier> = match config.pushover {
        Some(pushover) => {
            info!("Pushover notifications enabled");
            Arc::new(PushoverNotifier::new(pushover)?)
        }
        None => {
            warn!("PUSHOVER_TOKEN or PUSHOVER_USER not set, notifications disabled");
            Arc::new(DisabledNotifier)
        }
    };

    if config.sync.dry_run {
        info!("Dry run enabled, the calendar will not be modified");
    }

    Ok(Reconciler::new(source, backend, notifier, &config.sync)?)
}
