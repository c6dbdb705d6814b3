//! magswipe demo.
//!
//! Runs a session against the mock reader and a SQLite profile store and
//! plays a scripted scenario: plug in, swipe, time out, auto-config,
//! unplug. Every event the session reports is printed.
//!
//! ```text
//! magswipe [CONFIG]        (default: magswipe.toml)
//! ```

mod config;

use anyhow::Context;
use config::AppConfig;
use magswipe_core::ConfigProfile;
use magswipe_hardware::mock::{MockDriverFactory, MockPlugDetector};
use magswipe_hardware::{DirectoryConfigFile, notification_channel, plug_channel};
use magswipe_session::{DeviceSession, SessionActor, SessionEvent, SessionHandle, event_channel};
use magswipe_storage::{Database, DatabaseConfig, SqliteProfileStore};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_TRACK: &[u8] = b"%B4111111111111111^DOE/JOHN^2505101000000000000?;4111111111111111=2505?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("magswipe.toml"), PathBuf::from);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("magswipe {} starting", magswipe_core::VERSION);

    ensure_config_file(&config.driver.config_file)?;

    let db = Database::open(DatabaseConfig::new(&config.storage.database_path))
        .await
        .context("opening profile database")?;
    let store = SqliteProfileStore::new(db.pool().clone());

    let (driver_tx, driver_rx) = notification_channel();
    let (plug_tx, plug_rx) = plug_channel();
    let (factory, driver) = MockDriverFactory::new(driver_tx);
    let (detector, jack) = MockPlugDetector::new(plug_tx);
    let (sink, events) = event_channel();

    let session = DeviceSession::builder(factory, store)
        .plug_detector(detector)
        .event_sink(sink)
        .config_files(DirectoryConfigFile::with_path(&config.driver.config_file))
        .config(config.session.clone())
        .build()
        .await?;

    let (handle, task) = SessionActor::spawn(
        session,
        driver_rx,
        plug_rx,
        config.session.command_capacity,
    );
    let printer = tokio::spawn(print_events(events));

    handle.activate().await?;

    info!("Plugging reader in");
    jack.plug_in();
    sync(&handle).await?;
    driver.connect()?;
    sync(&handle).await?;

    info!("Swiping a card");
    handle.request_swipe().await?;
    driver.swipe(DEMO_TRACK)?;
    sync(&handle).await?;

    info!("Arming a swipe nobody completes");
    handle.request_swipe().await?;
    driver.timeout("Swipe card timed out.")?;
    sync(&handle).await?;

    info!("Running auto-config");
    handle.request_auto_config().await?;
    if let Err(e) = handle.request_swipe().await {
        info!("Swipe rejected as expected: {}", e);
    }
    driver.complete_auto_config(ConfigProfile {
        input_frequency: 48_000,
        output_frequency: 48_000,
        record_buffer_size: 4096,
        baud_rate: 9600,
        ..Default::default()
    })?;
    sync(&handle).await?;
    driver.connect()?;
    sync(&handle).await?;

    let status = handle.status().await?;
    info!(
        "Status: {:?}, connection {}, profile stored: {}",
        status.activation, status.connection, status.has_profile
    );

    info!("Unplugging reader");
    jack.unplug();
    sync(&handle).await?;

    handle.shutdown().await?;
    task.await.context("session task")?;
    drop(handle);
    printer.await.context("event printer")?;
    db.close().await;

    info!("magswipe stopped");
    Ok(())
}

/// Round trip through the session so queued driver and plug input is handled.
async fn sync(handle: &SessionHandle) -> anyhow::Result<()> {
    handle.status().await?;
    Ok(())
}

/// The mock driver never reads the configuration file; it only has to exist.
fn ensure_config_file(path: &Path) -> anyhow::Result<()> {
    if path.is_file() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    warn!("Creating placeholder {}", path.display());
    std::fs::write(path, "<uniMagCfg/>\n").with_context(|| format!("writing {}", path.display()))
}

async fn print_events(mut events: UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            SessionEvent::SwipeSuccess(record) => println!(
                "{:<22} {} {} {}/{}",
                event.name(),
                record.masked_card_number(),
                record.first_name(),
                record.expiry_month(),
                record.expiry_year()
            ),
            _ => match event.payload() {
                Some(payload) => println!("{:<22} {}", event.name(), payload),
                None => println!("{}", event.name()),
            },
        }
    }
}
