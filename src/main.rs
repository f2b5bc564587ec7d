use std::{sync::Arc, time::Duration};

use alarma::{
    appsettings::AppSettings,
    console::{Console, ConsoleDeliveryChannel, ConsoleEnd},
    scheduling::{AlarmManager, AlarmTicker, Clock, SystemClock},
    storage::{AlarmRepository, FileKeyValueStore, KeyValueStore, SettingsStore, SoundLibrary},
};
use anyhow::Context;
use tokio::{io::BufReader, sync::Mutex};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let appsettings = AppSettings::load().context("Could not load configuration")?;
    log::info!("Starting alarma. [data_dir = {}]", appsettings.storage.data_dir.display());

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileKeyValueStore::open(appsettings.storage.data_dir.clone())
            .context("Could not open the data directory")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(appsettings.timezone()?));

    let manager = AlarmManager::new(
        AlarmRepository::load(Arc::clone(&store)),
        Arc::clone(&clock),
        appsettings.manager_options(),
    )
    .into_shared();
    let settings = Arc::new(Mutex::new(SettingsStore::load(Arc::clone(&store))));
    let delivery = Arc::new(ConsoleDeliveryChannel::new(
        Arc::clone(&settings),
        tokio::io::stdout(),
    ));

    let ticker = AlarmTicker::start(
        Arc::clone(&manager),
        delivery.clone(),
        appsettings.tick_interval(),
    );

    let mut console = Console::new(
        manager,
        settings,
        SoundLibrary::load(store),
        clock,
        delivery,
    );

    let keep_running = tokio::select! {
        result = console.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => {
            match result {
                Ok(ConsoleEnd::Quit) => false,
                Ok(ConsoleEnd::EndOfInput) => {
                    log::info!("Console input closed, alarms keep running until Ctrl-C.");
                    true
                }
                Err(error) => {
                    log::error!("Console stopped with an error. [error = {:#}]", error);
                    true
                }
            }
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received Ctrl-C.");
            false
        }
    };

    if keep_running {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("Could not listen for Ctrl-C. [error = {}]", error);
        } else {
            log::info!("Received Ctrl-C.");
        }
    }

    ticker.stop(SHUTDOWN_TIMEOUT).await;
    log::info!("Stopped alarma.");

    Ok(())
}
