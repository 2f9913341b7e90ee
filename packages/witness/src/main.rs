//! XChain Door Witness Node
//!
//! Observes commits on the source door and attests them on the target door.
//!
//! # Pipeline
//!
//! 1. The watcher polls the source chain block by block for door commits
//! 2. Each commit becomes an attestation job on a bounded queue
//! 3. Attestor workers check the target door and submit
//!    `add_claim_attestation` / `add_create_account_attestation`
//! 4. Transient failures are re-enqueued with exponential backoff
//!
//! Once enough witnesses agree the claim reaches quorum on the target door
//! and anyone holding matching parameters can claim it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use xchain_witness::attestor::Attestor;
use xchain_witness::bounded_cache::BoundedCache;
use xchain_witness::config::Config;
use xchain_witness::door_client::{GasSettings, LcdDoor};
use xchain_witness::queue::job_queue;
use xchain_witness::watcher::Watcher;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    let config = Config::load()?;
    init_logging(config.log_json);

    info!(witness_id = %config.witness_id, "Starting XChain Door Witness");

    config.validate()?;
    info!(
        source_lcd = %config.source.lcd_url,
        source_door = %config.source.door_address,
        target_lcd = %config.target.lcd_url,
        target_door = %config.target.door_address,
        workers = config.worker_count,
        "Configuration loaded"
    );

    let source = Arc::new(LcdDoor::new(
        &config.source.lcd_url,
        &config.source.chain_id,
        &config.source.door_address,
    )?);
    let target = Arc::new(
        LcdDoor::new(
            &config.target.lcd_url,
            &config.target.chain_id,
            &config.target.door_address,
        )?
        .with_signer(
            &config.mnemonic,
            &config.address_prefix,
            GasSettings {
                denom: config.gas_denom.clone(),
                price: config.gas_price,
                limit: config.gas_limit,
            },
        )?,
    );

    let (queue, jobs) = job_queue(config.queue_capacity);
    let cache = BoundedCache::new(
        config.cache_max_size,
        Duration::from_secs(config.cache_ttl_secs),
    );
    let attestor = Arc::new(Attestor::new(
        target,
        queue.clone(),
        config.retry_config(),
        cache,
    ));
    let mut watcher = Watcher::new(
        source,
        queue,
        config.target.door_address.clone(),
        config.start_height,
        config.poll_interval(),
    );

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle signals
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let workers = attestor.spawn_pool(config.worker_count, jobs, shutdown_rx.clone());

    // Run the watcher
    watcher.run(shutdown_rx).await?;

    for worker in workers {
        if let Err(e) = worker.await {
            error!(error = %e, "Attestor worker panicked");
        }
    }

    info!(next_height = watcher.next_height(), "XChain Door Witness stopped");
    Ok(())
}

fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,xchain_witness=debug"));

    let (plain, json) = if json {
        (None, Some(fmt::layer().json().with_target(true)))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
