use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing::{error, info};
use waste_sorter_agent::capture::{ExistingFile, FrameSource};
use waste_sorter_agent::config::{Args, Config, IndicatorBackend};
use waste_sorter_agent::indicator::{MemoryLines, OutputLines, SysfsLines};
use waste_sorter_agent::telemetry::{HttpTransport, LogTransport, Transport};
use waste_sorter_agent::{ClassificationClient, CycleLoop, IndicatorController, TelemetryPublisher};

fn main() -> ExitCode {
    let config = match Config::try_from(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Waste sorter agent. Press Ctrl-C to exit.");

    let lines: Box<dyn OutputLines> = match config.indicator {
        IndicatorBackend::Gpio => Box::new(SysfsLines::open(&config.gpio_root, config.gpio_pins)?),
        IndicatorBackend::Log => Box::new(MemoryLines::new()),
    };

    let transport: Arc<dyn Transport> = match &config.telemetry_endpoint {
        Some(url) => {
            let mut transport = HttpTransport::new(url.clone());
            if let Some(key) = &config.telemetry_hmac_key {
                transport = transport.with_hmac(key.clone());
            }
            Arc::new(transport)
        }
        None => Arc::new(LogTransport),
    };

    let source: Box<dyn FrameSource> = match &config.capture {
        Some(capture) => Box::new(capture.clone()),
        None => Box::new(ExistingFile),
    };

    let publisher = TelemetryPublisher::new(
        transport,
        config.telemetry_output.clone(),
        config.message_timeout,
        Arc::new(AtomicU64::new(0)),
    );
    let client = ClassificationClient::new(config.endpoint.clone(), config.request_timeout)?;

    let mut cycle_loop = CycleLoop::new(
        &config.image_path,
        source,
        client,
        IndicatorController::new(lines),
        publisher,
    )
    .with_cycle_delay(config.cycle_delay);

    cycle_loop.run(shutdown_signal()).await;
    info!("Waste sorter agent stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
