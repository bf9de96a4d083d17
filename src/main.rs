//! Adaptive quality demo.
//!
//! Drives a `QualityController` from a simulated render loop whose frame
//! cost follows the active quality settings, and logs what the controller
//! decides. Runs until SIGINT/SIGTERM.

use adaptive_quality::config;
use adaptive_quality::controller::QualityController;
use adaptive_quality::error::AppError;
use adaptive_quality::hud::HudOverlay;
use adaptive_quality::logging;
use adaptive_quality::simulation::SimulatedRenderer;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let _log_guard = logging::init_logging().map_err(|e| {
        eprintln!("Failed to initialize logging: {}", e);
        e
    })?;

    info!("Adaptive quality demo starting...");

    let result = run().await;

    match &result {
        Ok(()) => info!("Adaptive quality demo shut down gracefully"),
        Err(e) => error!("Adaptive quality demo error: {}", e),
    }

    result
}

async fn run() -> Result<(), AppError> {
    let config_path = config::default_path();
    let config = config::load_or_init(&config_path)?;
    info!("Configuration loaded from {:?}", config_path);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = setup_signal_handlers(shutdown_tx).await {
            error!("Signal handler error: {}", e);
        }
    });

    let clock = Instant::now();
    let mut controller = QualityController::try_new(config.controller, 0.0)?;
    let renderer = SimulatedRenderer::attach(config.simulation.clone(), &mut controller);
    let (hud, _hud_subscription) = HudOverlay::attach(&mut controller);

    info!(
        "Starting at {} quality (auto-adjust {})",
        controller.quality_level(),
        if controller.auto_adjust_enabled() { "on" } else { "off" }
    );

    render_loop(
        &mut controller,
        &renderer,
        &hud,
        clock,
        config.simulation.report_every_frames,
        shutdown_rx,
    )
    .await;

    let stats = controller.stats();
    info!(
        "Final stats: {}",
        serde_json::to_string(&stats).unwrap_or_else(|e| e.to_string())
    );
    Ok(())
}

/// Render frames until shutdown, feeding each frame's end time to the
/// controller.
async fn render_loop(
    controller: &mut QualityController,
    renderer: &Arc<Mutex<SimulatedRenderer>>,
    hud: &Arc<Mutex<HudOverlay>>,
    clock: Instant,
    report_every_frames: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut frame: u64 = 0;

    loop {
        let cost = match renderer.lock() {
            Ok(mut r) => r.render_frame(),
            Err(_) => {
                error!("Renderer lock poisoned, stopping render loop");
                return;
            }
        };

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender also ends the loop
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Render loop shutting down");
                    return;
                }
            }
            _ = tokio::time::sleep(cost) => {
                controller.update(elapsed_ms(clock));
                frame += 1;

                if report_every_frames > 0 && frame % report_every_frames == 0 {
                    report(controller, hud);
                }
            }
        }
    }
}

fn report(controller: &QualityController, hud: &Arc<Mutex<HudOverlay>>) {
    let stats = controller.stats();
    if let Ok(hud) = hud.lock() {
        let lines: Vec<String> = hud.render(&stats).into_iter().map(|l| l.text).collect();
        info!("{}", lines.join(" | "));
    }
    debug!(
        "budget {:.2}ms, p99 {:.2}ms, trend {:?}, cooldown {}",
        stats.frame_budget_ms, stats.p99_frame_time_ms, stats.trend, stats.cooldown_frames_remaining
    );
}

fn elapsed_ms(clock: Instant) -> f64 {
    clock.elapsed().as_secs_f64() * 1000.0
}

/// Set up signal handlers for graceful shutdown (SIGTERM and SIGINT).
#[cfg(unix)]
async fn setup_signal_handlers(
    shutdown_tx: watch::Sender<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}

#[cfg(not(unix))]
async fn setup_signal_handlers(
    shutdown_tx: watch::Sender<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    let _ = shutdown_tx.send(true);
    Ok(())
}
