// SPDX-License-Identifier: GPL-3.0-only

//! Headless CLI commands

use facemark::backends::camera::enumerate_cameras;
use facemark::backends::camera::V4l2Camera;
use facemark::config::Config;
use facemark::constants::LANDMARKS_PER_FACE;
use facemark::engine::RemoteEngine;
use facemark::landmark::ConnectorTopology;
use facemark::render::{BlendShapeView, RenderLoop};
use facemark::state::DisplayState;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// List available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found");
        return Ok(());
    }

    for camera in cameras {
        println!("{}: {} ({})", camera.index, camera.name, camera.path);
    }
    Ok(())
}

/// Run the render loop headless, printing per-second detection stats until
/// Ctrl+C or the duration elapses
pub fn track(config: Config, duration: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let mut camera = V4l2Camera::open(
        config.camera_index,
        config.capture_width,
        config.capture_height,
    )?;
    let format = camera.format();

    // Headless: no mirror, viewport pinned to the capture resolution
    let state = Arc::new(DisplayState::new(config.mode, false));
    state.set_viewport(format.width, format.height);

    let topology_path = config
        .engine
        .topology_path
        .clone()
        .ok_or("no topology path configured (use --topology)")?;
    let topology = Arc::new(ConnectorTopology::load(&topology_path, LANDMARKS_PER_FACE)?);

    let engine = runtime.block_on(RemoteEngine::connect(
        &config.engine.endpoint,
        &config.engine_options(),
    ))?;
    state.set_model_loading(false);

    let render_loop = RenderLoop::new(engine, camera.view(), Arc::clone(&state), topology);
    let handle = {
        let _guard = runtime.enter();
        render_loop.spawn()
    };
    let mut snapshots = handle.snapshots();

    info!(
        width = format.width,
        height = format.height,
        "Tracking; press Ctrl+C to stop"
    );

    let started = Instant::now();
    let mut last_sequence = 0u64;

    while running.load(Ordering::SeqCst) {
        if let Some(limit) = duration
            && started.elapsed() >= Duration::from_secs(limit)
        {
            break;
        }
        std::thread::sleep(Duration::from_secs(1));

        let snapshot = snapshots.borrow_and_update().clone();
        let draws = snapshot.sequence - last_sequence;
        last_sequence = snapshot.sequence;

        let top = match &snapshot.blend {
            BlendShapeView::Rows(rows) => rows
                .iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .map(|row| format!("{} {}", row.label, row.readout))
                .unwrap_or_else(|| "-".to_string()),
            BlendShapeView::Placeholder => "-".to_string(),
        };

        println!(
            "{:>4}s  faces: {}  draws/s: {:>3}  top: {}",
            started.elapsed().as_secs(),
            snapshot.faces,
            draws,
            top
        );
    }

    runtime.block_on(handle.stop());
    camera.stop();
    Ok(())
}
