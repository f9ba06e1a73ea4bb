// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based landmark viewer
//!
//! Renders the camera feed with the landmark overlay using Unicode
//! half-block characters, a blend-shape panel on the right, and a status
//! bar. All controls only write display state; the render loop picks the
//! new values up on its next tick.

use crate::backends::camera::{CameraFrame, V4l2Camera};
use crate::config::Config;
use crate::constants::{BLEND_PANEL_WIDTH, LANDMARKS_PER_FACE, NO_FACE_PLACEHOLDER};
use crate::engine::RemoteEngine;
use crate::errors::AppError;
use crate::landmark::ConnectorTopology;
use crate::render::{BlendShapeView, OverlaySnapshot, RenderLoop, RenderLoopHandle};
use crate::state::DisplayState;
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use futures::channel::oneshot;
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Run the terminal landmark viewer
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &runtime, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

type EngineInit = Result<(RemoteEngine, Arc<ConnectorTopology>), AppError>;

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &tokio::runtime::Runtime,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(DisplayState::new(config.mode, config.mirror_preview));

    let mut status_message = build_status_message(&state);
    let mut show_help = false;

    // Camera failure is terminal for the session: the viewer keeps running
    // with the gate flag set and a single visible notice.
    let camera = match V4l2Camera::open(
        config.camera_index,
        config.capture_width,
        config.capture_height,
    ) {
        Ok(camera) => Some(camera),
        Err(e) => {
            error!(error = %e, "Camera initialization failed");
            state.set_camera_error(true);
            status_message = format!("Error: {}", e);
            None
        }
    };

    // Engine and topology load in the background; the viewer shows the feed
    // (without overlay) while `model_loading` gates the loop.
    let (init_tx, mut init_rx) = oneshot::channel::<EngineInit>();
    {
        let endpoint = config.engine.endpoint.clone();
        let options = config.engine_options();
        let topology_path = config.engine.topology_path.clone();
        runtime.spawn(async move {
            let init = async {
                let path = topology_path.ok_or_else(|| {
                    AppError::Config("no topology path configured (use --topology)".to_string())
                })?;
                let topology = ConnectorTopology::load(&path, LANDMARKS_PER_FACE)?;
                let engine = RemoteEngine::connect(&endpoint, &options).await?;
                Ok((engine, Arc::new(topology)))
            }
            .await;
            let _ = init_tx.send(init);
        });
    }

    let mut render: Option<RenderLoopHandle> = None;
    let mut snapshots: Option<watch::Receiver<OverlaySnapshot>> = None;
    let mut engine_failed = false;

    loop {
        // Start the render loop once the engine is up
        if render.is_none()
            && state.model_loading()
            && let Ok(Some(init)) = init_rx.try_recv()
        {
            match init {
                Ok((engine, topology)) => {
                    if let Some(cam) = &camera {
                        let render_loop =
                            RenderLoop::new(engine, cam.view(), Arc::clone(&state), topology);
                        let handle = {
                            let _guard = runtime.enter();
                            render_loop.spawn()
                        };
                        snapshots = Some(handle.snapshots());
                        render = Some(handle);
                        info!("Overlay active");
                    }
                    state.set_model_loading(false);
                    status_message = build_status_message(&state);
                }
                Err(e) => {
                    // Single user-visible notice; model_loading stays set,
                    // which keeps the precondition check blocking draws.
                    error!(error = %e, "Engine initialization failed");
                    status_message = format!("Error: {}", e);
                    engine_failed = true;
                }
            }
        }

        let frame = camera.as_ref().and_then(|c| c.latest_frame());
        let snapshot = snapshots
            .as_mut()
            .map(|rx| rx.borrow_and_update().clone());

        terminal.draw(|f| {
            let area = f.area();

            let panel_width = if area.width > BLEND_PANEL_WIDTH * 2 {
                BLEND_PANEL_WIDTH
            } else {
                0
            };

            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width.saturating_sub(panel_width),
                height: area.height.saturating_sub(1),
            };

            // Report the displayed size; half-blocks double the vertical
            // pixel resolution per cell.
            state.set_viewport(camera_area.width as u32, camera_area.height as u32 * 2);

            f.render_widget(
                FrameWidget {
                    frame: frame.as_ref(),
                    overlay: snapshot.as_ref(),
                    mirrored: state.mirrored(),
                    camera_error: state.camera_error(),
                },
                camera_area,
            );

            if panel_width > 0 {
                let panel_area = Rect {
                    x: area.x + camera_area.width,
                    y: area.y,
                    width: panel_width,
                    height: area.height.saturating_sub(1),
                };
                f.render_widget(
                    BlendShapePanel {
                        view: snapshot.as_ref().map(|s| &s.blend),
                        loading: state.model_loading() && !engine_failed,
                    },
                    panel_area,
                );
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,

                // Cycle overlay mode
                KeyCode::Char('m') => {
                    show_help = false;
                    state.cycle_mode();
                    status_message = build_status_message(&state);
                }

                // Toggle mirror (selfie view)
                KeyCode::Char('f') => {
                    show_help = false;
                    state.toggle_mirrored();
                    status_message = build_status_message(&state);
                }

                // Save a snapshot of the composited view
                KeyCode::Char('p') => {
                    show_help = false;
                    if let Some(frame) = &frame {
                        let overlay = snapshot.clone().unwrap_or_default();
                        match storage::save_snapshot(frame, &overlay, state.mirrored()) {
                            Ok(path) => {
                                status_message = format!("Saved: {}", path.display());
                            }
                            Err(e) => {
                                error!("Failed to save snapshot: {}", e);
                                status_message = format!("Error: {}", e);
                            }
                        }
                    }
                }

                // Toggle help
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    status_message = if show_help {
                        build_help_message()
                    } else {
                        build_status_message(&state)
                    };
                }

                _ => {}
            }
        }
    }

    // Teardown: stop the loop first so no draw can land on released state,
    // then release the capture device.
    if let Some(handle) = render {
        runtime.block_on(handle.stop());
    }
    if let Some(mut cam) = camera {
        cam.stop();
    }

    config.mode = state.mode();
    config.mirror_preview = state.mirrored();
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    Ok(())
}

fn build_status_message(state: &DisplayState) -> String {
    format!(
        "{} | mirror {} | 'm' mode | 'f' mirror | 'p' photo | 'h' help | 'q' quit",
        state.mode().display_name(),
        if state.mirrored() { "on" } else { "off" },
    )
}

fn build_help_message() -> String {
    "m: Cycle overlay mode | f: Toggle mirror | p: Take snapshot | h: Toggle help | q/Ctrl+C: Quit"
        .to_string()
}

/// Widget that renders the composited camera frame + overlay using
/// half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    overlay: Option<&'a OverlaySnapshot>,
    mirrored: bool,
    camera_error: bool,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame else {
            let msg = if self.camera_error {
                "Camera unavailable"
            } else {
                "Waiting for camera..."
            };
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Calculate display dimensions maintaining aspect ratio; each
        // terminal cell shows 2 vertical pixels via half blocks.
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top_color = self.sample(frame, src_x, src_y_top);
                let bottom_color = self.sample(frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

impl FrameWidget<'_> {
    /// Sample the composited pixel: mirrored video underneath, overlay on
    /// top. The overlay canvas already carries the mirror transform, so it
    /// is sampled in display space.
    fn sample(&self, frame: &CameraFrame, x: u32, y: u32) -> Color {
        let base_x = if self.mirrored && frame.width > 0 {
            frame.width - 1 - x.min(frame.width - 1)
        } else {
            x
        };
        let (mut r, mut g, mut b) = frame.rgb_at(base_x, y);

        if let Some(overlay) = self.overlay
            && overlay.width == frame.width
            && overlay.height == frame.height
            && x < overlay.width
            && y < overlay.height
        {
            let idx = ((y * overlay.width + x) * 4) as usize;
            if idx + 3 < overlay.pixels.len() {
                let a = overlay.pixels[idx + 3] as u32;
                if a > 0 {
                    let blend = |base: u8, over: u8| -> u8 {
                        ((over as u32 * a + base as u32 * (255 - a)) / 255) as u8
                    };
                    r = blend(r, overlay.pixels[idx]);
                    g = blend(g, overlay.pixels[idx + 1]);
                    b = blend(b, overlay.pixels[idx + 2]);
                }
            }
        }

        Color::Rgb(r, g, b)
    }
}

/// Side panel listing blend-shape categories as proportional bars
struct BlendShapePanel<'a> {
    view: Option<&'a BlendShapeView>,
    loading: bool,
}

impl Widget for BlendShapePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 8 || area.height == 0 {
            return;
        }

        let dim = Style::default().fg(Color::DarkGray);

        if self.loading {
            buf.set_string(area.x + 1, area.y, "loading model...", dim);
            return;
        }

        let rows = match self.view {
            Some(BlendShapeView::Rows(rows)) if !rows.is_empty() => rows,
            _ => {
                buf.set_string(area.x + 1, area.y, NO_FACE_PLACEHOLDER, dim);
                return;
            }
        };

        // Layout: label | bar track | readout
        let readout_width: u16 = 6;
        let label_width: u16 = (area.width / 2).min(14);
        let track_width = area
            .width
            .saturating_sub(label_width + readout_width + 3)
            .max(1);

        for (i, row) in rows.iter().enumerate() {
            let y = area.y + i as u16;
            if y >= area.y + area.height {
                break;
            }

            let label: String = row.label.chars().take(label_width as usize).collect();
            buf.set_string(area.x + 1, y, &label, Style::default());

            let filled = (row.score * track_width as f32).round() as u16;
            let bar_x = area.x + 1 + label_width + 1;
            for t in 0..track_width {
                let (ch, style) = if t < filled {
                    ('█', Style::default().fg(Color::Green))
                } else {
                    ('─', dim)
                };
                if let Some(cell) = buf.cell_mut((bar_x + t, y)) {
                    cell.set_char(ch);
                    cell.set_style(style);
                }
            }

            buf.set_string(bar_x + track_width + 1, y, &row.readout, Style::default());
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = if self.message.len() > area.width as usize {
            &self.message[..area.width as usize]
        } else {
            self.message
        };

        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
