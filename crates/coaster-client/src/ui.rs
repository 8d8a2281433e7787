//! Ride HUD: live telemetry, start/stop buttons and a speed/height plot.
//!
//! Drawn in the egui pass after the scene has rendered. The panel is pinned
//! to the top-right corner of the current viewport.

use std::collections::VecDeque;

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use coaster_sim::{SimulationMode, TelemetrySnapshot};
use egui_plot::{Line, Plot};

use crate::FrameStage;
use crate::vehicle::{Ride, RideControl, RideStats};
use crate::viewport::ViewportSize;

/// Samples kept in the rolling history plot.
pub const HISTORY_LEN: usize = 240;

/// HUD panel width in logical pixels.
const PANEL_WIDTH: f32 = 260.0;
/// Gap between the panel and the viewport edge.
const PANEL_MARGIN: f32 = 10.0;

/// Plugin for the ride HUD.
pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_plugins(FrameTimeDiagnosticsPlugin::default())
            .init_resource::<RideHistory>()
            .add_systems(Update, record_history.after(FrameStage::Vehicle))
            .add_systems(EguiPrimaryContextPass, hud_system);
    }
}

/// Rolling window of recent speed and height samples.
#[derive(Resource, Default)]
pub struct RideHistory {
    samples: VecDeque<TelemetrySnapshot>,
}

impl RideHistory {
    /// Append a sample, dropping the oldest once full.
    pub fn push(&mut self, snapshot: TelemetrySnapshot) {
        if self.samples.len() == HISTORY_LEN {
            self.samples.pop_front();
        }
        self.samples.push_back(snapshot);
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Plot points for one quantity, oldest first.
    #[allow(clippy::cast_precision_loss)]
    fn series(&self, value: impl Fn(&TelemetrySnapshot) -> f32) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| [i as f64, f64::from(value(s))])
            .collect()
    }
}

fn record_history(ride: Option<Res<Ride>>, mut history: ResMut<RideHistory>) {
    if let Some(ride) = ride {
        history.push(ride.snapshot());
    }
}

/// Render the HUD panel.
#[allow(clippy::needless_pass_by_value, clippy::cast_precision_loss)]
fn hud_system(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    viewport: Option<Res<ViewportSize>>,
    ride: Option<Res<Ride>>,
    stats: Res<RideStats>,
    history: Res<RideHistory>,
    mut controls: MessageWriter<RideControl>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    let Some(ride) = ride else {
        egui::Window::new("Ride").show(ctx, |ui| {
            ui.label("Track failed to load; see the log.");
        });
        return Ok(());
    };
    let snapshot = ride.snapshot();

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);

    let width = viewport.map_or(PANEL_WIDTH + 2.0 * PANEL_MARGIN, |v| v.width);
    let x = (width - PANEL_WIDTH - PANEL_MARGIN).max(PANEL_MARGIN);

    egui::Window::new("Ride")
        .fixed_pos(egui::pos2(x, PANEL_MARGIN))
        .default_width(PANEL_WIDTH)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(format!("{:.1} km/h", snapshot.speed_kmh()));
            ui.label(format!("Height: {:.1} m", snapshot.height));
            ui.label(format!("Lap: {}", snapshot.laps + 1));
            ui.add(
                egui::ProgressBar::new(snapshot.lap_progress)
                    .text(format!("{:.0}%", snapshot.lap_progress * 100.0)),
            );
            ui.label(format!("Bank: {:.1}°", snapshot.bank_degrees));

            ui.separator();
            ui.horizontal(|ui| {
                let moving = snapshot.mode == SimulationMode::Moving;
                if ui.add_enabled(!moving, egui::Button::new("Start")).clicked() {
                    controls.write(RideControl::Start);
                }
                if ui.add_enabled(moving, egui::Button::new("Stop")).clicked() {
                    controls.write(RideControl::Stop);
                }
                let (color, label) = if moving {
                    (egui::Color32::LIGHT_GREEN, "Moving")
                } else {
                    (egui::Color32::LIGHT_RED, "Stopped")
                };
                ui.colored_label(color, label);
            });

            ui.separator();
            Plot::new("ride_history")
                .height(90.0)
                .show_axes(false)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .include_x(0.0)
                .include_x(HISTORY_LEN as f64)
                .include_y(0.0)
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new("speed (km/h)", history.series(TelemetrySnapshot::speed_kmh))
                            .color(egui::Color32::from_rgb(240, 140, 40)),
                    );
                    plot_ui.line(
                        Line::new("height (m)", history.series(|s| s.height))
                            .color(egui::Color32::from_rgb(80, 160, 240)),
                    );
                });

            ui.collapsing("Diagnostics", |ui| {
                ui.label(format!("FPS: {fps:.0}"));
                ui.label(format!("Frames: {}", stats.frames));
                for (outcome, count) in &stats.outcomes {
                    ui.label(format!("{outcome}: {count}"));
                }
                ui.label(format!("Velocity: {:.6}", snapshot.velocity));
                ui.label(format!("Acceleration: {:+.7}", snapshot.acceleration));
            });

            ui.separator();
            ui.label("Space - Start  Backspace - Stop");
        });

    Ok(())
}
