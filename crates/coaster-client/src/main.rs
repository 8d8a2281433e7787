//! Animated roller coaster ride using Bevy.
//!
//! A cart runs around a closed spline track under a simplified physics model,
//! trailed by a smoothed camera, with a HUD showing live telemetry and
//! start/stop controls. Runs natively or in the browser via WASM.

mod camera;
mod environment;
mod launch_params;
mod track_mesh;
mod ui;
mod vehicle;
mod viewport;

use bevy::prelude::*;
use camera::FollowCameraPlugin;
use environment::EnvironmentPlugin;
use launch_params::LaunchParams;
use track_mesh::TrackMeshPlugin;
use ui::HudPlugin;
use vehicle::VehiclePlugin;
use viewport::ViewportPlugin;

/// Per-tick ordering of the ride systems inside `Update`.
///
/// Rendering happens after `Update`, and the HUD draws in the egui pass, so
/// the full tick order is controls, vehicle, environment, camera, render,
/// overlay.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    /// Apply start/stop requests.
    Controls,
    /// Advance the cart.
    Vehicle,
    /// Drift decorative scenery.
    Environment,
    /// Move the trailing camera.
    Camera,
}

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                FrameStage::Controls,
                FrameStage::Vehicle,
                FrameStage::Environment,
                FrameStage::Camera,
            )
                .chain(),
        )
        .add_plugins((
            VehiclePlugin,
            TrackMeshPlugin,
            EnvironmentPlugin,
            FollowCameraPlugin,
            ViewportPlugin,
            HudPlugin,
        ));
    }
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    tracing::info!("Launch parameters: {params:?}");

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "coaster".to_string(),
        resolution: (params.width, params.height).into(),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }));

    app.insert_resource::<LaunchParams>(params)
        .add_plugins(AppPlugin)
        .run();
}
