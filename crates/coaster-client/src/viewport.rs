//! Window resize handling.

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::camera::RideCamera;
use crate::launch_params::LaunchParams;

/// Plugin that keeps the projection and HUD anchoring in step with the window.
pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, init_viewport_size)
            .add_systems(Update, handle_resize);
    }
}

/// Current drawable size in logical pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

#[allow(clippy::cast_precision_loss)]
fn init_viewport_size(mut commands: Commands, params: Res<LaunchParams>) {
    commands.insert_resource(ViewportSize {
        width: params.width as f32,
        height: params.height as f32,
    });
}

/// Apply the latest resize to the camera projection and [`ViewportSize`].
fn handle_resize(
    mut resized: MessageReader<WindowResized>,
    mut viewport: ResMut<ViewportSize>,
    mut cameras: Query<&mut Projection, With<RideCamera>>,
) {
    let Some(last) = resized.read().last() else {
        return;
    };
    // Minimised windows report a zero size.
    if last.width <= 0.0 || last.height <= 0.0 {
        return;
    }

    *viewport = ViewportSize {
        width: last.width,
        height: last.height,
    };
    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = viewport.aspect_ratio();
        }
    }
    tracing::debug!("Viewport resized to {}x{}", last.width, last.height);
}
