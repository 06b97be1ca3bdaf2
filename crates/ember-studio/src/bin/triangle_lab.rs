//! Spinning RGB triangle for checking world/view/projection transforms by hand.
//!
//! Keys: 1 identity view, 2 and 5 look-at views, 3 perspective, 4 orthographic, esc quit.

use glam::{Mat4, Vec3};
use winit::dpi::LogicalSize;

use ember_engine::core::{App, AppControl, FrameCtx};
use ember_engine::device::GpuInit;
use ember_engine::input::Key;
use ember_engine::logging::{LoggingConfig, init_logging};
use ember_engine::render::triangle::{TriangleRenderer, Transforms};
use ember_engine::window::{Runtime, RuntimeConfig};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 99.0 / 255.0,
    g: 21.0 / 255.0,
    b: 35.0 / 255.0,
    a: 1.0,
};

/// Degrees per second around +Y.
const SPIN_SPEED: f32 = 180.0;

fn main() {
    init_logging(LoggingConfig::default());

    println!("triangle-lab  ·  1 identity  2/5 look-at  3 perspective  4 orthographic  esc quit");

    let config = RuntimeConfig {
        title: "ember triangle lab".to_string(),
        initial_size: LogicalSize::new(800.0, 600.0),
    };
    if let Err(e) = Runtime::run(config, GpuInit::default(), TriangleLab::default()) {
        log::error!("runtime error: {e:#}");
        eprintln!("triangle-lab runtime error: {e:#}");
        std::process::exit(1);
    }
}

fn look_at_from_front() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 0.5, 1.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
}

fn look_at_from_below() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, -0.5, 0.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
}

fn perspective(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(70f32.to_radians(), aspect, 0.01, 100.0)
}

fn orthographic() -> Mat4 {
    Mat4::orthographic_rh(-4.0, 4.0, -3.0, 3.0, -100.0, 100.0)
}

#[derive(Default)]
struct TriangleLab {
    renderer: TriangleRenderer,
    transforms: Transforms,
    angle: f32,
}

impl TriangleLab {
    fn apply_key(&mut self, key: Key, aspect: f32) {
        match key {
            Key::Digit1 => self.transforms.view = Mat4::IDENTITY,
            Key::Digit2 => self.transforms.view = look_at_from_front(),
            Key::Digit5 => self.transforms.view = look_at_from_below(),
            Key::Digit3 => self.transforms.projection = perspective(aspect),
            Key::Digit4 => self.transforms.projection = orthographic(),
            _ => {}
        }
    }

    fn spin(&mut self, dt: f32) {
        self.angle = (self.angle + SPIN_SPEED * dt) % 360.0;
        self.transforms.world = Mat4::from_rotation_y(self.angle.to_radians());
    }
}

impl App for TriangleLab {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let (w, h) = ctx.window.physical_size();
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        for &key in &ctx.input_frame.keys_pressed {
            self.apply_key(key, aspect);
        }

        self.spin(ctx.time.dt);

        let renderer = &mut self.renderer;
        let transforms = self.transforms;
        ctx.render(CLEAR, |rctx, target| renderer.render(rctx, target, transforms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_identity_view_and_projection() {
        let lab = TriangleLab::default();
        assert_eq!(lab.transforms.view, Mat4::IDENTITY);
        assert_eq!(lab.transforms.projection, Mat4::IDENTITY);
    }

    #[test]
    fn number_keys_swap_view_and_projection_independently() {
        let mut lab = TriangleLab::default();
        lab.apply_key(Key::Digit2, 4.0 / 3.0);
        lab.apply_key(Key::Digit4, 4.0 / 3.0);
        assert_eq!(lab.transforms.view, look_at_from_front());
        assert_eq!(lab.transforms.projection, orthographic());

        lab.apply_key(Key::Digit1, 4.0 / 3.0);
        assert_eq!(lab.transforms.view, Mat4::IDENTITY);
        assert_eq!(lab.transforms.projection, orthographic());
    }

    #[test]
    fn half_second_spins_half_a_turn() {
        let mut lab = TriangleLab::default();
        lab.spin(0.5);
        let tip = lab.transforms.world.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(tip.abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn orthographic_maps_box_corners_to_clip_edges() {
        let p = orthographic().project_point3(Vec3::new(4.0, 3.0, 0.0));
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }
}
