use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::dpi::LogicalSize;

use ember_engine::billboard::{BillboardBatch, BillboardOwner};
use ember_engine::camera::{Camera, Projection};
use ember_engine::core::{App, AppControl, FrameCtx};
use ember_engine::device::GpuInit;
use ember_engine::input::Key;
use ember_engine::logging::{LoggingConfig, init_logging};
use ember_engine::particles::{ParticleDescriptor, ParticleEmitter, ParticleSystem};
use ember_engine::render::billboard::{BillboardRenderer, BillboardTexture};
use ember_engine::window::{Runtime, RuntimeConfig};
use ember_scene::{LightSet, LightSource};

const CLEAR: wgpu::Color = wgpu::Color { r: 0.02, g: 0.02, b: 0.04, a: 1.0 };

/// Degrees per second.
const CAMERA_ORBIT_SPEED: f32 = 20.0;
const SMOKE_ORBIT_SPEED: f32 = 45.0;
const SMOKE_ORBIT_RADIUS: f32 = 2.0;

fn main() {
    init_logging(LoggingConfig::default());

    let lights = match load_lights(std::env::args().skip(1)) {
        Ok(set) => set,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("ember-studio: {e:#}");
            std::process::exit(1);
        }
    };

    let studio = ParticleStudio::new(lights.lights());

    println!("ember-studio  ·  1 perspective  2 orthographic  space pause  P orbit  esc quit");

    let config = RuntimeConfig {
        title: "ember studio".to_string(),
        initial_size: LogicalSize::new(1024.0, 768.0),
    };
    if let Err(e) = Runtime::run(config, GpuInit::default(), studio) {
        log::error!("runtime error: {e:#}");
        eprintln!("ember-studio runtime error: {e:#}");
        std::process::exit(1);
    }
}

/// Loads one light per scene file. A bad file is fatal.
fn load_lights(paths: impl Iterator<Item = String>) -> Result<LightSet> {
    let mut set = LightSet::new();
    for path in paths {
        let src = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read scene file {path}"))?;
        let light = set.load(&src).with_context(|| format!("in scene file {path}"))?;
        log::info!(
            "light from {path}: position {:?}, color {:?}",
            light.position,
            light.color
        );
    }
    Ok(set)
}

/// Fire plume whose warm colors are multiplied by the light's color.
fn tinted_fire(light: &LightSource) -> ParticleDescriptor {
    let [r, g, b] = light.color;
    let tint = Vec4::new(r, g, b, 1.0);
    let fire = ParticleDescriptor::fire();
    ParticleDescriptor {
        initial_color: fire.initial_color * tint,
        mid_color: fire.mid_color * tint,
        ..fire
    }
}

/// World transform of the smoke emitter's parent at `time` seconds.
fn smoke_orbit(time: f32) -> Mat4 {
    Mat4::from_rotation_y((SMOKE_ORBIT_SPEED * time).to_radians())
        * Mat4::from_translation(Vec3::new(SMOKE_ORBIT_RADIUS, 0.5, 0.0))
}

/// Particle systems for the scene, plus the index of the parented smoke system.
fn build_systems(lights: &[LightSource]) -> (Vec<ParticleSystem>, Option<usize>) {
    if lights.is_empty() {
        let fire = ParticleSystem::new(
            BillboardOwner(0),
            ParticleEmitter::new(Vec3::ZERO),
            Arc::new(ParticleDescriptor::fire()),
        );
        let smoke = ParticleSystem::new(
            BillboardOwner(1),
            ParticleEmitter::with_parent(Vec3::ZERO, smoke_orbit(0.0)),
            Arc::new(ParticleDescriptor::smoke()),
        );
        return (vec![fire, smoke], Some(1));
    }

    let systems = lights
        .iter()
        .enumerate()
        .map(|(i, light)| {
            let [x, y, z, _] = light.position;
            ParticleSystem::new(
                BillboardOwner(i as u32),
                ParticleEmitter::new(Vec3::new(x, y, z)),
                Arc::new(tinted_fire(light)),
            )
        })
        .collect();
    (systems, None)
}

struct ParticleStudio {
    camera: Camera,
    batch: BillboardBatch,
    systems: Vec<ParticleSystem>,
    smoke: Option<usize>,
    renderer: BillboardRenderer,
    rng: StdRng,

    paused: bool,
    orbiting: bool,
    sim_time: f32,
}

impl ParticleStudio {
    fn new(lights: &[LightSource]) -> Self {
        let (systems, smoke) = build_systems(lights);
        let capacity = systems.iter().map(ParticleSystem::max_particles).sum();

        log::info!("{} particle system(s), batch capacity {capacity}", systems.len());

        Self {
            camera: Camera::new(
                Vec3::new(0.0, 2.0, 8.0),
                Vec3::new(0.0, 1.5, 0.0),
                Projection::perspective(60.0, 4.0 / 3.0),
            ),
            batch: BillboardBatch::new(capacity),
            systems,
            smoke,
            renderer: BillboardRenderer::with_texture(BillboardTexture::soft_disc(64)),
            rng: StdRng::from_os_rng(),
            paused: false,
            orbiting: true,
            sim_time: 0.0,
        }
    }

    fn handle_keys(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        let frame = ctx.input_frame;

        if frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }
        let perspective = matches!(self.camera.projection, Projection::Perspective { .. });
        if frame.pressed(Key::Digit1) && !perspective {
            self.camera.toggle_projection();
        }
        if frame.pressed(Key::Digit2) && perspective {
            self.camera.toggle_projection();
        }
        if frame.pressed(Key::Space) {
            self.paused = !self.paused;
            log::info!("simulation {}", if self.paused { "paused" } else { "resumed" });
        }
        if frame.pressed(Key::P) {
            self.orbiting = !self.orbiting;
        }

        AppControl::Continue
    }

    fn simulate(&mut self, dt: f32) {
        self.sim_time += dt;

        if let Some(system) = self.smoke.and_then(|i| self.systems.get_mut(i)) {
            system
                .emitter_mut()
                .set_parent_transform(Some(smoke_orbit(self.sim_time)));
        }

        for system in &mut self.systems {
            system.update(dt, &mut self.batch, &mut self.rng);
        }
    }
}

impl App for ParticleStudio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_keys(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }

        let dt = ctx.time.dt;
        let (w, h) = ctx.window.physical_size();
        if h > 0 {
            self.camera.set_aspect(w as f32 / h as f32);
        }
        if self.orbiting {
            self.camera.orbit(CAMERA_ORBIT_SPEED * dt);
        }
        if !self.paused {
            self.simulate(dt);
        }

        // Re-sorted every frame: the camera may move while the simulation is paused.
        self.batch.update(self.camera.view_matrix(), self.systems.as_slice());

        let renderer = &mut self.renderer;
        let batch = &self.batch;
        let camera = &self.camera;

        ctx.render(CLEAR, |rctx, target| {
            renderer.upload(rctx, batch);
            renderer.draw(rctx, target, camera, batch);
        })
    }
}

impl Drop for ParticleStudio {
    fn drop(&mut self) {
        for system in self.systems.drain(..) {
            system.release(&mut self.batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── scene setup ───────────────────────────────────────────────────────

    #[test]
    fn default_scene_is_fire_and_orbiting_smoke() {
        let (systems, smoke) = build_systems(&[]);
        assert_eq!(systems.len(), 2);
        assert_eq!(smoke, Some(1));
        assert!(systems[1].emitter().position().abs_diff_eq(smoke_orbit(0.0).transform_point3(Vec3::ZERO), 1e-6));
    }

    #[test]
    fn one_fire_per_light_at_its_position() {
        let lights = [
            LightSource { position: [1.0, 2.0, 3.0, 1.0], ..LightSource::default() },
            LightSource { position: [-4.0, 0.0, 0.0, 1.0], ..LightSource::default() },
        ];
        let (systems, smoke) = build_systems(&lights);
        assert_eq!(systems.len(), 2);
        assert!(smoke.is_none());
        assert_eq!(systems[0].emitter().position(), Vec3::new(1.0, 2.0, 3.0));
        assert_ne!(systems[0].owner(), systems[1].owner());
    }

    #[test]
    fn batch_capacity_covers_every_pool() {
        let studio = ParticleStudio::new(&[]);
        let total: usize = studio.systems.iter().map(ParticleSystem::max_particles).sum();
        assert_eq!(studio.batch.capacity(), total);
    }

    #[test]
    fn fire_is_tinted_by_light_color() {
        let light = LightSource { color: [0.0, 1.0, 0.5], ..LightSource::default() };
        let d = tinted_fire(&light);
        let fire = ParticleDescriptor::fire();
        assert_eq!(d.initial_color.x, 0.0);
        assert_eq!(d.mid_color.z, fire.mid_color.z * 0.5);
        assert_eq!(d.mid_color.w, fire.mid_color.w);
        assert_eq!(d.end_color, fire.end_color);
    }

    // ── simulation ────────────────────────────────────────────────────────

    #[test]
    fn simulated_scene_keeps_batch_in_sync_with_systems() {
        let mut studio = ParticleStudio::new(&[]);
        for _ in 0..200 {
            studio.simulate(1.0 / 60.0);
        }
        let active: usize = studio.systems.iter().map(ParticleSystem::active_count).sum();
        assert_eq!(studio.batch.live_count(), active);
        assert!(active > 0);

        studio.batch.update(studio.camera.view_matrix(), studio.systems.as_slice());
        assert_eq!(studio.batch.vertex_count(), active * 6);
    }

    // ── scene files ───────────────────────────────────────────────────────

    #[test]
    fn missing_scene_file_names_the_path() {
        let err = load_lights(std::iter::once("/nonexistent/light.txt".to_string())).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/light.txt"));
    }
}
