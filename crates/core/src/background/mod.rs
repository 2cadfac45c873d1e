//! Decorative background: a slowly rotating star field and a floating
//! wireframe torus, both pure functions of elapsed time.
//!
//! The [`AmbientDriver`] owns its own frame timer. It is started and stopped
//! with the page and shares nothing with the interactive components.

use std::{
    cell::RefCell,
    f32::consts::TAU,
    rc::{Rc, Weak},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::BackgroundConfig,
    host::{Registration, TimerHost},
};

/// Stacking order of the background layer, below all content.
pub const LAYER_Z_INDEX: i32 = -10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Position and Euler rotation (radians) of an object at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            fov: 75.0,
        }
    }
}

/// Points scattered uniformly inside a cube centred on the origin.
#[derive(Debug, Clone)]
pub struct StarField {
    positions: Vec<Vec3>,
}

impl StarField {
    const SPIN: Vec3 = Vec3::new(0.05, 0.02, 0.0);

    pub fn generate(count: usize, spread: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut coordinate = || (rng.gen::<f32>() - 0.5) * spread;
        let positions = (0..count)
            .map(|_| Vec3::new(coordinate(), coordinate(), coordinate()))
            .collect();
        Self { positions }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn rotation_at(&self, elapsed: f32) -> Vec3 {
        Vec3::new(Self::SPIN.x * elapsed, Self::SPIN.y * elapsed, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusGeometry {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl Default for TorusGeometry {
    fn default() -> Self {
        Self {
            radius: 3.0,
            tube: 1.0,
            radial_segments: 16,
            tubular_segments: 100,
        }
    }
}

impl TorusGeometry {
    /// Grid of `(radial + 1) * (tubular + 1)` vertices; the seam is
    /// duplicated so that each ring closes on itself.
    pub fn vertices(&self) -> Vec<Vec3> {
        let mut vertices =
            Vec::with_capacity(((self.radial_segments + 1) * (self.tubular_segments + 1)) as usize);
        for j in 0..=self.radial_segments {
            let v = j as f32 / self.radial_segments as f32 * TAU;
            for i in 0..=self.tubular_segments {
                let u = i as f32 / self.tubular_segments as f32 * TAU;
                let ring = self.radius + self.tube * v.cos();
                vertices.push(Vec3::new(ring * u.cos(), ring * u.sin(), self.tube * v.sin()));
            }
        }
        vertices
    }

    /// Number of line segments drawn in wireframe mode.
    pub fn wireframe_edges(&self) -> usize {
        // every quad contributes its top and left edge plus one diagonal
        (self.radial_segments * self.tubular_segments * 3) as usize
    }
}

#[derive(Debug, Clone)]
pub struct FloatingTorus {
    pub geometry: TorusGeometry,
    pub base_position: Vec3,
}

impl Default for FloatingTorus {
    fn default() -> Self {
        Self {
            geometry: TorusGeometry::default(),
            base_position: Vec3::new(10.0, 0.0, 0.0),
        }
    }
}

impl FloatingTorus {
    pub fn transform_at(&self, elapsed: f32) -> Transform {
        Transform {
            position: Vec3::new(self.base_position.x, elapsed.sin() * 2.0, self.base_position.z),
            rotation: Vec3::new(elapsed * 0.2, elapsed * 0.1, 0.0),
        }
    }
}

/// Everything needed to draw one background frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundFrame {
    pub elapsed: f32,
    pub star_rotation: Vec3,
    pub torus: Transform,
}

#[derive(Debug, Clone)]
pub struct BackgroundScene {
    pub camera: Camera,
    pub stars: StarField,
    pub torus: FloatingTorus,
}

impl BackgroundScene {
    pub fn from_config(config: &BackgroundConfig) -> Self {
        Self {
            camera: Camera::default(),
            stars: StarField::generate(config.star_count, config.spread, config.seed),
            torus: FloatingTorus::default(),
        }
    }

    pub fn frame(&self, elapsed: Duration) -> BackgroundFrame {
        let seconds = elapsed.as_secs_f32();
        BackgroundFrame {
            elapsed: seconds,
            star_rotation: self.stars.rotation_at(seconds),
            torus: self.torus.transform_at(seconds),
        }
    }
}

struct DriverState {
    scene: BackgroundScene,
    started_at: Duration,
    latest: Option<BackgroundFrame>,
    frames: u64,
}

/// Continuously samples the background scene on a host frame timer.
pub struct AmbientDriver {
    state: Rc<RefCell<DriverState>>,
    timers: Rc<dyn TimerHost>,
    timer: Option<Registration>,
}

impl AmbientDriver {
    pub fn start(
        scene: BackgroundScene,
        timers: Rc<dyn TimerHost>,
        frame_interval: Duration,
    ) -> Self {
        let state = Rc::new(RefCell::new(DriverState {
            scene,
            started_at: timers.now(),
            latest: None,
            frames: 0,
        }));

        let weak: Weak<RefCell<DriverState>> = Rc::downgrade(&state);
        let clock = Rc::downgrade(&timers);
        let timer = timers.set_interval(
            frame_interval,
            Box::new(move || {
                let (Some(state), Some(clock)) = (weak.upgrade(), clock.upgrade()) else {
                    return;
                };
                let mut state = state.borrow_mut();
                let elapsed = clock.now().saturating_sub(state.started_at);
                let frame = state.scene.frame(elapsed);
                state.latest = Some(frame);
                state.frames += 1;
            }),
        );
        tracing::debug!(?frame_interval, "ambient background started");

        Self {
            state,
            timers,
            timer: Some(timer),
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Time since the driver was started, according to the host clock.
    pub fn elapsed(&self) -> Duration {
        self.timers.now().saturating_sub(self.state.borrow().started_at)
    }

    pub fn latest_frame(&self) -> Option<BackgroundFrame> {
        self.state.borrow().latest
    }

    pub fn frames_drawn(&self) -> u64 {
        self.state.borrow().frames
    }

    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.release();
            tracing::debug!(frames = self.frames_drawn(), "ambient background stopped");
        }
    }
}

impl std::fmt::Debug for AmbientDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientDriver")
            .field("running", &self.is_running())
            .field("frames", &self.frames_drawn())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    #[test]
    fn star_field_is_reproducible_and_bounded() {
        let a = StarField::generate(500, 2_000.0, 42);
        let b = StarField::generate(500, 2_000.0, 42);
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.len(), 500);
        assert!(a
            .positions()
            .iter()
            .all(|p| [p.x, p.y, p.z].iter().all(|c| c.abs() <= 1_000.0)));

        let c = StarField::generate(500, 2_000.0, 43);
        assert_ne!(a.positions(), c.positions());
    }

    #[test]
    fn torus_vertices_lie_on_the_tube() {
        let geometry = TorusGeometry::default();
        let vertices = geometry.vertices();
        assert_eq!(vertices.len(), 17 * 101);

        for vertex in vertices {
            let ring = (vertex.x * vertex.x + vertex.y * vertex.y).sqrt() - geometry.radius;
            let distance = (ring * ring + vertex.z * vertex.z).sqrt();
            assert!((distance - geometry.tube).abs() < 1e-4);
        }
        assert_eq!(geometry.wireframe_edges(), 16 * 100 * 3);
    }

    #[test]
    fn frame_follows_elapsed_time() {
        let scene = BackgroundScene::from_config(&BackgroundConfig {
            star_count: 10,
            ..BackgroundConfig::default()
        });
        let frame = scene.frame(Duration::from_secs(10));
        assert!((frame.star_rotation.x - 0.5).abs() < 1e-5);
        assert!((frame.star_rotation.y - 0.2).abs() < 1e-5);
        assert!((frame.torus.rotation.x - 2.0).abs() < 1e-5);
        assert!((frame.torus.position.y - 10f32.sin() * 2.0).abs() < 1e-5);
        assert_eq!(frame.torus.position.x, 10.0);
    }

    #[test]
    fn driver_samples_until_stopped() {
        let host = SimulatedHost::new(800.0);
        host.advance(Duration::from_secs(1));
        let scene = BackgroundScene::from_config(&BackgroundConfig {
            star_count: 10,
            ..BackgroundConfig::default()
        });
        let mut driver =
            AmbientDriver::start(scene, Rc::new(host.clone()), Duration::from_millis(100));

        host.advance(Duration::from_millis(500));
        assert_eq!(driver.frames_drawn(), 5);
        let frame = driver.latest_frame().unwrap();
        assert!((frame.elapsed - 0.5).abs() < 1e-5);

        driver.stop();
        assert!(!driver.is_running());
        host.advance(Duration::from_secs(5));
        assert_eq!(driver.frames_drawn(), 5);
        assert_eq!(host.active_timers(), 0);
    }
}
