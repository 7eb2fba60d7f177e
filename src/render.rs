//! Draw-list extraction
//!
//! Walks the active slots of every pool and emits plain GPU-ready instance
//! records. Nothing here knows how drawing happens; a renderer uploads the
//! byte slices and picks a pipeline from the layer's blend mode.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::sim::World;

/// One sprite/quad instance
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub position: [f32; 2],
    /// Radians
    pub rotation: f32,
    /// Radius or half-size in pixels
    pub size: f32,
    pub color: [f32; 4],
}

impl Instance {
    pub fn new(position: Vec2, rotation: f32, size: f32, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            rotation,
            size,
            color,
        }
    }
}

/// Simple 2D vertex with position and color (line lists)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// How a layer is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    Alpha,
    Additive,
}

/// Colors for game elements
pub mod colors {
    pub const STAR: [f32; 4] = [0.8, 0.85, 1.0, 1.0];
    pub const ASTEROID: [f32; 4] = [0.75, 0.75, 0.8, 1.0];
    pub const BULLET: [f32; 4] = [1.0, 1.0, 0.6, 1.0];
    pub const LANDER: [f32; 4] = [0.3, 1.0, 0.4, 1.0];
    pub const BAITER: [f32; 4] = [1.0, 0.3, 0.8, 1.0];
    pub const SHIP: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.02, 1.0];
}

/// Glow pass scale relative to the particle core
const GLOW_SCALE: f32 = 2.5;
const GLOW_ALPHA: f32 = 0.35;

/// Instances for one draw call
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: &'static str,
    pub blend: Blend,
    pub instances: Vec<Instance>,
}

impl Layer {
    fn new(name: &'static str, blend: Blend) -> Self {
        Self {
            name,
            blend,
            instances: Vec::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Everything a renderer needs for one frame, back to front
#[derive(Debug, Clone)]
pub struct DrawList {
    /// Framebuffer clear color
    pub clear_color: [f32; 4],
    pub layers: Vec<Layer>,
    /// Asteroid outlines as a line list (pairs of vertices)
    pub outlines: Vec<Vertex>,
}

impl DrawList {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn instance_count(&self) -> usize {
        self.layers.iter().map(|l| l.instances.len()).sum()
    }

    pub fn outline_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.outlines)
    }
}

/// Build the frame's draw list from the world's active entities
pub fn build_draw_list(world: &World) -> DrawList {
    let mut stars = Layer::new("stars", Blend::Additive);
    world.stars.for_each_active(|_, s| {
        let mut color = colors::STAR;
        color[3] = s.brightness;
        stars
            .instances
            .push(Instance::new(s.pos, 0.0, s.size(), color));
    });

    let mut asteroids = Layer::new("asteroids", Blend::Alpha);
    let mut outlines = Vec::new();
    world.asteroids.for_each_active(|_, a| {
        asteroids
            .instances
            .push(Instance::new(a.pos, a.angle, a.radius(), colors::ASTEROID));

        let points: Vec<Vec2> = a.outline().collect();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            outlines.push(Vertex::new(p.x, p.y, colors::ASTEROID));
            outlines.push(Vertex::new(q.x, q.y, colors::ASTEROID));
        }
    });

    let mut enemies = Layer::new("enemies", Blend::Alpha);
    world.enemies.for_each_active(|_, e| {
        let color = match e.kind {
            crate::sim::EnemyKind::Lander => colors::LANDER,
            crate::sim::EnemyKind::Baiter => colors::BAITER,
        };
        enemies
            .instances
            .push(Instance::new(e.pos, 0.0, e.half_extents().x, color));
    });

    let mut bullets = Layer::new("bullets", Blend::Additive);
    world.bullets.for_each_active(|_, b| {
        bullets
            .instances
            .push(Instance::new(b.pos, 0.0, b.radius, colors::BULLET));
    });

    // Particles draw twice: a wide, faint additive glow and a solid core
    let mut glow = Layer::new("particle_glow", Blend::Additive);
    let mut particles = Layer::new("particles", Blend::Alpha);
    world.particles.for_each_active(|_, p| {
        let mut halo = p.color;
        halo[3] *= GLOW_ALPHA;
        glow.instances
            .push(Instance::new(p.pos, 0.0, p.size * GLOW_SCALE, halo));
        particles
            .instances
            .push(Instance::new(p.pos, 0.0, p.size, p.color));
    });

    let mut ship = Layer::new("ship", Blend::Alpha);
    if world.ship.alive {
        let mut color = colors::SHIP;
        // Blink while invulnerable
        if world.ship.invulnerable_timer > 0.0 && world.time_ticks % 10 < 5 {
            color[3] = 0.3;
        }
        ship.instances.push(Instance::new(
            world.ship.pos,
            world.ship.angle,
            world.ship.radius,
            color,
        ));
    }

    DrawList {
        clear_color: colors::BACKGROUND,
        layers: vec![stars, asteroids, enemies, bullets, glow, particles, ship],
        outlines,
    }
}
