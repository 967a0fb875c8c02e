//! Pool table physics using rapier3d

use glam::Vec3;
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::*;

use crate::core::Config;

/// Balls in a game: the cue ball plus a 15-ball rack
pub const BALL_COUNT: usize = 16;

/// Regulation ball mass in kilograms
const BALL_MASS: f32 = 0.17;

/// Slab thickness below the playing surface
const TABLE_THICKNESS: f32 = 0.05;

/// Steps run by [`TablePhysics::settle`]
const SETTLE_STEPS: usize = 480;

/// Step length used while settling
const SETTLE_DT: f32 = 1.0 / 240.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BallHandle(RigidBodyHandle);

/// Table geometry, read from the config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableDimensions {
    /// Playing surface length
    pub length: f32,
    /// Height of the playing surface above the floor
    pub height: f32,
    /// Ball diameter
    pub ball_diameter: f32,
}

impl TableDimensions {
    /// Read `L_table`, `H_table` and `ball_diameter`
    pub fn from_config(config: &Config) -> Self {
        Self {
            length: config.f32_or("L_table", 2.3368),
            height: config.f32_or("H_table", 0.77),
            ball_diameter: config.f32_or("ball_diameter", 0.05715),
        }
    }

    /// Playing surface width (half the length)
    pub fn width(&self) -> f32 {
        0.5 * self.length
    }

    /// Ball radius
    pub fn ball_radius(&self) -> f32 {
        0.5 * self.ball_diameter
    }

    /// Racked starting positions: the cue ball on the head string, then a
    /// triangle with its apex on the foot spot.
    pub fn rack_positions(&self) -> Vec<Vec3> {
        let radius = self.ball_radius();
        let y = self.height + radius;
        // Small gap so racked balls do not start in contact
        let spacing = self.ball_diameter + 0.0005;
        let row_step = spacing * 3f32.sqrt() * 0.5;
        let foot_spot = -0.25 * self.length;

        let mut positions = Vec::with_capacity(BALL_COUNT);
        positions.push(Vec3::new(0.0, y, 0.25 * self.length));
        for row in 0..5 {
            for col in 0..=row {
                let x = (col as f32 - 0.5 * row as f32) * spacing;
                let z = foot_spot - row as f32 * row_step;
                positions.push(Vec3::new(x, y, z));
            }
        }
        positions
    }
}

/// Physics world for one table
pub struct TablePhysics {
    /// Gravity vector
    pub gravity: Vec3,
    dimensions: TableDimensions,
    balls: Vec<BallHandle>,
    rack: Vec<Vec3>,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    integration_parameters: IntegrationParameters,
}

impl TablePhysics {
    /// Build the table and rack from the config's gravity and dimensions
    pub fn from_config(config: &Config) -> Self {
        let gravity = Vec3::new(0.0, -config.f32_or("gravity", 9.81), 0.0);
        Self::new(gravity, TableDimensions::from_config(config))
    }

    /// Build the table and rack
    pub fn new(gravity: Vec3, dimensions: TableDimensions) -> Self {
        let mut physics = Self {
            gravity,
            dimensions,
            balls: Vec::with_capacity(BALL_COUNT),
            rack: dimensions.rack_positions(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
        };
        physics.add_table();
        for i in 0..physics.rack.len() {
            let position = physics.rack[i];
            let ball = physics.add_ball(position);
            physics.balls.push(ball);
        }
        log::info!(
            "physics world ready: {} balls, gravity {:?}",
            physics.balls.len(),
            physics.gravity
        );
        physics
    }

    fn add_table(&mut self) {
        let half_thickness = 0.5 * TABLE_THICKNESS;
        let body = RigidBodyBuilder::fixed()
            .translation(vector![0.0, self.dimensions.height - half_thickness, 0.0])
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(
            0.5 * self.dimensions.width(),
            half_thickness,
            0.5 * self.dimensions.length,
        )
        .friction(0.2)
        .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
    }

    fn add_ball(&mut self, position: Vec3) -> BallHandle {
        let radius = self.dimensions.ball_radius();
        let volume = 4.0 / 3.0 * std::f32::consts::PI * radius.powi(3);
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .density(BALL_MASS / volume)
            .restitution(0.9)
            .friction(0.2)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        BallHandle(handle)
    }

    /// Step the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![self.gravity.x, self.gravity.y, self.gravity.z],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Let the balls come to rest with small steps before play starts
    pub fn settle(&mut self) {
        for _ in 0..SETTLE_STEPS {
            self.step(SETTLE_DT);
        }
    }

    /// Put every ball back on its rack position, at rest
    pub fn reset(&mut self) {
        for (ball, position) in self.balls.iter().zip(&self.rack) {
            if let Some(rb) = self.rigid_body_set.get_mut(ball.0) {
                rb.set_translation(vector![position.x, position.y, position.z], true);
                rb.set_rotation(UnitQuaternion::identity(), true);
                rb.set_linvel(vector![0.0, 0.0, 0.0], true);
                rb.set_angvel(vector![0.0, 0.0, 0.0], true);
                rb.reset_forces(true);
            }
        }
        log::info!("table reset");
    }

    /// Number of balls on the table
    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    /// Current position of ball `index`
    pub fn ball_position(&self, index: usize) -> Option<Vec3> {
        let ball = self.balls.get(index)?;
        self.rigid_body_set.get(ball.0).map(|rb| {
            let pos = rb.translation();
            Vec3::new(pos.x, pos.y, pos.z)
        })
    }

    /// Table geometry
    pub fn dimensions(&self) -> &TableDimensions {
        &self.dimensions
    }
}

impl std::fmt::Debug for TablePhysics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePhysics")
            .field("gravity", &self.gravity)
            .field("dimensions", &self.dimensions)
            .field("balls", &self.balls.len())
            .finish_non_exhaustive()
    }
}
