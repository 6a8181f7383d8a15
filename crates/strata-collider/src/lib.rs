//! Physics collider construction: converts chunk voxel data into Rapier
//! colliders, one fixed rigid body per chunk. Chunks made only of box-like
//! blocks get unit cuboid colliders; a chunk holding any trimesh-hinted
//! block (ramps, stairs) gets one triangle mesh reusing the chunk's culled
//! collision surface instead.

use rapier3d::prelude::*;

pub mod collider;

pub use collider::{
    ChunkColliderDesc, ChunkColliderMap, build_chunk_collider_desc, insert_chunk_collider,
    refresh_chunk_colliders, remove_chunk_colliders,
};

/// Bundle of Rapier state backing the chunk colliders.
pub struct PhysicsWorld {
    /// Gravity applied to dynamic bodies, in m/s².
    pub gravity: Vector,
    /// Fixed-timestep solver settings.
    pub integration_parameters: IntegrationParameters,
    /// Steps the whole simulation.
    pub physics_pipeline: PhysicsPipeline,
    /// Sleep and wake bookkeeping for body islands.
    pub island_manager: IslandManager,
    /// BVH broad phase over collider AABBs.
    pub broad_phase: BroadPhaseBvh,
    /// Contact and intersection computation.
    pub narrow_phase: NarrowPhase,
    /// Every rigid body, including the fixed per-chunk ones.
    pub rigid_body_set: RigidBodySet,
    /// Every collider attached to those bodies.
    pub collider_set: ColliderSet,
    /// Impulse joints; unused by chunk colliders but required by the pipeline.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints, likewise pipeline-required.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection state.
    pub ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Creates a physics world with gravity `(0, -9.81, 0)` and a `1/60` s
    /// timestep.
    pub fn new() -> Self {
        Self {
            gravity: Vector::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters {
                dt: 1.0 / 60.0,
                ..Default::default()
            },
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
