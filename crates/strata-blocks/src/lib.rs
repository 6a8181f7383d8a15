//! Block type definitions: the six-direction face model, geometric block
//! shapes with occlusion metadata, the built-in shape library, and the
//! registries mapping block ids to definitions and shape names to geometry.

pub mod builtin;
pub mod face;
pub mod registry;
pub mod shape;

pub use face::FaceDirection;
pub use registry::{BlockDefinition, BlockRegistry, RegistryError, ShapeRegistry};
pub use shape::{BlockShape, CollisionHint, FaceDef, Occlusion};
