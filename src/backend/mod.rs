mod traits;
mod transform;

#[cfg(feature = "avian3d")]
pub mod avian;

pub use traits::{BodyState, MotionPhysicsBackend};
pub use transform::{BodyProperties, ImpulseAccumulator, TransformBackend, TransformBackendPlugin};

#[cfg(feature = "avian3d")]
pub use avian::Avian3dBackend;
