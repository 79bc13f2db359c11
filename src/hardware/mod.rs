/// ハードウェア制御モジュール
pub mod camera;
#[cfg(feature = "esp")]
pub mod led;

pub use camera::{Camera, CameraError, Frame, FrameSize};
