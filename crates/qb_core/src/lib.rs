pub mod animation;
pub mod components;
pub mod input;
pub mod time;
pub mod timer;

pub use animation::{FrameDuration, SpriteAnimation, SpriteFrame};
pub use components::{Gravity, Highlight, Motion, TextureOffset, TextureSlide, Transform};
pub use input::{InputState, Key, MouseBtn};
pub use time::{TimeState, FIXED_DT_SECS, FIXED_DT_US};
pub use timer::RepeatingTimer;
