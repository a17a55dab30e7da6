//! High-level flash operations
//!
//! [`Session`] owns the frame channel for one invocation and schedules reads,
//! programs and erases over it chunk by chunk.

mod erase;
mod load;
mod progress;
mod session;

pub use erase::{ErasePlan, EraseStep};
pub use load::load_bitstream;
pub use progress::{NoProgress, Phase, Progress};
pub use session::{DeviceInfo, Mode, Session, SessionOptions, NAME_LEN};
