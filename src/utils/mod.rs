mod epoch_millis;
mod request_fence;

pub use epoch_millis::*;
pub use request_fence::{FenceRefusal, RequestFence};
