mod flusher;
mod queue;

pub use flusher::{FlusherConfig, FlusherHandle, WriteBackFlusher};
pub use queue::{PendingWrite, PendingWrites};
