//! Registry server process core.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use lifecycle::{Dispatcher, ShutdownHandle, ShutdownOutcome, ShutdownRequest};

// Unit tests read the allocator counters.
#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: health::alloc::CountingAllocator = health::alloc::CountingAllocator::system();
