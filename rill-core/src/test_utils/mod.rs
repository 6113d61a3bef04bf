//! In-memory implementations for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that prove the trait APIs are usable.

mod echo_component;
mod in_memory_loader;
mod recording_sink;

pub use echo_component::EchoComponent;
pub use in_memory_loader::InMemoryLoader;
pub use recording_sink::RecordingSink;
