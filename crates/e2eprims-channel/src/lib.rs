//! Named FIFO byte queues with deterministic fault injection.
//!
//! This is the lowest layer of e2eprims. It stands in for whatever unreliable
//! transport carries protected frames between a sender and a receiver:
//! - [`QueueBus`] is a lossless, strictly ordered set of named queues
//! - [`FaultyBus`] wraps it and drops, repeats, corrupts or reorders entries
//!   according to per-name [`FaultPlan`]s or a seeded [`ChaosConfig`]
//!
//! Both implement [`ByteChannel`], the only interface the upper layers use.

pub mod error;
pub mod fault;
pub mod faulty;
pub mod queue;
pub mod traits;

pub use error::{ChannelError, Result};
pub use fault::{ChaosConfig, Fault, FaultPlan, Trigger};
pub use faulty::{ChannelStats, FaultyBus};
pub use queue::QueueBus;
pub use traits::ByteChannel;
