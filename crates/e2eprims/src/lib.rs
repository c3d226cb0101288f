//! End-to-end protection of periodic readings over unreliable byte channels.
//!
//! # Crate Structure
//!
//! - [`channel`]: Named byte queues with fault injection
//! - [`protect`]: Sequence counter + CRC-16 protection state machines
//! - [`airbag`]: Demo application: a crash sensor feeding an airbag controller
//! - [`campaign`]: Seeded fault-injection campaigns over the demo

pub mod airbag;
pub mod campaign;

/// Re-export channel types.
pub mod channel {
    pub use e2eprims_channel::*;
}

/// Re-export protection types.
pub mod protect {
    pub use e2eprims_protect::*;
}
