//! Mutation events and their dispatch

mod bus;
mod event;

pub use bus::{EventBus, MutationHandler};
pub use event::{ChangeKind, MutationEvent};

#[cfg(test)]
pub use bus::MockMutationHandler;
