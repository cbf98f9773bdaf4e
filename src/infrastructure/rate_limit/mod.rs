//! Request rate gate

mod rate_gate;

pub use rate_gate::{RateDecision, RateGate, RateGateConfig};
