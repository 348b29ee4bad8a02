pub mod services;

pub use services::{identify, GateDecision, RateGate};
