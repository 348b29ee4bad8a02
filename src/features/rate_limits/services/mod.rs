mod rate_gate;

pub use rate_gate::{identify, GateDecision, InMemoryRateStore, RateGate, RateStore};
