pub mod clock;
pub mod constants;
pub mod hash;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
