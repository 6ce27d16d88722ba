//! Simulation boxes and particle systems.

mod simulation_box;
pub use self::simulation_box::{SimulationBox, BoxShape};

mod simple_system;
pub use self::simple_system::SimpleSystem;

#[cfg(test)]
pub(crate) mod test_utils;
