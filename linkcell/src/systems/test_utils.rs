use crate::Vector3D;
use super::{SimpleSystem, SimulationBox};

pub fn test_system(name: &str) -> SimpleSystem {
    match name {
        "dimer" => get_dimer(),
        "chain" => get_chain(),
        _ => panic!("unknown test system {}", name)
    }
}

/// Pairs of the system as `(min, max)` tuples, sorted
pub fn sorted_pairs(system: &SimpleSystem) -> Vec<(usize, usize)> {
    let mut pairs = system.pairs()
        .expect("missing neighbors")
        .map(|pair| (usize::min(pair.first, pair.second), usize::max(pair.first, pair.second)))
        .collect::<Vec<_>>();
    pairs.sort_unstable();
    return pairs;
}

fn get_dimer() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationBox::cubic(10.0));
    system.add_particle(Vector3D::new(0.0, 0.0, 0.0));
    system.add_particle(Vector3D::new(1.5, 0.0, 0.0));
    return system;
}

/// Linear chain of five particles with a spacing of 1
fn get_chain() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationBox::cubic(10.0));
    for i in 0..5 {
        system.add_particle(Vector3D::new(1.0 + i as f64, 1.0, 1.0));
    }
    return system;
}
