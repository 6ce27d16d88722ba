#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use linkcell::{Pair, Vector3D};
use linkcell::systems::SimulationBox;

/// Uniformly distributed random positions inside the box
pub fn random_positions(simulation_box: &SimulationBox, count: usize, seed: u64) -> Vec<Vector3D> {
    let mut rng = StdRng::seed_from_u64(seed);
    return (0..count)
        .map(|_| {
            let fractional = Vector3D::new(rng.gen(), rng.gen(), rng.gen());
            simulation_box.cartesian(fractional)
        })
        .collect();
}

/// Displace all `positions` by a random amount up to `max_displacement`
/// along each axis, and wrap them back inside the box
pub fn displace(simulation_box: &SimulationBox, positions: &mut [Vector3D], max_displacement: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for position in positions {
        let delta = Vector3D::new(
            rng.gen_range(-max_displacement..max_displacement),
            rng.gen_range(-max_displacement..max_displacement),
            rng.gen_range(-max_displacement..max_displacement),
        );
        *position += delta;
        simulation_box.wrap_vector(position);
    }
}

/// Pair with the smaller index first, as rounded integer keys for sorting
/// and exact comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PairKey {
    pub first: usize,
    pub second: usize,
    pub vector: [i64; 3],
}

impl PairKey {
    pub fn new(first: usize, second: usize, vector: Vector3D) -> PairKey {
        if first < second {
            PairKey { first: first, second: second, vector: round(vector) }
        } else if first > second {
            PairKey { first: second, second: first, vector: round(-vector) }
        } else {
            // a particle paired with its own image, the pair is the same in
            // both directions
            let vector = round(vector);
            let reversed = [-vector[0], -vector[1], -vector[2]];
            PairKey { first: first, second: second, vector: std::cmp::max(vector, reversed) }
        }
    }

    pub fn from_pair(pair: &Pair) -> PairKey {
        PairKey::new(pair.first, pair.second, pair.vector)
    }
}

/// Get all pairs closer than `cutoff`, including all periodic images, by
/// checking every pair of particles and every image
pub fn brute_force_pairs(simulation_box: &SimulationBox, positions: &[Vector3D], cutoff: f64) -> Vec<PairKey> {
    let range = image_range(simulation_box, cutoff);
    let (a, b, c) = (simulation_box.edge(0), simulation_box.edge(1), simulation_box.edge(2));

    let mut pairs = Vec::new();
    for i in 0..positions.len() {
        for j in i..positions.len() {
            for m0 in -range[0]..=range[0] {
                for m1 in -range[1]..=range[1] {
                    for m2 in -range[2]..=range[2] {
                        if i == j && !is_up([m0, m1, m2]) {
                            continue;
                        }

                        let shift = m0 as f64 * a + m1 as f64 * b + m2 as f64 * c;
                        let vector = positions[j] - positions[i] + shift;
                        if vector.norm() <= cutoff {
                            pairs.push(PairKey::new(i, j, vector));
                        }
                    }
                }
            }
        }
    }

    pairs.sort_unstable();
    return pairs;
}

/// Neighbor of a single particle, with the vector from this particle to the
/// neighbor rounded to integer keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NeighborKey {
    pub other: usize,
    pub vector: [i64; 3],
}

impl NeighborKey {
    pub fn from_pair(pair: &Pair) -> NeighborKey {
        NeighborKey { other: pair.second, vector: round(pair.vector) }
    }
}

/// Get all the neighbors of `particle` by checking every other particle
/// and every image
pub fn brute_force_neighbors(simulation_box: &SimulationBox, positions: &[Vector3D], cutoff: f64, particle: usize) -> Vec<NeighborKey> {
    let range = image_range(simulation_box, cutoff);
    let (a, b, c) = (simulation_box.edge(0), simulation_box.edge(1), simulation_box.edge(2));

    let mut neighbors = Vec::new();
    for j in 0..positions.len() {
        for m0 in -range[0]..=range[0] {
            for m1 in -range[1]..=range[1] {
                for m2 in -range[2]..=range[2] {
                    if j == particle && m0 == 0 && m1 == 0 && m2 == 0 {
                        continue;
                    }

                    let shift = m0 as f64 * a + m1 as f64 * b + m2 as f64 * c;
                    let vector = positions[j] - positions[particle] + shift;
                    if vector.norm() <= cutoff {
                        neighbors.push(NeighborKey { other: j, vector: round(vector) });
                    }
                }
            }
        }
    }

    neighbors.sort_unstable();
    return neighbors;
}

/// Sorted keys of the given pairs
pub fn pair_keys(pairs: impl Iterator<Item = Pair>) -> Vec<PairKey> {
    let mut keys = pairs.map(|pair| PairKey::from_pair(&pair)).collect::<Vec<_>>();
    keys.sort_unstable();
    return keys;
}

/// Sorted keys of the given neighbors
pub fn neighbor_keys(pairs: impl Iterator<Item = Pair>) -> Vec<NeighborKey> {
    let mut keys = pairs.map(|pair| NeighborKey::from_pair(&pair)).collect::<Vec<_>>();
    keys.sort_unstable();
    return keys;
}

/// Largest number of box lengths between a particle and an image within the
/// cutoff, along each axis
fn image_range(simulation_box: &SimulationBox, cutoff: f64) -> [i32; 3] {
    let faces = simulation_box.distances_between_faces();
    let mut range = [0; 3];
    for axis in 0..3 {
        if simulation_box.is_periodic(axis) {
            range[axis] = f64::ceil(cutoff / faces[axis]) as i32 + 1;
        }
    }
    return range;
}

fn round(vector: Vector3D) -> [i64; 3] {
    [
        f64::round(vector[0] * 1e6) as i64,
        f64::round(vector[1] * 1e6) as i64,
        f64::round(vector[2] * 1e6) as i64,
    ]
}

fn is_up(displacement: [i32; 3]) -> bool {
    for value in displacement {
        if value != 0 {
            return value > 0;
        }
    }
    return false;
}
