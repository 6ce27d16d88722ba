use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use linkcell::{CellListParameters, CellNeighbors, Vector3D};
use linkcell::systems::SimulationBox;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count = match std::env::args().nth(1) {
        Some(count) => count.parse()?,
        None => 50_000,
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    // run the calculation
    let n_pairs = count_pairs(count)?;
    println!("found {} pairs between {} particles", n_pairs, count);

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Build a cell list for `count` random particles in a triclinic box, move
/// the particles a few times and count the pairs after each move
fn count_pairs(count: usize) -> Result<usize, Box<dyn std::error::Error>> {
    let length = f64::cbrt(count as f64 / 0.8);
    let simulation_box = SimulationBox::triclinic(length, length, length, 80.0, 95.0, 105.0);

    let mut rng = StdRng::seed_from_u64(0);
    let mut positions = (0..count)
        .map(|_| simulation_box.cartesian(Vector3D::new(rng.gen(), rng.gen(), rng.gen())))
        .collect::<Vec<_>>();

    let parameters = CellListParameters::from_json(r#"{
        "cutoff": 2.5,
        "cell_range": 2
    }"#)?;

    let n_pairs = time_graph::spanned!("Full calculation", {
        let mut neighbors = CellNeighbors::new(simulation_box, parameters)?;
        neighbors.assign_all(&positions);

        let mut n_pairs = 0;
        for _ in 0..10 {
            for (particle, position) in positions.iter_mut().enumerate() {
                *position += Vector3D::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));
                simulation_box.wrap_vector(position);
                neighbors.on_particle_moved(particle, *position);
            }

            n_pairs = 0;
            neighbors.for_each_pair(&positions, |_| n_pairs += 1);
        }
        n_pairs
    });

    Ok(n_pairs)
}
