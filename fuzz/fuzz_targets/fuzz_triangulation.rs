#![no_main]

use libfuzzer_sys::fuzz_target;
use survey_mesh::Triangulation;

fuzz_target!(|vertices: Vec<[f64; 3]>| {
    let mut triangulation = Triangulation::new();

    let Ok(result) = triangulation.triangulate(&vertices, None) else {
        return;
    };

    for tri in &result.triangles {
        assert!(tri.iter().all(|&idx| idx < vertices.len()));
    }
    assert!(triangulation.is_sound());
});
