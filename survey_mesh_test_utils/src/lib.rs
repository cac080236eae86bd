//! utils for survey_mesh tests
#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

use rand::{distr::Uniform, prelude::Distribution};
use rand_distr::{Normal, UnitDisc};
use std::ops::RangeInclusive;

pub type Vertex3 = [f64; 3];

/// Samples `n` vertices in 3D space from the [Uniform] distribution.
///
/// If no range is specified, the unit-cube centered around the origin is used, `[-0.5, 0.5]`.
pub fn sample_vertices_3d(n: usize, range: Option<RangeInclusive<f64>>) -> Vec<Vertex3> {
    let mut rng = rand::rng();
    let range = range.unwrap_or(-0.5..=0.5);
    let uniform = Uniform::try_from(range).expect("Expected range with a greater start then end");

    let mut vertices: Vec<Vertex3> = Vec::with_capacity(n);
    for _ in 0..n {
        let x = uniform.sample(&mut rng);
        let y = uniform.sample(&mut rng);
        let z = uniform.sample(&mut rng);

        vertices.push([x, y, z]);
    }

    vertices
}

/// Samples `n` vertices from the [UnitDisc], scaled by `radius`, at elevation `0.0`.
pub fn sample_vertices_in_disc(n: usize, radius: f64) -> Vec<Vertex3> {
    let mut rng = rand::rng();

    (0..n)
        .map(|_| {
            let [x, y]: [f64; 2] = UnitDisc.sample(&mut rng);
            [x * radius, y * radius, 0.0]
        })
        .collect()
}

/// Samples `n` elevations from a [Normal] distribution.
///
/// The default parametrization is `μ = 100.0` and `σ = 2.5`, i.e. gently rolling terrain.
///
/// Parameters can be passed as an optional tuple `(μ, σ)`.
pub fn sample_elevations(n: usize, params: Option<(f64, f64)>) -> Vec<f64> {
    let mut rng = rand::rng();
    let (mean, std_dev) = params.unwrap_or((100.0, 2.5));
    let normal = Normal::new(mean, std_dev).unwrap();

    let mut elevations: Vec<f64> = Vec::with_capacity(n);
    for _ in 0..n {
        let z: f64 = normal.sample(&mut rng);
        elevations.push(z);
    }

    elevations
}

fn cross(o: &Vertex3, a: &Vertex3, b: &Vertex3) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Counts the corners of the convex hull of the xy-projection, collinear boundary points excluded.
///
/// Andrew's monotone chain.
pub fn convex_hull_size(vertices: &[Vertex3]) -> usize {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    sorted.dedup_by(|a, b| a[0] == b[0] && a[1] == b[1]);

    if sorted.len() < 3 {
        return sorted.len();
    }

    let mut hull: Vec<Vertex3> = Vec::with_capacity(2 * sorted.len());
    for pass in 0..2 {
        let start = hull.len();
        let chain: Box<dyn Iterator<Item = &Vertex3>> = if pass == 0 {
            Box::new(sorted.iter())
        } else {
            Box::new(sorted.iter().rev())
        };

        for v in chain {
            while hull.len() >= start + 2
                && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], v) <= 0.0
            {
                hull.pop();
            }
            hull.push(*v);
        }
        // the last point of a chain is the first of the next one
        hull.pop();
    }

    hull.len()
}
