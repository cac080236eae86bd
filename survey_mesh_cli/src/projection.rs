use anyhow::{Ok, Result};
use survey_mesh::Vertex3;

use crate::{agd::TopologyPoint, args::Elevation};

/// Center of the latitude/longitude bounding box, as `(latitude, longitude)`.
pub fn reference_point(points: &[TopologyPoint]) -> Result<(f64, f64)> {
    if points.is_empty() {
        return Err(anyhow::Error::msg(
            "Cannot find a reference point of an empty point set",
        ));
    }

    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];

    for p in points {
        min[0] = min[0].min(p.latitude);
        min[1] = min[1].min(p.longitude);
        max[0] = max[0].max(p.latitude);
        max[1] = max[1].max(p.longitude);
    }

    Ok(((min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0))
}

/// Maps geographic coordinates to the plane of EPSG:4326, i.e. `x = longitude`, `y = latitude`.
pub const fn to_epsg4326(latitude: f64, longitude: f64) -> (f64, f64) {
    (longitude, latitude)
}

/// Projects topology points to `(x, y, elevation)` vertices, keeping their order.
///
/// `progress` receives `(current, total)` every 100 points and at the last one.
pub fn project(
    points: &[TopologyPoint],
    elevation: Elevation,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Vec<Vertex3> {
    let num_points = points.len();

    points
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let (x, y) = to_epsg4326(p.latitude, p.longitude);
            let z = match elevation {
                Elevation::Existing => p.existing_elevation,
                Elevation::Proposed => p.proposed_elevation,
            };

            if idx % 100 == 0 || idx == num_points - 1 {
                if let Some(progress) = progress.as_deref_mut() {
                    progress(idx + 1, num_points);
                }
            }

            [x, y, z]
        })
        .collect()
}
