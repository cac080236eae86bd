use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Ok, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, trace};

/// The number of fields of a complete AGD record.
const NUM_FIELDS: usize = 7;

/// A surveyed point of an AGD file.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub existing_elevation: f64,
    pub proposed_elevation: f64,
    /// Positive for cut, i.e. the existing ground lies above the proposed one, negative for fill.
    pub cut_fill: f64,
    pub code: String,
    pub comments: String,
}

/// Loads the topology points of an AGD file.
pub fn load_topology_data(path: &Path) -> Result<Vec<TopologyPoint>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open AGD file '{}'", path.display()))?;

    read_topology_data(file).with_context(|| format!("Cannot read AGD file '{}'", path.display()))
}

/// Reads topology points from AGD formatted text.
///
/// The first line is a header. Every following line is expected to hold
///
/// ```csv
/// latitude,longitude,existing,proposed,cut_fill,code,comments
/// ```
///
/// Lines with fewer fields are skipped, as are points missing one of the two elevations.
pub fn read_topology_data<R: Read>(reader: R) -> Result<Vec<TopologyPoint>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    let mut num_skipped = 0;

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());

        if record.len() < NUM_FIELDS {
            trace!("Skipping line {line}, it has only {} fields", record.len());
            num_skipped += 1;
            continue;
        }

        match parse_record(&record).with_context(|| format!("Invalid record on line {line}"))? {
            Some(point) => points.push(point),
            None => num_skipped += 1,
        }
    }

    debug!(
        "Read {} topology points, skipped {} records",
        points.len(),
        num_skipped
    );

    Ok(points)
}

/// Returns `None` if the point lacks the existing or the proposed elevation.
fn parse_record(record: &StringRecord) -> Result<Option<TopologyPoint>> {
    let field = |idx: usize| record.get(idx).unwrap_or_default();

    let latitude = parse_number(field(0), "latitude")?;
    let longitude = parse_number(field(1), "longitude")?;
    let existing_elevation = parse_elevation(field(2), "existing elevation")?;
    let proposed_elevation = parse_elevation(field(3), "proposed elevation")?;

    if existing_elevation == 0.0 || proposed_elevation == 0.0 {
        return Ok(None);
    }

    // the file stores cut as negative
    let cut_fill = match field(4) {
        "" | "0.000" => existing_elevation - proposed_elevation,
        value => -parse_number(value, "cut/fill")?,
    };

    Ok(Some(TopologyPoint {
        latitude,
        longitude,
        existing_elevation,
        proposed_elevation,
        cut_fill,
        code: field(5).to_string(),
        comments: field(6).to_string(),
    }))
}

fn parse_number(value: &str, name: &str) -> Result<f64> {
    value
        .parse()
        .with_context(|| format!("Cannot parse {name} '{value}'"))
}

/// An empty elevation reads as zero.
fn parse_elevation(value: &str, name: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }

    parse_number(value, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGD: &str = "\
Latitude,Longitude,Existing,Proposed,CutFill,Code,Comments
30.267153,-97.743057,150.250,149.750,-0.500,TOPO,north corner
30.267201, -97.742990 ,150.100,150.600,,TOPO,
30.267250,-97.743100,,149.900,0.000,EDGE,no existing
30.267300,-97.743150,151.000,150.000,0.000,TOPO,computed
30.267350,-97.743200,151.000
";

    #[test]
    fn test_read_topology_data() {
        let points = read_topology_data(AGD.as_bytes()).unwrap();

        assert_eq!(points.len(), 3);

        assert_eq!(points[0].latitude, 30.267153);
        assert_eq!(points[0].longitude, -97.743057);
        assert_eq!(points[0].cut_fill, 0.5);
        assert_eq!(points[0].code, "TOPO");
        assert_eq!(points[0].comments, "north corner");

        // fields are trimmed, an empty cut/fill is computed
        assert_eq!(points[1].longitude, -97.74299);
        assert!((points[1].cut_fill + 0.5).abs() < 1e-9);
        assert!(points[1].comments.is_empty());

        // a zero cut/fill is computed as well
        assert_eq!(points[2].cut_fill, 1.0);
    }

    #[test]
    fn test_header_only() {
        let points = read_topology_data("Latitude,Longitude\n".as_bytes()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_invalid_number_names_the_line() {
        let agd = "header\n1.0,2.0,3.0,4.0,,A,\nnorth,2.0,3.0,4.0,,A,\n";
        let err = read_topology_data(agd.as_bytes()).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("latitude 'north'"), "{message}");
    }

    #[test]
    fn test_missing_file() {
        let err = load_topology_data(Path::new("does/not/exist.agd")).unwrap_err();
        assert!(err.to_string().contains("Cannot open AGD file"));
    }
}
