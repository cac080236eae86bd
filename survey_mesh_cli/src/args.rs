use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::{Ok, Result};
use log::warn;

pub const USAGE: &str = "\
AGD Converter - Convert AGD survey files to triangulated meshes

Usage: survey_mesh [OPTIONS]

Options:
  -i, --input <FILE>        Input AGD file path
  -o, --output <FILE>       Output file path
  -f, --format <FORMAT>     Output format (default: ply)
  -e, --elevation <TYPE>    Elevation type: existing or proposed (default: existing)
  -p, --progress            Show progress bar (default)
  -q, --quiet               Do not show progress
  -h, --help                Show this help message

Examples:
  survey_mesh -i input.agd -o output.ply
  survey_mesh -i input.agd -o output.ply -f ply -e proposed
  RUST_LOG=debug survey_mesh -i input.agd -o output.ply --quiet";

/// Which of the two surveyed elevations becomes the z-coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Elevation {
    #[default]
    Existing,
    Proposed,
}

impl Elevation {
    /// Anything but `proposed` selects the existing elevation.
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "proposed" => Self::Proposed,
            "existing" => Self::Existing,
            other => {
                warn!("Unknown elevation type '{other}', using the existing elevation");
                Self::Existing
            }
        }
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing => write!(f, "existing"),
            Self::Proposed => write!(f, "proposed"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Ply,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ply" => Ok(Self::Ply),
            _ => Err(anyhow::Error::msg(format!(
                "Unsupported output format '{s}', supported formats: ply"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ply => write!(f, "ply"),
        }
    }
}

/// Settings of a conversion run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub elevation: Elevation,
    pub progress: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Convert(Config),
}

/// Parses the command line arguments, without the program name.
///
/// Options take their value either as the next argument or after `=`, e.g. `--input=a.agd`.
/// Missing input or output paths fall back to [`Command::Help`].
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command> {
    let mut input = None;
    let mut output = None;
    let mut format = OutputFormat::default();
    let mut elevation = Elevation::default();
    let mut progress = true;
    let mut help = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let (name, inline_value) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };

        let mut value = || {
            inline_value
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| anyhow::Error::msg(format!("Option '{name}' requires a value")))
        };

        match name.as_str() {
            "-i" | "--input" => input = Some(PathBuf::from(value()?)),
            "-o" | "--output" => output = Some(PathBuf::from(value()?)),
            "-f" | "--format" => format = value()?.parse()?,
            "-e" | "--elevation" => elevation = Elevation::parse(&value()?),
            "-p" | "--progress" => progress = true,
            "-q" | "--quiet" => progress = false,
            "-h" | "--help" => help = true,
            _ => {
                return Err(anyhow::Error::msg(format!(
                    "Unknown option '{arg}'. Try '--help' for more information."
                )))
            }
        }
    }

    match (input, output) {
        (Some(input), Some(output)) if !help => Ok(Command::Convert(Config {
            input,
            output,
            format,
            elevation,
            progress,
        })),
        _ => Ok(Command::Help),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_defaults() {
        let command = parse(&["-i", "site.agd", "-o", "site.ply"]).unwrap();

        assert_eq!(
            command,
            Command::Convert(Config {
                input: PathBuf::from("site.agd"),
                output: PathBuf::from("site.ply"),
                format: OutputFormat::Ply,
                elevation: Elevation::Existing,
                progress: true,
            })
        );
    }

    #[test]
    fn test_long_options() {
        let command = parse(&[
            "--input=site.agd",
            "--output",
            "out/site.ply",
            "--format",
            "PLY",
            "--elevation=Proposed",
            "--quiet",
        ])
        .unwrap();

        let Command::Convert(config) = command else {
            panic!("expected a conversion");
        };
        assert_eq!(config.output, PathBuf::from("out/site.ply"));
        assert_eq!(config.elevation, Elevation::Proposed);
        assert!(!config.progress);
    }

    #[test]
    fn test_unknown_elevation_falls_back_to_existing() {
        let Command::Convert(config) = parse(&["-i", "a", "-o", "b", "-e", "design"]).unwrap() else {
            panic!("expected a conversion");
        };
        assert_eq!(config.elevation, Elevation::Existing);
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&["-i", "site.agd"]).unwrap(), Command::Help);
        assert_eq!(
            parse(&["-i", "site.agd", "-o", "site.ply", "--help"]).unwrap(),
            Command::Help
        );
    }

    #[test]
    fn test_errors() {
        let err = parse(&["-i", "a", "-o", "b", "-f", "obj"]).unwrap_err();
        assert!(err.to_string().contains("Unsupported output format 'obj'"));

        let err = parse(&["-i"]).unwrap_err();
        assert!(err.to_string().contains("requires a value"));

        let err = parse(&["--verbose"]).unwrap_err();
        assert!(err.to_string().contains("Unknown option '--verbose'"));
    }
}
