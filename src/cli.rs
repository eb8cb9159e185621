// ============================================================================
// roi5d command line arguments (clap derive)
// ============================================================================
//
// Usage examples:
//   roi5d stack.npy                                  (whole volume to volume.npy)
//   roi5d stack.npy --x 10:73 --z 2 -o crop.npy      (inclusive per-axis ranges)
//   roi5d stack.npy --rois rois.json -o cells.npy    (bounding box of saved ROIs)
//   roi5d stack.npy --local shapes.json --id-property CELL --export-local out.json

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use roi5d::bounds::AxisRequest;
use roi5d::constants::DEFAULT_OUTPUT_FILE;

/// Crop a local pixel volume to 5D regions of interest and write a NumPy array.
#[derive(Parser, Debug)]
#[command(
    name = "roi5d",
    version,
    about = "Crop a 5D pixel volume to regions of interest",
    long_about = "Read a pixel volume (.npy or a standard image), crop it to the bounding\n\
                  box of a set of ROIs or to explicit per-axis ranges, and write the\n\
                  result as a [t][z][c][y][x] NumPy array.\n\n\
                  Example:\n  \
                  roi5d stack.npy --x 0:63 --y 0:63 --t 1 -o crop.npy\n  \
                  roi5d stack.npy --local shapes.json --id-property CELL"
)]
#[command(group(ArgGroup::new("shapes").args(["rois", "local"])))]
pub struct Cli {
    /// Pixel volume to read.
    #[arg(value_name = "VOLUME")]
    pub input: PathBuf,

    /// ROIs saved as JSON. The output covers their combined bounding box.
    #[arg(short, long, value_name = "ROIS.json")]
    pub rois: Option<PathBuf>,

    /// Local toolkit shapes as JSON, grouped into ROIs by the ID property.
    #[arg(short, long, value_name = "SHAPES.json")]
    pub local: Option<PathBuf>,

    /// Write the loaded ROIs as local toolkit shapes to this file.
    #[arg(long, value_name = "SHAPES.json", requires = "shapes")]
    pub export_local: Option<PathBuf>,

    /// Property holding the 4D ROI index of a local shape.
    /// Overrides the configured value.
    #[arg(long, value_name = "NAME")]
    pub id_property: Option<String>,

    /// Inclusive X range, as LO:HI or a single index.
    #[arg(long, value_name = "LO:HI", value_parser = parse_range, conflicts_with = "shapes")]
    pub x: Option<[i64; 2]>,

    /// Inclusive Y range.
    #[arg(long, value_name = "LO:HI", value_parser = parse_range, conflicts_with = "shapes")]
    pub y: Option<[i64; 2]>,

    /// Inclusive channel range.
    #[arg(long, value_name = "LO:HI", value_parser = parse_range, conflicts_with = "shapes")]
    pub c: Option<[i64; 2]>,

    /// Inclusive Z range.
    #[arg(long, value_name = "LO:HI", value_parser = parse_range, conflicts_with = "shapes")]
    pub z: Option<[i64; 2]>,

    /// Inclusive T range.
    #[arg(long, value_name = "LO:HI", value_parser = parse_range, conflicts_with = "shapes")]
    pub t: Option<[i64; 2]>,

    /// Output .npy file.
    #[arg(short, long, value_name = "OUT.npy", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Config file to use instead of the one in the user config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Per-axis ranges given on the command line.
    pub fn axis_request(&self) -> AxisRequest {
        AxisRequest {
            x: self.x,
            y: self.y,
            c: self.c,
            z: self.z,
            t: self.t,
        }
    }
}

/// Parse `LO:HI` (inclusive) or a single index `N` meaning `N:N`.
fn parse_range(s: &str) -> Result<[i64; 2], String> {
    let index = |v: &str| {
        v.trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid index '{}': {}", v, e))
    };
    match s.split_once(':') {
        Some((lo, hi)) => Ok([index(lo)?, index(hi)?]),
        None => {
            let i = index(s)?;
            Ok([i, i])
        }
    }
}
