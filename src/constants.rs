//! Global constants for roi5d

/// Property used to tag local shapes with their 4D ROI index when no
/// property name is given.
pub const DEFAULT_ID_PROPERTY: &str = "ROI";

/// Display groups are only assigned when there are fewer ROIs than this.
pub const MAX_DISPLAY_GROUPS: usize = 255;

/// Default output file written by the command line tool.
pub const DEFAULT_OUTPUT_FILE: &str = "volume.npy";
