pub mod layout;
pub mod volume;

pub use layout::{compute_layout, LayoutError, Region, RegionMap, VolumeParams};
pub use volume::{format_volume, FormatError, VolumeFile};
