//! Input loading for baselab: the concept catalog, the observation store
//! and the encounter set, plus file fingerprints for the build summary.

pub mod datetime;
pub mod hash;
pub mod inputs;
pub mod loaders;

pub use datetime::{TimestampError, format_timestamp, parse_timestamp};
pub use hash::{fingerprint_file, sha256_hex};
pub use inputs::{
    CATALOG_FILE, ENCOUNTERS_FILE, InputDigest, InputPaths, InputSet, OBSERVATIONS_FILE,
};
pub use loaders::{read_catalog, read_encounters, read_observations};
