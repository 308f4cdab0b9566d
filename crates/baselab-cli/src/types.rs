use std::path::PathBuf;

use baselab_core::FeatureMatrix;
use baselab_ingest::InputDigest;
use baselab_model::{Consolidation, QualityReport};

#[derive(Debug)]
pub struct BuildResult {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub digests: Vec<InputDigest>,
    pub consolidation: Consolidation,
    pub matrix: FeatureMatrix,
    pub quality: QualityReport,
    pub outputs: Vec<PathBuf>,
}
