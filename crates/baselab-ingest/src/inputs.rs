use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use baselab_model::{ConceptCatalog, Encounter, InputKind, Observation, QualityReport};

use crate::hash::fingerprint_file;
use crate::loaders::{read_catalog, read_encounters, read_observations};

/// Conventional file names inside a data directory.
pub const CATALOG_FILE: &str = "d_labitems_inclusion.csv";
pub const OBSERVATIONS_FILE: &str = "labevents.csv";
pub const ENCOUNTERS_FILE: &str = "admissions.csv";

/// Where the three inputs live.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub catalog: PathBuf,
    pub observations: PathBuf,
    pub encounters: PathBuf,
}

impl InputPaths {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            catalog: dir.join(CATALOG_FILE),
            observations: dir.join(OBSERVATIONS_FILE),
            encounters: dir.join(ENCOUNTERS_FILE),
        }
    }

    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.catalog = path;
        self
    }

    pub fn with_observations(mut self, path: PathBuf) -> Self {
        self.observations = path;
        self
    }

    pub fn with_encounters(mut self, path: PathBuf) -> Self {
        self.encounters = path;
        self
    }
}

/// Identity of one loaded input, recorded in the build summary so a matrix
/// can be tied back to exact input files.
#[derive(Debug, Clone, Serialize)]
pub struct InputDigest {
    pub kind: InputKind,
    pub path: PathBuf,
    pub sha256: String,
    /// Rows retained after row-level quality filtering.
    pub records: usize,
    pub warnings: usize,
}

/// The three inputs loaded, fingerprinted and quality-checked. Immutable
/// once constructed; everything downstream works on these snapshots.
#[derive(Debug)]
pub struct InputSet {
    pub catalog: ConceptCatalog,
    pub observations: Vec<Observation>,
    pub encounters: Vec<Encounter>,
    pub digests: Vec<InputDigest>,
    pub quality: QualityReport,
}

impl InputSet {
    pub fn load(paths: &InputPaths) -> Result<Self> {
        let (catalog, catalog_quality) = read_catalog(&paths.catalog)?;
        let (observations, observation_quality) = read_observations(&paths.observations)?;
        let (encounters, encounter_quality) = read_encounters(&paths.encounters)?;

        let digests = vec![
            InputDigest {
                kind: InputKind::Catalog,
                path: paths.catalog.clone(),
                sha256: fingerprint_file(&paths.catalog)?,
                records: catalog.len(),
                warnings: catalog_quality.total(),
            },
            InputDigest {
                kind: InputKind::Observations,
                path: paths.observations.clone(),
                sha256: fingerprint_file(&paths.observations)?,
                records: observations.len(),
                warnings: observation_quality.total(),
            },
            InputDigest {
                kind: InputKind::Encounters,
                path: paths.encounters.clone(),
                sha256: fingerprint_file(&paths.encounters)?,
                records: encounters.len(),
                warnings: encounter_quality.total(),
            },
        ];

        let mut quality = catalog_quality;
        quality.merge(observation_quality);
        quality.merge(encounter_quality);

        Ok(Self {
            catalog,
            observations,
            encounters,
            digests,
            quality,
        })
    }
}
