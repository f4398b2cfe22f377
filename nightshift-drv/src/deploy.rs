//  DEPLOY.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 11:05:48
//  Last edited:
//    04 Apr 2023, 17:14:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the ingestion of deployment artifacts: unpacking them into
//!   a staging directory, loading the staged experiment descriptors and
//!   enqueueing the result.
//

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use zip::ZipArchive;

use nightshift_cmd::{DefaultFactory, DummyFactory, ExecutorFactory};
use nightshift_exe::{Experiment, ExperimentManager};

pub use crate::errors::DeployError as Error;


/***** TESTS *****/





/***** HELPER FUNCTIONS *****/
/// Ensures the given directory exists and is empty.
fn fresh_dir(path: &Path) -> Result<(), std::io::Error> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)
}





/***** LIBRARY *****/
/// Turns dropped deployment artifacts into queued experiments.
///
/// Every artifact is unpacked into its own staging directory under the unpack root, after which every staged `*.experiment` descriptor is loaded and enqueued. Both the artifact and its staging directory are removed once ingestion has run, successful or not, so a malformed artifact is never retried on the next drop.
pub struct Deployer {
    /// The root under which per-artifact staging directories are created.
    unpack_dir : PathBuf,
    /// Whether enqueued experiments should run against the no-op executor instead of real hosts.
    dry_run    : bool,
}

impl Deployer {
    /// Constructor for the Deployer.
    ///
    /// # Arguments
    /// - `unpack_dir`: The root under which artifacts are staged.
    /// - `dry_run`: If true, experiments get a no-op executor factory that only logs commands.
    ///
    /// # Returns
    /// A new Deployer instance.
    #[inline]
    pub fn new(unpack_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            unpack_dir : unpack_dir.into(),
            dry_run,
        }
    }

    /// Produces the executor factory that newly loaded experiments connect through.
    fn factory(&self) -> Box<dyn ExecutorFactory> {
        if self.dry_run {
            Box::new(DummyFactory::new())
        } else {
            Box::new(DefaultFactory)
        }
    }

    /// Ingests a single deployment artifact, enqueueing the experiments it contains.
    ///
    /// The artifact and its staging directory are removed afterwards, also when ingestion fails partway, so a bad artifact is never retried on the next drop.
    ///
    /// # Arguments
    /// - `manager`: The manager to enqueue loaded experiments on.
    /// - `artifact`: The path of the dropped artifact.
    ///
    /// # Errors
    /// This function errors if the artifact has an unsupported extension, cannot be unpacked, contains no descriptor or any staged descriptor fails to load. Ingestion errors never affect already-queued experiments.
    pub fn ingest(&self, manager: &mut ExperimentManager, artifact: &Path) -> Result<(), Error> {
        info!("Ingesting deployment artifact '{}'...", artifact.display());

        // Every artifact stages into its own directory, named after the artifact
        let staging: PathBuf = match artifact.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => self.unpack_dir.join(stem),
            None       => { return Err(Error::UnsupportedExtension{ path: artifact.into() }); },
        };

        let result: Result<(), Error> = self.unpack(artifact, &staging).and_then(|_| self.load_staged(manager, &staging));

        // Cleanup runs on both paths so a bad artifact is not re-ingested forever
        if let Err(err) = fs::remove_file(artifact) {
            warn!("Failed to remove ingested artifact '{}': {}", artifact.display(), err);
        }
        if staging.exists() {
            if let Err(err) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove staging directory '{}': {}", staging.display(), err);
            }
        }

        result
    }

    /// Unpacks the artifact into the given staging directory, by extension.
    fn unpack(&self, artifact: &Path, staging: &Path) -> Result<(), Error> {
        match artifact.extension().and_then(|e| e.to_str()) {
            Some("zip") => {
                fresh_dir(staging).map_err(|err| Error::StagingDirError{ path: staging.into(), err })?;
                let handle: File = File::open(artifact).map_err(|err| Error::ArtifactOpenError{ path: artifact.into(), err })?;
                let mut archive: ZipArchive<File> = ZipArchive::new(handle).map_err(|err| Error::ArchiveError{ path: artifact.into(), err })?;
                debug!("Extracting '{}' ({} entries) to '{}'...", artifact.display(), archive.len(), staging.display());
                archive.extract(staging).map_err(|err| Error::ExtractError{ path: artifact.into(), target: staging.into(), err })
            },

            Some("experiment") => {
                fresh_dir(staging).map_err(|err| Error::StagingDirError{ path: staging.into(), err })?;
                let target: PathBuf = match artifact.file_name() {
                    Some(name) => staging.join(name),
                    None       => { return Err(Error::UnsupportedExtension{ path: artifact.into() }); },
                };
                fs::copy(artifact, &target).map_err(|err| Error::CopyError{ source: artifact.into(), target, err })?;
                Ok(())
            },

            _ => Err(Error::UnsupportedExtension{ path: artifact.into() }),
        }
    }

    /// Loads every staged `*.experiment` descriptor and enqueues it.
    fn load_staged(&self, manager: &mut ExperimentManager, staging: &Path) -> Result<(), Error> {
        let entries = fs::read_dir(staging).map_err(|err| Error::StagingReadError{ path: staging.into(), err })?;

        let mut n_loaded: usize = 0;
        for entry in entries {
            let entry = entry.map_err(|err| Error::StagingReadError{ path: staging.into(), err })?;
            let path: PathBuf = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("experiment") { continue; }

            let experiment: Experiment = Experiment::from_path(&path, self.factory()).map_err(|err| Error::ExperimentLoadError{ path, err })?;
            manager.enqueue(experiment);
            n_loaded += 1;
        }

        if n_loaded == 0 {
            return Err(Error::NoDescriptor{ path: staging.into() });
        }
        Ok(())
    }
}
