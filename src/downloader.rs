use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::domain::{CompoundRecord, DownloadOutcome, Provider};
use crate::error::PhytoError;
use crate::fs_util::temp_file_in;
use crate::imppat::ImppatClient;
use crate::pubchem::PubchemClient;
use crate::resolver::{ResolvedCompound, resolve, structure_key};
use crate::workspace::PlantWorkspace;

/// Fetches one structure file per compound into a workspace. Every failure
/// is folded into the returned [`DownloadOutcome`].
///
/// A downloader lives for one batch and remembers which structure key owns
/// each file it has reported, so two different compounds that sanitize to the
/// same file name never share one structure.
pub struct StructureDownloader<'a, I: ImppatClient, P: PubchemClient> {
    imppat: &'a I,
    pubchem: &'a P,
    workspace: &'a PlantWorkspace,
    provider: Provider,
    owners: HashMap<Utf8PathBuf, String>,
}

impl<'a, I: ImppatClient, P: PubchemClient> StructureDownloader<'a, I, P> {
    pub fn new(
        imppat: &'a I,
        pubchem: &'a P,
        workspace: &'a PlantWorkspace,
        provider: Provider,
    ) -> Self {
        Self {
            imppat,
            pubchem,
            workspace,
            provider,
            owners: HashMap::new(),
        }
    }

    pub fn download(&mut self, record: &CompoundRecord) -> DownloadOutcome {
        let key = match structure_key(record, self.provider) {
            Ok(key) => key,
            Err(err) => {
                warn!(compound = %record.name, error = %err, "unresolvable compound");
                return DownloadOutcome::failed(record.name.clone(), err.to_string());
            }
        };

        let path = self.workspace.structure_path(&key, self.provider);
        if let Some(other) = self.owners.get(&path).filter(|owner| **owner != key) {
            let err = PhytoError::FileNameCollision {
                path: path.to_string(),
                other: other.clone(),
            };
            warn!(compound = %key, error = %err, "file name collision");
            return DownloadOutcome::failed(key, err.to_string());
        }
        if path.as_std_path().exists() {
            debug!(%path, "structure already present");
            self.owners.insert(path.clone(), key.clone());
            return DownloadOutcome::skipped(key, path.to_string());
        }

        match self.fetch(record, &path) {
            Ok(()) => {
                self.owners.insert(path.clone(), key.clone());
                DownloadOutcome::succeeded(key, path.to_string())
            }
            Err(err) => {
                warn!(compound = %key, error = %err, "structure download failed");
                DownloadOutcome::failed(key, err.to_string())
            }
        }
    }

    fn fetch(&self, record: &CompoundRecord, path: &Utf8Path) -> Result<(), PhytoError> {
        let resolved = resolve(record, self.provider, self.pubchem)?;
        let temp = temp_file_in(self.workspace.dir().as_std_path())?;
        match &resolved {
            ResolvedCompound::Cid(cid) => self.pubchem.download_structure(*cid, temp.path())?,
            ResolvedCompound::Imppat(id) => self.imppat.download_structure(id, temp.path())?,
        }
        temp.persist(path.as_std_path())
            .map_err(|err| PhytoError::persistence(path, err.error))?;
        Ok(())
    }
}
