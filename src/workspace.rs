use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::UserDirs;

use crate::domain::{PlantName, Provider};
use crate::error::PhytoError;
use crate::fs_util::sanitize_file_token;

/// The per-plant directory holding the exported spreadsheet and every
/// downloaded structure file. Created on demand, never removed.
#[derive(Debug, Clone)]
pub struct PlantWorkspace {
    plant: PlantName,
    dir: Utf8PathBuf,
}

impl PlantWorkspace {
    pub fn new(root: &Utf8Path, plant: &PlantName) -> Self {
        Self {
            plant: plant.clone(),
            dir: root.join(plant_token(plant)),
        }
    }

    pub fn plant(&self) -> &PlantName {
        &self.plant
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.as_std_path().is_dir()
    }

    pub fn ensure(&self) -> Result<(), PhytoError> {
        fs::create_dir_all(self.dir.as_std_path())
            .map_err(|err| PhytoError::persistence(&self.dir, err))
    }

    /// Canonical location of the structure file for `key` (a compound name
    /// or an IMPPAT identifier).
    pub fn structure_path(&self, key: &str, provider: Provider) -> Utf8PathBuf {
        self.dir.join(format!(
            "{}.{}",
            sanitize_file_token(key),
            provider.file_extension()
        ))
    }

    /// `<plant>_<stamp>.xlsx`, or `<plant>_<stamp>_<n>.xlsx` for `n > 0`.
    pub fn spreadsheet_path(&self, stamp: &str, attempt: usize) -> Utf8PathBuf {
        let token = plant_token(&self.plant);
        let name = if attempt == 0 {
            format!("{token}_{stamp}.xlsx")
        } else {
            format!("{token}_{stamp}_{attempt}.xlsx")
        };
        self.dir.join(name)
    }
}

pub fn plant_token(plant: &PlantName) -> String {
    sanitize_file_token(plant.as_str())
}

/// `~/Downloads/phytofetch` when the platform has a download directory,
/// `./Downloads` otherwise.
pub fn default_output_root() -> Utf8PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(|dir| dir.join("phytofetch")))
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let plant: PlantName = "Ocimum sanctum".parse().unwrap();
        let workspace = PlantWorkspace::new(Utf8Path::new("/data"), &plant);

        assert!(workspace.dir().ends_with("Ocimum_sanctum"));
        assert!(
            workspace
                .structure_path("IMPHY000001", Provider::Imppat)
                .ends_with("Ocimum_sanctum/IMPHY000001.sdf")
        );
        assert!(
            workspace
                .structure_path("Ursolic acid", Provider::Pubchem)
                .ends_with("Ocimum_sanctum/Ursolic_acid.sdf")
        );
        assert!(
            workspace
                .spreadsheet_path("20261016_101500", 2)
                .ends_with("Ocimum_sanctum/Ocimum_sanctum_20261016_101500_2.xlsx")
        );
    }
}
