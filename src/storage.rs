use std::path::{Path, PathBuf};

/// Filesystem layout under the backend data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub source_dir: PathBuf,
    pub csv_path: PathBuf,
    pub providers_json: PathBuf,
    pub specialties_json: PathBuf,
}

impl StoragePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        let source_dir = data_dir.join("source");
        let csv_path = source_dir.join("cms-doctors-clinicians.csv");
        let providers_json = data_dir.join("fallback_providers.json");
        let specialties_json = data_dir.join("specialties.json");

        Self {
            data_dir,
            source_dir,
            csv_path,
            providers_json,
            specialties_json,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.source_dir)
    }

    /// Optional dataset overrides: present means "use instead of the
    /// built-in data".
    pub fn providers_override(&self) -> Option<PathBuf> {
        file_present_nonempty(&self.providers_json).then(|| self.providers_json.clone())
    }

    pub fn specialties_override(&self) -> Option<PathBuf> {
        file_present_nonempty(&self.specialties_json).then(|| self.specialties_json.clone())
    }
}

pub fn file_present_nonempty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) => m.is_file() && m.len() > 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_the_data_dir() {
        let paths = StoragePaths::new("/tmp/mediconnect");
        assert_eq!(
            paths.csv_path,
            PathBuf::from("/tmp/mediconnect/source/cms-doctors-clinicians.csv")
        );
        assert_eq!(
            paths.providers_json,
            PathBuf::from("/tmp/mediconnect/fallback_providers.json")
        );
    }

    #[test]
    fn missing_override_files_read_as_none() {
        let paths = StoragePaths::new("/tmp/mediconnect-does-not-exist");
        assert!(paths.providers_override().is_none());
        assert!(paths.specialties_override().is_none());
    }
}
