use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "VIDGRAB_DATA_DIR";

pub trait AppPaths: Send + Sync {
    fn data_dir(&self) -> PathBuf;

    fn settings_file(&self) -> PathBuf {
        self.data_dir().join("settings.json")
    }

    fn auth_dir(&self) -> PathBuf {
        self.data_dir().join("auth")
    }

    fn bin_dir(&self) -> PathBuf {
        self.data_dir().join("bin")
    }
}

pub struct DesktopPaths;

impl AppPaths for DesktopPaths {
    fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::data_dir()
            .map(|d| d.join("vidgrab"))
            .unwrap_or_else(|| PathBuf::from(".vidgrab"))
    }
}

/// Rooted at a fixed directory.
pub struct FixedPaths(pub PathBuf);

impl AppPaths for FixedPaths {
    fn data_dir(&self) -> PathBuf {
        self.0.clone()
    }
}
