//! Per-user directories the crate reads its files from.
use std::path::PathBuf;

const APP_DIR: &str = "assist_detect";

#[derive(Debug, Clone, Copy)]
pub enum FsAccess {
    Home,
    Config,
}

impl FsAccess {
    /// Retrieves the base path for the directory type, optionally appending the
    /// `assist_detect` subdirectory (`.assist_detect` under home).
    fn get_path(&self, raw: bool) -> anyhow::Result<PathBuf> {
        let base_path = match self {
            FsAccess::Home => dirs::home_dir(),
            FsAccess::Config => dirs::config_dir(),
        };

        let mut path = base_path.ok_or_else(|| {
            anyhow::anyhow!("No {:?} directory on this platform", self)
        })?;

        if !raw {
            match self {
                FsAccess::Home => path.push(format!(".{APP_DIR}")),
                FsAccess::Config => path.push(APP_DIR),
            }
        }
        Ok(path)
    }

    /// The application directory, e.g. `~/.config/assist_detect` or `~/.assist_detect`.
    /// Not created; callers only read from it.
    pub fn path(&self) -> anyhow::Result<PathBuf> {
        self.get_path(false)
    }

    /// The platform directory without the application subdirectory.
    pub fn raw_path(&self) -> anyhow::Result<PathBuf> {
        self.get_path(true)
    }

    /// First application directory that resolves on this platform.
    pub fn first_available() -> anyhow::Result<PathBuf> {
        FsAccess::Config.path().or_else(|_| FsAccess::Home.path())
    }
}
