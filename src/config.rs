use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "symptom-tracker";
pub const DATA_FILE_NAME: &str = "data.json";
pub const NOTES_DIR_NAME: &str = "notes";

/// Per-user data directory, used when no `--data-dir` is given.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub data_file: PathBuf,
    pub notes_dir: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data_file: root.join(DATA_FILE_NAME),
            notes_dir: root.join(NOTES_DIR_NAME),
            root,
        }
    }

    pub fn resolve(data_dir: Option<&Path>) -> Self {
        match data_dir {
            Some(dir) => Self::new(dir),
            None => Self::new(default_data_dir()),
        }
    }
}
