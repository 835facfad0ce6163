use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "aikart", "aiKart") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    (root.join("aikart.json"), root.join("backups"))
}

/// Backup directory used when only the store file is given.
pub fn backups_beside(file: &std::path::Path) -> PathBuf {
    file.with_extension("backups")
}
