//! Config file discovery.

use std::path::{Path, PathBuf};

/// Find `config_name` in `start` or one of its ancestors.
///
/// ```text
/// /home/user/app/src/icons/      ← start
/// /home/user/app/spriteforge.toml ← found
/// ```
///
/// Absolute names are returned as-is when they exist.
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/icons");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("spriteforge.toml"), "").unwrap();

        let found = find_config_file(Path::new("spriteforge.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("spriteforge.toml"));
    }

    #[test]
    fn test_absolute_and_missing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sprites.toml");
        assert_eq!(find_config_file(&file, dir.path()), None);

        fs::write(&file, "").unwrap();
        assert_eq!(find_config_file(&file, Path::new("/")), Some(file));
        assert_eq!(find_config_file(Path::new("missing-config.toml"), dir.path()), None);
    }
}
