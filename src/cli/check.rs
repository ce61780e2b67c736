//! `check` command: scan and report without compiling or writing.

use anyhow::{Result, bail};

use crate::compiler::{format_duplicates, print_duplicates};
use crate::config::SpriteConfig;
use crate::core::SpriteCore;
use crate::log;
use crate::utils::plural_count;

pub async fn run_check(config: SpriteConfig, deny_duplicates: bool) -> Result<()> {
    let core = SpriteCore::initialize(config)?;
    let count = core.scan().await?;

    let ((statics, dynamics), groups) =
        core.with_store(|store| (store.counts(), store.duplicate_groups()));
    log!(
        "check";
        "{}: {} static, {} dynamic",
        plural_count(count, "svg"),
        statics,
        dynamics
    );

    if deny_duplicates && !groups.is_empty() {
        bail!(
            "{} with duplicate content:\n{}",
            plural_count(groups.len(), "shape"),
            format_duplicates(&groups)
        );
    }
    print_duplicates(&groups);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SymbolConfig;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> SpriteConfig {
        let mut config = SpriteConfig::default();
        config.sprites.symbol = Some(SymbolConfig::default());
        config.silent = true;
        config.finalize(dir.path());
        config
    }

    #[tokio::test]
    async fn test_check_duplicates() {
        let dir = TempDir::new().unwrap();
        let svg = r#"<svg viewBox="0 0 24 24"><path d="M0 0"/></svg>"#;
        fs::write(dir.path().join("a.svg"), svg).unwrap();
        fs::write(dir.path().join("b.svg"), svg).unwrap();

        run_check(config(&dir), false).await.unwrap();
        let err = run_check(config(&dir), true).await.unwrap_err();
        assert!(err.to_string().contains("duplicate content"));
        assert!(!config(&dir).paths().output.exists());
    }
}
