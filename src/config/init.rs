use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, Config};
use crate::scoring::HealthProfile;

/// Write a starter config file and return where it was written.
///
/// Refuses to replace an existing file unless `force` is set. The file is
/// written atomically so an interrupted run never leaves half a config.
pub fn write_starter_config(
    path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    profiles: Vec<HealthProfile>,
    force: bool,
) -> Result<PathBuf> {
    let config_path = path.unwrap_or_else(get_config_path);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Pass --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config {
        data_dir: Some(data_dir.unwrap_or_else(|| PathBuf::from("data"))),
        min_window_duration: Some("3h".to_string()),
        sensitivity: Some(1.0),
        profiles: if profiles.is_empty() { None } else { Some(profiles) },
        catalog: None,
    };

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    write_atomic(&config_path, &yaml)?;
    Ok(config_path)
}

pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}
