//! Project creation and scaffolding

use anyhow::{Context, Result};
use cinemap_core::{Landmark, LngLat};
use std::fs;
use std::path::Path;

use crate::config::{CinemapConfig, CONFIG_FILE};

/// Landmarks written into new projects so `cinemap tour` has somewhere to go
fn sample_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new("gyeongbokgung", "Gyeongbokgung Palace", LngLat::new(126.9770, 37.5796))
            .with_category("palace"),
        Landmark::new("bukchon", "Bukchon Hanok Village", LngLat::new(126.9850, 37.5826))
            .with_category("neighbourhood"),
        Landmark::new("namsan", "N Seoul Tower", LngLat::new(126.9882, 37.5512))
            .with_category("viewpoint"),
    ]
}

/// Create a new Cinemap project
pub fn create_project(path: &Path, name: &str) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut config = CinemapConfig::new(name);
    config.landmarks = sample_landmarks();
    fs::write(&config_path, config.to_toml()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    fs::write(
        path.join("README.md"),
        format!(
            r#"# {name}

A Cinemap project.

## Tour

```bash
cinemap tour
```

## Sync demo

```bash
cinemap sync-demo --controllers 2
```

Edit `{CONFIG_FILE}` to change the landmarks, the opening view, shot timings
and sync guard windows.
"#
        ),
    )?;

    tracing::info!(path = %path.display(), "created project {name}");
    Ok(())
}
