use std::fs;

use crate::manifest::PluginManifest;

pub fn run_manifest(compact: bool) -> anyhow::Result<()> {
    let manifest = PluginManifest::ninjazzz();
    let output = if compact {
        serde_json::to_string(&manifest)?
    } else {
        serde_json::to_string_pretty(&manifest)?
    };
    println!("{output}");
    Ok(())
}

pub fn run_permissions(json: bool) -> anyhow::Result<()> {
    let manifest = PluginManifest::ninjazzz();

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest.permissions)?);
        return Ok(());
    }

    let width = manifest
        .permissions
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0);

    println!();
    for p in &manifest.permissions {
        println!("  {:<width$}  {:<6}  {}", p.name, p.kind, p.target);
    }
    println!();

    Ok(())
}

pub fn run_storages(json: bool) -> anyhow::Result<()> {
    let manifest = PluginManifest::ninjazzz();

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest.storages)?);
        return Ok(());
    }

    println!();
    for s in &manifest.storages {
        println!("  {} (primary key: {})", s.storage_key, s.primary_key);
        println!("    {}", s.description);
    }
    println!();

    Ok(())
}

pub fn run_check(path: Option<String>) -> anyhow::Result<()> {
    let manifest = match &path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {path}: {e}"))?;
            serde_json::from_str::<PluginManifest>(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?
        }
        None => PluginManifest::ninjazzz(),
    };

    manifest.validate()?;

    println!(
        "Manifest '{}' is valid: {} permissions, {} storages",
        manifest.friendly_name,
        manifest.permissions.len(),
        manifest.storages.len()
    );
    Ok(())
}
