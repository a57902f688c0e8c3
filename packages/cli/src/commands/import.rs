use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use console::style;
use ingest::{Descriptor, DiagramSynthesizer, NoDiagram, ProgressLogDiagram, readme};
use registry_server::config::RegistryConfig;
use registry_server::services::ingestion::import_descriptor;
use tracing::debug;

pub async fn run(paths: &[PathBuf]) -> anyhow::Result<()> {
    let (config, db) = super::connect().await?;
    let registry = &config.registry;
    let diagrams: Box<dyn DiagramSynthesizer> = if registry.diagrams_enabled {
        Box::new(ProgressLogDiagram)
    } else {
        Box::new(NoDiagram)
    };

    let mut failed = 0usize;
    for path in paths {
        match import_one(&db, registry, diagrams.as_ref(), path).await {
            Ok((id, created)) => {
                let verb = if created { "created" } else { "updated" };
                println!("{} {} ({})", style("✔").green(), id, verb);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {:#}", style("✘").red(), path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} descriptors failed to import", paths.len());
    }
    Ok(())
}

async fn import_one(
    db: &sea_orm::DatabaseConnection,
    registry: &RegistryConfig,
    diagrams: &dyn DiagramSynthesizer,
    path: &Path,
) -> anyhow::Result<(String, bool)> {
    let (root, file_name) = split_descriptor_path(path, &registry.descriptor_file)?;
    debug!(root = %root.display(), file_name = %file_name, "Importing descriptor");
    let descriptor = Descriptor::load(&root, &file_name)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let html = readme::compose(&root, &registry.readme_file, &descriptor, diagrams);
    let readme = (!html.is_empty()).then_some(html);

    let (model, created) = import_descriptor(db, &descriptor, readme)
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;
    Ok((model.id, created))
}

/// A directory resolves to the descriptor inside it; a file is taken as the
/// descriptor itself.
fn split_descriptor_path(path: &Path, descriptor_file: &str) -> anyhow::Result<(PathBuf, String)> {
    if path.is_dir() {
        return Ok((path.to_path_buf(), descriptor_file.to_string()));
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a descriptor path: {}", path.display()))?
        .to_string();
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((root, file_name))
}
