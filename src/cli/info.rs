use anyhow::{Context, Result};
use std::path::PathBuf;

use snapsub::container::{walk, BundleContainer, Container, ContainerError, Node};

/// Display the tree of a snapshot bundle
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Bundle does not exist: {}", file.display());
    }

    let bundle = BundleContainer::open(&file).context("Failed to open bundle")?;
    let manifest = bundle.manifest();

    println!("Snapshot Bundle Information");
    println!("===========================");
    println!("Bundle: {}", file.display());
    println!("Format: {} v{}", manifest.format, manifest.version);
    println!();

    let mut groups = 0usize;
    let mut datasets = 0usize;
    let mut bytes = 0usize;

    walk(&bundle, "/", &mut |node: &Node| {
        let depth = node.path().matches('/').count().saturating_sub(1);
        let indent = "  ".repeat(depth);
        let name = node.path().rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("/");
        match node {
            Node::Group(group) => {
                groups += 1;
                println!("{indent}{name}/ ({} attributes)", group.attributes.len());
            }
            Node::Leaf(leaf) => {
                datasets += 1;
                bytes += leaf.descriptor.bytes_for(leaf.descriptor.rows);
                println!(
                    "{indent}{name}: {} {:?} ({} attributes)",
                    leaf.descriptor.dtype,
                    leaf.descriptor.shape(),
                    leaf.attributes.len()
                );
            }
        }
        Ok::<(), ContainerError>(())
    })?;

    println!();
    println!("Groups: {groups}");
    println!("Datasets: {datasets}");
    println!("Uncompressed values: {bytes} bytes");

    Ok(())
}
