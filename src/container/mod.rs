//! # Container Module
//!
//! The hierarchical, chunked container that snapshots live in, seen through a
//! narrow interface: a tree of groups and leaf datasets, each carrying
//! attributes, where datasets support contiguous row-range reads and
//! fancy-index reads.
//!
//! ## Backends
//!
//! - [`MemoryContainer`]: an in-memory tree, used to materialise subsets as
//!   buffers and in tests.
//! - [`BundleContainer`] / [`BundleWriter`]: an on-disk directory bundle where
//!   groups are directories and every dataset is a Parquet file whose row
//!   groups are the chunk unit.
//!
//! ```text
//! snapshot.bundle/
//! ├── manifest.json             # Format name and version
//! ├── attributes.json           # Root attributes
//! ├── Header/attributes.json    # Group attributes
//! ├── Cells/Centres.parquet     # Dataset: one `values` column
//! └── PartType0/Coordinates.parquet
//! ```
//!
//! Buffers are Arrow arrays. Scalar rows are primitive arrays, vector rows are
//! (possibly nested) fixed-size lists of a primitive element type.

mod bundle;
mod config;
mod error;
mod layout;
mod memory;

#[cfg(test)]
mod tests;

pub use bundle::{BundleContainer, BundleDataset, BundleManifest, BundleWriter, ATTRIBUTES_KEY};
pub use config::{BundleConfig, CompressionType};
pub use error::ContainerError;
pub use layout::{
    array_type, concat_rows, flatten_rows, split_array_type, with_trailing_shape,
    DatasetDescriptor,
};
pub use memory::{MemoryContainer, MemoryDataset};

use std::collections::BTreeMap;
use std::ops::Range;

use arrow::array::ArrayRef;

/// Key/value metadata attached to groups and datasets
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Path of the root group
pub const ROOT: &str = "/";

/// A group: an internal node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub path: String,
    pub attributes: Attributes,
    /// Names of the direct children, sorted
    pub children: Vec<String>,
}

/// A dataset: a leaf of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    pub descriptor: DatasetDescriptor,
    pub attributes: Attributes,
}

/// A node of the container tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(GroupNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Child names; always empty for leaves
    pub fn children(&self) -> &[String] {
        match self {
            Node::Group(group) => &group.children,
            Node::Leaf(_) => &[],
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::Group(group) => &group.path,
            Node::Leaf(leaf) => &leaf.descriptor.path,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Node::Group(group) => &group.attributes,
            Node::Leaf(leaf) => &leaf.attributes,
        }
    }
}

/// Read access to one dataset
pub trait DatasetHandle: Send + Sync {
    fn descriptor(&self) -> &DatasetDescriptor;

    fn attributes(&self) -> &Attributes;

    /// Read the contiguous half-open block of rows `rows`
    fn read_rows(&self, rows: Range<usize>) -> Result<ArrayRef, ContainerError>;

    /// Read the given rows in the given order, duplicates included
    fn take_rows(&self, indices: &[usize]) -> Result<ArrayRef, ContainerError>;

    fn rows(&self) -> usize {
        self.descriptor().rows
    }

    fn read_all(&self) -> Result<ArrayRef, ContainerError> {
        self.read_rows(0..self.rows())
    }
}

/// Read-only view of a container
pub trait Container {
    type Dataset: DatasetHandle;

    /// Look up the node at an absolute path
    fn node(&self, path: &str) -> Result<Node, ContainerError>;

    /// Open the dataset at an absolute path
    fn dataset(&self, path: &str) -> Result<Self::Dataset, ContainerError>;

    fn root(&self) -> Result<Node, ContainerError> {
        self.node(ROOT)
    }

    /// Whether any node exists at `path`
    fn exists(&self, path: &str) -> Result<bool, ContainerError> {
        match self.node(path) {
            Ok(_) => Ok(true),
            Err(ContainerError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Write access to a freshly created container
pub trait ContainerWriter {
    /// Create a group (and any missing parents), replacing its attributes
    fn create_group(&mut self, path: &str, attributes: &Attributes) -> Result<(), ContainerError>;

    /// Create a dataset holding `values`; missing parent groups are created
    fn write_dataset(
        &mut self,
        path: &str,
        values: ArrayRef,
        attributes: &Attributes,
    ) -> Result<(), ContainerError>;
}

/// Split an absolute path into its components; the root has none
pub fn split_path(path: &str) -> Result<Vec<&str>, ContainerError> {
    let trimmed = path
        .strip_prefix('/')
        .ok_or_else(|| ContainerError::InvalidPath(format!("{path} is not absolute")))?;

    let parts: Vec<&str> = trimmed.split('/').filter(|part| !part.is_empty()).collect();
    if let Some(bad) = parts.iter().find(|part| **part == "." || **part == "..") {
        return Err(ContainerError::InvalidPath(format!(
            "{path} contains relative component {bad}"
        )));
    }
    Ok(parts)
}

/// Absolute path of `child` under `parent`
pub fn join_path(parent: &str, child: &str) -> String {
    if parent == ROOT || parent.is_empty() {
        format!("/{child}")
    } else {
        format!("{}/{child}", parent.trim_end_matches('/'))
    }
}

/// Canonical absolute path for a list of components
pub(crate) fn canonical_path(parts: &[&str]) -> String {
    format!("/{}", parts.join("/"))
}

/// Depth-first, pre-order traversal of the subtree at `path`
pub fn walk<C, F, E>(container: &C, path: &str, visit: &mut F) -> Result<(), E>
where
    C: Container + ?Sized,
    F: FnMut(&Node) -> Result<(), E>,
    E: From<ContainerError>,
{
    let node = container.node(path)?;
    visit(&node)?;
    for child in node.children() {
        walk(container, &join_path(node.path(), child), visit)?;
    }
    Ok(())
}

/// Paths of every dataset in the container, in traversal order
pub fn leaf_paths<C>(container: &C) -> Result<Vec<String>, ContainerError>
where
    C: Container + ?Sized,
{
    let mut paths = Vec::new();
    walk(container, ROOT, &mut |node: &Node| {
        if node.is_leaf() {
            paths.push(node.path().to_string());
        }
        Ok::<(), ContainerError>(())
    })?;
    Ok(paths)
}

/// Deep-copy the subtree at `path` (structure, attributes and values) into
/// `dest`. Returns the number of value bytes copied.
pub fn copy_subtree<C, W>(source: &C, path: &str, dest: &mut W) -> Result<usize, ContainerError>
where
    C: Container + ?Sized,
    W: ContainerWriter + ?Sized,
{
    let mut bytes = 0;
    walk(source, path, &mut |node: &Node| {
        match node {
            Node::Group(group) => dest.create_group(&group.path, &group.attributes)?,
            Node::Leaf(leaf) => {
                let dataset = source.dataset(&leaf.descriptor.path)?;
                let values = dataset.read_all()?;
                bytes += leaf.descriptor.bytes_for(values.len());
                dest.write_dataset(&leaf.descriptor.path, values, &leaf.attributes)?;
            }
        }
        Ok::<(), ContainerError>(())
    })?;
    Ok(bytes)
}
