use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt64Array};
use arrow::compute::take;

use super::{
    canonical_path, split_path, Attributes, Container, ContainerError, ContainerWriter,
    DatasetDescriptor, DatasetHandle, GroupNode, LeafNode, Node,
};

/// A container held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    root: MemoryGroup,
}

#[derive(Debug, Clone, Default)]
struct MemoryGroup {
    attributes: Attributes,
    children: BTreeMap<String, MemoryNode>,
}

#[derive(Debug, Clone)]
enum MemoryNode {
    Group(MemoryGroup),
    Dataset(StoredDataset),
}

#[derive(Debug, Clone)]
struct StoredDataset {
    descriptor: DatasetDescriptor,
    attributes: Attributes,
    values: ArrayRef,
}

enum Found<'a> {
    Group(&'a MemoryGroup),
    Dataset(&'a StoredDataset),
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, path: &str) -> Result<(String, Found<'_>), ContainerError> {
        let parts = split_path(path)?;
        let canonical = canonical_path(&parts);
        let mut group = &self.root;

        for (depth, part) in parts.iter().enumerate() {
            match group.children.get(*part) {
                Some(MemoryNode::Group(child)) => group = child,
                Some(MemoryNode::Dataset(dataset)) if depth + 1 == parts.len() => {
                    return Ok((canonical, Found::Dataset(dataset)));
                }
                Some(MemoryNode::Dataset(_)) => {
                    return Err(ContainerError::NotAGroup(canonical_path(&parts[..=depth])));
                }
                None => return Err(ContainerError::NotFound(canonical)),
            }
        }

        Ok((canonical, Found::Group(group)))
    }

    fn ensure_group(&mut self, parts: &[&str]) -> Result<&mut MemoryGroup, ContainerError> {
        let mut group = &mut self.root;
        for (depth, part) in parts.iter().enumerate() {
            let node = group
                .children
                .entry(part.to_string())
                .or_insert_with(|| MemoryNode::Group(MemoryGroup::default()));
            group = match node {
                MemoryNode::Group(child) => child,
                MemoryNode::Dataset(_) => {
                    return Err(ContainerError::NotAGroup(canonical_path(&parts[..=depth])));
                }
            };
        }
        Ok(group)
    }
}

impl Container for MemoryContainer {
    type Dataset = MemoryDataset;

    fn node(&self, path: &str) -> Result<Node, ContainerError> {
        let (canonical, found) = self.find(path)?;
        Ok(match found {
            Found::Group(group) => Node::Group(GroupNode {
                path: canonical,
                attributes: group.attributes.clone(),
                children: group.children.keys().cloned().collect(),
            }),
            Found::Dataset(dataset) => Node::Leaf(LeafNode {
                descriptor: dataset.descriptor.clone(),
                attributes: dataset.attributes.clone(),
            }),
        })
    }

    fn dataset(&self, path: &str) -> Result<MemoryDataset, ContainerError> {
        match self.find(path)? {
            (_, Found::Dataset(dataset)) => Ok(MemoryDataset {
                descriptor: dataset.descriptor.clone(),
                attributes: dataset.attributes.clone(),
                values: dataset.values.clone(),
                reads: Arc::new(AtomicUsize::new(0)),
            }),
            (canonical, Found::Group(_)) => Err(ContainerError::NotADataset(canonical)),
        }
    }
}

impl ContainerWriter for MemoryContainer {
    fn create_group(&mut self, path: &str, attributes: &Attributes) -> Result<(), ContainerError> {
        let parts = split_path(path)?;
        let group = self.ensure_group(&parts)?;
        group.attributes = attributes.clone();
        Ok(())
    }

    fn write_dataset(
        &mut self,
        path: &str,
        values: ArrayRef,
        attributes: &Attributes,
    ) -> Result<(), ContainerError> {
        let parts = split_path(path)?;
        let Some((name, parents)) = parts.split_last() else {
            return Err(ContainerError::InvalidPath(format!(
                "{path} names the root group, not a dataset"
            )));
        };

        let descriptor = DatasetDescriptor::of_array(canonical_path(&parts), values.as_ref())?;
        let group = self.ensure_group(parents)?;
        if group.children.contains_key(*name) {
            return Err(ContainerError::AlreadyExists(descriptor.path));
        }

        group.children.insert(
            name.to_string(),
            MemoryNode::Dataset(StoredDataset {
                descriptor,
                attributes: attributes.clone(),
                values,
            }),
        );
        Ok(())
    }
}

/// Handle to a dataset of a [`MemoryContainer`].
///
/// Range reads are zero-copy slices. The handle counts the read primitives it
/// serves, which makes I/O patterns observable in tests.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    descriptor: DatasetDescriptor,
    attributes: Attributes,
    values: ArrayRef,
    reads: Arc<AtomicUsize>,
}

impl MemoryDataset {
    /// Number of `read_rows`/`take_rows` calls served so far
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl DatasetHandle for MemoryDataset {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn read_rows(&self, rows: Range<usize>) -> Result<ArrayRef, ContainerError> {
        self.descriptor.check_rows(&rows)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.values.slice(rows.start, rows.end - rows.start))
    }

    fn take_rows(&self, indices: &[usize]) -> Result<ArrayRef, ContainerError> {
        self.descriptor.check_indices(indices)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let indices = UInt64Array::from_iter_values(indices.iter().map(|&row| row as u64));
        Ok(take(self.values.as_ref(), &indices, None)?)
    }
}
