use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{new_empty_array, Array, ArrayRef, UInt64Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder, RowSelection,
};
use parquet::arrow::ArrowWriter;
use parquet::format::KeyValue;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{
    canonical_path, concat_rows, split_path, Attributes, BundleConfig, Container, ContainerError,
    ContainerWriter, DatasetDescriptor, DatasetHandle, GroupNode, LeafNode, Node,
};
use crate::selection::{compress, SelectionError};

/// Manifest file at the bundle root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-group attribute file
pub const ATTRIBUTES_FILE: &str = "attributes.json";

/// File extension of dataset files
pub const DATASET_EXTENSION: &str = "parquet";

/// Arrow schema metadata key holding a dataset's attributes as JSON
pub const ATTRIBUTES_KEY: &str = "snapsub:attributes";

/// The single column of every dataset file
pub const VALUES_COLUMN: &str = "values";

pub const FORMAT_NAME: &str = "snapsub-bundle";
pub const FORMAT_VERSION: u32 = 1;

/// Default number of rows decoded per record batch
const DEFAULT_BATCH_SIZE: usize = 8192;

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format: String,
    pub version: u32,
}

impl Default for BundleManifest {
    fn default() -> Self {
        Self {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
        }
    }
}

impl BundleManifest {
    fn validate(&self) -> Result<(), ContainerError> {
        if self.format != FORMAT_NAME {
            return Err(ContainerError::InvalidFormat(format!(
                "unexpected format {:?}, expected {FORMAT_NAME:?}",
                self.format
            )));
        }
        if self.version > FORMAT_VERSION {
            return Err(ContainerError::InvalidFormat(format!(
                "bundle version {} is newer than supported version {FORMAT_VERSION}",
                self.version
            )));
        }
        Ok(())
    }
}

enum Location {
    Group(PathBuf),
    Dataset(PathBuf),
}

/// Read access to an on-disk bundle
#[derive(Debug, Clone)]
pub struct BundleContainer {
    root: PathBuf,
    manifest: BundleManifest,
    batch_size: usize,
}

impl BundleContainer {
    /// Open a bundle directory, validating its manifest
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let root = path.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ContainerError::InvalidFormat(format!(
                "{} has no {MANIFEST_FILE}",
                root.display()
            )));
        }

        let manifest: BundleManifest = serde_json::from_slice(&fs::read(&manifest_path)?)?;
        manifest.validate()?;
        debug!("Opened bundle {} (version {})", root.display(), manifest.version);

        Ok(Self {
            root,
            manifest,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Rows decoded per record batch when reading datasets
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    fn locate(&self, path: &str) -> Result<(String, Location), ContainerError> {
        let parts = split_path(path)?;
        let canonical = canonical_path(&parts);

        let Some((name, parents)) = parts.split_last() else {
            return Ok((canonical, Location::Group(self.root.clone())));
        };

        let mut dir = self.root.clone();
        for (depth, part) in parents.iter().enumerate() {
            dir.push(part);
            if !dir.is_dir() {
                if dataset_file(&dir).is_file() {
                    return Err(ContainerError::NotAGroup(canonical_path(&parts[..=depth])));
                }
                return Err(ContainerError::NotFound(canonical));
            }
        }

        let group_dir = dir.join(name);
        if group_dir.is_dir() {
            return Ok((canonical, Location::Group(group_dir)));
        }
        let file = dataset_file(&group_dir);
        if file.is_file() {
            return Ok((canonical, Location::Dataset(file)));
        }
        Err(ContainerError::NotFound(canonical))
    }
}

/// `<dir>/<name>` -> `<dir>/<name>.parquet`
fn dataset_file(node_dir: &Path) -> PathBuf {
    let mut file = node_dir.as_os_str().to_owned();
    file.push(".");
    file.push(DATASET_EXTENSION);
    PathBuf::from(file)
}

fn read_group_attributes(dir: &Path) -> Result<Attributes, ContainerError> {
    let path = dir.join(ATTRIBUTES_FILE);
    if !path.is_file() {
        return Ok(Attributes::new());
    }
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

/// Sorted child names of a group directory
fn list_children(dir: &Path) -> Result<Vec<String>, ContainerError> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if path.is_dir() {
            children.push(name.to_string());
        } else if path.extension().and_then(|e| e.to_str()) == Some(DATASET_EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                children.push(stem.to_string());
            }
        }
    }
    children.sort();
    children.dedup();
    Ok(children)
}

impl Container for BundleContainer {
    type Dataset = BundleDataset;

    fn node(&self, path: &str) -> Result<Node, ContainerError> {
        match self.locate(path)? {
            (canonical, Location::Group(dir)) => Ok(Node::Group(GroupNode {
                path: canonical,
                attributes: read_group_attributes(&dir)?,
                children: list_children(&dir)?,
            })),
            (canonical, Location::Dataset(file)) => {
                let dataset = BundleDataset::open(canonical, file, self.batch_size)?;
                Ok(Node::Leaf(LeafNode {
                    descriptor: dataset.descriptor,
                    attributes: dataset.attributes,
                }))
            }
        }
    }

    fn dataset(&self, path: &str) -> Result<BundleDataset, ContainerError> {
        match self.locate(path)? {
            (canonical, Location::Dataset(file)) => {
                BundleDataset::open(canonical, file, self.batch_size)
            }
            (canonical, Location::Group(_)) => Err(ContainerError::NotADataset(canonical)),
        }
    }
}

/// One dataset file of a bundle.
///
/// The Parquet footer and page index are loaded once on open; every read
/// reopens the file so handles can be shared across threads.
#[derive(Debug, Clone)]
pub struct BundleDataset {
    file: PathBuf,
    descriptor: DatasetDescriptor,
    attributes: Attributes,
    metadata: ArrowReaderMetadata,
    batch_size: usize,
}

impl BundleDataset {
    fn open(path: String, file: PathBuf, batch_size: usize) -> Result<Self, ContainerError> {
        let handle = File::open(&file)?;
        let options = ArrowReaderOptions::new().with_page_index(true);
        let metadata = ArrowReaderMetadata::load(&handle, options)?;

        let schema = metadata.schema();
        let field = schema.field_with_name(VALUES_COLUMN).map_err(|_| {
            ContainerError::InvalidFormat(format!(
                "{} has no {VALUES_COLUMN:?} column",
                file.display()
            ))
        })?;

        let rows = metadata.metadata().file_metadata().num_rows();
        let rows = usize::try_from(rows).map_err(|_| {
            ContainerError::InvalidFormat(format!("{} reports {rows} rows", file.display()))
        })?;
        let descriptor = DatasetDescriptor::from_array_type(path, field.data_type(), rows)?;

        let attributes = match schema.metadata().get(ATTRIBUTES_KEY) {
            Some(json) => serde_json::from_str(json)?,
            None => Attributes::new(),
        };

        Ok(Self {
            file,
            descriptor,
            attributes,
            metadata,
            batch_size,
        })
    }

    /// Number of row groups (chunks) in the dataset file
    pub fn row_group_count(&self) -> usize {
        self.metadata.metadata().num_row_groups()
    }

    /// Compressed size of the dataset file in bytes
    pub fn compressed_size(&self) -> u64 {
        self.metadata
            .metadata()
            .row_groups()
            .iter()
            .map(|rg| rg.compressed_size().max(0) as u64)
            .sum()
    }

    /// Decode the given ascending, disjoint half-open row ranges in one pass.
    ///
    /// Row groups and pages that no range touches are skipped entirely.
    pub fn read_selection(&self, ranges: &[Range<usize>]) -> Result<ArrayRef, ContainerError> {
        let data_type = self.descriptor.array_type();
        let wanted: usize = ranges.iter().map(|r| r.len()).sum();
        if wanted == 0 {
            return Ok(new_empty_array(&data_type));
        }
        let mut previous_end = 0;
        for range in ranges {
            self.descriptor.check_rows(range)?;
            if range.start < previous_end {
                return Err(SelectionError::Unordered {
                    previous: previous_end - 1,
                    next: range.start,
                }
                .into());
            }
            previous_end = previous_end.max(range.end);
        }

        let selection =
            RowSelection::from_consecutive_ranges(ranges.iter().cloned(), self.descriptor.rows);
        let file = File::open(&self.file)?;
        let reader = ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone())
            .with_row_selection(selection)
            .with_batch_size(self.batch_size)
            .build()?;

        let mut parts = Vec::new();
        for batch in reader {
            parts.push(batch?.column(0).clone());
        }
        Ok(concat_rows(&parts, &data_type)?)
    }
}

impl DatasetHandle for BundleDataset {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn read_rows(&self, rows: Range<usize>) -> Result<ArrayRef, ContainerError> {
        self.descriptor.check_rows(&rows)?;
        self.read_selection(std::slice::from_ref(&rows))
    }

    fn take_rows(&self, indices: &[usize]) -> Result<ArrayRef, ContainerError> {
        self.descriptor.check_indices(indices)?;

        let mut unique = indices.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let ranges: Vec<Range<usize>> = compress(unique.iter().copied())?
            .iter()
            .map(|range| range.to_half_open())
            .collect();
        let values = self.read_selection(&ranges)?;

        // `values` holds the unique rows ascending; map each request onto it
        let positions = UInt64Array::from_iter_values(
            indices
                .iter()
                .map(|&row| unique.partition_point(|&u| u < row) as u64),
        );
        Ok(take(values.as_ref(), &positions, None)?)
    }
}

/// Creates a new bundle on disk.
///
/// Every file is written to a temporary sibling first and moved into place
/// once complete, so a failed write never leaves a truncated dataset behind.
#[derive(Debug)]
pub struct BundleWriter {
    root: PathBuf,
    config: BundleConfig,
    datasets_written: usize,
}

impl BundleWriter {
    /// Create the bundle directory; it must not exist or must be empty
    pub fn create<P: AsRef<Path>>(path: P, config: BundleConfig) -> Result<Self, ContainerError> {
        let root = path.as_ref().to_path_buf();
        if root.exists() && (!root.is_dir() || fs::read_dir(&root)?.next().is_some()) {
            return Err(ContainerError::AlreadyExists(root.display().to_string()));
        }
        fs::create_dir_all(&root)?;

        let manifest = serde_json::to_vec_pretty(&BundleManifest::default())?;
        write_atomic(&root, &root.join(MANIFEST_FILE), &manifest)?;
        debug!("Created bundle {}", root.display());

        Ok(Self {
            root,
            config,
            datasets_written: 0,
        })
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Number of datasets written so far
    pub fn datasets_written(&self) -> usize {
        self.datasets_written
    }

    fn group_dir(&self, parts: &[&str]) -> Result<PathBuf, ContainerError> {
        let mut dir = self.root.clone();
        for (depth, part) in parts.iter().enumerate() {
            dir.push(part);
            if dataset_file(&dir).is_file() {
                return Err(ContainerError::NotAGroup(canonical_path(&parts[..=depth])));
            }
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl ContainerWriter for BundleWriter {
    fn create_group(&mut self, path: &str, attributes: &Attributes) -> Result<(), ContainerError> {
        let parts = split_path(path)?;
        let dir = self.group_dir(&parts)?;
        let json = serde_json::to_vec_pretty(attributes)?;
        write_atomic(&dir, &dir.join(ATTRIBUTES_FILE), &json)
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
        let dir = self.group_dir(parents)?;
        let target = dir.join(format!("{name}.{DATASET_EXTENSION}"));
        if target.exists() || dir.join(name).exists() {
            return Err(ContainerError::AlreadyExists(descriptor.path));
        }

        let attributes_json = serde_json::to_string(attributes)?;
        let footer = vec![KeyValue::new(
            ATTRIBUTES_KEY.to_string(),
            attributes_json.clone(),
        )];
        let metadata = HashMap::from([(ATTRIBUTES_KEY.to_string(), attributes_json)]);
        let schema = Arc::new(
            Schema::new(vec![Field::new(
                VALUES_COLUMN,
                values.data_type().clone(),
                false,
            )])
            .with_metadata(metadata),
        );
        let props = self.config.to_writer_properties(&descriptor.dtype, footer);

        let mut tmp = NamedTempFile::new_in(&dir)?;
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), schema.clone(), Some(props))?;
        if !values.is_empty() {
            writer.write(&RecordBatch::try_new(schema, vec![values])?)?;
        }
        writer.close()?;
        tmp.persist(&target).map_err(|e| ContainerError::IoError(e.error))?;

        debug!(
            "Wrote {} ({} rows, shape {:?})",
            descriptor.path,
            descriptor.rows,
            descriptor.shape()
        );
        self.datasets_written += 1;
        Ok(())
    }
}

fn write_atomic(dir: &Path, target: &Path, contents: &[u8]) -> Result<(), ContainerError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(target).map_err(|e| ContainerError::IoError(e.error))?;
    Ok(())
}
