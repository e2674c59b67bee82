use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

/// Compression options for bundle datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// ZSTD compression at the given level
    Zstd(i32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// Maximum compression (slower write, smallest files)
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    pub fn balanced() -> Self {
        Self::Zstd(3)
    }

    /// Fast compression (faster write, larger files)
    pub fn fast() -> Self {
        Self::Snappy
    }

    fn to_parquet(self) -> Compression {
        match self {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Storage settings for datasets written by a [`super::BundleWriter`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Compression codec for every dataset
    pub compression: CompressionType,

    /// Rows per row group. Row groups are the chunk unit of a dataset:
    /// smaller means cheaper sparse reads, larger means better compression.
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write column chunk and page statistics
    pub write_statistics: bool,

    /// Use BYTE_STREAM_SPLIT encoding for floating-point datasets.
    /// Coordinates and velocities compress noticeably better with it.
    pub use_byte_stream_split: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::Zstd(3),
            // 64k rows per chunk keeps region reads cheap
            row_group_size: 65_536,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            use_byte_stream_split: true,
        }
    }
}

impl BundleConfig {
    /// Configuration optimized for maximum compression (slower write)
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::max_compression(),
            row_group_size: 1_048_576,
            data_page_size: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::fast(),
            row_group_size: 32_768,
            data_page_size: 512 * 1024,
            ..Self::default()
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }

    /// Writer properties for a dataset whose elements are `dtype`, with
    /// `footer` stored as plain key/value metadata
    pub(super) fn to_writer_properties(
        &self,
        dtype: &DataType,
        footer: Vec<KeyValue>,
    ) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Page
        } else {
            EnabledStatistics::None
        };

        // Particle data is high cardinality; dictionaries only cost space
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size.max(1))
            .set_dictionary_enabled(false)
            .set_key_value_metadata(Some(footer));

        if self.use_byte_stream_split && matches!(dtype, DataType::Float32 | DataType::Float64) {
            builder = builder.set_encoding(Encoding::BYTE_STREAM_SPLIT);
        }

        builder.build()
    }
}
