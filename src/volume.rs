//! The volume writer: materializes the backing file and lays down
//! the VCB, the free-space bitmap and the root directory, each as
//! one canonical block image at its region offset.

pub mod ondisk;

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, trace};

use crate::layout::{compute_layout, LayoutError, RegionMap, VolumeParams};
use ondisk::{initial_bitmap_block, DirEntry, VolumeControlBlock};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormatError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("A {block_size}-byte block cannot hold a {required}-byte structure")]
    BlockTooSmall { required: usize, block_size: u32 },
}

pub type Result<T> = std::result::Result<T, FormatError>;

/// Handle on the backing file of a volume being formatted. All I/O
/// is synchronous and blocking; callers must guarantee exclusive
/// access to the file for the duration.
#[derive(Debug)]
pub struct VolumeFile {
    file: File,
    params: VolumeParams,
}

impl VolumeFile {
    /// Opens (or creates) the backing file read+write. Reformatting
    /// an existing image is allowed and produces identical bytes.
    pub fn create(path: impl AsRef<Path>, params: VolumeParams) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening volume image at {path:?}");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file, params })
    }

    /// Grows (or shrinks) the backing file to exactly
    /// `block_size * total_blocks` bytes. Existing content below
    /// that length is untouched; the extension reads as zeroes.
    pub fn ensure_capacity(&mut self) -> Result<()> {
        let size = self.params.volume_size();
        trace!("Sizing volume image to {size} bytes");
        self.file.set_len(size)?;
        Ok(())
    }

    /// Writes one block image at `block_no * block_size` and flushes
    /// it before returning. The image must be exactly one block long;
    /// the ondisk builders guarantee that by construction.
    pub fn write_block(&mut self, block_no: u32, image: &[u8]) -> Result<()> {
        assert!(
            image.len() == self.params.block_size as usize,
            "block image must be exactly one block long"
        );
        let offset = block_no as u64 * self.params.block_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(image)?;
        self.file.flush()?;
        Ok(())
    }

    /// Formats the volume: computes the region map, sizes the file,
    /// then writes the VCB, the bitmap and the root directory in that
    /// order. Each write is flushed before the next begins; there is
    /// no rollback if a later write fails.
    pub fn format(&mut self) -> Result<RegionMap> {
        let params = self.params;
        let map = compute_layout(params)?;
        self.ensure_capacity()?;

        let vcb = VolumeControlBlock::new(params, &map);
        self.write_block(map.vcb.start_block, &vcb.to_block(params.block_size)?)?;
        debug!("Wrote VCB to block {}", map.vcb.start_block);

        let bitmap = initial_bitmap_block(&map, params.block_size);
        self.write_block(map.free_bitmap.start_block, &bitmap)?;
        debug!(
            "Wrote free-space bitmap to block {}",
            map.free_bitmap.start_block
        );

        let root = DirEntry::root_self_reference(&map);
        self.write_block(map.root_dir.start_block, &root.to_block(params.block_size)?)?;
        debug!(
            "Wrote root directory (.) entry to block {}",
            map.root_dir.start_block
        );

        Ok(map)
    }
}

/// One-shot formatting of the volume image at `path`.
pub fn format_volume(path: impl AsRef<Path>, params: VolumeParams) -> Result<RegionMap> {
    VolumeFile::create(path, params)?.format()
}
