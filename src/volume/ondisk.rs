//! Canonical byte images of the on-disk structures. Each structure
//! is a little-endian packed record at the start of its block; the
//! rest of the block is zero padding, so every image is exactly one
//! block long by construction.

use packed_struct::prelude::*;

use super::{FormatError, Result};
use crate::layout::{RegionMap, VolumeParams};

/// Pads a packed record out to a full block, or refuses if the block
/// is too small to hold it.
fn pad_to_block(packed: &[u8], block_size: u32) -> Result<Vec<u8>> {
    if (block_size as usize) < packed.len() {
        return Err(FormatError::BlockTooSmall {
            required: packed.len(),
            block_size,
        });
    }
    let mut block = vec![0; block_size as usize];
    block[..packed.len()].copy_from_slice(packed);
    Ok(block)
}

/// The volume control block, stored in block 0. Identifies the
/// format and records the volume geometry and the region map, so a
/// reader needs nothing but block 0 to find everything else.
#[derive(PackedStruct, Debug, PartialEq, Eq)]
#[packed_struct(endian = "lsb")]
pub struct VolumeControlBlock {
    /// Magic tag "VCB1"
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub block_size: u32,
    pub total_blocks: u32,
    /// Free-space bitmap region
    pub free_start: u32,
    pub free_len: u32,
    /// Root directory region
    pub root_start: u32,
    pub root_len: u32,
}

impl VolumeControlBlock {
    /// "VCB1", laid down little-endian on disk.
    pub const MAGIC: u32 = 0x5643_4231;
    pub const VERSION_MAJOR: u16 = 1;
    pub const VERSION_MINOR: u16 = 0;
    /// Width of the fixed fields; everything past this is padding.
    pub const PACKED_SIZE: usize = 32;

    pub fn new(params: VolumeParams, map: &RegionMap) -> Self {
        Self {
            magic: Self::MAGIC,
            version_major: Self::VERSION_MAJOR,
            version_minor: Self::VERSION_MINOR,
            block_size: params.block_size,
            total_blocks: params.total_blocks,
            free_start: map.free_bitmap.start_block,
            free_len: map.free_bitmap.length_blocks,
            root_start: map.root_dir.start_block,
            root_len: map.root_dir.length_blocks,
        }
    }

    pub fn to_block(&self, block_size: u32) -> Result<Vec<u8>> {
        pad_to_block(&self.pack().unwrap(), block_size)
    }
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryKind {
    Directory = 1,
    File = 2,
}

/// A directory entry. The format stores exactly one entry per
/// directory block, padded out to the block size.
#[derive(PackedStruct, Debug, PartialEq, Eq)]
#[packed_struct(endian = "lsb")]
pub struct DirEntry {
    /// Entry name, null-padded.
    pub name: [u8; 32],
    /// Block the entry's content occupies.
    pub block_num: u32,
    #[packed_field(element_size_bytes = "1", ty = "enum")]
    pub kind: EntryKind,
    /// 1 = live entry, 0 = free slot.
    pub valid: u8,
}

impl DirEntry {
    pub const NAME_LEN: usize = 32;
    pub const PACKED_SIZE: usize = 38;

    pub fn new(name: &str, block_num: u32, kind: EntryKind) -> Self {
        assert!(name.len() <= Self::NAME_LEN, "entry name too long");
        let mut field = [0; Self::NAME_LEN];
        field[..name.len()].copy_from_slice(name.as_bytes());
        Self {
            name: field,
            block_num,
            kind,
            valid: 1,
        }
    }

    /// The "." entry the root directory starts out with, pointing at
    /// the root directory's own block.
    pub fn root_self_reference(map: &RegionMap) -> Self {
        Self::new(".", map.root_dir.start_block, EntryKind::Directory)
    }

    /// Entry name with the null padding stripped.
    pub fn name(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::NAME_LEN);
        std::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    pub fn to_block(&self, block_size: u32) -> Result<Vec<u8>> {
        pad_to_block(&self.pack().unwrap(), block_size)
    }
}

/// Builds the first block of the free-space bitmap: one bit per
/// volume block, bit `i` stored at byte `i / 8`, bit `i % 8`
/// (low-to-high), set when the block is allocated. Every block
/// covered by a metadata region is marked used; all other bits are
/// clear. Only this first block is materialized by the formatter, so
/// block indices past its bit capacity stay in the implicitly-zero
/// tail of the bitmap region.
pub fn initial_bitmap_block(map: &RegionMap, block_size: u32) -> Vec<u8> {
    let mut bitmap = vec![0u8; block_size as usize];
    let capacity = bitmap.len() as u64 * 8;
    for region in map.regions() {
        for block in region.blocks() {
            if (block as u64) < capacity {
                bitmap[block as usize / 8] |= 1 << (block % 8);
            }
        }
    }
    bitmap
}
