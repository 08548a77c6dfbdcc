//! Region layout of a volume: where the VCB, the free-space bitmap
//! and the root directory live, expressed in whole blocks.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("Block size must be at least 1 byte")]
    ZeroBlockSize,
    #[error("The volume must contain at least one block")]
    ZeroBlockCount,
    #[error("A volume of {total_blocks} blocks cannot hold its own metadata ({required} blocks required)")]
    VolumeTooSmall { total_blocks: u32, required: u32 },
}

/// Parameters the whole layout derives from. The defaults match the
/// on-disk format's reference configuration; readers of the format
/// may assume them unless the VCB says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeParams {
    /// Bytes per block, a power of two in practice.
    pub block_size: u32,
    /// Total blocks in the volume. Volume size in bytes is
    /// `block_size * total_blocks`.
    pub total_blocks: u32,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            block_size: 512,
            total_blocks: 4096,
        }
    }
}

impl VolumeParams {
    pub fn volume_size(&self) -> u64 {
        self.block_size as u64 * self.total_blocks as u64
    }
}

/// A contiguous run of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_block: u32,
    pub length_blocks: u32,
}

impl Region {
    /// Block indices covered by this region.
    pub fn blocks(&self) -> std::ops::Range<u32> {
        self.start_block..self.start_block + self.length_blocks
    }
}

/// Where each metadata region lives. Regions are contiguous and
/// non-overlapping, in the order VCB, bitmap, root directory,
/// starting at block 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMap {
    pub vcb: Region,
    pub free_bitmap: Region,
    pub root_dir: Region,
}

impl RegionMap {
    pub fn regions(&self) -> [Region; 3] {
        [self.vcb, self.free_bitmap, self.root_dir]
    }
}

/// Compute the region map for a volume of `total_blocks` blocks of
/// `block_size` bytes each. The VCB takes block 0, the bitmap starts
/// right after it and is sized to hold one bit per volume block, and
/// the root directory takes the single block after the bitmap.
pub fn compute_layout(params: VolumeParams) -> Result<RegionMap, LayoutError> {
    if params.block_size == 0 {
        return Err(LayoutError::ZeroBlockSize);
    }
    if params.total_blocks == 0 {
        return Err(LayoutError::ZeroBlockCount);
    }

    let vcb = Region {
        start_block: 0,
        length_blocks: 1,
    };
    let bitmap_bytes = params.total_blocks.div_ceil(8);
    let free_bitmap = Region {
        start_block: vcb.start_block + vcb.length_blocks,
        length_blocks: bitmap_bytes.div_ceil(params.block_size),
    };
    let root_dir = Region {
        start_block: free_bitmap.start_block + free_bitmap.length_blocks,
        length_blocks: 1,
    };

    let required = root_dir.start_block + root_dir.length_blocks;
    if required > params.total_blocks {
        return Err(LayoutError::VolumeTooSmall {
            total_blocks: params.total_blocks,
            required,
        });
    }

    Ok(RegionMap {
        vcb,
        free_bitmap,
        root_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(block_size: u32, total_blocks: u32) -> VolumeParams {
        VolumeParams {
            block_size,
            total_blocks,
        }
    }

    #[test]
    fn default_layout() {
        let map = compute_layout(VolumeParams::default()).unwrap();
        assert_eq!(map.vcb.start_block, 0);
        assert_eq!(map.vcb.length_blocks, 1);
        assert_eq!(map.free_bitmap.start_block, 1);
        assert_eq!(map.free_bitmap.length_blocks, 1);
        assert_eq!(map.root_dir.start_block, 2);
        assert_eq!(map.root_dir.length_blocks, 1);
    }

    #[test]
    fn regions_are_contiguous_and_ordered() {
        let cases = [
            params(512, 4096),
            params(512, 3),
            params(512, 5000),
            params(4096, 1 << 20),
            params(64, 4096),
            params(1, 16),
        ];
        for p in cases {
            let map = compute_layout(p).unwrap();
            let [vcb, bitmap, root] = map.regions();
            assert_eq!(vcb.start_block, 0, "{p:?}");
            assert_eq!(bitmap.start_block, vcb.start_block + vcb.length_blocks);
            assert_eq!(root.start_block, bitmap.start_block + bitmap.length_blocks);
            assert!(vcb.start_block < bitmap.start_block);
            assert!(bitmap.start_block < root.start_block);
            assert!(root.start_block + root.length_blocks <= p.total_blocks);
        }
    }

    #[test]
    fn bitmap_is_sized_for_one_bit_per_block() {
        // (block_size, total_blocks, expected bitmap blocks)
        let cases = [
            (512, 4096, 1),
            (512, 4097, 2),
            (512, 512 * 8, 1),
            (512, 512 * 8 + 1, 2),
            (4096, 1 << 20, 32),
            (64, 4096, 8),
        ];
        for (block_size, total_blocks, expected) in cases {
            let map = compute_layout(params(block_size, total_blocks)).unwrap();
            assert_eq!(
                map.free_bitmap.length_blocks, expected,
                "block_size={block_size} total_blocks={total_blocks}"
            );
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            compute_layout(params(0, 4096)),
            Err(LayoutError::ZeroBlockSize)
        );
        assert_eq!(
            compute_layout(params(512, 0)),
            Err(LayoutError::ZeroBlockCount)
        );
        // Two blocks cannot hold VCB + bitmap + root directory.
        assert_eq!(
            compute_layout(params(512, 2)),
            Err(LayoutError::VolumeTooSmall {
                total_blocks: 2,
                required: 3
            })
        );
    }
}
