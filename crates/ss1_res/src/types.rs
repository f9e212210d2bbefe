//! Base types for structure of resource files.

use binrw::{binrw, BinRead, BinWrite};

use crate::resource::{ContentType, ResourceId};

/// Size of the file header, which is also where the first resource starts
pub const HEADER_SIZE: u32 = 0x80;

/// Position of the directory offset within the file header
pub const DIRECTORY_OFFSET_POSITION: u64 = 0x7C;

/// Resources always start on a multiple of this size
pub const BOUNDARY_SIZE: u64 = 4;

/// Largest length the 24 bit fields of a directory entry can hold
pub const MAX_LENGTH: u32 = 0x00FF_FFFF;

/// Rounds the offset up to the next resource boundary
pub fn align(offset: u64) -> u64 {
    offset + (BOUNDARY_SIZE - (offset % BOUNDARY_SIZE)) % BOUNDARY_SIZE
}

/// Resource file header
///
/// Defines the header of a resource file which always starts with "LG Res File v2\r\n" followed by the
/// comment terminator 0x1A. The remaining comment area is skipped when reading and written as zeroes.
/// All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(magic = b"LG Res File v2\r\n\x1a", little)]
pub struct ResHeader {
    /// The offset from the beginning of the file where the directory starts
    #[brw(pad_before = 107)]
    pub directory_offset: u32,
}

/// Leading record of the directory
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct DirectoryHeader {
    /// Number of entries following the header
    pub resource_count: u16,

    /// The offset from the beginning of the file where the data of the first resource starts
    pub first_resource_offset: u32,
}

/// Storage flags of a resource
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ResourceFlags(u8);

impl ResourceFlags {
    const COMPRESSED: u8 = 0x01;
    const COMPOUND: u8 = 0x02;

    /// Combine the flags of a resource
    pub fn new(compound: bool, compressed: bool) -> Self {
        let mut flags = 0;
        if compressed {
            flags |= Self::COMPRESSED;
        }
        if compound {
            flags |= Self::COMPOUND;
        }
        Self(flags)
    }

    /// Whether the data of the resource is compressed
    pub fn compressed(self) -> bool {
        (self.0 & Self::COMPRESSED) != 0
    }

    /// Whether the resource starts with a block table
    pub fn compound(self) -> bool {
        (self.0 & Self::COMPOUND) != 0
    }
}

/// Resource directory entry
///
/// Defines a resource in the file. The position of the resource is not part of the entry.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct DirectoryEntry {
    /// Identifier of the resource
    pub id: ResourceId,

    /// The size of the data for this resource before compression
    #[br(map = u24_from_bytes)]
    #[bw(map = u24_to_bytes)]
    pub unpacked_length: u32,

    /// How the resource is stored
    pub flags: ResourceFlags,

    /// The size of the data for this resource in the file
    #[br(map = u24_from_bytes)]
    #[bw(map = u24_to_bytes)]
    pub packed_length: u32,

    /// How the data of the resource shall be interpreted
    pub content_type: ContentType,
}

fn u24_from_bytes(bytes: [u8; 3]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

fn u24_to_bytes(value: &u32) -> [u8; 3] {
    let bytes = value.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Block table at the start of a compound resource
#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlockTable {
    #[br(temp)]
    #[bw(try_calc = block_ends.len().try_into())]
    block_count: u16,

    /// The offset from the start of the resource where the first block starts
    pub first_block_offset: u32,

    /// For each block, the offset from the start of the resource just past its data
    #[br(count = block_count)]
    pub block_ends: Vec<u32>,
}

/// Location of a single block within the uncompressed data of a compound resource
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Offset from the start of the resource
    pub start: u32,
    /// Length of the block
    pub size: u32,
}

impl BlockTable {
    /// Build the table for blocks of the given sizes, placing the first block right after the table
    pub fn for_sizes(sizes: impl IntoIterator<Item = u32>) -> Self {
        let sizes: Vec<u32> = sizes.into_iter().collect();
        let first_block_offset = Self::size_for(sizes.len());
        let block_ends = sizes
            .iter()
            .scan(first_block_offset, |end, size| {
                *end += size;
                Some(*end)
            })
            .collect();

        Self {
            first_block_offset,
            block_ends,
        }
    }

    /// Number of bytes a table with the given number of blocks occupies
    pub fn size_for(blocks: usize) -> u32 {
        (2 + 4 + 4 * blocks) as u32
    }

    /// Resolves the cumulative end offsets into block spans.
    ///
    /// Returns `None` if an end offset lies before the end of the previous block.
    pub fn spans(&self) -> Option<Vec<BlockSpan>> {
        let mut start = self.first_block_offset;
        self.block_ends
            .iter()
            .map(|&end| {
                let size = end.checked_sub(start)?;
                let span = BlockSpan { start, size };
                start = end;
                Some(span)
            })
            .collect()
    }
}
