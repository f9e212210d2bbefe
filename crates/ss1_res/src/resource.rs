//! Resources and the traits to provide them.

use std::{
    fmt::{self, Debug},
    io::Read,
    rc::Rc,
};

use binrw::{BinRead, BinWrite};
use derive_more::{Display, From, Into};
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Identifier of a resource within a resource file
#[derive(
    BinRead, BinWrite, Display, From, Into, Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[brw(little)]
#[display("0x{_0:04X}")]
pub struct ResourceId(pub u16);

/// Describes how the blocks of a resource shall be interpreted
#[derive(BinRead, BinWrite, Display, From, Into, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
#[display("0x{_0:02X}")]
pub struct ContentType(pub u8);

/// Reader over the uncompressed data of a single block
pub type BlockReader<'a> = Box<dyn Read + 'a>;

/// Keeper of the blocks of a resource
pub trait BlockProvider {
    /// Number of blocks available
    fn block_count(&self) -> usize;

    /// Returns a new reader for the identified block.
    ///
    /// Every call returns an independent reader starting at the beginning of the block.
    fn block(&self, index: usize) -> Result<BlockReader<'_>>;
}

/// A resource with its meta information and access to its blocks
pub struct Resource {
    /// Whether the resource is stored with a block table.
    /// Compound resources can have zero, one, or more blocks.
    pub compound: bool,

    /// How the block data shall be interpreted
    pub content_type: ContentType,

    /// Whether the data is stored in compressed form
    pub compressed: bool,

    blocks: Box<dyn BlockProvider>,
}

impl Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Resource")
            .field("compound", &self.compound)
            .field("content_type", &self.content_type)
            .field("compressed", &self.compressed)
            .field("blocks", &self.block_count())
            .finish()
    }
}

impl Resource {
    /// Create a resource around an arbitrary block provider
    pub fn new(
        compound: bool,
        content_type: ContentType,
        compressed: bool,
        blocks: impl BlockProvider + 'static,
    ) -> Self {
        Self {
            compound,
            content_type,
            compressed,
            blocks: Box::new(blocks),
        }
    }

    /// Create a simple resource holding the given data as its only block
    pub fn simple(content_type: ContentType, compressed: bool, data: impl Into<Vec<u8>>) -> Self {
        Self::new(
            false,
            content_type,
            compressed,
            MemoryBlocks::from(vec![data.into()]),
        )
    }

    /// Create a compound resource from a list of blocks
    pub fn compound(content_type: ContentType, compressed: bool, blocks: Vec<Vec<u8>>) -> Self {
        Self::new(true, content_type, compressed, MemoryBlocks::from(blocks))
    }

    /// Number of available blocks. Simple resources always have exactly one.
    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }

    /// Returns a new reader for the identified block. Data is always uncompressed.
    pub fn block(&self, index: usize) -> Result<BlockReader<'_>> {
        self.blocks.block(index)
    }

    /// Reads the complete data of the identified block
    pub fn block_data(&self, index: usize) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.block(index)?.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Blocks held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, From)]
pub struct MemoryBlocks(Vec<Vec<u8>>);

impl BlockProvider for MemoryBlocks {
    fn block_count(&self) -> usize {
        self.0.len()
    }

    fn block(&self, index: usize) -> Result<BlockReader<'_>> {
        let data = self.0.get(index).ok_or(Error::BlockIndexOutOfRange {
            index,
            count: self.0.len(),
        })?;
        Ok(Box::new(data.as_slice()))
    }
}

/// A source of resources, such as a resource file
pub trait Provider {
    /// The identifiers of all resources, in storage order
    fn ids(&self) -> Vec<ResourceId>;

    /// Retrieve the identified resource
    fn resource(&mut self, id: ResourceId) -> Result<Rc<Resource>>;
}

/// Resources held in memory, kept in insertion order
#[derive(Debug, Default)]
pub struct ResourceList {
    resources: IndexMap<ResourceId, Rc<Resource>>,
}

impl ResourceList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource. A replaced resource keeps its position.
    pub fn insert(
        &mut self,
        id: ResourceId,
        resource: impl Into<Rc<Resource>>,
    ) -> Option<Rc<Resource>> {
        self.resources.insert(id, resource.into())
    }

    /// Number of resources in the list
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the list contains no resources
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<(ResourceId, Resource)> for ResourceList {
    fn from_iter<T: IntoIterator<Item = (ResourceId, Resource)>>(iter: T) -> Self {
        Self {
            resources: iter
                .into_iter()
                .map(|(id, resource)| (id, Rc::new(resource)))
                .collect(),
        }
    }
}

impl Provider for ResourceList {
    fn ids(&self) -> Vec<ResourceId> {
        self.resources.keys().copied().collect()
    }

    fn resource(&mut self, id: ResourceId) -> Result<Rc<Resource>> {
        self.resources
            .get(&id)
            .cloned()
            .ok_or(Error::ResourceNotFound(id))
    }
}
