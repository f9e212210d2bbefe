//! Layering of resources from several sources.
//!
//! Layers are ordered from lowest (index 0, the base) to highest. For every block, the highest layer
//! that provides content for it wins. A block provides content if its first byte is not zero; a block
//! that is empty or starts with a zero byte lets the lower layers show through.

use std::{
    fmt::{self, Debug},
    io::{self, Read},
    rc::Rc,
};

use indexmap::IndexSet;
use tracing::{instrument, trace};

use crate::{
    error::{Error, Result},
    resource::{BlockProvider, BlockReader, ContentType, Provider, Resource, ResourceId},
};

/// Whether the layer has data for the block that overrides lower layers.
///
/// A layer without the block never provides content.
pub fn provides_content(layer: &Resource, index: usize) -> Result<bool> {
    if index >= layer.block_count() {
        return Ok(false);
    }

    let mut reader = layer.block(index)?;
    let mut first = [0u8; 1];
    loop {
        match reader.read(&mut first) {
            Ok(0) => return Ok(false),
            Ok(_) => return Ok(first[0] != 0x00),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

/// One resource, combined from the same resource of several layers
pub struct ResourceOverlay {
    layers: Vec<Rc<Resource>>,
}

impl Debug for ResourceOverlay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResourceOverlay")
            .field("layers", &self.layers.len())
            .field("blocks", &self.block_count())
            .finish()
    }
}

impl ResourceOverlay {
    /// Stack the given layers, lowest first
    pub fn new(layers: Vec<Rc<Resource>>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::EmptyOverlay);
        }
        Ok(Self { layers })
    }

    fn base(&self) -> &Resource {
        &self.layers[0]
    }

    /// Taken from the lowest layer
    pub fn compound(&self) -> bool {
        self.base().compound
    }

    /// Taken from the lowest layer
    pub fn content_type(&self) -> ContentType {
        self.base().content_type
    }

    /// Taken from the lowest layer
    pub fn compressed(&self) -> bool {
        self.base().compressed
    }

    /// The largest block count of any layer
    pub fn block_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.block_count())
            .max()
            .unwrap_or_default()
    }

    /// Returns a fresh reader of the topmost layer that provides content for the block.
    ///
    /// `None` if no layer does.
    #[instrument(skip(self), err)]
    pub fn resolve_block(&self, index: usize) -> Result<Option<BlockReader<'_>>> {
        for (level, layer) in self.layers.iter().enumerate().rev() {
            if provides_content(layer, index)? {
                trace!(level, "block provided");
                return layer.block(index).map(Some);
            }
        }
        Ok(None)
    }

    /// Wrap the overlay as a resource with the metadata of the lowest layer
    pub fn into_resource(self) -> Resource {
        Resource::new(
            self.compound(),
            self.content_type(),
            self.compressed(),
            self,
        )
    }
}

impl BlockProvider for ResourceOverlay {
    fn block_count(&self) -> usize {
        ResourceOverlay::block_count(self)
    }

    /// Blocks no layer provides content for read as empty
    fn block(&self, index: usize) -> Result<BlockReader<'_>> {
        let count = ResourceOverlay::block_count(self);
        if index >= count {
            return Err(Error::BlockIndexOutOfRange { index, count });
        }

        match self.resolve_block(index)? {
            Some(reader) => Ok(reader),
            None => Ok(Box::new(io::empty())),
        }
    }
}

/// Provider stacking the resources of several providers.
///
/// A resource present in only some layers is taken from those. The resulting identifiers are in order
/// of first appearance, starting with the lowest layer.
#[derive(Default)]
pub struct LayeredProvider {
    layers: Vec<Box<dyn Provider>>,
}

impl Debug for LayeredProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LayeredProvider")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl LayeredProvider {
    /// Create a provider without any layers
    pub fn new() -> Self {
        Self::default()
    }

    /// Put another layer on top
    pub fn push_layer(&mut self, layer: impl Provider + 'static) {
        self.layers.push(Box::new(layer));
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether there are no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<P: Provider + 'static> FromIterator<P> for LayeredProvider {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        let mut provider = Self::new();
        for layer in iter {
            provider.push_layer(layer);
        }
        provider
    }
}

impl Provider for LayeredProvider {
    fn ids(&self) -> Vec<ResourceId> {
        self.layers
            .iter()
            .flat_map(|layer| layer.ids())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    #[instrument(skip(self), err)]
    fn resource(&mut self, id: ResourceId) -> Result<Rc<Resource>> {
        let mut found = Vec::new();
        for layer in self.layers.iter_mut() {
            match layer.resource(id) {
                Ok(resource) => found.push(resource),
                Err(Error::ResourceNotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }

        if found.is_empty() {
            return Err(Error::ResourceNotFound(id));
        }
        trace!(layers = found.len(), "combining resource");

        Ok(Rc::new(ResourceOverlay::new(found)?.into_resource()))
    }
}
