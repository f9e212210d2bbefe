//! Types for writing resource files
//!

use binrw::BinWrite;
use bon::Builder;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use tracing::{debug, instrument};

use crate::compression::compress;
use crate::error::{Error, Result};
use crate::resource::{ContentType, Provider, ResourceId};
use crate::types::{
    align, BlockTable, DirectoryEntry, DirectoryHeader, ResHeader, ResourceFlags,
    DIRECTORY_OFFSET_POSITION, HEADER_SIZE, MAX_LENGTH,
};

/// Options for how the resource file should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct WriterOptions {
    /// The zlib level (0-9) used for compressed resources
    #[builder(default = 6)]
    pub compression_level: u32,

    /// Accept identifiers that were already written.
    ///
    /// Readers only ever see the first resource of an identifier.
    #[builder(default)]
    pub allow_duplicates: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A resource that is currently being written
#[derive(Debug)]
struct PendingResource {
    id: ResourceId,
    content_type: ContentType,
    compound: bool,
    compressed: bool,
    payload: Vec<u8>,
    block_starts: Vec<usize>,
}

impl PendingResource {
    fn block_sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.block_starts.iter().enumerate().map(|(index, start)| {
            let end = self
                .block_starts
                .get(index + 1)
                .copied()
                .unwrap_or(self.payload.len());
            (end - start) as u32
        })
    }

    /// Serializes the resource, returning its directory entry and the bytes to store
    #[instrument(skip_all, fields(id = %self.id), err)]
    fn encode(self, compression_level: u32) -> Result<(DirectoryEntry, Vec<u8>)> {
        let too_large = |size: usize| Error::ResourceTooLarge {
            id: self.id,
            size: size as u64,
        };

        let (unpacked_length, data) = if self.compound {
            if self.block_starts.len() > usize::from(u16::MAX) {
                return Err(Error::CapacityExceeded("blocks"));
            }
            let unpacked_length =
                BlockTable::size_for(self.block_starts.len()) as usize + self.payload.len();
            if unpacked_length > MAX_LENGTH as usize {
                return Err(too_large(unpacked_length));
            }

            let mut data = Vec::new();
            BlockTable::for_sizes(self.block_sizes()).write(&mut Cursor::new(&mut data))?;
            if self.compressed {
                data.extend(compress(&self.payload, compression_level).map_err(Error::WriteFailure)?);
            } else {
                data.extend_from_slice(&self.payload);
            }
            (unpacked_length, data)
        } else if self.compressed {
            (
                self.payload.len(),
                compress(&self.payload, compression_level).map_err(Error::WriteFailure)?,
            )
        } else {
            (self.payload.len(), self.payload)
        };

        if unpacked_length > MAX_LENGTH as usize {
            return Err(too_large(unpacked_length));
        }
        if data.len() > MAX_LENGTH as usize {
            return Err(too_large(data.len()));
        }

        let entry = DirectoryEntry {
            id: self.id,
            unpacked_length: unpacked_length as u32,
            flags: ResourceFlags::new(self.compound, self.compressed),
            packed_length: data.len() as u32,
            content_type: self.content_type,
        };
        Ok((entry, data))
    }
}

/// Sink for the data of a single block
#[derive(Debug)]
pub struct BlockWriter<'a> {
    pending: &'a mut PendingResource,
}

impl Write for BlockWriter<'_> {
    #[instrument(level = "trace", skip_all, err, fields(size = buf.len()))]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.payload.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builder for the blocks of a compound resource
#[derive(Debug)]
pub struct CompoundResourceWriter<'a> {
    pending: &'a mut PendingResource,
}

impl CompoundResourceWriter<'_> {
    /// Start a new block. Data written to the returned sink ends up in this block.
    pub fn create_block(&mut self) -> BlockWriter<'_> {
        self.pending.block_starts.push(self.pending.payload.len());
        BlockWriter {
            pending: self.pending,
        }
    }

    /// Number of blocks started so far
    pub fn block_count(&self) -> usize {
        self.pending.block_starts.len()
    }
}

/// Resource file generator
///
/// The directory is only written by [`ResourceWriter::finish`], which also patches its offset into the
/// header. Without that call the target does not contain a valid resource file.
///
/// ```
/// # fn doit() -> ss1_res::error::Result<()>
/// # {
/// use std::io::Write;
/// use ss1_res::{ContentType, ResourceId, ResourceWriter};
/// use ss1_res::write::WriterOptions;
///
/// // We use a buffer here, though you'd normally use a `File`
/// let mut res = ResourceWriter::new(std::io::Cursor::new(Vec::new()), WriterOptions::default());
///
/// res.create_resource(ResourceId(0x0100), ContentType(0x00), false)?
///     .write_all(b"Hello, World!")?;
///
/// let mut frames = res.create_compound_resource(ResourceId(0x0101), ContentType(0x02), true)?;
/// frames.create_block().write_all(&[0x01, 0x02])?;
/// frames.create_block().write_all(&[0x03])?;
///
/// // Apply the changes you've made.
/// res.finish()?;
///
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct ResourceWriter<W: Write + Seek> {
    inner: W,
    options: WriterOptions,
    origin: Option<u64>,
    position: u64,
    directory: Vec<DirectoryEntry>,
    pending: Option<PendingResource>,
}

impl<W: Write + Seek> ResourceWriter<W> {
    /// Prepares writing to the target. Nothing is written until the first resource is created.
    pub fn new(inner: W, options: WriterOptions) -> ResourceWriter<W> {
        ResourceWriter {
            inner,
            options,
            origin: None,
            position: u64::from(HEADER_SIZE),
            directory: Vec::new(),
            pending: None,
        }
    }

    /// Number of resources written so far, including the one currently open
    pub fn len(&self) -> usize {
        self.directory.len() + usize::from(self.pending.is_some())
    }

    /// Whether no resource has been created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a simple resource and return the sink for its only block.
    ///
    /// Any previously created resource is completed first.
    #[instrument(skip(self))]
    pub fn create_resource(
        &mut self,
        id: ResourceId,
        content_type: ContentType,
        compressed: bool,
    ) -> Result<BlockWriter<'_>> {
        let pending = self.start_resource(id, content_type, false, compressed)?;
        pending.block_starts.push(0);
        Ok(BlockWriter { pending })
    }

    /// Start a compound resource and return the builder for its blocks.
    ///
    /// Any previously created resource is completed first.
    #[instrument(skip(self))]
    pub fn create_compound_resource(
        &mut self,
        id: ResourceId,
        content_type: ContentType,
        compressed: bool,
    ) -> Result<CompoundResourceWriter<'_>> {
        let pending = self.start_resource(id, content_type, true, compressed)?;
        Ok(CompoundResourceWriter { pending })
    }

    fn start_resource(
        &mut self,
        id: ResourceId,
        content_type: ContentType,
        compound: bool,
        compressed: bool,
    ) -> Result<&mut PendingResource> {
        self.finish_resource()?;
        self.accept_resource(id)?;

        Ok(self.pending.insert(PendingResource {
            id,
            content_type,
            compound,
            compressed,
            payload: Vec::new(),
            block_starts: Vec::new(),
        }))
    }

    /// Checks whether another resource with the identifier may be added
    #[instrument(skip(self), err)]
    fn accept_resource(&self, id: ResourceId) -> Result<()> {
        if !self.options.allow_duplicates && self.directory.iter().any(|entry| entry.id == id) {
            return Err(Error::DuplicateResource(id));
        }
        if self.directory.len() >= usize::from(u16::MAX) {
            return Err(Error::CapacityExceeded("resources"));
        }
        Ok(())
    }

    /// Emits the currently open resource, padded to the next boundary
    #[instrument(skip(self), err)]
    fn finish_resource(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        self.reserve_header()?;

        let (entry, data) = pending.encode(self.options.compression_level)?;
        let end = self.position + data.len() as u64;
        let padded = align(end);

        self.inner.write_all(&data).map_err(Error::WriteFailure)?;
        self.inner
            .write_all(&[0u8; 4][..(padded - end) as usize])
            .map_err(Error::WriteFailure)?;

        debug!(id = %entry.id, offset = self.position, size = entry.packed_length, "wrote resource");
        self.position = padded;
        self.directory.push(entry);

        Ok(())
    }

    /// Writes a placeholder header at the current position of the target on first use
    fn reserve_header(&mut self) -> Result<()> {
        if self.origin.is_some() {
            return Ok(());
        }

        let origin = self.inner.stream_position().map_err(Error::WriteFailure)?;
        ResHeader::default()
            .write(&mut self.inner)
            .map_err(write_failure)?;
        self.origin = Some(origin);

        Ok(())
    }

    /// Complete the last resource and write the directory
    ///
    /// This will return the writer, positioned after the directory.
    #[instrument(skip(self), err)]
    pub fn finish(mut self) -> Result<W> {
        self.finish_resource()?;
        self.reserve_header()?;

        let origin = self.origin.unwrap_or_default();
        let directory_offset =
            u32::try_from(self.position).map_err(|_| Error::CapacityExceeded("bytes"))?;

        DirectoryHeader {
            resource_count: self.directory.len() as u16,
            first_resource_offset: HEADER_SIZE,
        }
        .write(&mut self.inner)
        .map_err(write_failure)?;
        for entry in &self.directory {
            entry.write(&mut self.inner).map_err(write_failure)?;
        }

        let end = self.inner.stream_position().map_err(Error::WriteFailure)?;
        self.inner
            .seek(SeekFrom::Start(origin + DIRECTORY_OFFSET_POSITION))
            .map_err(Error::WriteFailure)?;
        self.inner
            .write_u32::<LittleEndian>(directory_offset)
            .map_err(Error::WriteFailure)?;
        self.inner
            .seek(SeekFrom::Start(end))
            .map_err(Error::WriteFailure)?;
        self.inner.flush().map_err(Error::WriteFailure)?;

        debug!(
            resources = self.directory.len(),
            directory_offset, "finished resource file"
        );

        Ok(self.inner)
    }
}

fn write_failure(err: binrw::Error) -> Error {
    match err {
        binrw::Error::Io(err) => Error::WriteFailure(err),
        err => Error::from(err),
    }
}

/// Serializes all resources of the provider into the target, in the order of its identifiers.
///
/// Returns the target positioned after the written resource file.
pub fn write<W: Write + Seek, P: Provider + ?Sized>(target: W, source: &mut P) -> Result<W> {
    write_with_options(target, source, WriterOptions::default())
}

/// Like [`write`], with explicit [`WriterOptions`]
#[instrument(skip(target, source), err)]
pub fn write_with_options<W: Write + Seek, P: Provider + ?Sized>(
    target: W,
    source: &mut P,
    options: WriterOptions,
) -> Result<W> {
    let mut writer = ResourceWriter::new(target, options);

    for id in source.ids() {
        let resource = source.resource(id)?;

        if resource.compound {
            let mut builder =
                writer.create_compound_resource(id, resource.content_type, resource.compressed)?;
            for index in 0..resource.block_count() {
                io::copy(&mut resource.block(index)?, &mut builder.create_block())?;
            }
        } else if resource.block_count() == 1 {
            let mut block =
                writer.create_resource(id, resource.content_type, resource.compressed)?;
            io::copy(&mut resource.block(0)?, &mut block)?;
        } else {
            return Err(Error::InvalidResourceShape {
                id,
                blocks: resource.block_count(),
            });
        }
    }

    writer.finish()
}
