//! Types for reading resource files
//!

use binrw::BinRead;
use std::{
    cell::{OnceCell, RefCell},
    collections::HashMap,
    fmt::{self, Debug},
    io::{self, Read, Seek, SeekFrom},
    rc::Rc,
};
use tracing::{debug, instrument, trace};

use crate::{
    compression::DataReader,
    error::{Error, Result},
    resource::{BlockProvider, BlockReader, Provider, Resource, ResourceId},
    types::{align, BlockSpan, BlockTable, DirectoryEntry, DirectoryHeader, ResHeader},
};

/// A window into the shared source of a resource file.
///
/// Every read seeks the source first, so any number of windows can be read interleaved.
pub(crate) struct SectionReader<R> {
    source: Rc<RefCell<R>>,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R> SectionReader<R> {
    fn new(source: Rc<RefCell<R>>, start: u64, len: u64) -> Self {
        Self {
            source,
            start,
            len,
            pos: 0,
        }
    }

    /// A new window of the same region, positioned at its start
    fn reopen(&self) -> Self {
        Self::new(self.source.clone(), self.start, self.len)
    }

    /// A new window covering a region relative to this one
    fn section(&self, offset: u64, len: u64) -> Self {
        Self::new(self.source.clone(), self.start + offset, len)
    }
}

impl<R: Read + Seek> Read for SectionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));

        let mut source = self.source.borrow_mut();
        source.seek(SeekFrom::Start(self.start + self.pos))?;
        let read = source.read(&mut buf[..limit])?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl<R> Seek for SectionReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        self.pos = target.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;
        Ok(self.pos)
    }
}

/// Single block of a simple resource
struct SimpleBlock<R> {
    data: SectionReader<R>,
    compressed: bool,
    unpacked_length: u64,
}

impl<R: Read + Seek> BlockProvider for SimpleBlock<R> {
    fn block_count(&self) -> usize {
        1
    }

    fn block(&self, index: usize) -> Result<BlockReader<'_>> {
        if index != 0 {
            return Err(Error::BlockIndexOutOfRange { index, count: 1 });
        }
        let limit = if self.compressed {
            self.unpacked_length
        } else {
            self.data.len
        };
        Ok(Box::new(
            DataReader::new(self.data.reopen(), self.compressed).take(limit),
        ))
    }
}

/// Blocks of a compound resource
struct CompoundBlocks<R> {
    id: ResourceId,
    payload: SectionReader<R>,
    first_block_offset: u32,
    spans: Vec<BlockSpan>,
    compressed: bool,
    decompressed: OnceCell<Vec<u8>>,
}

impl<R: Read + Seek> CompoundBlocks<R> {
    /// Decompresses the complete payload on first use
    fn decompressed_payload(&self) -> Result<&[u8]> {
        if let Some(payload) = self.decompressed.get() {
            return Ok(payload.as_slice());
        }

        let mut payload = Vec::new();
        DataReader::new(self.payload.reopen(), true).read_to_end(&mut payload)?;
        debug!(id = %self.id, size = payload.len(), "decompressed compound resource");

        Ok(self.decompressed.get_or_init(|| payload).as_slice())
    }
}

impl<R: Read + Seek> BlockProvider for CompoundBlocks<R> {
    fn block_count(&self) -> usize {
        self.spans.len()
    }

    fn block(&self, index: usize) -> Result<BlockReader<'_>> {
        let span = self.spans.get(index).ok_or(Error::BlockIndexOutOfRange {
            index,
            count: self.spans.len(),
        })?;
        let start = (span.start - self.first_block_offset) as usize;
        let end = start + span.size as usize;

        if self.compressed {
            let block = self
                .decompressed_payload()?
                .get(start..end)
                .ok_or(Error::MalformedBlockTable { id: self.id })?;
            Ok(Box::new(block))
        } else {
            Ok(Box::new(
                self.payload.section(start as u64, u64::from(span.size)),
            ))
        }
    }
}

#[derive(Debug)]
struct Directory {
    origin: u64,
    first_resource_offset: u32,
    entries: Vec<DirectoryEntry>,
}

/// Resource file reader
///
/// Resources are decoded on first request and kept for the lifetime of the reader.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_res_contents(reader: impl Read + Seek + 'static) -> ss1_res::error::Result<()> {
///     let mut res = ss1_res::ResourceReader::new(reader)?;
///
///     for id in res.ids() {
///         let resource = res.resource(id)?;
///         println!("Resource {} with {} blocks", id, resource.block_count());
///         std::io::copy(&mut resource.block(0)?, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct ResourceReader<R> {
    source: Rc<RefCell<R>>,
    directory: Directory,
    cache: HashMap<ResourceId, Rc<Resource>>,
}

impl<R> Debug for ResourceReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResourceReader({:#?})", self.directory)
    }
}

impl<R: Read + Seek + 'static> ResourceReader<R> {
    /// Read the header and directory of a resource file.
    ///
    /// The file is expected at the current position of the source; all offsets are relative to it.
    /// Fails with [`Error::FormatMismatch`] if the source does not start with the resource file
    /// signature. Any failure to read the directory fails the construction as a whole.
    #[instrument(skip_all, err)]
    pub fn new(mut reader: R) -> Result<ResourceReader<R>> {
        let origin = reader.stream_position()?;
        let header = Self::read_header(&mut reader, origin)?;
        let directory = Self::read_directory(&mut reader, origin, header.directory_offset)?;

        debug!(
            resources = directory.entries.len(),
            first_resource_offset = directory.first_resource_offset,
            "read directory"
        );

        Ok(ResourceReader {
            source: Rc::new(RefCell::new(reader)),
            directory,
            cache: HashMap::new(),
        })
    }

    /// Number of entries in the directory
    pub fn len(&self) -> usize {
        self.directory.entries.len()
    }

    /// Whether the file contains no resources
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The resource identifiers in the order of the directory
    pub fn ids(&self) -> Vec<ResourceId> {
        self.directory.entries.iter().map(|entry| entry.id).collect()
    }

    /// Get the directory entry of a resource, if it's present
    pub fn entry(&self, id: ResourceId) -> Option<&DirectoryEntry> {
        self.find_entry(id).map(|(_, entry)| entry)
    }

    /// Returns the identified resource.
    ///
    /// The same instance is returned for repeated requests. Failures are not remembered.
    #[instrument(skip(self), err)]
    pub fn resource(&mut self, id: ResourceId) -> Result<Rc<Resource>> {
        if let Some(resource) = self.cache.get(&id) {
            return Ok(resource.clone());
        }

        let (start, entry) = self.find_entry(id).ok_or(Error::ResourceNotFound(id))?;
        trace!(start, ?entry, "resolved resource");

        let resource = Rc::new(if entry.flags.compound() {
            self.compound_resource(entry, start)?
        } else {
            self.simple_resource(entry, start)
        });
        self.cache.insert(id, resource.clone());

        Ok(resource)
    }

    /// Locates the first entry with the given identifier and the offset of its data.
    ///
    /// Offsets are not stored in the file. They follow from the padded sizes of all earlier entries.
    fn find_entry(&self, id: ResourceId) -> Option<(u64, &DirectoryEntry)> {
        let mut offset = self.directory.origin + u64::from(self.directory.first_resource_offset);
        for entry in &self.directory.entries {
            if entry.id == id {
                return Some((offset, entry));
            }
            offset = align(offset + u64::from(entry.packed_length));
        }
        None
    }

    fn simple_resource(&self, entry: &DirectoryEntry, start: u64) -> Resource {
        let compressed = entry.flags.compressed();
        Resource::new(
            false,
            entry.content_type,
            compressed,
            SimpleBlock {
                data: SectionReader::new(
                    self.source.clone(),
                    start,
                    u64::from(entry.packed_length),
                ),
                compressed,
                unpacked_length: u64::from(entry.unpacked_length),
            },
        )
    }

    fn compound_resource(&self, entry: &DirectoryEntry, start: u64) -> Result<Resource> {
        let compressed = entry.flags.compressed();
        let window = u64::from(entry.packed_length);
        let data = SectionReader::new(self.source.clone(), start, window);

        let table = BlockTable::read(&mut data.reopen())?;
        let spans = table
            .spans()
            .ok_or(Error::MalformedBlockTable { id: entry.id })?;

        let first_block_offset = u64::from(table.first_block_offset);
        let payload_end = spans
            .last()
            .map_or(first_block_offset, |span| u64::from(span.start + span.size));
        if first_block_offset > window || (!compressed && payload_end > window) {
            return Err(Error::MalformedBlockTable { id: entry.id });
        }

        Ok(Resource::new(
            true,
            entry.content_type,
            compressed,
            CompoundBlocks {
                id: entry.id,
                payload: data.section(first_block_offset, window - first_block_offset),
                first_block_offset: table.first_block_offset,
                spans,
                compressed,
                decompressed: OnceCell::new(),
            },
        ))
    }

    fn read_header(reader: &mut R, origin: u64) -> Result<ResHeader> {
        reader.seek(SeekFrom::Start(origin))?;
        ResHeader::read(reader).map_err(|err| match err {
            binrw::Error::BadMagic { .. } => Error::FormatMismatch,
            err => Error::from(err),
        })
    }

    fn read_directory(reader: &mut R, origin: u64, directory_offset: u32) -> Result<Directory> {
        reader.seek(SeekFrom::Start(origin + u64::from(directory_offset)))?;
        let header = DirectoryHeader::read(reader)?;

        let entries = (0..header.resource_count)
            .map(|_| DirectoryEntry::read(reader).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Directory {
            origin,
            first_resource_offset: header.first_resource_offset,
            entries,
        })
    }
}

impl<R: Read + Seek + 'static> Provider for ResourceReader<R> {
    fn ids(&self) -> Vec<ResourceId> {
        ResourceReader::ids(self)
    }

    fn resource(&mut self, id: ResourceId) -> Result<Rc<Resource>> {
        ResourceReader::resource(self, id)
    }
}
