//! This library handles reading from, creating and layering **LG resource** files used by *System Shock*.
//!
//! # Resource File Format Documentation
//!
//! Resource files store numbered content units ("resources") within a single file. Every resource is
//! identified by a 16 bit [`ResourceId`], carries an opaque [`ContentType`] tag and consists of one or
//! more blocks of data. Resource files are typically identified with the `.res` extension.
//!
//! ## File Structure
//!
//! A resource file consists of a header, followed by the resource data, and the directory at the end.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Signature              | 16 bytes: "LG Res File v2\r\n"                             |
//! | 0x0010         | Comment terminator     | 1 byte: 0x1A                                               |
//! | 0x0011         | Comment                | 107 bytes: free text, written as zeroes                    |
//! | 0x007C         | Directory Offset       | 4 bytes: Offset to the directory                           |
//! | 0x0080         | Resource data          | Resources in directory order                               |
//!
//! ### Resource Data
//!
//! Resources are stored one after the other in the order of the directory, starting at the
//! **First Resource Offset** of the directory. Every resource is padded with zeroes so that the next one
//! starts on a 4 byte boundary. The offset of a resource is not stored anywhere; it is the sum of the
//! padded sizes of all resources before it.
//!
//! ### Directory
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Resource Count         | 2 bytes: Number of directory entries                    |
//! | 0x0002         | First Resource Offset  | 4 bytes: Offset to the data of the first resource       |
//! | 0x0006         | Entries                | 10 bytes per resource                                   |
//!
//! Each entry has the following structure:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | ID                     | 2 bytes: Identifier of the resource                     |
//! | 0x0002         | Unpacked Length        | 3 bytes: Size of the data when uncompressed             |
//! | 0x0005         | Type Flags             | 1 byte: 0x01 compressed, 0x02 compound                  |
//! | 0x0006         | Packed Length          | 3 bytes: Size of the data in the file                   |
//! | 0x0009         | Content Type           | 1 byte: How the data shall be interpreted               |
//!
//! ### Compound Resources
//!
//! Simple resources hold exactly one block. Compound resources hold any number of blocks and start with
//! a block table:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Block Count            | 2 bytes: Number of blocks                               |
//! | 0x0002         | First Block Offset     | 4 bytes: Offset of the first block within the resource  |
//! | 0x0006         | Block Ends             | 4 bytes per block: Offset just past the block           |
//!
//! If a compound resource is compressed, only the data after the block table is compressed, as one
//! stream. The block offsets always refer to the uncompressed data.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.res`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression**: zlib stream, either per simple resource or per compound payload
//!
//! ## Layering
//!
//! Several resource files can be stacked with [`overlay::LayeredProvider`]. A block of a higher layer
//! replaces the block of lower layers unless its first byte is zero.
//!

pub mod compression;
pub mod error;
pub mod overlay;
pub mod read;
pub mod resource;
pub mod types;
pub mod write;

pub use overlay::{LayeredProvider, ResourceOverlay};
pub use read::ResourceReader;
pub use resource::{BlockProvider, ContentType, Provider, Resource, ResourceId, ResourceList};
pub use write::ResourceWriter;
