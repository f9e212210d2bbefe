//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::resource::ResourceId;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file does not start with the resource file signature
    #[error("format mismatch")]
    #[diagnostic(help("resource files start with \"LG Res File v2\" followed by 0x1A"))]
    FormatMismatch,

    /// the block table of a compound resource is inconsistent
    #[error("malformed block table in resource {id}")]
    MalformedBlockTable {
        /// Resource the table belongs to
        id: ResourceId,
    },

    /// unable to find requested resource
    #[error("resource {0} does not exist")]
    ResourceNotFound(ResourceId),

    /// block index outside of the resource
    #[error("block index wrong: {index}/{count}")]
    BlockIndexOutOfRange {
        /// Requested block
        index: usize,
        /// Number of blocks in the resource
        count: usize,
    },

    /// writing to the target failed
    #[error("failed to write resource data")]
    WriteFailure(#[source] std::io::Error),

    /// a simple resource must carry exactly one block
    #[error("simple resource {id} has wrong number of blocks: {blocks}")]
    InvalidResourceShape {
        /// Offending resource
        id: ResourceId,
        /// Number of blocks it reported
        blocks: usize,
    },

    /// the identifier was already written to this archive
    #[error("resource {0} was already written")]
    #[diagnostic(help("readers only ever see the first entry of an identifier"))]
    DuplicateResource(ResourceId),

    /// a length does not fit into the 24 bit directory fields
    #[error("resource {id} is too large: {size} bytes")]
    ResourceTooLarge {
        /// Offending resource
        id: ResourceId,
        /// Length that had to be stored
        size: u64,
    },

    /// more resources or blocks than the 16 bit counters can hold
    #[error("too many {0}")]
    CapacityExceeded(&'static str),

    /// an overlay needs at least one layer
    #[error("overlay without layers")]
    EmptyOverlay,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
