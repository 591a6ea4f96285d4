//! Single-file block file system
//!
//! A fixed-capacity file system stored inside one backing file:
//! - 10 data blocks of 128 bytes, handed out from a free-block bitmap
//! - file contents laid out as singly-linked block chains terminated by -1
//! - a 5-slot inode table keyed by filename
//! - a magic-guarded metadata region persisted after every mutation
//!
//! [`FsManager`] is the entry point: open a backing file, then create,
//! write, read, delete and list files through it.

pub mod alloc;
pub mod disk;
pub mod error;
pub mod inode;
pub mod layout;
pub mod manager;

pub use error::FsError;
pub use inode::FileInfo;
pub use manager::FsManager;

/// Size of one data block in bytes
pub const BLOCK_SIZE: usize = 128;

/// Number of data blocks in the data area
pub const MAX_BLOCKS: usize = 10;

/// Number of inode slots
pub const MAX_FILES: usize = 5;

/// Fixed width of the on-disk filename field; longer names are rejected
pub const FILENAME_BYTES: usize = 11;

/// Metadata region magic, "FSYS" as big-endian ASCII
pub const META_MAGIC: u32 = 0x4653_5953;

/// Metadata layout version
pub const META_VERSION: u32 = 1;

/// One serialized inode record: filename, file size, first block
pub const INODE_RECORD_BYTES: usize = FILENAME_BYTES + 2 + 2;

/// Data area size in bytes; the metadata region starts at this offset
pub const DATA_AREA_SIZE: u64 = (MAX_BLOCKS * BLOCK_SIZE) as u64;

/// Serialized metadata region size in bytes
pub const METADATA_SIZE: usize =
    4 + 4 + MAX_FILES * INODE_RECORD_BYTES + MAX_BLOCKS + MAX_BLOCKS * 4;

/// Minimum backing file length: data area plus metadata region
pub const DISK_LEN: u64 = DATA_AREA_SIZE + METADATA_SIZE as u64;
