//! File system manager
//!
//! Owns the backing store and the in-memory tables, and serializes every
//! operation behind one `&mut self` entry point. Features:
//! - fixed-capacity inode table and free-block bitmap held in memory
//! - mutations staged on scratch copies of the tables and swapped in only
//!   after the backing store accepted every write
//! - metadata persisted with a durable sync before a mutation reports
//!   success
//! - persisted state reloaded on open, falling back to empty tables when
//!   the metadata region is absent or fails its magic check

use std::path::Path;

use crate::alloc::BlockMap;
use crate::disk::{BackingStore, DiskFile};
use crate::error::FsError;
use crate::inode::{FileInfo, InodeTable};
use crate::{layout, BLOCK_SIZE, DATA_AREA_SIZE, DISK_LEN, METADATA_SIZE};

pub struct FsManager {
    store: Box<dyn BackingStore>,
    inodes: InodeTable,
    blocks: BlockMap,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════════════

impl FsManager {
    /// Open the file system stored in the file at `path`
    ///
    /// Creates the file (and missing parent directories) if needed and
    /// extends it to the minimum length. Persisted metadata is loaded when
    /// present and valid; otherwise the file system starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FsError> {
        let disk = DiskFile::open(path, DISK_LEN)?;
        Ok(Self::with_store(Box::new(disk)))
    }

    /// Open the file system on an already-constructed backing store
    pub fn with_store(mut store: Box<dyn BackingStore>) -> Self {
        let mut buf = [0u8; METADATA_SIZE];
        let (inodes, blocks) = match store.read_at(DATA_AREA_SIZE, &mut buf) {
            Ok(()) => match layout::decode(&buf) {
                Ok((inodes, blocks)) => {
                    log::info!(
                        "fsys: loaded metadata: {} file(s), {} free block(s)",
                        inodes.len(),
                        blocks.free_count()
                    );
                    (inodes, blocks)
                }
                Err(err) => {
                    let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
                    if magic == 0 {
                        log::debug!("fsys: blank metadata region, starting empty");
                    } else {
                        log::warn!("fsys: {} Ignoring persisted state.", err);
                    }
                    (InodeTable::new(), BlockMap::new())
                }
            },
            Err(err) => {
                log::warn!("fsys: metadata read failed ({}), starting empty", err);
                (InodeTable::new(), BlockMap::new())
            }
        };
        Self {
            store,
            inodes,
            blocks,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════════════════════════

impl FsManager {
    /// Create an empty file with one reserved data block
    pub fn create_file(&mut self, name: &str) -> Result<(), FsError> {
        if name.is_empty() {
            return Err(FsError::EmptyName);
        }

        let mut inodes = self.inodes.clone();
        let mut blocks = self.blocks.clone();
        let slot = inodes.insert(name, 0, -1)?;
        let first = blocks.allocate_one().ok_or(FsError::NoFreeBlock)?;
        blocks.link(&[first]);
        inodes.set_extent(slot, 0, first as i16);

        self.commit(inodes, blocks)?;
        log::debug!("fsys: created '{}' at block {}", name, first);
        Ok(())
    }

    /// Replace a file's content
    ///
    /// Blocks of the existing chain are reused first, in chain order; any
    /// extra blocks come from the free pool, lowest index first. The final
    /// block is zero-padded on disk. On any backing-store failure the
    /// staged tables are discarded and the live state is left untouched.
    pub fn write_file(&mut self, name: &str, content: &[u8]) -> Result<(), FsError> {
        if name.is_empty() {
            return Err(FsError::EmptyName);
        }
        if content.is_empty() {
            return Err(FsError::EmptyContent);
        }

        let slot = self.inodes.find(name).ok_or(FsError::NotFound)?;
        let first = self
            .inodes
            .get(slot)
            .map(|inode| inode.first_block)
            .unwrap_or(-1);
        let current = self.blocks.chain_from(first);
        let required = (content.len() + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let available = self.blocks.free_count() + current.len();
        if required > available {
            return Err(FsError::NoSpace {
                needed: required,
                available,
            });
        }

        let mut inodes = self.inodes.clone();
        let mut blocks = self.blocks.clone();
        let reuse = current.len().min(required);
        let mut targets = current[..reuse].to_vec();
        blocks.release(&current[reuse..]);
        targets.extend(blocks.allocate(required - reuse)?);
        blocks.link(&targets);
        let new_first = targets.first().map_or(-1, |&block| block as i16);
        inodes.set_extent(slot, content.len() as u16, new_first);

        for (&block, chunk) in targets.iter().zip(content.chunks(BLOCK_SIZE)) {
            let mut data = [0u8; BLOCK_SIZE];
            data[..chunk.len()].copy_from_slice(chunk);
            self.store.write_at((block * BLOCK_SIZE) as u64, &data)?;
        }

        self.commit(inodes, blocks)?;
        log::debug!(
            "fsys: wrote {} byte(s) to '{}' across {} block(s)",
            content.len(),
            name,
            targets.len()
        );
        Ok(())
    }

    /// Read a file's full content
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>, FsError> {
        let (size, first) = {
            let inode = self.inodes.lookup(name).ok_or(FsError::NotFound)?;
            (usize::from(inode.size), inode.first_block)
        };
        let chain = self.blocks.chain_from(first);

        let mut data = Vec::with_capacity(chain.len() * BLOCK_SIZE);
        for &block in &chain {
            if data.len() >= size {
                break;
            }
            let mut buf = [0u8; BLOCK_SIZE];
            self.store.read_at((block * BLOCK_SIZE) as u64, &mut buf)?;
            data.extend_from_slice(&buf);
        }
        data.truncate(size);
        Ok(data)
    }

    /// Delete a file and free every block of its chain
    pub fn delete_file(&mut self, name: &str) -> Result<(), FsError> {
        let first = self
            .inodes
            .lookup(name)
            .map(|inode| inode.first_block)
            .ok_or(FsError::NotFound)?;

        let mut inodes = self.inodes.clone();
        let mut blocks = self.blocks.clone();
        let chain = blocks.chain_from(first);
        blocks.release(&chain);
        inodes.remove(name);

        self.commit(inodes, blocks)?;
        log::debug!("fsys: deleted '{}', released {} block(s)", name, chain.len());
        Ok(())
    }

    /// Snapshot of all live files in table order
    pub fn list_files(&self) -> Vec<FileInfo> {
        self.inodes.list()
    }

    /// Persist the staged tables, then make them live
    ///
    /// The live tables are untouched unless the metadata write and the
    /// durable sync both succeed.
    fn commit(&mut self, inodes: InodeTable, blocks: BlockMap) -> Result<(), FsError> {
        let buf = layout::encode(&inodes, &blocks);
        self.store.write_at(DATA_AREA_SIZE, &buf)?;
        self.store.sync()?;
        self.inodes = inodes;
        self.blocks = blocks;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
