//! Free-block bitmap and chain table
//!
//! One flag and one next pointer per data block. A used block belongs to
//! exactly one file's chain; its next pointer either names the following
//! block or carries -1 as the chain terminator. Free blocks keep -1 so the
//! serialized form stays canonical.

use crate::error::FsError;
use crate::MAX_BLOCKS;

/// Block allocation state for the whole data area
///
/// Cloning is cheap (two small fixed arrays), which is how mutating
/// operations stage their changes before committing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMap {
    free: [bool; MAX_BLOCKS],
    next: [i32; MAX_BLOCKS],
}

impl Default for BlockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockMap {
    /// All blocks free, no chains
    pub fn new() -> Self {
        Self {
            free: [true; MAX_BLOCKS],
            next: [-1; MAX_BLOCKS],
        }
    }

    pub(crate) fn from_parts(free: [bool; MAX_BLOCKS], next: [i32; MAX_BLOCKS]) -> Self {
        Self { free, next }
    }

    /// Number of free blocks
    pub fn free_count(&self) -> usize {
        self.free.iter().filter(|&&f| f).count()
    }

    pub(crate) fn is_free(&self, block: usize) -> bool {
        self.free[block]
    }

    pub(crate) fn next_of(&self, block: usize) -> i32 {
        self.next[block]
    }

    /// Mark the lowest free block used and return its index
    pub fn allocate_one(&mut self) -> Option<usize> {
        let block = self.free.iter().position(|&f| f)?;
        self.free[block] = false;
        self.next[block] = -1;
        Some(block)
    }

    /// Mark `count` free blocks used, lowest indices first
    ///
    /// Fails without touching the map when fewer than `count` blocks are
    /// free; a partial allocation is never left behind.
    pub fn allocate(&mut self, count: usize) -> Result<Vec<usize>, FsError> {
        let free: Vec<usize> = (0..MAX_BLOCKS).filter(|&b| self.free[b]).collect();
        if count > free.len() {
            return Err(FsError::NoSpace {
                needed: count,
                available: free.len(),
            });
        }
        let taken = free[..count].to_vec();
        for &block in &taken {
            self.free[block] = false;
            self.next[block] = -1;
        }
        Ok(taken)
    }

    /// Return blocks to the free pool and drop their chain entries
    pub fn release(&mut self, blocks: &[usize]) {
        for &block in blocks {
            if block >= MAX_BLOCKS {
                log::warn!("fsys: release of out-of-range block {}", block);
                continue;
            }
            self.free[block] = true;
            self.next[block] = -1;
        }
    }

    /// Chain `blocks` together in order, terminating the last with -1
    ///
    /// Refuses the whole list when any index is out of range, leaving no
    /// half-linked chain behind.
    pub fn link(&mut self, blocks: &[usize]) {
        if let Some(&bad) = blocks.iter().find(|&&b| b >= MAX_BLOCKS) {
            log::warn!("fsys: link of out-of-range block {}", bad);
            return;
        }
        for pair in blocks.windows(2) {
            self.next[pair[0]] = pair[1] as i32;
        }
        if let Some(&last) = blocks.last() {
            self.next[last] = -1;
        }
    }

    /// Walk the chain starting at `first`
    ///
    /// The walk ends at the -1 terminator and refuses to follow
    /// out-of-range pointers, pointers into free blocks, or more than
    /// MAX_BLOCKS hops, so a damaged chain cannot loop forever.
    pub fn chain_from(&self, first: i16) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cur = i32::from(first);
        while cur >= 0 && chain.len() < MAX_BLOCKS {
            let block = cur as usize;
            if block >= MAX_BLOCKS {
                log::warn!("fsys: chain pointer {} out of range", block);
                break;
            }
            if self.free[block] {
                log::warn!("fsys: chain runs into free block {}", block);
                break;
            }
            chain.push(block);
            cur = self.next[block];
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free_first() {
        let mut map = BlockMap::new();
        assert_eq!(map.allocate_one(), Some(0));
        assert_eq!(map.allocate_one(), Some(1));
        map.release(&[0]);
        assert_eq!(map.allocate_one(), Some(0));
    }

    #[test]
    fn allocate_is_all_or_nothing() {
        let mut map = BlockMap::new();
        let taken = map.allocate(8).unwrap();
        assert_eq!(taken, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        let err = map.allocate(3).unwrap_err();
        assert!(matches!(
            err,
            FsError::NoSpace {
                needed: 3,
                available: 2
            }
        ));
        assert_eq!(map.free_count(), 2);
    }

    #[test]
    fn link_then_walk() {
        let mut map = BlockMap::new();
        let chain = map.allocate(3).unwrap();
        map.link(&chain);
        assert_eq!(map.chain_from(0), vec![0, 1, 2]);
        assert_eq!(map.next_of(2), -1);
    }

    #[test]
    fn walk_of_empty_chain() {
        let map = BlockMap::new();
        assert!(map.chain_from(-1).is_empty());
    }

    #[test]
    fn walk_stops_at_free_block() {
        let mut map = BlockMap::new();
        let chain = map.allocate(3).unwrap();
        map.link(&chain);
        map.release(&[1]);
        assert_eq!(map.chain_from(0), vec![0]);
    }

    #[test]
    fn walk_of_looped_chain_is_bounded() {
        let mut map = BlockMap::new();
        let chain = map.allocate(2).unwrap();
        map.link(&chain);
        map.next[1] = 0;
        assert_eq!(map.chain_from(0).len(), MAX_BLOCKS);
    }

    #[test]
    fn link_refuses_out_of_range_blocks() {
        let mut map = BlockMap::new();
        let chain = map.allocate(2).unwrap();
        map.link(&chain);
        map.link(&[1, MAX_BLOCKS]);
        assert_eq!(map.next_of(1), -1);
        assert_eq!(map.chain_from(0), vec![0, 1]);
    }

    #[test]
    fn release_clears_chain_entry() {
        let mut map = BlockMap::new();
        let chain = map.allocate(2).unwrap();
        map.link(&chain);
        map.release(&chain);
        assert_eq!(map.free_count(), MAX_BLOCKS);
        assert_eq!(map.next_of(0), -1);
    }
}
