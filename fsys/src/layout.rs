//! On-disk metadata layout
//!
//! The metadata region lives at the tail of the backing file, right after
//! the data area:
//!
//! ```text
//! magic    u32                  0x46535953, "FSYS"
//! version  u32                  currently 1
//! inodes   MAX_FILES x 15 B     name[11] | size u16 | first_block i16
//! free     MAX_BLOCKS x u8      1 = free, 0 = used
//! next     MAX_BLOCKS x i32     chain pointer, -1 = end of chain
//! ```
//!
//! All multi-byte fields are big-endian. An all-zero name field marks an
//! empty inode slot; shorter names are zero-padded.

use crate::alloc::BlockMap;
use crate::error::FsError;
use crate::inode::{Inode, InodeTable};
use crate::{
    FILENAME_BYTES, INODE_RECORD_BYTES, MAX_BLOCKS, MAX_FILES, META_MAGIC, META_VERSION,
    METADATA_SIZE,
};

/// Byte offset of the inode records inside the region
const INODES_OFF: usize = 8;
/// Byte offset of the free-block flags
const FREE_OFF: usize = INODES_OFF + MAX_FILES * INODE_RECORD_BYTES;
/// Byte offset of the chain next pointers
const NEXT_OFF: usize = FREE_OFF + MAX_BLOCKS;

/// Serialize the tables into one metadata region image
pub fn encode(inodes: &InodeTable, blocks: &BlockMap) -> [u8; METADATA_SIZE] {
    let mut buf = [0u8; METADATA_SIZE];
    buf[0..4].copy_from_slice(&META_MAGIC.to_be_bytes());
    buf[4..8].copy_from_slice(&META_VERSION.to_be_bytes());

    for slot in 0..MAX_FILES {
        let off = INODES_OFF + slot * INODE_RECORD_BYTES;
        if let Some(inode) = inodes.get(slot) {
            let name = inode.name.as_bytes();
            let len = name.len().min(FILENAME_BYTES);
            buf[off..off + len].copy_from_slice(&name[..len]);
            let size_off = off + FILENAME_BYTES;
            buf[size_off..size_off + 2].copy_from_slice(&inode.size.to_be_bytes());
            buf[size_off + 2..size_off + 4].copy_from_slice(&inode.first_block.to_be_bytes());
        }
    }

    for block in 0..MAX_BLOCKS {
        buf[FREE_OFF + block] = u8::from(blocks.is_free(block));
        let off = NEXT_OFF + block * 4;
        buf[off..off + 4].copy_from_slice(&blocks.next_of(block).to_be_bytes());
    }
    buf
}

/// Rebuild the tables from a metadata region image
///
/// Fails only on a magic or version mismatch; the caller treats that as
/// "no persisted state" and keeps empty tables. Chain pointers of free
/// blocks are normalized to -1 so the decoded map is canonical, and a name
/// that does not decode as UTF-8 is replaced lossily and kept within the
/// field width.
pub fn decode(buf: &[u8; METADATA_SIZE]) -> Result<(InodeTable, BlockMap), FsError> {
    let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let version = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    if magic != META_MAGIC || version != META_VERSION {
        return Err(FsError::CorruptMetadata);
    }

    let mut inodes = InodeTable::new();
    for slot in 0..MAX_FILES {
        let off = INODES_OFF + slot * INODE_RECORD_BYTES;
        let name_field = &buf[off..off + FILENAME_BYTES];
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_BYTES);
        if name_len == 0 {
            continue;
        }
        let mut name = String::from_utf8_lossy(&name_field[..name_len]).into_owned();
        // replacement characters are wider than the bytes they stand in for,
        // so a lossy decode can outgrow the fixed field
        if name.len() > FILENAME_BYTES {
            log::warn!("fsys: slot {} name is not valid UTF-8", slot);
            let mut cut = FILENAME_BYTES;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        let size_off = off + FILENAME_BYTES;
        let size = u16::from_be_bytes([buf[size_off], buf[size_off + 1]]);
        let first_block = i16::from_be_bytes([buf[size_off + 2], buf[size_off + 3]]);
        inodes.restore(
            slot,
            Inode {
                name,
                size,
                first_block,
            },
        );
    }

    let mut free = [false; MAX_BLOCKS];
    let mut next = [-1i32; MAX_BLOCKS];
    for block in 0..MAX_BLOCKS {
        free[block] = buf[FREE_OFF + block] != 0;
        let off = NEXT_OFF + block * 4;
        next[block] = i32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);
        if free[block] {
            next[block] = -1;
        }
    }

    Ok((inodes, BlockMap::from_parts(free, next)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tables_encode_to_known_bytes() {
        let buf = encode(&InodeTable::new(), &BlockMap::new());
        assert_eq!(&buf[0..4], &[0x46, 0x53, 0x59, 0x53]);
        assert_eq!(&buf[4..8], &[0, 0, 0, 1]);
        assert!(buf[INODES_OFF..FREE_OFF].iter().all(|&b| b == 0));
        assert!(buf[FREE_OFF..NEXT_OFF].iter().all(|&b| b == 1));
        for block in 0..MAX_BLOCKS {
            let off = NEXT_OFF + block * 4;
            assert_eq!(&buf[off..off + 4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn populated_tables_survive_a_round_trip() {
        let mut inodes = InodeTable::new();
        let mut blocks = BlockMap::new();
        let chain = blocks.allocate(3).unwrap();
        blocks.link(&chain);
        inodes.insert("notes", 300, chain[0] as i16).unwrap();
        let single = blocks.allocate_one().unwrap();
        inodes.insert("empty", 0, single as i16).unwrap();

        let (decoded_inodes, decoded_blocks) = decode(&encode(&inodes, &blocks)).unwrap();
        assert_eq!(decoded_inodes, inodes);
        assert_eq!(decoded_blocks, blocks);
    }

    #[test]
    fn record_fields_are_big_endian() {
        let mut inodes = InodeTable::new();
        let mut blocks = BlockMap::new();
        let block = blocks.allocate_one().unwrap();
        inodes.insert("f", 0x0102, block as i16).unwrap();

        let buf = encode(&inodes, &blocks);
        let size_off = INODES_OFF + FILENAME_BYTES;
        assert_eq!(buf[INODES_OFF], b'f');
        assert_eq!(&buf[size_off..size_off + 2], &[0x01, 0x02]);
        assert_eq!(&buf[size_off + 2..size_off + 4], &[0x00, 0x00]);
    }

    #[test]
    fn bad_magic_or_version_is_rejected() {
        let good = encode(&InodeTable::new(), &BlockMap::new());

        let mut bad_magic = good;
        bad_magic[0] = 0;
        assert!(matches!(decode(&bad_magic), Err(FsError::CorruptMetadata)));

        let mut bad_version = good;
        bad_version[7] = 9;
        assert!(matches!(
            decode(&bad_version),
            Err(FsError::CorruptMetadata)
        ));
    }

    #[test]
    fn lossy_name_decode_stays_within_its_field() {
        let mut buf = encode(&InodeTable::new(), &BlockMap::new());
        buf[INODES_OFF..INODES_OFF + FILENAME_BYTES].copy_from_slice(&[0xFF; FILENAME_BYTES]);
        buf[FREE_OFF] = 0;

        let (inodes, blocks) = decode(&buf).unwrap();
        let listing = inodes.list();
        assert_eq!(listing.len(), 1);
        assert!(listing[0].name.len() <= FILENAME_BYTES);

        // re-encoding the normalized table must not spill into slot 1
        let again = encode(&inodes, &blocks);
        let second = INODES_OFF + INODE_RECORD_BYTES;
        assert!(again[second..FREE_OFF].iter().all(|&b| b == 0));
        let (reloaded, _) = decode(&again).unwrap();
        assert_eq!(reloaded.list(), listing);
    }

    #[test]
    fn encode_clamps_names_to_the_field_width() {
        let mut inodes = InodeTable::new();
        inodes.restore(
            0,
            Inode {
                name: "0123456789abcdef".into(),
                size: 0,
                first_block: -1,
            },
        );
        let buf = encode(&inodes, &BlockMap::new());
        let second = INODES_OFF + INODE_RECORD_BYTES;
        assert_eq!(&buf[INODES_OFF..INODES_OFF + FILENAME_BYTES], b"0123456789a");
        assert!(buf[second..FREE_OFF].iter().all(|&b| b == 0));
    }

    #[test]
    fn free_block_pointers_are_normalized() {
        let mut buf = encode(&InodeTable::new(), &BlockMap::new());
        let off = NEXT_OFF + 2 * 4;
        buf[off..off + 4].copy_from_slice(&7i32.to_be_bytes());
        let (_, blocks) = decode(&buf).unwrap();
        assert_eq!(blocks.next_of(2), -1);
    }
}
