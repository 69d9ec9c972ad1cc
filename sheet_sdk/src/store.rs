use crate::block::{Block, BlockData, BlockKind};

/// Ordered collection of blocks for one session. Owns every block instance;
/// display order is vector order.
#[derive(Debug, Default, Clone)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Appends a block. Callers guarantee id uniqueness; generated ids are
    /// timestamp-derived and never reused after deletion.
    pub fn insert(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Removes the first block with the given id. Returns whether a removal
    /// occurred; absent ids are a no-op.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.blocks.iter().position(|b| b.id == id) {
            Some(pos) => {
                self.blocks.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// First block of the given kind, in display order.
    pub fn find_kind(&self, kind: BlockKind) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    pub fn find_kind_mut(&mut self, kind: BlockKind) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.kind == kind)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    pub fn count_kind(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }

    /// Whole-payload replacement used by field and item edits. Returns false
    /// when the id is unknown or the payload kind does not match the block.
    pub fn replace_data(&mut self, id: &str, data: BlockData) -> bool {
        match self.find_mut(id) {
            Some(block) if block.kind == data.kind() => {
                block.data = data;
                true
            }
            _ => false,
        }
    }

    /// Structural invariant pass: if both an avatar and an info block exist
    /// and info is not directly after avatar, move it there. Idempotent.
    /// Returns whether a move happened.
    pub fn reorder_info_after_avatar(&mut self) -> bool {
        let avatar_pos = self.blocks.iter().position(|b| b.kind == BlockKind::Avatar);
        let info_pos = self.blocks.iter().position(|b| b.kind == BlockKind::Info);
        let (Some(avatar_pos), Some(info_pos)) = (avatar_pos, info_pos) else {
            return false;
        };
        if info_pos == avatar_pos + 1 {
            return false;
        }
        let info = self.blocks.remove(info_pos);
        // Removing the info block shifts the avatar left when info came first
        let avatar_pos = if info_pos < avatar_pos {
            avatar_pos - 1
        } else {
            avatar_pos
        };
        self.blocks.insert(avatar_pos + 1, info);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
