use crate::block::{Block, BlockData, BlockKind};
use crate::client::PlaceholderClient;
use crate::error::{Result, SheetError};
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Reserved local key holding the ordered `{type, id}` membership list.
const MEMBERSHIP_KEY: &str = "blocks";

/// Reserved local key holding the edit-mode flag.
const EDIT_MODE_KEY: &str = "edit_mode";

/// Abstraction over where blocks live: the local key-value store or the
/// remote `/posts`-shaped resource. Both back the same CRUD capability set.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Enumerate every known block, dropping (and logging) records that
    /// fail to parse or carry an unrecognized kind.
    async fn list(&self) -> Result<Vec<Block>>;

    /// Persist a new block. Returns the backend-assigned identity when the
    /// backend assigns one; the local store addresses blocks by `id` itself.
    async fn create(&self, block: &Block) -> Result<Option<String>>;

    /// Whole-resource replacement of the block's payload.
    async fn update(&self, block: &Block) -> Result<()>;

    /// Partial replacement of the payload only, used by item add/remove.
    /// Converges to the same final data as `update`.
    async fn patch_data(&self, block: &Block) -> Result<()>;

    /// Remove the block's backing record. A block that was never durable
    /// remotely has nothing to delete there.
    async fn delete(&self, block: &Block) -> Result<()>;

    /// Persist the display order. Backends without an order concept
    /// (the remote resource) ignore this.
    async fn sync_membership(&self, _blocks: &[Block]) -> Result<()> {
        Ok(())
    }
}

/// Map one raw remote row into a block. Returns `None` (after logging) for
/// rows with an unrecognized kind or a body that is not valid payload JSON;
/// such rows are dropped from the listing, never surfaced as errors.
pub fn row_to_block(row: &Value) -> Option<Block> {
    let title = row.get("title").and_then(Value::as_str)?;
    let Some(kind) = BlockKind::parse(title) else {
        warn!("dropping remote row with unrecognized kind '{}'", title);
        return None;
    };
    let server_id = match row.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => {
            warn!("dropping remote {} row without an id", title);
            return None;
        }
    };
    let body = row.get("body").and_then(Value::as_str).unwrap_or_default();
    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("dropping remote row {}: body is not JSON: {}", server_id, e);
            return None;
        }
    };
    let data = match BlockData::from_json(kind, payload) {
        Ok(d) => d,
        Err(e) => {
            warn!("dropping remote row {}: bad {} payload: {}", server_id, kind, e);
            return None;
        }
    };
    let mut block = Block::new(kind, format!("{}-block-{}", kind, server_id), data);
    block.server_id = Some(server_id);
    Some(block)
}

/// Remote adapter over the placeholder REST API.
pub struct RemoteStore {
    client: PlaceholderClient,
}

impl RemoteStore {
    pub fn new(client: PlaceholderClient) -> Self {
        Self { client }
    }

    fn require_server_id<'a>(&self, block: &'a Block) -> Result<&'a str> {
        block.server_id.as_deref().ok_or_else(|| {
            SheetError::Validation(format!(
                "cannot address block {} remotely: no server id assigned",
                block.id
            ))
        })
    }
}

#[async_trait]
impl PersistenceAdapter for RemoteStore {
    async fn list(&self) -> Result<Vec<Block>> {
        let rows = self.client.list_posts().await?;
        Ok(rows.iter().filter_map(row_to_block).collect())
    }

    async fn create(&self, block: &Block) -> Result<Option<String>> {
        let server_id = self
            .client
            .create_post(block.kind.as_str(), &block.body_json())
            .await?;
        Ok(Some(server_id))
    }

    async fn update(&self, block: &Block) -> Result<()> {
        let server_id = self.require_server_id(block)?;
        self.client
            .put_post(server_id, block.kind.as_str(), &block.body_json())
            .await
    }

    async fn patch_data(&self, block: &Block) -> Result<()> {
        let server_id = self.require_server_id(block)?;
        self.client
            .patch_post_body(server_id, &block.body_json())
            .await
    }

    async fn delete(&self, block: &Block) -> Result<()> {
        match &block.server_id {
            Some(server_id) => self.client.delete_post(server_id).await,
            // never durable remotely, nothing to delete
            None => Ok(()),
        }
    }
}

/// One `{type, id}` entry of the local membership list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MembershipEntry {
    #[serde(rename = "type")]
    kind: BlockKind,
    id: String,
}

/// Local adapter: a directory of JSON files, one per block id, plus the two
/// reserved keys (`blocks` membership list, `edit_mode` flag).
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn read_membership(&self) -> Result<Vec<MembershipEntry>> {
        let path = self.key_path(MEMBERSHIP_KEY);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_membership(&self, entries: &[MembershipEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(self.key_path(MEMBERSHIP_KEY), json)?;
        Ok(())
    }

    fn write_block_data(&self, block: &Block) -> Result<()> {
        let json = serde_json::to_string_pretty(&block.data.to_value())?;
        fs::write(self.key_path(&block.id), json)?;
        Ok(())
    }

    /// Edit-mode flag, persisted under its reserved key. Missing or corrupt
    /// means "off".
    pub fn load_edit_mode(&self) -> bool {
        let path = self.key_path(EDIT_MODE_KEY);
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or(false)
    }

    pub fn save_edit_mode(&self, edit_mode: bool) -> Result<()> {
        let json = serde_json::to_string(&edit_mode)?;
        fs::write(self.key_path(EDIT_MODE_KEY), json)?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for LocalStore {
    async fn list(&self) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        for entry in self.read_membership()? {
            let path = self.key_path(&entry.id);
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) => {
                    warn!("dropping local block {}: unreadable: {}", entry.id, e);
                    continue;
                }
            };
            let payload: Value = match serde_json::from_str(&json) {
                Ok(v) => v,
                Err(e) => {
                    warn!("dropping local block {}: not JSON: {}", entry.id, e);
                    continue;
                }
            };
            match BlockData::from_json(entry.kind, payload) {
                Ok(data) => blocks.push(Block::new(entry.kind, entry.id, data)),
                Err(e) => warn!("dropping local block {}: bad payload: {}", entry.id, e),
            }
        }
        Ok(blocks)
    }

    async fn create(&self, block: &Block) -> Result<Option<String>> {
        self.write_block_data(block)?;
        let mut entries = self.read_membership()?;
        if !entries.iter().any(|e| e.id == block.id) {
            entries.push(MembershipEntry {
                kind: block.kind,
                id: block.id.clone(),
            });
            self.write_membership(&entries)?;
        }
        // local identity is the block id itself
        Ok(None)
    }

    async fn update(&self, block: &Block) -> Result<()> {
        self.write_block_data(block)
    }

    async fn patch_data(&self, block: &Block) -> Result<()> {
        // the local store has no partial-write concept; full replacement
        // converges to the same final data
        self.write_block_data(block)
    }

    async fn delete(&self, block: &Block) -> Result<()> {
        let path = self.key_path(&block.id);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }
        let mut entries = self.read_membership()?;
        entries.retain(|e| e.id != block.id);
        self.write_membership(&entries)
    }

    async fn sync_membership(&self, blocks: &[Block]) -> Result<()> {
        let entries: Vec<MembershipEntry> = blocks
            .iter()
            .map(|b| MembershipEntry {
                kind: b.kind,
                id: b.id.clone(),
            })
            .collect();
        self.write_membership(&entries)
    }
}
