use crate::avatar::{AvatarSource, Identity};
use crate::block::{AvatarData, Block, BlockData, BlockKind, InfoData, InventoryData};
use crate::error::{Result, SheetError};
use crate::persist::PersistenceAdapter;
use crate::store::BlockStore;
use chrono::Utc;
use log::{error, info, warn};
use serde_json::{Map, Value};

/// Startup reconciliation state. Mutating operations are only meaningful
/// once the session is `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Seeding,
    Reconciling,
    Ready,
}

/// One editing session over a character sheet.
///
/// Owns the block store, the persistence backend and the edit-mode flag.
/// All mutations are applied to the in-memory store first; remote
/// propagation is best-effort and never rolled back, so the store is the
/// authoritative state until the next full reload.
pub struct Session {
    store: BlockStore,
    adapter: Box<dyn PersistenceAdapter>,
    avatars: Box<dyn AvatarSource>,
    edit_mode: bool,
    state: SyncState,
}

impl Session {
    pub fn new(
        adapter: Box<dyn PersistenceAdapter>,
        avatars: Box<dyn AvatarSource>,
        edit_mode: bool,
    ) -> Self {
        Self {
            store: BlockStore::new(),
            adapter,
            avatars,
            edit_mode,
            state: SyncState::Idle,
        }
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        self.edit_mode = on;
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        self.edit_mode
    }

    /// Startup pass: enumerate existing blocks, seed defaults when there are
    /// none (or the listing is unreachable), otherwise reconcile what came
    /// back. Ends in `Ready` regardless of remote failures.
    pub async fn load(&mut self) -> Result<()> {
        self.state = SyncState::Loading;
        match self.adapter.list().await {
            Ok(blocks) if blocks.is_empty() => {
                info!("no stored blocks, seeding defaults");
                self.seed().await;
            }
            Ok(blocks) => {
                self.reconcile(blocks).await;
            }
            Err(e) => {
                warn!("listing blocks failed, treating as no stored state: {}", e);
                self.seed().await;
            }
        }
        self.state = SyncState::Ready;
        Ok(())
    }

    /// The canonical default sheet: avatar, info, stats, inventory.
    fn default_sheet(portrait: Option<String>) -> Vec<Block> {
        let mut stats = Map::new();
        stats.insert("Intelligence".to_string(), Value::from(8));
        stats.insert("Reflexes".to_string(), Value::from(9));
        stats.insert("Charisma".to_string(), Value::from(7));

        vec![
            Block::new(
                BlockKind::Avatar,
                "avatar-block",
                BlockData::Avatar(AvatarData { avatar: portrait }),
            ),
            Block::new(
                BlockKind::Info,
                "info-block",
                BlockData::Info(InfoData {
                    name: "Johnny Silverhand".to_string(),
                    role: "Rockerboy".to_string(),
                    age: "32".to_string(),
                }),
            ),
            Block::new(BlockKind::Stats, "stats-block", BlockData::Stats(stats)),
            Block::new(
                BlockKind::Inventory,
                "inventory-block",
                BlockData::Inventory(InventoryData {
                    items: vec![
                        "Pistol".to_string(),
                        "Leather jacket".to_string(),
                        "Guitar".to_string(),
                    ],
                }),
            ),
        ]
    }

    async fn seed(&mut self) {
        self.state = SyncState::Seeding;
        let portrait = match self.avatars.fetch_portrait().await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("portrait fetch failed, seeding without one: {}", e);
                None
            }
        };
        self.store = BlockStore::new();
        for mut block in Self::default_sheet(portrait) {
            self.persist_create(&mut block).await;
            self.store.insert(block);
        }
        self.sync_membership().await;
    }

    /// Invariant pass over a non-empty listing, in fixed order: ensure an
    /// info block exists, move it directly after the avatar, backfill an
    /// empty avatar portrait.
    async fn reconcile(&mut self, blocks: Vec<Block>) {
        self.state = SyncState::Reconciling;
        self.store = BlockStore::from_blocks(blocks);

        if self.store.find_kind(BlockKind::Info).is_none() {
            let id = if self.store.contains_id("info-block") {
                format!("info-block-{}", Utc::now().timestamp_millis())
            } else {
                "info-block".to_string()
            };
            info!("no info block in listing, synthesizing {}", id);
            let mut block = Block::new(
                BlockKind::Info,
                id,
                BlockData::Info(InfoData {
                    name: "Johnny Silverhand".to_string(),
                    role: "Rockerboy".to_string(),
                    age: "32".to_string(),
                }),
            );
            self.persist_create(&mut block).await;
            self.store.insert(block);
        }

        if self.store.reorder_info_after_avatar() {
            info!("moved info block directly after avatar");
        }

        let avatar_empty = self
            .store
            .find_kind(BlockKind::Avatar)
            .map(|b| match &b.data {
                BlockData::Avatar(d) => d.avatar.as_deref().unwrap_or("").is_empty(),
                _ => false,
            })
            .unwrap_or(false);
        if avatar_empty {
            match self.avatars.fetch_portrait().await {
                Ok(url) => {
                    if let Some(block) = self.store.find_kind_mut(BlockKind::Avatar) {
                        block.data = BlockData::Avatar(AvatarData { avatar: Some(url) });
                        let block = block.clone();
                        self.persist_update(&block).await;
                    }
                }
                Err(e) => warn!("avatar backfill failed: {}", e),
            }
        }

        self.sync_membership().await;
    }

    /// Add a block of the given kind with default data and a
    /// timestamp-derived id. No-op when edit mode is off; rejects
    /// unrecognized kinds. Returns the new block's id.
    pub async fn add_block(&mut self, kind: &str) -> Result<Option<String>> {
        if !self.edit_mode {
            return Ok(None);
        }
        let Some(kind) = BlockKind::parse(kind) else {
            return Err(SheetError::Validation(format!(
                "unknown block type '{}' (expected one of: avatar, info, stats, inventory, cyber-implants)",
                kind
            )));
        };

        let base = format!("{}-block-{}", kind, Utc::now().timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.store.contains_id(&id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        let mut block = Block::new(kind, id.clone(), BlockData::default_for(kind));
        self.persist_create(&mut block).await;
        self.store.insert(block);
        self.sync_membership().await;
        Ok(Some(id))
    }

    /// Remove a block after confirmation. The local removal always happens;
    /// the remote delete is issued only for blocks that were durable there.
    pub async fn remove_block(
        &mut self,
        id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool> {
        if !self.edit_mode {
            return Ok(false);
        }
        let Some(block) = self.store.find(id) else {
            return Ok(false);
        };
        if !confirm() {
            return Ok(false);
        }
        let block = block.clone();
        if let Err(e) = self.adapter.delete(&block).await {
            error!("deleting block {} from backend failed: {}", block.id, e);
        }
        self.store.remove_by_id(id);
        self.sync_membership().await;
        Ok(true)
    }

    /// Edit one field, or one position of the list field when `index` is
    /// given. Empty input leaves the data unchanged.
    pub async fn edit_field(
        &mut self,
        id: &str,
        field: &str,
        index: Option<usize>,
        value: &str,
    ) -> Result<bool> {
        if !self.edit_mode {
            return Ok(false);
        }
        if value.is_empty() {
            return Ok(false);
        }
        let block = self
            .store
            .find_mut(id)
            .ok_or_else(|| SheetError::BlockNotFound(id.to_string()))?;
        block.data.set_field(field, index, value)?;
        let block = block.clone();
        self.persist_update(&block).await;
        Ok(true)
    }

    /// Append an entry to a list block. The field (`items` or `implants`)
    /// is chosen by the block's kind.
    pub async fn add_item(&mut self, id: &str, value: &str) -> Result<bool> {
        if !self.edit_mode {
            return Ok(false);
        }
        if value.is_empty() {
            return Ok(false);
        }
        let block = self
            .store
            .find_mut(id)
            .ok_or_else(|| SheetError::BlockNotFound(id.to_string()))?;
        let kind = block.kind;
        let Some(list) = block.data.list_mut() else {
            return Err(SheetError::Validation(format!(
                "{} block has no item list",
                kind
            )));
        };
        list.push(value.to_string());
        let block = block.clone();
        self.persist_patch(&block).await;
        Ok(true)
    }

    /// Remove one list entry by index, after confirmation. Later entries
    /// shift down by one.
    pub async fn remove_item(
        &mut self,
        id: &str,
        index: usize,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool> {
        if !self.edit_mode {
            return Ok(false);
        }
        if !confirm() {
            return Ok(false);
        }
        let block = self
            .store
            .find_mut(id)
            .ok_or_else(|| SheetError::BlockNotFound(id.to_string()))?;
        let kind = block.kind;
        let Some(list) = block.data.list_mut() else {
            return Err(SheetError::Validation(format!(
                "{} block has no item list",
                kind
            )));
        };
        if index >= list.len() {
            return Err(SheetError::Validation(format!(
                "no {} at index {} (len {})",
                kind.item_noun(),
                index,
                list.len()
            )));
        }
        list.remove(index);
        let block = block.clone();
        self.persist_patch(&block).await;
        Ok(true)
    }

    /// Tear the sheet down and reseed it with a random identity. Existing
    /// backing records are deleted best-effort; edit mode ends up off.
    pub async fn reset(&mut self, confirm: impl FnOnce() -> bool) -> Result<bool> {
        if !confirm() {
            return Ok(false);
        }
        let existing: Vec<Block> = self.store.iter().cloned().collect();
        for block in &existing {
            if let Err(e) = self.adapter.delete(block).await {
                error!("deleting block {} during reset failed: {}", block.id, e);
            }
        }

        let blocks = match self.avatars.fetch_identity().await {
            Ok(identity) => Self::reset_sheet(identity),
            Err(e) => {
                warn!("identity fetch failed, resetting to defaults: {}", e);
                Self::default_sheet(None)
            }
        };

        self.store = BlockStore::new();
        for mut block in blocks {
            self.persist_create(&mut block).await;
            self.store.insert(block);
        }
        self.edit_mode = false;
        self.sync_membership().await;
        Ok(true)
    }

    fn reset_sheet(identity: Identity) -> Vec<Block> {
        let mut blocks = Self::default_sheet(Some(identity.portrait));
        for block in &mut blocks {
            if let BlockData::Info(d) = &mut block.data {
                d.name = identity.name.clone();
                d.age = identity.age.clone();
            }
        }
        blocks
    }

    /// Export the sheet as one JSON document mapping block id to payload,
    /// in display order. Independent of edit mode.
    pub fn export_json(&self) -> Value {
        let mut doc = Map::new();
        for block in self.store.iter() {
            doc.insert(block.id.clone(), block.data.to_value());
        }
        Value::Object(doc)
    }

    async fn persist_create(&self, block: &mut Block) {
        match self.adapter.create(block).await {
            Ok(server_id) => block.server_id = server_id,
            Err(e) => error!("saving new block {} failed (kept locally): {}", block.id, e),
        }
    }

    async fn persist_update(&self, block: &Block) {
        if let Err(e) = self.adapter.update(block).await {
            error!("saving block {} failed (kept locally): {}", block.id, e);
        }
    }

    async fn persist_patch(&self, block: &Block) {
        if let Err(e) = self.adapter.patch_data(block).await {
            error!(
                "partially updating block {} failed (kept locally): {}",
                block.id, e
            );
        }
    }

    async fn sync_membership(&self) {
        let blocks: Vec<Block> = self.store.iter().cloned().collect();
        if let Err(e) = self.adapter.sync_membership(&blocks).await {
            warn!("persisting block order failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum Listing {
        Rows(Vec<Block>),
        Unreachable,
    }

    #[derive(Default)]
    struct Calls {
        creates: usize,
        updates: usize,
        patches: usize,
        deletes: usize,
    }

    struct MockAdapter {
        listing: Listing,
        calls: Arc<Mutex<Calls>>,
        fail_writes: bool,
    }

    impl MockAdapter {
        fn new(listing: Listing) -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    listing,
                    calls: calls.clone(),
                    fail_writes: false,
                },
                calls,
            )
        }

        fn failing_writes(listing: Listing) -> (Self, Arc<Mutex<Calls>>) {
            let (mut adapter, calls) = Self::new(listing);
            adapter.fail_writes = true;
            (adapter, calls)
        }

        fn write_result(&self) -> Result<()> {
            if self.fail_writes {
                Err(SheetError::Other("backend down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PersistenceAdapter for MockAdapter {
        async fn list(&self) -> Result<Vec<Block>> {
            match &self.listing {
                Listing::Rows(rows) => Ok(rows.clone()),
                Listing::Unreachable => Err(SheetError::Other("connection refused".to_string())),
            }
        }

        async fn create(&self, _block: &Block) -> Result<Option<String>> {
            let mut calls = self.calls.lock().unwrap();
            calls.creates += 1;
            let n = calls.creates;
            drop(calls);
            self.write_result()?;
            Ok(Some(n.to_string()))
        }

        async fn update(&self, _block: &Block) -> Result<()> {
            self.calls.lock().unwrap().updates += 1;
            self.write_result()
        }

        async fn patch_data(&self, _block: &Block) -> Result<()> {
            self.calls.lock().unwrap().patches += 1;
            self.write_result()
        }

        async fn delete(&self, _block: &Block) -> Result<()> {
            self.calls.lock().unwrap().deletes += 1;
            self.write_result()
        }
    }

    struct StubAvatars;

    #[async_trait]
    impl AvatarSource for StubAvatars {
        async fn fetch_portrait(&self) -> Result<String> {
            Ok("https://example.com/portrait.jpg".to_string())
        }

        async fn fetch_identity(&self) -> Result<Identity> {
            Ok(Identity {
                name: "Rebecca".to_string(),
                age: "25".to_string(),
                portrait: "https://example.com/rebecca.jpg".to_string(),
            })
        }
    }

    struct NoAvatars;

    #[async_trait]
    impl AvatarSource for NoAvatars {
        async fn fetch_portrait(&self) -> Result<String> {
            Err(SheetError::Other("avatar source down".to_string()))
        }

        async fn fetch_identity(&self) -> Result<Identity> {
            Err(SheetError::Other("avatar source down".to_string()))
        }
    }

    fn session(listing: Listing) -> (Session, Arc<Mutex<Calls>>) {
        let (adapter, calls) = MockAdapter::new(listing);
        (
            Session::new(Box::new(adapter), Box::new(StubAvatars), false),
            calls,
        )
    }

    fn listed(kind: BlockKind, server_id: &str, data: BlockData) -> Block {
        let mut block = Block::new(kind, format!("{}-block-{}", kind, server_id), data);
        block.server_id = Some(server_id.to_string());
        block
    }

    fn kinds(session: &Session) -> Vec<BlockKind> {
        session.store().iter().map(|b| b.kind).collect()
    }

    #[tokio::test]
    async fn test_empty_listing_seeds_canonical_sheet() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();

        assert_eq!(session.state(), SyncState::Ready);
        assert_eq!(
            kinds(&session),
            [
                BlockKind::Avatar,
                BlockKind::Info,
                BlockKind::Stats,
                BlockKind::Inventory
            ]
        );
        assert_eq!(calls.lock().unwrap().creates, 4);

        // seeded avatar carries a portrait
        let avatar = session.store().find_kind(BlockKind::Avatar).unwrap();
        match &avatar.data {
            BlockData::Avatar(d) => {
                assert_eq!(d.avatar.as_deref(), Some("https://example.com/portrait.jpg"))
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_unreachable_listing_seeds_defaults() {
        let (mut session, _calls) = session(Listing::Unreachable);
        session.load().await.unwrap();

        assert_eq!(session.state(), SyncState::Ready);
        assert_eq!(session.store().len(), 4);
    }

    #[tokio::test]
    async fn test_reconcile_synthesizes_missing_info() {
        let stats = listed(BlockKind::Stats, "3", BlockData::default_for(BlockKind::Stats));
        let (mut session, calls) = session(Listing::Rows(vec![stats]));
        session.load().await.unwrap();

        assert_eq!(session.store().len(), 2);
        assert_eq!(session.store().count_kind(BlockKind::Info), 1);
        assert_eq!(calls.lock().unwrap().creates, 1);
    }

    #[tokio::test]
    async fn test_reconcile_disambiguates_colliding_info_id() {
        // a non-info block already squats on the canonical id
        let squatter = Block::new(
            BlockKind::Stats,
            "info-block",
            BlockData::default_for(BlockKind::Stats),
        );
        let (mut session, _calls) = session(Listing::Rows(vec![squatter]));
        session.load().await.unwrap();

        let info = session.store().find_kind(BlockKind::Info).unwrap();
        assert_ne!(info.id, "info-block");
        assert!(info.id.starts_with("info-block-"));
        assert_eq!(session.store().count_kind(BlockKind::Info), 1);
    }

    #[tokio::test]
    async fn test_reconcile_moves_info_directly_after_avatar() {
        let rows = vec![
            listed(BlockKind::Info, "1", BlockData::default_for(BlockKind::Info)),
            listed(BlockKind::Stats, "2", BlockData::default_for(BlockKind::Stats)),
            listed(
                BlockKind::Avatar,
                "3",
                BlockData::Avatar(AvatarData {
                    avatar: Some("https://example.com/x.jpg".to_string()),
                }),
            ),
        ];
        let (mut session, _calls) = session(Listing::Rows(rows));
        session.load().await.unwrap();

        let order = kinds(&session);
        let avatar_pos = order.iter().position(|k| *k == BlockKind::Avatar).unwrap();
        assert_eq!(order[avatar_pos + 1], BlockKind::Info);
    }

    #[tokio::test]
    async fn test_reconcile_backfills_empty_avatar() {
        let rows = vec![
            listed(
                BlockKind::Avatar,
                "1",
                BlockData::Avatar(AvatarData { avatar: None }),
            ),
            listed(BlockKind::Info, "2", BlockData::default_for(BlockKind::Info)),
        ];
        let (mut session, calls) = session(Listing::Rows(rows));
        session.load().await.unwrap();

        let avatar = session.store().find_kind(BlockKind::Avatar).unwrap();
        match &avatar.data {
            BlockData::Avatar(d) => {
                assert_eq!(d.avatar.as_deref(), Some("https://example.com/portrait.jpg"))
            }
            _ => unreachable!(),
        }
        // the backfill was persisted
        assert_eq!(calls.lock().unwrap().updates, 1);
    }

    #[tokio::test]
    async fn test_reconcile_survives_avatar_source_outage() {
        let rows = vec![listed(
            BlockKind::Avatar,
            "1",
            BlockData::Avatar(AvatarData { avatar: None }),
        )];
        let (adapter, _calls) = MockAdapter::new(Listing::Rows(rows));
        let mut session = Session::new(Box::new(adapter), Box::new(NoAvatars), false);
        session.load().await.unwrap();

        assert_eq!(session.state(), SyncState::Ready);
    }

    #[tokio::test]
    async fn test_edit_ops_are_noops_without_edit_mode() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        let before = calls.lock().unwrap().creates;

        assert_eq!(session.add_block("inventory").await.unwrap(), None);
        assert!(!session
            .edit_field("info-block", "name", None, "V")
            .await
            .unwrap());
        assert!(!session.add_item("inventory-block", "Katana").await.unwrap());
        assert!(!session
            .remove_item("inventory-block", 0, || true)
            .await
            .unwrap());
        assert!(!session.remove_block("stats-block", || true).await.unwrap());

        assert_eq!(calls.lock().unwrap().creates, before);
        assert_eq!(calls.lock().unwrap().updates, 0);
        assert_eq!(calls.lock().unwrap().patches, 0);
        assert_eq!(calls.lock().unwrap().deletes, 0);
    }

    #[tokio::test]
    async fn test_add_block_rejects_unknown_kind() {
        let (mut session, _calls) = session(Listing::Rows(vec![]));
        session.set_edit_mode(true);
        assert!(matches!(
            session.add_block("weapons").await,
            Err(SheetError::Validation(_))
        ));
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_inventory_crud_scenario() {
        // add an inventory block to an empty store, add one item, remove it:
        // one create and two partial updates reach the backend
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.set_edit_mode(true);

        let id = session.add_block("inventory").await.unwrap().unwrap();
        assert!(session.add_item(&id, "Pistol").await.unwrap());
        assert!(session.remove_item(&id, 0, || true).await.unwrap());

        let items = session.store().find(&id).unwrap().data.list().unwrap();
        assert!(items.is_empty());
        assert_eq!(calls.lock().unwrap().creates, 1);
        assert_eq!(calls.lock().unwrap().patches, 2);
    }

    #[tokio::test]
    async fn test_remove_item_preserves_relative_order() {
        let (mut session, _calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);

        // seeded inventory is [Pistol, Leather jacket, Guitar]
        assert!(session
            .remove_item("inventory-block", 1, || true)
            .await
            .unwrap());
        let items = session
            .store()
            .find("inventory-block")
            .unwrap()
            .data
            .list()
            .unwrap();
        assert_eq!(items, &["Pistol", "Guitar"]);
    }

    #[tokio::test]
    async fn test_remove_item_unconfirmed_changes_nothing() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);
        let patches_before = calls.lock().unwrap().patches;

        assert!(!session
            .remove_item("inventory-block", 0, || false)
            .await
            .unwrap());
        let items = session
            .store()
            .find("inventory-block")
            .unwrap()
            .data
            .list()
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(calls.lock().unwrap().patches, patches_before);
    }

    #[tokio::test]
    async fn test_edit_field_empty_input_leaves_data_unchanged() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);

        assert!(!session
            .edit_field("info-block", "name", None, "")
            .await
            .unwrap());
        match &session.store().find("info-block").unwrap().data {
            BlockData::Info(d) => assert_eq!(d.name, "Johnny Silverhand"),
            _ => unreachable!(),
        }
        assert_eq!(calls.lock().unwrap().updates, 0);
    }

    #[tokio::test]
    async fn test_indexed_edit_replaces_single_position() {
        let (mut session, _calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);

        assert!(session
            .edit_field("inventory-block", "items", Some(0), "Malorian Arms 3516")
            .await
            .unwrap());
        let items = session
            .store()
            .find("inventory-block")
            .unwrap()
            .data
            .list()
            .unwrap();
        assert_eq!(items, &["Malorian Arms 3516", "Leather jacket", "Guitar"]);
    }

    #[tokio::test]
    async fn test_remove_block_confirmation_and_delete() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);

        assert!(!session.remove_block("stats-block", || false).await.unwrap());
        assert!(session.store().find("stats-block").is_some());

        assert!(session.remove_block("stats-block", || true).await.unwrap());
        assert!(session.store().find("stats-block").is_none());
        assert_eq!(calls.lock().unwrap().deletes, 1);

        // removing an unknown id is a quiet no-op
        assert!(!session.remove_block("stats-block", || true).await.unwrap());
    }

    #[tokio::test]
    async fn test_backend_write_failure_keeps_local_state() {
        let (adapter, calls) = MockAdapter::failing_writes(Listing::Rows(vec![]));
        let mut session = Session::new(Box::new(adapter), Box::new(StubAvatars), true);

        let id = session.add_block("cyber-implants").await.unwrap().unwrap();
        assert!(session.add_item(&id, "sandevistan").await.unwrap());

        // writes were attempted, failed, and the store kept the mutations
        assert_eq!(calls.lock().unwrap().creates, 1);
        assert_eq!(calls.lock().unwrap().patches, 1);
        let items = session.store().find(&id).unwrap().data.list().unwrap();
        assert_eq!(items, &["sandevistan"]);
        // no server identity was assigned
        assert!(session.store().find(&id).unwrap().server_id.is_none());
    }

    #[tokio::test]
    async fn test_export_matches_store_regardless_of_edit_mode() {
        let (mut session, _calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();

        let doc = session.export_json();
        let exported: Vec<&String> = doc.as_object().unwrap().keys().collect();
        let ids: Vec<String> = session.store().iter().map(|b| b.id.clone()).collect();
        assert_eq!(exported, ids.iter().collect::<Vec<_>>());
        for block in session.store().iter() {
            assert_eq!(doc[&block.id], block.data.to_value());
        }

        session.set_edit_mode(true);
        assert_eq!(session.export_json(), doc);
    }

    #[tokio::test]
    async fn test_reset_reseeds_with_random_identity() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        session.set_edit_mode(true);

        assert!(session.reset(|| true).await.unwrap());
        assert!(!session.edit_mode());
        assert_eq!(session.store().len(), 4);
        // previous rows were torn down best-effort
        assert_eq!(calls.lock().unwrap().deletes, 4);
        match &session.store().find_kind(BlockKind::Info).unwrap().data {
            BlockData::Info(d) => {
                assert_eq!(d.name, "Rebecca");
                assert_eq!(d.age, "25");
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_reset_unconfirmed_is_noop() {
        let (mut session, calls) = session(Listing::Rows(vec![]));
        session.load().await.unwrap();
        let creates = calls.lock().unwrap().creates;

        assert!(!session.reset(|| false).await.unwrap());
        assert_eq!(calls.lock().unwrap().creates, creates);
        assert_eq!(calls.lock().unwrap().deletes, 0);
    }
}
