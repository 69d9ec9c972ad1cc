pub mod avatar;
pub mod block;
pub mod client;
pub mod error;
pub mod persist;
pub mod render;
pub mod session;
pub mod store;
pub mod weather;

pub use avatar::{AvatarSource, Identity, RandomUserApi};
pub use block::{Block, BlockData, BlockKind};
pub use client::PlaceholderClient;
pub use error::{Result, SheetError};
pub use persist::{LocalStore, PersistenceAdapter, RemoteStore};
pub use render::{project, SheetView};
pub use session::{Session, SyncState};
pub use store::BlockStore;
pub use weather::{WeatherClient, WeatherReport};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::avatar::{AvatarSource, RandomUserApi};
    pub use crate::block::{Block, BlockData, BlockKind};
    pub use crate::client::PlaceholderClient;
    pub use crate::error::{Result, SheetError};
    pub use crate::persist::{LocalStore, PersistenceAdapter, RemoteStore};
    pub use crate::render::project;
    pub use crate::session::{Session, SyncState};
    pub use crate::store::BlockStore;
}
