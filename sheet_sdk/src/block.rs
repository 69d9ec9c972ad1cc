use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of block kinds a character sheet is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Avatar,
    Info,
    Stats,
    Inventory,
    CyberImplants,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Avatar,
        BlockKind::Info,
        BlockKind::Stats,
        BlockKind::Inventory,
        BlockKind::CyberImplants,
    ];

    /// Wire name, used as the `title` of the remote resource and as the
    /// prefix of generated block ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Avatar => "avatar",
            BlockKind::Info => "info",
            BlockKind::Stats => "stats",
            BlockKind::Inventory => "inventory",
            BlockKind::CyberImplants => "cyber-implants",
        }
    }

    pub fn parse(s: &str) -> Option<BlockKind> {
        match s {
            "avatar" => Some(BlockKind::Avatar),
            "info" => Some(BlockKind::Info),
            "stats" => Some(BlockKind::Stats),
            "inventory" => Some(BlockKind::Inventory),
            "cyber-implants" => Some(BlockKind::CyberImplants),
            _ => None,
        }
    }

    /// Section heading for display.
    pub fn title(&self) -> &'static str {
        match self {
            BlockKind::Avatar => "Character Avatar",
            BlockKind::Info => "Character Info",
            BlockKind::Stats => "Stats",
            BlockKind::Inventory => "Inventory",
            BlockKind::CyberImplants => "Cyber Implants",
        }
    }

    /// Name of the editable list field, for the two list-shaped kinds.
    /// The field is selected by kind, never by the caller.
    pub fn list_field(&self) -> Option<&'static str> {
        match self {
            BlockKind::Inventory => Some("items"),
            BlockKind::CyberImplants => Some("implants"),
            _ => None,
        }
    }

    /// What a single list entry is called, for prompts and log lines.
    pub fn item_noun(&self) -> &'static str {
        match self {
            BlockKind::CyberImplants => "implant",
            _ => "item",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarData {
    /// Portrait URL or data URI. Empty is valid until reconciliation
    /// backfills it.
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoData {
    pub name: String,
    pub role: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryData {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplantsData {
    pub implants: Vec<String>,
}

/// Per-kind block payload. Stats keep insertion order (display order).
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    Avatar(AvatarData),
    Info(InfoData),
    Stats(Map<String, Value>),
    Inventory(InventoryData),
    CyberImplants(ImplantsData),
}

impl BlockData {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockData::Avatar(_) => BlockKind::Avatar,
            BlockData::Info(_) => BlockKind::Info,
            BlockData::Stats(_) => BlockKind::Stats,
            BlockData::Inventory(_) => BlockKind::Inventory,
            BlockData::CyberImplants(_) => BlockKind::CyberImplants,
        }
    }

    /// Default payload for a freshly added block of the given kind.
    pub fn default_for(kind: BlockKind) -> BlockData {
        match kind {
            BlockKind::Avatar => BlockData::Avatar(AvatarData { avatar: None }),
            BlockKind::Info => BlockData::Info(InfoData {
                name: "New character".to_string(),
                role: "Unknown".to_string(),
                age: "0".to_string(),
            }),
            BlockKind::Stats => {
                let mut stats = Map::new();
                stats.insert("Intelligence".to_string(), Value::from(5));
                stats.insert("Reflexes".to_string(), Value::from(5));
                stats.insert("Charisma".to_string(), Value::from(5));
                BlockData::Stats(stats)
            }
            BlockKind::Inventory => BlockData::Inventory(InventoryData { items: vec![] }),
            BlockKind::CyberImplants => {
                BlockData::CyberImplants(ImplantsData { implants: vec![] })
            }
        }
    }

    /// Parse a payload of a known kind from its JSON representation.
    pub fn from_json(kind: BlockKind, value: Value) -> Result<BlockData> {
        let data = match kind {
            BlockKind::Avatar => BlockData::Avatar(serde_json::from_value(value)?),
            BlockKind::Info => BlockData::Info(serde_json::from_value(value)?),
            BlockKind::Stats => match value {
                Value::Object(map) => BlockData::Stats(map),
                other => {
                    return Err(SheetError::Validation(format!(
                        "stats payload must be an object, got {}",
                        other
                    )))
                }
            },
            BlockKind::Inventory => BlockData::Inventory(serde_json::from_value(value)?),
            BlockKind::CyberImplants => BlockData::CyberImplants(serde_json::from_value(value)?),
        };
        Ok(data)
    }

    pub fn to_value(&self) -> Value {
        match self {
            BlockData::Avatar(d) => serde_json::to_value(d).unwrap_or(Value::Null),
            BlockData::Info(d) => serde_json::to_value(d).unwrap_or(Value::Null),
            BlockData::Stats(map) => Value::Object(map.clone()),
            BlockData::Inventory(d) => serde_json::to_value(d).unwrap_or(Value::Null),
            BlockData::CyberImplants(d) => serde_json::to_value(d).unwrap_or(Value::Null),
        }
    }

    /// The ordered list behind `items`/`implants`, if this is a list kind.
    pub fn list(&self) -> Option<&Vec<String>> {
        match self {
            BlockData::Inventory(d) => Some(&d.items),
            BlockData::CyberImplants(d) => Some(&d.implants),
            _ => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            BlockData::Inventory(d) => Some(&mut d.items),
            BlockData::CyberImplants(d) => Some(&mut d.implants),
            _ => None,
        }
    }

    /// Replace a single field, or a single position of the list field when
    /// `index` is given. Rejects unknown fields and out-of-range indices.
    pub fn set_field(&mut self, field: &str, index: Option<usize>, value: &str) -> Result<()> {
        if let Some(i) = index {
            let kind = self.kind();
            let Some(list_field) = kind.list_field() else {
                return Err(SheetError::Validation(format!(
                    "block kind {} has no indexed field",
                    kind
                )));
            };
            if field != list_field {
                return Err(SheetError::Validation(format!(
                    "unknown indexed field '{}' for {} block",
                    field, kind
                )));
            }
            let list = self.list_mut().unwrap_or_else(|| unreachable!());
            let len = list.len();
            let Some(slot) = list.get_mut(i) else {
                return Err(SheetError::Validation(format!(
                    "index {} out of range for '{}' (len {})",
                    i, field, len
                )));
            };
            *slot = value.to_string();
            return Ok(());
        }

        match self {
            BlockData::Avatar(d) if field == "avatar" => {
                d.avatar = Some(value.to_string());
                Ok(())
            }
            BlockData::Info(d) => {
                match field {
                    "name" => d.name = value.to_string(),
                    "role" => d.role = value.to_string(),
                    "age" => d.age = value.to_string(),
                    other => {
                        return Err(SheetError::Validation(format!(
                            "unknown info field '{}'",
                            other
                        )))
                    }
                }
                Ok(())
            }
            // Stats accept any key; edited values are stored as strings,
            // matching what the edit surface hands us.
            BlockData::Stats(map) => {
                map.insert(field.to_string(), Value::String(value.to_string()));
                Ok(())
            }
            other => Err(SheetError::Validation(format!(
                "unknown field '{}' for {} block",
                field,
                other.kind()
            ))),
        }
    }
}

/// One editable unit of the character sheet.
///
/// `id` is the stable client-side identity; `server_id` is assigned by the
/// remote backend on first successful create and stays `None` until then.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub server_id: Option<String>,
    pub data: BlockData,
}

impl Block {
    pub fn new(kind: BlockKind, id: impl Into<String>, data: BlockData) -> Block {
        Block {
            id: id.into(),
            kind,
            server_id: None,
            data,
        }
    }

    /// Factory over the wire-level kind name. Returns `None` for an
    /// unrecognized kind or a payload that does not match it; never panics.
    pub fn create(kind: &str, id: impl Into<String>, data: Option<BlockData>) -> Option<Block> {
        let kind = BlockKind::parse(kind)?;
        let data = match data {
            Some(data) if data.kind() == kind => data,
            Some(_) => return None,
            None => BlockData::default_for(kind),
        };
        Some(Block::new(kind, id, data))
    }

    /// JSON-serialized payload, as stored in the remote resource `body`.
    pub fn body_json(&self) -> String {
        self.data.to_value().to_string()
    }
}
