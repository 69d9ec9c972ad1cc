use crate::block::{Block, BlockData, BlockKind};
use crate::store::BlockStore;
use std::fmt;

/// Display representation of the whole sheet. Derived from the store and
/// the edit-mode flag by a pure function; rendering never mutates state.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    pub edit_mode: bool,
    pub sections: Vec<SectionView>,
}

/// One rendered block.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub id: String,
    pub kind: BlockKind,
    pub title: String,
    pub lines: Vec<String>,
}

/// Project the store into its display representation.
pub fn project(store: &BlockStore, edit_mode: bool) -> SheetView {
    SheetView {
        edit_mode,
        sections: store.iter().map(section).collect(),
    }
}

fn section(block: &Block) -> SectionView {
    let lines = match &block.data {
        BlockData::Avatar(d) => vec![match d.avatar.as_deref() {
            Some(url) if !url.is_empty() => format!("Portrait: {}", url),
            _ => "Portrait: (none)".to_string(),
        }],
        BlockData::Info(d) => vec![
            format!("Name: {}", d.name),
            format!("Role: {}", d.role),
            format!("Age: {}", d.age),
        ],
        BlockData::Stats(map) => map
            .iter()
            .map(|(stat, value)| match value {
                serde_json::Value::String(s) => format!("{}: {}", stat, s),
                other => format!("{}: {}", stat, other),
            })
            .collect(),
        BlockData::Inventory(d) => numbered(&d.items),
        BlockData::CyberImplants(d) => numbered(&d.implants),
    };
    SectionView {
        id: block.id.clone(),
        kind: block.kind,
        title: block.kind.title().to_string(),
        lines,
    }
}

// Indices are printed so edit commands can address entries directly.
fn numbered(entries: &[String]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["(empty)".to_string()];
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("[{}] {}", i, entry))
        .collect()
}

impl fmt::Display for SheetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "== {} ({})", section.title, section.id)?;
            for line in &section.lines {
                writeln!(f, "  {}", line)?;
            }
        }
        if self.edit_mode {
            writeln!(f, "-- edit mode is ON --")?;
        }
        Ok(())
    }
}
