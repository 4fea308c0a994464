//! Scripted sessions: seed a [`MemoryBackend`], then drive a
//! [`ListController`] through page loads and mutations step by step.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::controller::{ListController, ListSnapshot};
use crate::cursor::CursorStore;
use crate::error::{ListError, Result};
use crate::event::MutationOutcome;
use crate::item::{CollectionKey, Item, ItemId, Kind, SortKeys};
use crate::memory::MemoryBackend;
use crate::sort::{Direction, SortField, SortSpec};

/// An item placed on the backend before the session starts.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub id: String,
    pub name: String,
    pub kind: Option<Kind>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub updated_at: i64,
    /// Defaults to the script's collection.
    pub collection: Option<String>,
}

/// One user-visible action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    LoadFirst,
    LoadNext,
    LoadAll,
    Create {
        name: String,
        kind: Option<Kind>,
    },
    Upload {
        name: String,
        #[serde(default)]
        size: u64,
    },
    Rename {
        id: String,
        name: String,
    },
    MoveOut {
        id: String,
        to: String,
    },
    /// Copy an item from any collection into the scripted one.
    CopyIn {
        id: String,
    },
    Trash {
        id: String,
    },
    Restore {
        id: String,
    },
    Delete {
        id: String,
    },
    Sort {
        field: SortField,
        #[serde(default)]
        direction: Direction,
    },
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::LoadFirst => "load_first",
            Step::LoadNext => "load_next",
            Step::LoadAll => "load_all",
            Step::Create { .. } => "create",
            Step::Upload { .. } => "upload",
            Step::Rename { .. } => "rename",
            Step::MoveOut { .. } => "move_out",
            Step::CopyIn { .. } => "copy_in",
            Step::Trash { .. } => "trash",
            Step::Restore { .. } => "restore",
            Step::Delete { .. } => "delete",
            Step::Sort { .. } => "sort",
        }
    }
}

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub collection: String,
    pub page_size: Option<usize>,
    #[serde(default)]
    pub items: Vec<SeedItem>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(content: &str) -> Result<Script> {
        toml::from_str(content).map_err(|e| ListError::Script(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Script> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// State after one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub snapshot: ListSnapshot,
    /// A rejected mutation or failed fetch; the session continues.
    pub error: Option<String>,
}

/// Run `script` to completion. `page_size` overrides the script's own.
pub async fn run(script: &Script, spec: SortSpec, page_size: usize) -> Result<Vec<StepReport>> {
    let key = CollectionKey::new(script.collection.clone());
    let mut backend = MemoryBackend::new();
    for seed in &script.items {
        let into = seed
            .collection
            .as_deref()
            .map(CollectionKey::from)
            .unwrap_or_else(|| key.clone());
        let item = Item::new(
            seed.id.as_str(),
            SortKeys::new(seed.name.as_str(), seed.updated_at, seed.size),
            seed.kind.unwrap_or(Kind::File),
        );
        backend.seed(&into, [item]);
    }

    let mut controller = ListController::new(key.clone(), spec, page_size, CursorStore::new());
    let mut reports = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, action = step.label(), "replaying step");
        let error = match execute(step, &key, &mut backend, &mut controller).await {
            Ok(()) => None,
            Err(e) => {
                warn!(index, action = step.label(), error = %e, "step failed");
                Some(e.to_string())
            }
        };
        reports.push(StepReport {
            index,
            action: step.label(),
            snapshot: controller.snapshot(),
            error,
        });
    }

    controller.close();
    Ok(reports)
}

async fn execute(
    step: &Step,
    key: &CollectionKey,
    backend: &mut MemoryBackend,
    controller: &mut ListController,
) -> Result<()> {
    let outcome: MutationOutcome = match step {
        Step::LoadFirst => {
            controller.load_first_page(&*backend).await?;
            return Ok(());
        }
        Step::LoadNext => {
            controller.load_next_page(&*backend).await?;
            return Ok(());
        }
        Step::LoadAll => {
            controller.load_all(&*backend).await?;
            return Ok(());
        }
        Step::Sort { field, direction } => {
            let spec = SortSpec::new(*field, *direction)
                .with_folders_first(controller.sort_spec().folders_first);
            controller.change_sort_spec(spec);
            controller.load_first_page(&*backend).await?;
            return Ok(());
        }
        Step::Create { name, kind } => backend.create(key, name, kind.unwrap_or(Kind::File)),
        Step::Upload { name, size } => backend.upload(key, name, *size),
        Step::Rename { id, name } => backend.rename(&ItemId::from(id.as_str()), name)?,
        Step::MoveOut { id, to } => {
            backend.move_item(&ItemId::from(id.as_str()), &CollectionKey::from(to.as_str()))?
        }
        Step::CopyIn { id } => backend.copy(&ItemId::from(id.as_str()), key)?,
        Step::Trash { id } => backend.trash(&ItemId::from(id.as_str()))?,
        Step::Restore { id } => backend.restore(&ItemId::from(id.as_str()))?,
        Step::Delete { id } => backend.delete(&ItemId::from(id.as_str()))?,
    };

    controller.apply_outcome(&outcome);
    controller.refresh_if_needed(&*backend).await?;
    Ok(())
}
