use std::fmt;

use serde::Serialize;

use super::{emit, Context};
use crate::catalog::fish::{FishView, RowUpdate};
use crate::catalog::{CatalogLoader, Category};
use crate::checklist::{ChecklistState, TierRecord};
use crate::error::Result;
use crate::storage::KeyValueStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub name: String,
    pub tiers: TierRecord,
    pub caught: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSummary {
    pub caught: usize,
    pub entries: Vec<ChecklistEntry>,
}

pub fn summarize(checklist: &ChecklistState) -> ChecklistSummary {
    let entries: Vec<ChecklistEntry> = checklist
        .entries()
        .map(|(name, record)| ChecklistEntry {
            name: name.to_string(),
            tiers: record,
            caught: record.any(),
        })
        .collect();
    ChecklistSummary {
        caught: entries.iter().filter(|e| e.caught).count(),
        entries,
    }
}

/// Flips one tier for `name`. The fish list is consulted so the update can be
/// placed on the first table page; an unavailable list still records the change.
pub async fn toggle_star<S: KeyValueStore>(
    loader: &mut CatalogLoader,
    store: &mut S,
    name: &str,
    tier: u8,
) -> Result<RowUpdate> {
    let items = match loader.fetch(Category::Fish).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("fish list unavailable, recording {name} anyway: {e}");
            Default::default()
        }
    };
    let view = FishView::new(items);
    let mut checklist = ChecklistState::load(store)?;
    view.toggle_star(&mut checklist, store, name, tier)
}

pub async fn toggle(ctx: &Context, name: &str, tier: u8) -> Result<()> {
    let mut loader = CatalogLoader::new(ctx.settings.data_source.clone());
    let mut store = ctx.open_store();
    let update = toggle_star(&mut loader, &mut store, name, tier).await?;
    emit(ctx.json, &ToggleOutput(update))
}

pub fn show(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store();
    let checklist = ChecklistState::load(&mut store)?;
    emit(ctx.json, &summarize(&checklist))
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ToggleOutput(RowUpdate);

impl fmt::Display for ToggleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let change = &self.0.change;
        let state = if change.caught { "marcado" } else { "desmarcado" };
        writeln!(
            f,
            "{} ★{} {state}  {}",
            change.name,
            change.tier,
            change.record.stars()
        )
    }
}

impl fmt::Display for ChecklistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}  {}", entry.tiers.stars(), entry.name)?;
        }
        writeln!(f, "{} peces capturados", self.caught)
    }
}
