//! Filterable, paginated view over the fish category.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::images::{fish_image, ImageRef};
use super::item::CatalogItem;
use super::loader::CatalogCollection;
use crate::checklist::{ChecklistState, TierChange, TierRecord};
use crate::error::Result;
use crate::storage::KeyValueStore;

pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Cards,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(ViewMode::Table),
            "cards" => Ok(ViewMode::Cards),
            other => Err(format!("unknown view '{other}' (expected table or cards)")),
        }
    }
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Table => ViewMode::Cards,
            ViewMode::Cards => ViewMode::Table,
        }
    }
}

/// `all`, or one exact value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    All,
    Only(String),
}

impl FilterValue {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

impl FromStr for FilterValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "all" {
            FilterValue::All
        } else {
            FilterValue::Only(s.to_string())
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterDimension {
    Location,
    Weather,
    Time,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 3] = [
        FilterDimension::Location,
        FilterDimension::Weather,
        FilterDimension::Time,
    ];

    fn value_of(self, item: &CatalogItem) -> Option<&str> {
        match self {
            FilterDimension::Location => item.fields.location.as_deref(),
            FilterDimension::Weather => item.fields.weather.as_deref(),
            FilterDimension::Time => item.fields.time.as_deref(),
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FilterDimension::Location => "Filtro Ubicación",
            FilterDimension::Weather => "Filtro Clima",
            FilterDimension::Time => "Filtro Hora",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FishFilters {
    pub location: FilterValue,
    pub weather: FilterValue,
    pub time: FilterValue,
}

impl FishFilters {
    fn slot(&mut self, dimension: FilterDimension) -> &mut FilterValue {
        match dimension {
            FilterDimension::Location => &mut self.location,
            FilterDimension::Weather => &mut self.weather,
            FilterDimension::Time => &mut self.time,
        }
    }

    /// All three dimensions must match.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.location.matches(FilterDimension::Location.value_of(item))
            && self.weather.matches(FilterDimension::Weather.value_of(item))
            && self.time.matches(FilterDimension::Time.value_of(item))
    }
}

/// One rendered fish entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FishRow {
    pub name: String,
    pub level: String,
    pub image: ImageRef,
    pub location: String,
    pub shadow: String,
    pub weather: String,
    pub time: String,
    pub unconfirmed: bool,
    pub tiers: [bool; 5],
    pub caught: bool,
}

/// Outcome of a star click: which row on the current page changed, if it is visible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowUpdate {
    pub position: Option<usize>,
    pub change: TierChange,
    pub caught: bool,
}

#[derive(Clone, Debug)]
pub struct FishView {
    items: CatalogCollection,
    filters: FishFilters,
    mode: ViewMode,
    page: usize,
    /// Indices into `items` passing the current filters.
    filtered: Vec<usize>,
}

impl FishView {
    pub fn new(items: CatalogCollection) -> Self {
        let filtered = (0..items.len()).collect();
        Self {
            items,
            filters: FishFilters::default(),
            mode: ViewMode::default(),
            page: 1,
            filtered,
        }
    }

    pub fn filters(&self) -> &FishFilters {
        &self.filters
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE).max(1)
    }

    /// Sorted distinct values for a filter drop-down.
    pub fn options(&self, dimension: FilterDimension) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| dimension.value_of(item))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Changes one filter, refilters and returns to the first page.
    pub fn set_filter(&mut self, dimension: FilterDimension, value: FilterValue) {
        *self.filters.slot(dimension) = value;
        self.refilter();
    }

    /// Replaces all filters at once.
    pub fn apply_filters(&mut self, filters: FishFilters) {
        self.filters = filters;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filters.matches(item))
            .map(|(i, _)| i)
            .collect();
        self.page = 1;
    }

    /// Switches between table and cards. Filters are kept.
    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.page = 1;
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    /// Moves to `page`, clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn page_label(&self) -> String {
        format!("Página {} de {}", self.page, self.total_pages())
    }

    /// Every item passing the filters, unpaginated.
    pub fn filtered_items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.filtered.iter().map(|&i| &self.items[i])
    }

    fn page_items(&self) -> impl Iterator<Item = &CatalogItem> {
        let start = (self.page - 1) * PAGE_SIZE;
        self.filtered
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .map(|&i| &self.items[i])
    }

    /// Rows for the current page.
    pub fn rows(&self, checklist: &ChecklistState) -> Vec<FishRow> {
        self.page_items()
            .map(|item| fish_row(item, checklist))
            .collect()
    }

    /// Toggles a star tier for `name` and reports where on the current page that row is.
    pub fn toggle_star<S: KeyValueStore>(
        &self,
        checklist: &mut ChecklistState,
        store: &mut S,
        name: &str,
        tier: u8,
    ) -> Result<RowUpdate> {
        let change = checklist.toggle(store, name, tier)?;
        let position = self
            .page_items()
            .position(|item| item.fish_name() == Some(name));
        Ok(RowUpdate {
            position,
            caught: change.record.any(),
            change,
        })
    }
}

fn fish_row(item: &CatalogItem, checklist: &ChecklistState) -> FishRow {
    let name = item.fish_name().unwrap_or_default().to_string();
    let record = checklist.get(&name);
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    FishRow {
        level: text(&item.fields.level),
        image: fish_image(item.fields.image.as_deref().or(item.fields.imagen.as_deref())),
        location: text(&item.fields.location),
        shadow: text(&item.fields.shadow),
        weather: text(&item.fields.weather),
        time: text(&item.fields.time),
        unconfirmed: item.fields.unconfirmed,
        tiers: record.tiers(),
        caught: record.any(),
        name,
    }
}

impl fmt::Display for FishRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stars = TierRecord::from_tiers(self.tiers).stars();
        let flag = if self.unconfirmed { " (?)" } else { "" };
        write!(
            f,
            "{stars} | {} | {} | {}{flag} | {} | {} | {} | {}",
            self.level, self.image, self.name, self.location, self.shadow, self.weather, self.time
        )
    }
}
