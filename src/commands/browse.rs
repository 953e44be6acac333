use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{emit, Context};
use crate::catalog::cards::CardGrid;
use crate::catalog::fish::{
    FilterDimension, FilterValue, FishFilters, FishRow, FishView, ViewMode,
};
use crate::catalog::viewer::{Screen, Viewer};
use crate::catalog::{CatalogLoader, Category};
use crate::checklist::{ChecklistState, TierRecord};
use crate::cli::BrowseArgs;
use crate::error::Result;
use crate::storage::KeyValueStore;

pub const NO_FISH: &str = "No se encontraron peces con estos filtros.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLink {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FishPage {
    pub filters: FishFilters,
    pub options: BTreeMap<&'static str, Vec<String>>,
    pub mode: ViewMode,
    pub page: usize,
    pub total_pages: usize,
    pub page_label: String,
    pub rows: Vec<FishRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "screen")]
pub enum BrowseOutput {
    Home { categories: Vec<CategoryLink> },
    Cards { category: Category, grid: CardGrid },
    Fish(FishPage),
}

fn option_key(dimension: FilterDimension) -> &'static str {
    match dimension {
        FilterDimension::Location => "location",
        FilterDimension::Weather => "weather",
        FilterDimension::Time => "time",
    }
}

/// Applies the requested filters, view mode and page, in that order, and
/// renders the resulting page.
pub fn fish_page(view: &mut FishView, args: &BrowseArgs, checklist: &ChecklistState) -> FishPage {
    view.apply_filters(FishFilters {
        location: args.location.clone().unwrap_or_default(),
        weather: args.weather.clone().unwrap_or_default(),
        time: args.time.clone().unwrap_or_default(),
    });
    if let Some(mode) = args.view {
        view.set_mode(mode);
    }
    view.go_to_page(args.page);

    FishPage {
        filters: view.filters().clone(),
        options: FilterDimension::ALL
            .into_iter()
            .map(|d| (option_key(d), view.options(d)))
            .collect(),
        mode: view.mode(),
        page: view.page(),
        total_pages: view.total_pages(),
        page_label: view.page_label(),
        rows: view.rows(checklist),
    }
}

pub async fn browse<S: KeyValueStore>(
    viewer: &mut Viewer<S>,
    args: &BrowseArgs,
) -> Result<BrowseOutput> {
    let output = match viewer.start(args.category.as_deref()).await? {
        Screen::Home => BrowseOutput::Home {
            categories: Category::ALL
                .into_iter()
                .map(|c| CategoryLink {
                    key: c.key(),
                    label: c.label(),
                })
                .collect(),
        },
        Screen::Cards { category, grid } => BrowseOutput::Cards { category, grid },
        Screen::Fish(mut view) => {
            let checklist = ChecklistState::load(viewer.store_mut())?;
            BrowseOutput::Fish(fish_page(&mut view, args, &checklist))
        }
    };
    Ok(output)
}

pub async fn run(ctx: &Context, args: BrowseArgs) -> Result<()> {
    let loader = CatalogLoader::new(ctx.settings.data_source.clone());
    let mut viewer = Viewer::new(loader, ctx.open_store());
    let output = browse(&mut viewer, &args).await?;
    emit(ctx.json, &output)
}

impl fmt::Display for FishPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chosen = [
            &self.filters.location,
            &self.filters.weather,
            &self.filters.time,
        ];
        let active: Vec<String> = FilterDimension::ALL
            .into_iter()
            .zip(chosen)
            .filter_map(|(dimension, value)| match value {
                FilterValue::Only(value) => Some(format!("{}: {value}", dimension.placeholder())),
                FilterValue::All => None,
            })
            .collect();
        if !active.is_empty() {
            writeln!(f, "{}", active.join(" · "))?;
        }

        if self.rows.is_empty() {
            writeln!(f, "{NO_FISH}")?;
        } else if self.mode == ViewMode::Table {
            writeln!(f, "Estrellas | Nivel | Imagen | Nombre | Ubicación | Sombra | Clima | Hora")?;
            for row in &self.rows {
                writeln!(f, "{row}")?;
            }
        } else {
            for row in &self.rows {
                let mark = if row.caught { " ✔" } else { "" };
                writeln!(f, "{}{mark}  {}", row.name, TierRecord::from_tiers(row.tiers).stars())?;
                writeln!(f, "  imagen: {}", row.image)?;
                writeln!(f, "  nivel: {}  sombra: {}", row.level, row.shadow)?;
                writeln!(f, "  {} · {} · {}", row.location, row.weather, row.time)?;
            }
        }
        writeln!(f, "{}", self.page_label)
    }
}

impl fmt::Display for BrowseOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseOutput::Home { categories } => {
                for link in categories {
                    writeln!(f, "{:<9} {}", link.key, link.label)?;
                }
                Ok(())
            }
            BrowseOutput::Cards { category, grid } => {
                writeln!(f, "== {} ==", category.label())?;
                write!(f, "{grid}")
            }
            BrowseOutput::Fish(page) => write!(f, "{page}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataSource;
    use crate::storage::{keys, MemoryStore};

    fn args(category: &str) -> BrowseArgs {
        BrowseArgs {
            category: Some(category.into()),
            location: None,
            weather: None,
            time: None,
            view: None,
            page: 1,
        }
    }

    fn viewer_in(dir: &tempfile::TempDir) -> Viewer<MemoryStore> {
        let loader = CatalogLoader::new(DataSource::Directory(dir.path().to_path_buf()));
        Viewer::new(loader, MemoryStore::new())
    }

    #[tokio::test]
    async fn test_fish_page_with_filter_and_checklist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fish.json"),
            r#"[{"Name":"Trucha","Location":"Río"},{"Name":"Carpa","Location":"Lago"}]"#,
        )
        .unwrap();
        let mut viewer = viewer_in(&dir);
        viewer
            .store_mut()
            .set(keys::CHECKLIST, r#"{"Trucha": true}"#.into())
            .unwrap();

        let request = BrowseArgs {
            location: Some(FilterValue::Only("Río".into())),
            page: 9,
            ..args("peces")
        };
        let BrowseOutput::Fish(page) = browse(&mut viewer, &request).await.unwrap() else {
            panic!("expected fish page");
        };
        assert_eq!(page.rows.len(), 1);
        assert!(page.rows[0].caught);
        assert_eq!(page.page_label, "Página 1 de 1");
        assert_eq!(page.options["location"], ["Lago", "Río"]);
        let text = page.to_string();
        assert!(text.contains("★☆☆☆☆"));
        assert!(text.starts_with("Filtro Ubicación: Río\n"));
    }

    #[tokio::test]
    async fn test_missing_file_renders_empty_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_in(&dir);
        let output = browse(&mut viewer, &args("insectos")).await.unwrap();
        assert!(output.to_string().contains("No hay datos disponibles."));
        assert_eq!(viewer.last_view().as_deref(), Some("insectos"));
    }

    #[tokio::test]
    async fn test_home_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer_in(&dir);
        let output = browse(&mut viewer, &args("home")).await.unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["screen"], "home");
        assert_eq!(json["categories"].as_array().unwrap().len(), 5);
    }
}
