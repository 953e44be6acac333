use super::cards::{render_cards, CardGrid};
use super::category::Category;
use super::fish::FishView;
use super::loader::CatalogLoader;
use crate::error::Result;
use crate::storage::{keys, KeyValueStore};

pub const HOME: &str = "home";

/// What the viewer is showing.
#[derive(Debug)]
pub enum Screen {
    Home,
    Cards { category: Category, grid: CardGrid },
    Fish(FishView),
}

/// Navigation between the home page and the category views.
pub struct Viewer<S: KeyValueStore> {
    loader: CatalogLoader,
    store: S,
}

impl<S: KeyValueStore> Viewer<S> {
    pub fn new(loader: CatalogLoader, store: S) -> Self {
        Self { loader, store }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn last_view(&self) -> Option<String> {
        self.store.get(keys::LAST_VIEW)
    }

    /// Opens `requested` if given, else the last stored view. Anything that is
    /// not a known category lands on the home page.
    pub async fn start(&mut self, requested: Option<&str>) -> Result<Screen> {
        let target = requested
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.last_view());
        match target.as_deref().and_then(Category::from_key) {
            Some(category) => self.show_category(category).await,
            None => self.show_home(),
        }
    }

    pub fn show_home(&mut self) -> Result<Screen> {
        self.store.set(keys::LAST_VIEW, HOME.to_string())?;
        Ok(Screen::Home)
    }

    /// Loads and renders a category. The view is only remembered once it rendered.
    pub async fn show_category(&mut self, category: Category) -> Result<Screen> {
        let items = self.loader.fetch(category).await?;
        let screen = match category {
            Category::Fish => Screen::Fish(FishView::new(items)),
            _ => Screen::Cards {
                category,
                grid: render_cards(&items, category),
            },
        };
        self.store.set(keys::LAST_VIEW, category.key().to_string())?;
        Ok(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::loader::DataSource;
    use crate::storage::MemoryStore;

    fn viewer_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Viewer<MemoryStore>) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let loader = CatalogLoader::new(DataSource::Directory(dir.path().to_path_buf()));
        (dir, Viewer::new(loader, MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_start_uses_stored_view() {
        let (_dir, mut viewer) = viewer_with(&[("fish.json", r#"[{"Name":"Trucha"}]"#)]);
        viewer.store_mut().set(keys::LAST_VIEW, "peces".into()).unwrap();

        let screen = viewer.start(None).await.unwrap();
        assert!(matches!(screen, Screen::Fish(ref view) if view.filtered_len() == 1));
    }

    #[tokio::test]
    async fn test_unknown_target_goes_home() {
        let (_dir, mut viewer) = viewer_with(&[]);
        let screen = viewer.start(Some("dragones")).await.unwrap();
        assert!(matches!(screen, Screen::Home));
        assert_eq!(viewer.last_view().as_deref(), Some(HOME));
    }

    #[tokio::test]
    async fn test_category_remembered_after_render() {
        let (_dir, mut viewer) = viewer_with(&[("crops.json", "oops")]);
        viewer.show_home().unwrap();

        assert!(viewer.show_category(Category::Crops).await.is_err());
        assert_eq!(viewer.last_view().as_deref(), Some(HOME));

        let screen = viewer.show_category(Category::Flowers).await.unwrap();
        assert!(matches!(screen, Screen::Cards { grid: CardGrid::Empty, .. }));
        assert_eq!(viewer.last_view().as_deref(), Some("flores"));
    }
}
