use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use super::category::Category;
use super::item::CatalogItem;
use crate::error::{GuideError, Result};

/// Items of one category in file order.
pub type CatalogCollection = Arc<Vec<CatalogItem>>;

/// Where category files are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Base URL; files are fetched as `<base>/<file>`.
    Http(String),
    /// Local directory holding the files.
    Directory(PathBuf),
}

impl DataSource {
    /// `http(s)://` prefixes select HTTP, anything else is a directory.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Http(location.trim_end_matches('/').to_string())
        } else {
            DataSource::Directory(crate::util::expand_tilde(location))
        }
    }
}

/// Fetches category files and keeps every successful result for the rest of the session.
pub struct CatalogLoader {
    source: DataSource,
    client: reqwest::Client,
    cache: HashMap<Category, CatalogCollection>,
}

impl CatalogLoader {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
            cache: HashMap::new(),
        }
    }

    pub fn is_cached(&self, category: Category) -> bool {
        self.cache.contains_key(&category)
    }

    /// Resolves a navigation key. Unknown keys have no data.
    pub async fn fetch_key(&mut self, key: &str) -> Result<CatalogCollection> {
        match Category::from_key(key) {
            Some(category) => self.fetch(category).await,
            None => {
                tracing::debug!("no data source for category key '{key}'");
                Ok(Arc::new(Vec::new()))
            }
        }
    }

    /// Returns the cached collection or loads it. Failures leave the cache untouched.
    pub async fn fetch(&mut self, category: Category) -> Result<CatalogCollection> {
        if let Some(items) = self.cache.get(&category) {
            tracing::debug!("cache hit for {category}");
            return Ok(Arc::clone(items));
        }

        let bytes = match self.read_source(category).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::info!("{category} has no data file");
                return Ok(Arc::new(Vec::new()));
            }
            Err(e) => {
                tracing::warn!("failed to load {category}: {e}");
                return Err(e);
            }
        };

        let values: Vec<Value> = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("{} is not a JSON array: {e}", category.file_name());
            GuideError::from(e)
        })?;
        let items: Vec<CatalogItem> = values
            .into_iter()
            .map(|value| CatalogItem::from_value(category, value))
            .collect();

        tracing::info!("loaded {} {category} items", items.len());
        let items = Arc::new(items);
        self.cache.insert(category, Arc::clone(&items));
        Ok(items)
    }

    /// Raw file contents, or `None` when the file does not exist.
    async fn read_source(&self, category: Category) -> Result<Option<Vec<u8>>> {
        match &self.source {
            DataSource::Http(base) => {
                let url = format!("{base}/{}", category.file_name());
                let response = self.client.get(&url).send().await?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    return Err(GuideError::HostRejection {
                        status: response.status().as_u16(),
                        message: format!("GET {url}"),
                    });
                }
                Ok(Some(response.bytes().await?.to_vec()))
            }
            DataSource::Directory(dir) => {
                let path = dir.join(category.file_name());
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_data_source_parse() {
        assert_eq!(
            DataSource::parse("https://example.com/data/"),
            DataSource::Http("https://example.com/data".into())
        );
        assert_eq!(
            DataSource::parse("site/data"),
            DataSource::Directory(PathBuf::from("site/data"))
        );
    }

    #[tokio::test]
    async fn test_second_fetch_uses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/fish.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"Name":"Trucha"},{"Name":"Carpa"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut loader = CatalogLoader::new(DataSource::Http(format!("{}/data", server.uri())));
        let first = loader.fetch(Category::Fish).await.unwrap();
        let second = loader.fetch_key("peces").await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/insects.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut loader = CatalogLoader::new(DataSource::Http(server.uri()));
        let err = loader.fetch(Category::Insects).await.unwrap_err();
        assert!(matches!(err, GuideError::HostRejection { status: 500, .. }));
        assert!(!loader.is_cached(Category::Insects));
    }

    #[tokio::test]
    async fn test_http_not_found_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crops.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let mut loader = CatalogLoader::new(DataSource::Http(server.uri()));
        assert!(loader.fetch(Category::Crops).await.unwrap().is_empty());
        assert!(!loader.is_cached(Category::Crops));
        assert!(loader.fetch_key("cultivos").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_source_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("flowers.json"),
            r#"[{"Nombre":"Rosa","⭐ 1":"5"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("crops.json"), "{not json").unwrap();

        let mut loader = CatalogLoader::new(DataSource::Directory(dir.path().to_path_buf()));
        let flowers = loader.fetch(Category::Flowers).await.unwrap();
        assert_eq!(flowers[0].display_name(), Some("Rosa"));

        let recipes = loader.fetch(Category::Recipes).await.unwrap();
        assert!(recipes.is_empty());
        assert!(!loader.is_cached(Category::Recipes));

        let err = loader.fetch(Category::Crops).await.unwrap_err();
        assert!(matches!(err, GuideError::Decode(_)));
        assert!(!loader.is_cached(Category::Crops));
    }

    #[tokio::test]
    async fn test_unknown_key_is_empty() {
        let mut loader = CatalogLoader::new(DataSource::Directory(PathBuf::from("/nonexistent")));
        assert!(loader.fetch_key("dragones").await.unwrap().is_empty());
    }
}
