pub mod cards;
pub mod category;
pub mod fish;
pub mod images;
pub mod item;
pub mod loader;
pub mod viewer;

pub use category::Category;
pub use item::CatalogItem;
pub use loader::{CatalogCollection, CatalogLoader, DataSource};
