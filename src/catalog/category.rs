use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Folder every item image lives under.
pub const IMAGE_ROOT: &str = "imagenes/";

/// One of the five content domains, each backed by one JSON file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "recetas")]
    Recipes,
    #[serde(rename = "insectos")]
    Insects,
    #[serde(rename = "peces")]
    Fish,
    #[serde(rename = "cultivos")]
    Crops,
    #[serde(rename = "flores")]
    Flowers,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Recipes,
        Category::Insects,
        Category::Fish,
        Category::Crops,
        Category::Flowers,
    ];

    /// Key used in navigation, storage and image subfolders.
    pub fn key(self) -> &'static str {
        match self {
            Category::Recipes => "recetas",
            Category::Insects => "insectos",
            Category::Fish => "peces",
            Category::Crops => "cultivos",
            Category::Flowers => "flores",
        }
    }

    /// Looks up a category by key. Unknown keys are not an error, just no category.
    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Data file name relative to the data source root.
    pub fn file_name(self) -> &'static str {
        match self {
            Category::Recipes => "recipes.json",
            Category::Insects => "insects.json",
            Category::Fish => "fish.json",
            Category::Crops => "crops.json",
            Category::Flowers => "flowers.json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Recipes => "Recetas",
            Category::Insects => "Insectos",
            Category::Fish => "Peces",
            Category::Crops => "Cultivos",
            Category::Flowers => "Flores",
        }
    }

    /// `imagenes/<key>/`
    pub fn image_folder(self) -> String {
        format!("{IMAGE_ROOT}{}/", self.key())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_key(s).ok_or_else(|| {
            let known: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
            format!("unknown category '{s}' (expected one of: {})", known.join(", "))
        })
    }
}
