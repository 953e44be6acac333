use std::fmt;

use serde::Serialize;

use super::category::{Category, IMAGE_ROOT};
use crate::util::encode_uri_component;

/// Shown in the fish table when an entry has no image at all.
pub const FISH_FALLBACK_IMAGE: &str = "imagenes/peces/fish_icon.png";

const PLACEHOLDER_BASE: &str = "https://placehold.co/150x150/FFCCBC/5D4037";

/// What to put where an item's picture goes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ImageRef {
    /// A relative asset path or absolute URL.
    Source(String),
    /// A short glyph rendered as text.
    Glyph(String),
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Source(src) => f.write_str(src),
            ImageRef::Glyph(glyph) => f.write_str(glyph),
        }
    }
}

/// Inserts `folder` after the shared `imagenes/` prefix when a path lacks it.
///
/// Paths outside `imagenes/`, or already containing `/<folder>/`, are returned unchanged.
pub fn repair_image_path(path: &str, folder: &str) -> String {
    if path.starts_with(IMAGE_ROOT) && !path.contains(&format!("/{folder}/")) {
        format!("{IMAGE_ROOT}{folder}/{}", &path[IMAGE_ROOT.len()..])
    } else {
        path.to_string()
    }
}

/// Generated placeholder keyed by the first character of `name`.
pub fn placeholder_url(name: &str) -> String {
    let initial: String = name.chars().take(1).collect();
    format!("{PLACEHOLDER_BASE}?text={}", encode_uri_component(&initial))
}

/// Short tokens with no separator or extension are glyphs, not file names.
pub fn is_glyph_token(value: &str) -> bool {
    value.chars().count() < 5 && !value.contains('.') && !value.contains('/')
}

/// Image for a card in a generic category grid.
pub fn card_image(path: Option<&str>, category: Category, name: &str) -> ImageRef {
    match path {
        Some(path) => ImageRef::Source(repair_image_path(path, category.key())),
        None => ImageRef::Source(placeholder_url(name)),
    }
}

/// Image for a fish row or card.
pub fn fish_image(path: Option<&str>) -> ImageRef {
    match path {
        Some(token) if is_glyph_token(token) => ImageRef::Glyph(token.to_string()),
        Some(path) => ImageRef::Source(repair_image_path(path, Category::Fish.key())),
        None => ImageRef::Source(FISH_FALLBACK_IMAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_inserts_missing_folder_once() {
        let fixed = repair_image_path("imagenes/tarta.png", "recetas");
        assert_eq!(fixed, "imagenes/recetas/tarta.png");
        assert_eq!(fixed.matches("/recetas/").count(), 1);
        // A second pass is a no-op.
        assert_eq!(repair_image_path(&fixed, "recetas"), fixed);
    }

    #[test]
    fn test_repair_leaves_correct_and_foreign_paths() {
        assert_eq!(
            repair_image_path("imagenes/peces/trucha.png", "peces"),
            "imagenes/peces/trucha.png"
        );
        assert_eq!(
            repair_image_path("https://cdn.example/x.png", "peces"),
            "https://cdn.example/x.png"
        );
    }

    #[test]
    fn test_repair_holds_for_every_category() {
        for category in Category::ALL {
            let once = repair_image_path("imagenes/a/b.png", category.key());
            let twice = repair_image_path(&once, category.key());
            assert_eq!(once, twice);
            assert!(once.starts_with(&category.image_folder()));
        }
    }

    #[test]
    fn test_card_placeholder() {
        assert_eq!(
            card_image(None, Category::Flowers, "Rosa"),
            ImageRef::Source("https://placehold.co/150x150/FFCCBC/5D4037?text=R".into())
        );
        assert_eq!(
            placeholder_url("Ñandú"),
            "https://placehold.co/150x150/FFCCBC/5D4037?text=%C3%91"
        );
    }

    #[test]
    fn test_fish_glyph_and_fallback() {
        assert_eq!(fish_image(Some("🐟")), ImageRef::Glyph("🐟".into()));
        assert_eq!(
            fish_image(Some("imagenes/trucha.png")),
            ImageRef::Source("imagenes/peces/trucha.png".into())
        );
        assert_eq!(fish_image(None), ImageRef::Source(FISH_FALLBACK_IMAGE.into()));
        // Short but looks like a file.
        assert_eq!(fish_image(Some("a.pn")), ImageRef::Source("a.pn".into()));
    }
}
