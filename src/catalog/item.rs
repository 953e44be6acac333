use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::category::Category;

/// Fields any category file may carry. Every field is optional; values that
/// arrive as numbers or booleans are kept as their text form, and empty
/// strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    #[serde(rename = "Name", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Receta", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub receta: Option<String>,
    #[serde(rename = "Nombre", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(rename = "Imagen", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(rename = "Image", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "Ingredientes", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,

    #[serde(rename = "⭐ 1", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price_1: Option<String>,
    #[serde(rename = "⭐ 2", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price_2: Option<String>,
    #[serde(rename = "⭐ 3", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price_3: Option<String>,
    #[serde(rename = "⭐ 4", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price_4: Option<String>,
    #[serde(rename = "⭐ 5", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price_5: Option<String>,

    #[serde(rename = "Location", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "Weather", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(rename = "Time", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "Shadow", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub shadow: Option<String>,
    #[serde(rename = "Level", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(rename = "Unconfirmed", default, deserialize_with = "lenient_flag")]
    pub unconfirmed: bool,

    /// Anything the renderer does not know about, kept for completeness.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A catalog entry tagged with the category it was loaded from.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogItem {
    pub category: Category,
    pub fields: ItemFields,
}

impl CatalogItem {
    pub fn new(category: Category, fields: ItemFields) -> Self {
        Self { category, fields }
    }

    /// Builds an item from a raw JSON value; non-objects yield an empty item.
    pub fn from_value(category: Category, value: Value) -> Self {
        let fields = match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => ItemFields::default(),
        };
        Self { category, fields }
    }

    /// `Receta`, then `Nombre`, then `Name`.
    pub fn display_name(&self) -> Option<&str> {
        self.fields
            .receta
            .as_deref()
            .or(self.fields.nombre.as_deref())
            .or(self.fields.name.as_deref())
    }

    /// Name used by the fish table and as the checklist key.
    pub fn fish_name(&self) -> Option<&str> {
        self.fields.name.as_deref().or_else(|| self.display_name())
    }

    /// `Imagen`, then `Image`.
    pub fn image(&self) -> Option<&str> {
        self.fields
            .imagen
            .as_deref()
            .or(self.fields.image.as_deref())
    }

    /// Price per star tier, index 0 being one star.
    pub fn prices(&self) -> [Option<&str>; 5] {
        [
            self.fields.price_1.as_deref(),
            self.fields.price_2.as_deref(),
            self.fields.price_3.as_deref(),
            self.fields.price_4.as_deref(),
            self.fields.price_5.as_deref(),
        ]
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0"
        }
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fish_fields_parse() {
        let item = CatalogItem::from_value(
            Category::Fish,
            json!({
                "Name": "Trucha",
                "Location": "Río",
                "Weather": "Soleado",
                "Time": "Día",
                "Level": 3,
                "Unconfirmed": true,
                "Notas": "rara"
            }),
        );
        assert_eq!(item.fish_name(), Some("Trucha"));
        assert_eq!(item.fields.level.as_deref(), Some("3"));
        assert!(item.fields.unconfirmed);
        assert_eq!(item.fields.extra.get("Notas"), Some(&json!("rara")));
    }

    #[test]
    fn test_display_name_precedence() {
        let item = CatalogItem::from_value(
            Category::Recipes,
            json!({"Nombre": "Tarta", "Receta": "Pastel de manzana"}),
        );
        assert_eq!(item.display_name(), Some("Pastel de manzana"));

        let blank = CatalogItem::from_value(Category::Flowers, json!({"Nombre": "  "}));
        assert_eq!(blank.display_name(), None);
    }

    #[test]
    fn test_prices_and_image() {
        let item = CatalogItem::from_value(
            Category::Crops,
            json!({"Nombre": "Trigo", "⭐ 1": 10, "⭐ 2": "", "Image": "🌾"}),
        );
        assert_eq!(item.prices()[0], Some("10"));
        assert_eq!(item.prices()[1], None);
        assert_eq!(item.image(), Some("🌾"));
    }

    #[test]
    fn test_non_object_is_empty_item() {
        let item = CatalogItem::from_value(Category::Insects, json!(42));
        assert_eq!(item.fields, ItemFields::default());
    }

    #[test]
    fn test_unconfirmed_strings() {
        let yes = CatalogItem::from_value(Category::Fish, json!({"Unconfirmed": "x"}));
        let no = CatalogItem::from_value(Category::Fish, json!({"Unconfirmed": "false"}));
        assert!(yes.fields.unconfirmed);
        assert!(!no.fields.unconfirmed);
    }
}
