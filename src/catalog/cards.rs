use std::fmt;

use serde::Serialize;

use super::category::Category;
use super::images::{card_image, ImageRef};
use super::item::CatalogItem;

pub const UNNAMED: &str = "Sin Nombre";
pub const EMPTY_MESSAGE: &str = "No hay datos disponibles.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceRow {
    /// `★` repeated once per tier.
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub name: String,
    pub image: ImageRef,
    pub ingredients: Option<String>,
    pub prices: Vec<PriceRow>,
}

/// Rendered grid for a generic category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "cards")]
pub enum CardGrid {
    Empty,
    Cards(Vec<Card>),
}

/// Zero and blank prices are left out rather than shown as zero.
fn price_rows(item: &CatalogItem) -> Vec<PriceRow> {
    item.prices()
        .iter()
        .enumerate()
        .filter_map(|(tier, price)| {
            let value = price.map(str::trim).filter(|p| !p.is_empty() && *p != "0")?;
            Some(PriceRow {
                label: "★".repeat(tier + 1),
                value: value.to_string(),
            })
        })
        .collect()
}

pub fn render_card(item: &CatalogItem, category: Category) -> Card {
    let name = item.display_name().unwrap_or(UNNAMED).to_string();
    Card {
        image: card_image(item.image(), category, &name),
        ingredients: item.fields.ingredients.clone(),
        prices: price_rows(item),
        name,
    }
}

/// Renders the whole collection at once, in file order.
pub fn render_cards(items: &[CatalogItem], category: Category) -> CardGrid {
    if items.is_empty() {
        return CardGrid::Empty;
    }
    CardGrid::Cards(items.iter().map(|item| render_card(item, category)).collect())
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  imagen: {}", self.image)?;
        if let Some(ingredients) = &self.ingredients {
            writeln!(f, "  ingredientes: {ingredients}")?;
        }
        for row in &self.prices {
            writeln!(f, "  {:<5} {}", row.label, row.value)?;
        }
        Ok(())
    }
}

impl fmt::Display for CardGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardGrid::Empty => writeln!(f, "{EMPTY_MESSAGE}"),
            CardGrid::Cards(cards) => cards.iter().try_for_each(|card| write!(f, "{card}")),
        }
    }
}
