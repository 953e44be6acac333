use serde::Serialize;
use serde_json::{Number, Value};

use super::document::{Document, ItemId, Record};
use crate::error::{GuideError, Result};

pub const EMPTY_ITEM: &str = "El item no puede estar vacío.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum FieldInput {
    Text(String),
    /// Numbers stay numbers when the edited text still parses as one.
    Number(String),
    Choice(bool),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub input: FieldInput,
}

/// The create/edit form for one item. Saving never touches the remote file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    /// `None` when creating a new item.
    pub target: Option<ItemId>,
    pub fields: Vec<FormField>,
}

/// Fields offered for a new item in a file that has no items yet.
pub fn fallback_fields(path: &str) -> &'static [&'static str] {
    if path.contains("recipes") {
        &["Receta", "Imagen", "Ingredientes"]
    } else if path.contains("fish") {
        &["Name", "Location", "Image"]
    } else {
        &["Nombre"]
    }
}

fn input_for(value: Option<&Value>) -> FieldInput {
    match value {
        Some(Value::Bool(b)) => FieldInput::Choice(*b),
        Some(Value::Number(n)) => FieldInput::Number(n.to_string()),
        Some(Value::String(s)) => FieldInput::Text(s.clone()),
        Some(Value::Null) | None => FieldInput::Text(String::new()),
        Some(other) => FieldInput::Text(other.to_string()),
    }
}

impl EditForm {
    fn build(doc: &Document, target: Option<ItemId>, record: Option<&Record>) -> Self {
        let names = if doc.is_empty() {
            fallback_fields(doc.path())
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            doc.field_names()
        };
        let fields = names
            .into_iter()
            .map(|name| FormField {
                input: input_for(record.and_then(|r| r.get(&name))),
                name,
            })
            .collect();
        Self { target, fields }
    }

    /// Blank form with every field known to the file.
    pub fn for_new(doc: &Document) -> Self {
        Self::build(doc, None, None)
    }

    /// Form prefilled from an existing item.
    pub fn for_item(doc: &Document, id: ItemId) -> Result<Self> {
        let record = doc
            .get(id)
            .ok_or_else(|| GuideError::Custom("item no longer exists".into()))?;
        Ok(Self::build(doc, Some(id), Some(record)))
    }

    /// Sets a field from user text. Unknown names add a new text field.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<()> {
        let Some(position) = self.fields.iter().position(|f| f.name == name) else {
            self.fields.push(FormField {
                name: name.to_string(),
                input: FieldInput::Text(raw.to_string()),
            });
            return Ok(());
        };
        let field = &mut self.fields[position];
        field.input = match &field.input {
            FieldInput::Choice(_) => match raw.trim() {
                "true" => FieldInput::Choice(true),
                "false" => FieldInput::Choice(false),
                other => {
                    return Err(GuideError::Validation(format!(
                        "{name} must be true or false, got '{other}'"
                    )))
                }
            },
            FieldInput::Number(_) => FieldInput::Number(raw.to_string()),
            FieldInput::Text(_) => FieldInput::Text(raw.to_string()),
        };
        Ok(())
    }

    /// Builds the item to store. `"true"`/`"false"` become booleans and text is
    /// trimmed; an item where nothing has a value is refused and the form is kept.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = Record::new();
        let mut has_content = false;
        for field in &self.fields {
            let value = match &field.input {
                FieldInput::Choice(b) => Value::Bool(*b),
                FieldInput::Text(raw) | FieldInput::Number(raw) => {
                    let text = raw.trim();
                    match (text, &field.input) {
                        ("true", _) => Value::Bool(true),
                        ("false", _) => Value::Bool(false),
                        (_, FieldInput::Number(_)) => text
                            .parse::<Number>()
                            .map(Value::Number)
                            .unwrap_or_else(|_| Value::String(text.to_string())),
                        _ => Value::String(text.to_string()),
                    }
                }
            };
            has_content |= match &value {
                Value::Bool(b) => *b,
                Value::String(s) => !s.is_empty(),
                _ => true,
            };
            record.insert(field.name.clone(), value);
        }
        if !has_content {
            return Err(GuideError::Validation(EMPTY_ITEM.into()));
        }
        Ok(record)
    }
}
