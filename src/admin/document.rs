use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GuideError, Result};

/// One item of an edited file, with its fields in file order.
pub type Record = Map<String, Value>;

/// Session-local identity assigned when the file is loaded. Positions are only
/// used at the table boundary; everything else addresses items by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(u64);

/// The decoded array of a content file.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    path: String,
    entries: Vec<(ItemId, Record)>,
    next_id: u64,
}

impl Document {
    /// Strict parse: the text must be a JSON array of objects.
    pub fn parse(path: &str, text: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(text)?;
        Ok(Self::from_records(path, records))
    }

    pub fn from_records(path: &str, records: Vec<Record>) -> Self {
        let mut doc = Self {
            path: path.to_string(),
            entries: Vec::with_capacity(records.len()),
            next_id: 0,
        };
        for record in records {
            doc.create(record);
        }
        doc
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|(_, record)| record)
    }

    pub fn get(&self, id: ItemId) -> Option<&Record> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, record)| record)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.entries.iter().position(|(entry_id, _)| *entry_id == id)
    }

    pub fn id_at(&self, index: usize) -> Result<ItemId> {
        self.entries
            .get(index)
            .map(|(id, _)| *id)
            .ok_or(GuideError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Field names across all items, in the order they are first seen.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for key in self.records().flat_map(|record| record.keys()) {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
        names
    }

    /// Appends an item and returns its new id.
    pub fn create(&mut self, record: Record) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, record));
        id
    }

    /// Replaces an item in place, keeping its position.
    pub fn update(&mut self, id: ItemId, record: Record) -> Result<()> {
        let index = self.require(id)?;
        self.entries[index].1 = record;
        Ok(())
    }

    pub fn delete(&mut self, id: ItemId) -> Result<Record> {
        let index = self.require(id)?;
        Ok(self.entries.remove(index).1)
    }

    pub fn update_at(&mut self, index: usize, record: Record) -> Result<()> {
        let id = self.id_at(index)?;
        self.update(id, record)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Record> {
        let id = self.id_at(index)?;
        self.delete(id)
    }

    fn require(&self, id: ItemId) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| GuideError::Custom(format!("item {} no longer exists", id.0)))
    }

    /// Serialized file body: a JSON array indented by four spaces.
    pub fn to_json(&self) -> Result<String> {
        let records: Vec<&Record> = self.records().collect();
        to_pretty_json(&records)
    }
}

/// JSON indented by four spaces, the layout the data files are kept in.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| GuideError::Custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn sample() -> Document {
        Document::parse(
            "data/fish.json",
            r#"[{"Name":"Trucha","Location":"Río"},{"Name":"Carpa","Level":2},{"Name":"Lucio","Unconfirmed":true}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_is_strict() {
        assert!(matches!(Document::parse("x.json", "[{]"), Err(GuideError::Decode(_))));
        assert!(matches!(Document::parse("x.json", "{}"), Err(GuideError::Decode(_))));
        assert!(matches!(Document::parse("x.json", "[1, 2]"), Err(GuideError::Decode(_))));
        assert!(Document::parse("x.json", "[]").unwrap().is_empty());
    }

    #[test]
    fn test_ids_survive_deletes() {
        let mut doc = sample();
        let lucio = doc.id_at(2).unwrap();
        doc.delete_at(0).unwrap();
        assert_eq!(doc.index_of(lucio), Some(1));
        doc.update(lucio, record(json!({"Name": "Lucio grande"}))).unwrap();
        assert_eq!(doc.get(lucio).unwrap()["Name"], json!("Lucio grande"));

        let removed = doc.delete(lucio).unwrap();
        assert_eq!(removed["Name"], json!("Lucio grande"));
        assert!(doc.update(lucio, Record::new()).is_err());
    }

    #[test]
    fn test_new_ids_are_unique() {
        let mut doc = sample();
        let last = doc.id_at(2).unwrap();
        doc.delete(last).unwrap();
        let fresh = doc.create(record(json!({"Name": "Perca"})));
        assert_ne!(fresh, last);
        assert_eq!(doc.index_of(fresh), Some(2));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut doc = sample();
        assert!(matches!(
            doc.delete_at(3),
            Err(GuideError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_field_names_first_seen() {
        assert_eq!(
            sample().field_names(),
            ["Name", "Location", "Level", "Unconfirmed"]
        );
    }

    #[test]
    fn test_to_json_preserves_order_and_indent() {
        let doc = Document::parse("x.json", r#"[{"b":1,"a":"ñ"}]"#).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            "[\n    {\n        \"b\": 1,\n        \"a\": \"ñ\"\n    }\n]"
        );
        let reparsed = Document::parse("x.json", &doc.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.records().collect::<Vec<_>>(), doc.records().collect::<Vec<_>>());
    }
}
