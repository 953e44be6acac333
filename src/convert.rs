//! Reshaping helpers for getting pasted or legacy data into the category JSON files.

use regex::Regex;
use serde_json::Value;

use crate::admin::document::Record;
use crate::error::{GuideError, Result};

/// Splits one pasted row into cells. Cells exported as `="..."` or `+="..."`
/// formulas are unwrapped.
fn parse_sheet_line(line: &str, formula: &Regex) -> Vec<String> {
    line.split('\t')
        .map(|cell| match formula.captures(cell) {
            Some(caps) => caps[1].to_string(),
            None => {
                let cell = cell
                    .strip_prefix("+=\"")
                    .or_else(|| cell.strip_prefix("+\""))
                    .unwrap_or(cell);
                cell.strip_suffix('"').unwrap_or(cell).to_string()
            }
        })
        .collect()
}

/// Turns tab-separated rows (first row = headers) into records. Missing cells
/// become empty strings; blank lines are skipped.
pub fn sheet_to_records(text: &str) -> Result<Vec<Record>> {
    let formula = Regex::new(r#"="([^"]*)""#).map_err(|e| GuideError::Custom(e.to_string()))?;
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(line) => parse_sheet_line(line, &formula),
        None => return Err(GuideError::Validation("no header row found".into())),
    };
    tracing::debug!("sheet headers: {headers:?}");

    let records = lines
        .map(|line| {
            let values = parse_sheet_line(line, &formula);
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).cloned().unwrap_or_default();
                    (header.clone(), Value::String(value))
                })
                .collect::<Record>()
        })
        .collect();
    Ok(records)
}

/// Pulls the array out of `NAME = [ ... ];` source text and parses it as strict
/// JSON, after dropping trailing commas.
pub fn array_literal_to_records(source: &str) -> Result<Vec<Record>> {
    let assignment =
        Regex::new(r"=\s*(\[[\s\S]*\])\s*;").map_err(|e| GuideError::Custom(e.to_string()))?;
    let trailing_comma =
        Regex::new(r",(\s*[\]}])").map_err(|e| GuideError::Custom(e.to_string()))?;

    let literal = assignment
        .captures(source)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| GuideError::Validation("no `= [...];` array found".into()))?;
    let repaired = trailing_comma.replace_all(&literal, "$1");
    Ok(serde_json::from_str(&repaired)?)
}

/// Adds an empty `Imagen` field to every record missing one. Returns how many changed.
pub fn add_image_field(records: &mut [Record]) -> usize {
    let mut added = 0;
    for record in records.iter_mut() {
        if !record.contains_key("Imagen") {
            record.insert("Imagen".into(), Value::String(String::new()));
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sheet_with_formula_cells() {
        let text = "=\"Receta\"\t=\"⭐ 1\"\r\n\r\n=\"Sopa\"\t=\"12\"\n+=\"Pan\"\n";
        let records = sheet_to_records(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(Value::Object(records[0].clone()), json!({"Receta": "Sopa", "⭐ 1": "12"}));
        assert_eq!(Value::Object(records[1].clone()), json!({"Receta": "Pan", "⭐ 1": ""}));
    }

    #[test]
    fn test_sheet_plain_cells() {
        let records = sheet_to_records("Nombre\tPrecio\nRosa\t5").unwrap();
        assert_eq!(records[0]["Precio"], json!("5"));
        assert!(sheet_to_records("\n  \n").is_err());
    }

    #[test]
    fn test_array_literal_trailing_commas() {
        let source = "const FISH_DATA = [\n  {\"Name\": \"Trucha\",},\n  {\"Name\": \"Carpa\"},\n];\n";
        let records = array_literal_to_records(source).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["Name"], json!("Carpa"));
    }

    #[test]
    fn test_array_literal_rejects_js_only_syntax() {
        assert!(array_literal_to_records("const X = [{Name: 'a'}];").is_err());
        assert!(array_literal_to_records("nothing here").is_err());
    }

    #[test]
    fn test_add_image_field() {
        let mut records: Vec<Record> = serde_json::from_value(json!([
            {"Nombre": "Rosa"},
            {"Nombre": "Tulipán", "Imagen": "imagenes/flores/tulipan.png"}
        ]))
        .unwrap();
        assert_eq!(add_image_field(&mut records), 1);
        assert_eq!(records[0]["Imagen"], json!(""));
        assert_eq!(records[1]["Imagen"], json!("imagenes/flores/tulipan.png"));
    }
}
