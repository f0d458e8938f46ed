use serde_json::{Map, Value};
use std::path::Path;

/// CSV from a sequence of uniform flat records. The header row comes from the
/// first record's field names; every cell is JSON-stringified, so strings are
/// quoted and numbers/booleans are bare. Empty input yields an empty string.
pub fn to_csv(rows: &[Map<String, Value>]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let mut lines = vec![headers.join(",")];
    let empty = Value::String(String::new());
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| {
                let v = row.get(*h).unwrap_or(&empty);
                serde_json::to_string(v).unwrap_or_default()
            })
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

pub fn write_csv(out_path: &Path, rows: &[Map<String, Value>]) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out_path, to_csv(rows))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().expect("object row").clone()
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn cells_are_json_stringified() {
        let rows = vec![row(json!({ "a": 1, "b": "x" }))];
        assert_eq!(to_csv(&rows), "a,b\n1,\"x\"");
    }

    #[test]
    fn missing_fields_become_quoted_empty() {
        let rows = vec![
            row(json!({ "rollNo": "21CS01", "name": "Alex", "present": true })),
            row(json!({ "rollNo": "21CS02", "present": false })),
        ];
        assert_eq!(
            to_csv(&rows),
            "rollNo,name,present\n\"21CS01\",\"Alex\",true\n\"21CS02\",\"\",false"
        );
    }
}
