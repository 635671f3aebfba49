use crate::engine::error::CelloError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Normalizes the almost-JSON that Cello writes into strict JSON.
///
/// Cello's netlists and some sensor libraries contain tab characters and
/// trailing commas (including one after the outermost value). All tabs are
/// dropped. Outside string literals, every comma followed only by whitespace
/// and a closing bracket, or by the end of input, is removed.
pub fn sanitize(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().filter(|&c| c != '\t').collect();
    let mut out = String::with_capacity(chars.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' if is_dangling_comma(&chars[i + 1..]) => {}
            _ => out.push(c),
        }
    }
    out
}

fn is_dangling_comma(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(&c) => c == ']' || c == '}',
    }
}

/// Parses a Cello JSON document from a string after [`sanitize`]-ing it.
pub fn from_str<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(&sanitize(raw))
}

/// Reads and parses a Cello JSON document from disk.
///
/// # Errors
///
/// Returns [`CelloError::Io`] if the file cannot be read and
/// [`CelloError::Parse`] if it is not valid JSON even after sanitizing.
pub fn read_path<T: DeserializeOwned>(path: &Path) -> Result<T, CelloError> {
    let content = std::fs::read_to_string(path).map_err(|e| CelloError::io(path, e))?;
    from_str(&content).map_err(|e| CelloError::parse(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn strips_tabs_and_trailing_commas() {
        let raw = "{\n\t\"nodes\": [\n\t\t{\"name\": \"a\",},\n\t\t{\"name\": \"b\"},\n\t],\n},\n";
        let value: Value = from_str(raw).unwrap();
        assert_eq!(value, json!({"nodes": [{"name": "a"}, {"name": "b"}]}));
    }

    #[test]
    fn leaves_commas_inside_strings_alone() {
        let raw = r#"{"label": "a,]", "note": "say \"hi,}\""}"#;
        let value: Value = from_str(raw).unwrap();
        assert_eq!(value["label"], "a,]");
        assert_eq!(value["note"], "say \"hi,}\"");
    }

    #[test]
    fn valid_json_is_unchanged() {
        let raw = r#"[{"collection": "models", "name": "LacI_sensor_model"}]"#;
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn read_path_distinguishes_io_and_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_path::<Value>(&missing),
            Err(CelloError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"nodes\": [").unwrap();
        assert!(matches!(
            read_path::<Value>(&broken),
            Err(CelloError::Parse { .. })
        ));
    }
}
