use crate::core::io::lenient_json;
use crate::engine::error::CelloError;
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const SENSOR_COLLECTION: &str = "input_sensors";

/// Each input signal is described by three records in different collections,
/// whose names share the signal name as prefix.
const SIGNAL_RECORDS: [(&str, &str); 3] = [
    (SENSOR_COLLECTION, "_sensor"),
    ("models", "_sensor_model"),
    ("structures", "_sensor_structure"),
];

/// An input sensor library (`<chassis>.input.json`).
///
/// The library is a flat JSON array of records tagged by a `collection` field.
/// Records are kept as opaque JSON values so that fields this crate does not
/// understand survive a rewrite unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorLibrary {
    records: Vec<Value>,
}

impl SensorLibrary {
    /// Loads a sensor library from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CelloError::Parse`] if the file is not a JSON array.
    pub fn load(path: &Path) -> Result<Self, CelloError> {
        let value: Value = lenient_json::read_path(path)?;
        Self::from_value(value).map_err(|message| CelloError::parse(path, message))
    }

    /// Builds a library from an already parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(records) => Ok(Self { records }),
            other => Err(format!(
                "expected a JSON array of records, found {}",
                json_kind(&other)
            )),
        }
    }

    /// Returns the raw records.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Returns the signal names in file order.
    ///
    /// A signal name is the part of an `input_sensors` record name that
    /// precedes the first underscore, e.g. `LacI` for `LacI_sensor`.
    pub fn signal_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| collection_of(r) == Some(SENSOR_COLLECTION))
            .filter_map(name_of)
            .map(|name| name.split('_').next().unwrap_or(name).to_string())
            .collect()
    }

    /// Returns a copy of the library restricted to `signals`.
    ///
    /// Sensor, model and structure records of signals not listed are removed.
    /// Records of any other collection are kept. Unknown names are not
    /// validated here.
    ///
    /// # Arguments
    ///
    /// * `signals` - The signal names to keep.
    ///
    /// # Return
    ///
    /// Returns the pruned library.
    pub fn retain_signals<S: AsRef<str>>(&self, signals: &[S]) -> Self {
        let records = self
            .records
            .iter()
            .filter(|record| {
                let Some(collection) = collection_of(record) else {
                    return true;
                };
                let Some((_, suffix)) = SIGNAL_RECORDS.iter().find(|(c, _)| *c == collection)
                else {
                    return true;
                };
                let name = name_of(record).unwrap_or_default();
                signals
                    .iter()
                    .any(|s| name.strip_suffix(suffix) == Some(s.as_ref()))
            })
            .cloned()
            .collect();
        Self { records }
    }

    /// Writes the library as strict JSON.
    pub fn write(&self, path: &Path) -> Result<(), CelloError> {
        let file = File::create(path).map_err(|e| CelloError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.records)
            .map_err(|e| CelloError::io(path, e.into()))?;
        std::io::Write::flush(&mut writer).map_err(|e| CelloError::io(path, e))
    }
}

fn collection_of(record: &Value) -> Option<&str> {
    record.get("collection").and_then(Value::as_str)
}

fn name_of(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
