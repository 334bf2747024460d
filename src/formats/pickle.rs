//! Python pickle files: a stream of tuples and a lookup dictionary.

use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_pickle::{DeOptions, Deserializer, ErrorCode, HashableValue, Value};

use crate::error::DataSourceError;
use crate::fs_util::open_file;

/// Reads pickles written back to back until the stream ends.
pub fn read_stream<R: Read>(reader: R) -> Result<Vec<Value>, DataSourceError> {
    let mut deserializer = Deserializer::new(reader, DeOptions::new().decode_strings());
    let mut values = Vec::new();
    loop {
        match deserializer.deserialize_value() {
            Ok(value) => values.push(value),
            Err(serde_pickle::Error::Eval(ErrorCode::EOFWhileParsing, _)) => break,
            Err(serde_pickle::Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(DataSourceError::Pickle(err.to_string())),
        }
    }
    Ok(values)
}

pub fn read_stream_file(path: &Path) -> Result<Vec<Value>, DataSourceError> {
    read_stream(BufReader::new(open_file(path)?))
        .map_err(|err| DataSourceError::Pickle(format!("{}: {err}", path.display())))
}

/// Reads a single pickled dictionary with every key and value rendered as text.
pub fn read_string_map(path: &Path) -> Result<HashMap<String, String>, DataSourceError> {
    let value = serde_pickle::value_from_reader(
        BufReader::new(open_file(path)?),
        DeOptions::new().decode_strings(),
    )
    .map_err(|err| DataSourceError::Pickle(format!("{}: {err}", path.display())))?;
    match value {
        Value::Dict(entries) => Ok(entries
            .into_iter()
            .map(|(key, value)| (hashable_text(&key), value_text(&value)))
            .collect()),
        _ => Err(DataSourceError::Pickle(format!(
            "{}: expected a dictionary",
            path.display()
        ))),
    }
}

/// The fields of a tuple or list value rendered as text.
pub fn record_fields(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Tuple(items) | Value::List(items) => Some(items.iter().map(value_text).collect()),
        _ => None,
    }
}

/// Text form of a scalar, close to what `str()` prints in Python.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::None => String::new(),
        Value::Bool(flag) => if *flag { "True" } else { "False" }.to_string(),
        Value::I64(number) => number.to_string(),
        Value::Int(number) => number.to_string(),
        Value::F64(number) => number.to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::String(text) => text.clone(),
        other => format!("{other:?}"),
    }
}

fn hashable_text(value: &HashableValue) -> String {
    value_text(&value.clone().into_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    // protocol 2: ('CC>>C', 'US1', '1.2.3') twice, then a dict
    fn tuple_pickle(smiles: &str) -> Vec<u8> {
        let mut bytes = vec![0x80, 0x02];
        for text in [smiles, "US1", "1.2.3"] {
            bytes.push(b'X');
            bytes.extend((text.len() as u32).to_le_bytes());
            bytes.extend(text.as_bytes());
        }
        bytes.extend([0x87, b'.']);
        bytes
    }

    #[test]
    fn reads_back_to_back_pickles() {
        let mut stream = tuple_pickle("CC>>C");
        stream.extend(tuple_pickle("O>>O"));
        let values = read_stream(stream.as_slice()).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(
            record_fields(&values[1]).unwrap(),
            vec!["O>>O".to_string(), "US1".to_string(), "1.2.3".to_string()]
        );
    }

    #[test]
    fn reads_a_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.pkl");
        // {'1.2.3': 'Amide coupling'}
        let mut bytes = vec![0x80, 0x02, b'}', b'X'];
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(b"1.2.3");
        bytes.push(b'X');
        bytes.extend(14u32.to_le_bytes());
        bytes.extend(b"Amide coupling");
        bytes.extend([b's', b'.']);
        std::fs::write(&path, bytes).unwrap();

        let names = read_string_map(&path).unwrap();
        assert_eq!(names.get("1.2.3").map(String::as_str), Some("Amide coupling"));
    }
}
