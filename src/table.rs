//! In-memory string tables and the delimited / parquet readers behind every
//! format stage.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::DataSourceError;
use crate::fs_util::open_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Byte(u8),
    /// Runs of spaces or tabs.
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first record after the skipped rows names the columns.
    Row,
    /// Columns are named by position: `0`, `1`, ...
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub delimiter: Delimiter,
    pub header: HeaderMode,
    pub skip_rows: usize,
    pub drop_index_column: bool,
}

impl ReadOptions {
    pub const fn csv() -> Self {
        Self {
            delimiter: Delimiter::Byte(b','),
            header: HeaderMode::Row,
            skip_rows: 0,
            drop_index_column: false,
        }
    }

    pub const fn tsv() -> Self {
        Self {
            delimiter: Delimiter::Byte(b'\t'),
            ..Self::csv()
        }
    }

    pub const fn whitespace() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
            ..Self::csv()
        }
    }

    pub const fn delimited(delimiter: u8) -> Self {
        Self {
            delimiter: Delimiter::Byte(delimiter),
            ..Self::csv()
        }
    }

    pub const fn no_header(mut self) -> Self {
        self.header = HeaderMode::None;
        self
    }

    pub const fn skip_rows(mut self, rows: usize) -> Self {
        self.skip_rows = rows;
        self
    }

    pub const fn drop_index_column(mut self) -> Self {
        self.drop_index_column = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    pub fn read_delimited(path: &Path, options: &ReadOptions) -> Result<Self, DataSourceError> {
        let records = match options.delimiter {
            Delimiter::Byte(delimiter) => read_byte_delimited(path, delimiter)?,
            Delimiter::Whitespace => read_whitespace_delimited(path)?,
        };
        let mut records = records.into_iter().skip(options.skip_rows);

        let header = match options.header {
            HeaderMode::Row => records.next().unwrap_or_default(),
            HeaderMode::None => Vec::new(),
        };
        let body: Vec<Vec<String>> = records.collect();
        let width = body
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(header.len());

        let mut columns = header;
        for position in columns.len()..width {
            columns.push(position.to_string());
        }

        let mut table = Self::new(columns);
        for row in body {
            table.push_row(row);
        }
        if options.drop_index_column {
            table.drop_column_at(0);
        }
        Ok(table)
    }

    pub fn read_parquet(path: &Path) -> Result<Self, DataSourceError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(open_file(path)?)
            .map_err(|err| DataSourceError::Parquet(format!("{}: {err}", path.display())))?;
        let columns: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        let reader = builder
            .build()
            .map_err(|err| DataSourceError::Parquet(err.to_string()))?;

        let options = FormatOptions::default().with_null("");
        let mut table = Self::new(columns);
        for batch in reader {
            let batch = batch.map_err(|err| DataSourceError::Parquet(err.to_string()))?;
            let formatters = batch
                .columns()
                .iter()
                .map(|array| ArrayFormatter::try_new(array.as_ref(), &options))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| DataSourceError::Parquet(err.to_string()))?;
            for row in 0..batch.num_rows() {
                table.push_row(
                    formatters
                        .iter()
                        .map(|formatter| formatter.value(row).to_string())
                        .collect(),
                );
            }
        }
        Ok(table)
    }

    pub fn rename(mut self, renames: &[(&str, &str)]) -> Self {
        for column in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from == column) {
                *column = (*to).to_string();
            }
        }
        self
    }

    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
        self
    }

    /// Drops rows whose cells are all empty.
    pub fn drop_empty_rows(mut self) -> Self {
        self.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        self
    }

    /// Rewrites float-looking whole numbers (`"12.0"`) in `name` as integers.
    pub fn normalize_integer_column(mut self, name: &str) -> Result<Self, DataSourceError> {
        let Some(index) = self.columns.iter().position(|column| column == name) else {
            return Err(DataSourceError::Table(format!("missing column '{name}'")));
        };
        for row in &mut self.rows {
            let cell = row[index].trim();
            if cell.is_empty() || cell.parse::<i64>().is_ok() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(value) if value.fract() == 0.0 => row[index] = format!("{}", value as i64),
                _ => {
                    return Err(DataSourceError::Table(format!(
                        "column '{name}' holds a non-integer value '{cell}'"
                    )));
                }
            }
        }
        Ok(self)
    }

    /// Row-wise union. The column set is the ordered union of every input's
    /// columns; cells a table does not have stay empty.
    pub fn concat(tables: Vec<Table>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(index, column)| (column.as_str(), index))
            .collect();

        let mut rows = Vec::with_capacity(tables.iter().map(Table::len).sum());
        for table in &tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|column| positions[column.as_str()])
                .collect();
            for row in &table.rows {
                let mut merged = vec![String::new(); columns.len()];
                for (cell, target) in row.iter().zip(&mapping) {
                    merged[*target] = cell.clone();
                }
                rows.push(merged);
            }
        }
        Self { columns, rows }
    }

    /// Column-wise join of the first column of each part, named by `names`.
    pub fn side_by_side(parts: Vec<(&str, Table)>) -> Result<Self, DataSourceError> {
        let length = parts.first().map(|(_, table)| table.len()).unwrap_or(0);
        if let Some((name, _)) = parts.iter().find(|(_, table)| table.len() != length) {
            return Err(DataSourceError::Table(format!(
                "column '{name}' has a different row count than its siblings"
            )));
        }
        let mut table = Self::new(parts.iter().map(|(name, _)| *name));
        for row in 0..length {
            table.push_row(
                parts
                    .iter()
                    .map(|(_, part)| part.rows[row].first().cloned().unwrap_or_default())
                    .collect(),
            );
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), DataSourceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
        }
        let mut writer = csv::WriterBuilder::new()
            .flexible(false)
            .from_path(path)
            .map_err(|err| DataSourceError::Table(format!("{}: {err}", path.display())))?;
        writer
            .write_record(&self.columns)
            .map_err(|err| DataSourceError::Table(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| DataSourceError::Table(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| DataSourceError::Filesystem(err.to_string()))
    }

    fn drop_column_at(&mut self, index: usize) {
        if index >= self.columns.len() {
            return;
        }
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
    }
}

fn read_byte_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>, DataSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(open_file(path)?);
    let mut records = Vec::new();
    for record in reader.byte_records() {
        let record =
            record.map_err(|err| DataSourceError::Table(format!("{}: {err}", path.display())))?;
        records.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(records)
}

fn read_whitespace_delimited(path: &Path) -> Result<Vec<Vec<String>>, DataSourceError> {
    let reader = BufReader::new(open_file(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line =
            line.map_err(|err| DataSourceError::Table(format!("{}: {err}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(line.split_whitespace().map(str::to_string).collect());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn headerless_columns_are_positional() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bb.smi", "CCO ZINC000001\nc1ccccc1  ZINC000002\n\n");
        let table = Table::read_delimited(&path, &ReadOptions::whitespace().no_header())
            .unwrap()
            .rename(&[("0", "smiles"), ("1", "id")]);
        assert_eq!(table.columns(), ["smiles", "id"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], ["c1ccccc1", "ZINC000002"]);
    }

    #[test]
    fn skip_rows_then_header_and_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "split.tsv",
            "comment\nother\n\tsource\ttarget\n0\tCC\tCO\n1\tCN\tCC\n",
        );
        let table = Table::read_delimited(
            &path,
            &ReadOptions::tsv().skip_rows(2).drop_index_column(),
        )
        .unwrap();
        assert_eq!(table.columns(), ["source", "target"]);
        assert_eq!(table.rows()[1], ["CN", "CC"]);
    }

    #[test]
    fn concat_unions_columns_in_first_seen_order() {
        let mut left = Table::new(["a", "b"]);
        left.push_row(vec!["1".into(), "2".into()]);
        let mut right = Table::new(["b", "c"]);
        right.push_row(vec!["3".into(), "4".into()]);

        let merged = Table::concat(vec![left, right]);
        assert_eq!(merged.columns(), ["a", "b", "c"]);
        assert_eq!(merged.rows()[0], ["1", "2", ""]);
        assert_eq!(merged.rows()[1], ["", "3", "4"]);
    }

    #[test]
    fn integer_column_normalization() {
        let mut table = Table::new(["ID", "rule"]);
        table.push_row(vec!["12.0".into(), "x".into()]);
        table.push_row(vec!["7".into(), "y".into()]);
        let table = table.normalize_integer_column("ID").unwrap();
        assert_eq!(table.column("ID").unwrap(), ["12", "7"]);
    }

    #[test]
    fn side_by_side_rejects_ragged_parts() {
        let mut one = Table::new(["0"]);
        one.push_row(vec!["a".into()]);
        let two = Table::new(["0"]);
        assert!(Table::side_by_side(vec![("targets", one), ("sources", two)]).is_err());
    }

    #[test]
    fn csv_output_quotes_embedded_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::new(["reaction_smiles", "file_name"]);
        table.push_row(vec!["CC>>CO |f:0,1|".into(), "a.txt".into()]);
        let path = dir.path().join("out.csv");
        table.write_csv(&path).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "reaction_smiles,file_name\n\"CC>>CO |f:0,1|\",a.txt\n"
        );
    }
}
