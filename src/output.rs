use std::io::{self, Write};

use serde::Serialize;

use crate::pipeline::{BatchResult, RunResult, SourceList, VersionList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Plain,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_sources(result: &SourceList) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_versions(result: &VersionList) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_batch(result: &BatchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct PlainOutput;

impl PlainOutput {
    pub fn print_sources(result: &SourceList) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for source in &result.sources {
            writeln!(stdout, "{source}")?;
        }
        Ok(())
    }

    pub fn print_versions(result: &VersionList) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        let width = result
            .versions
            .iter()
            .map(|entry| entry.version.len())
            .max()
            .unwrap_or(0);
        for entry in &result.versions {
            writeln!(stdout, "{:<width$}  {}", entry.version, entry.citation)?;
        }
        Ok(())
    }

    pub fn print_run(result: &RunResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        write_run(&mut stdout, result)
    }

    pub fn print_batch(result: &BatchResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for run in &result.runs {
            write_run(&mut stdout, run)?;
        }
        writeln!(stdout, "{} runs completed", result.runs.len())
    }
}

fn write_run(out: &mut impl Write, result: &RunResult) -> io::Result<()> {
    writeln!(
        out,
        "{}:{}:{} -> {} ({} rows, {} skipped)",
        result.category,
        result.source,
        result.version,
        result.output_path,
        result.rows_written,
        result.skipped_records
    )?;
    if let Some(staging) = &result.staging_directory {
        writeln!(out, "  staging kept at {staging}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    #[test]
    fn run_line_names_the_output() {
        let result = RunResult {
            category: Category::Reaction,
            source: "crd".to_string(),
            version: "v_reaction_smiles_2001_to_2021".to_string(),
            output_path: "data/x.csv".to_string(),
            rows_written: 3,
            skipped_records: 1,
            staging_directory: None,
        };
        let mut buffer = Vec::new();
        write_run(&mut buffer, &result).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "reaction:crd:v_reaction_smiles_2001_to_2021 -> data/x.csv (3 rows, 1 skipped)\n"
        );
    }
}
