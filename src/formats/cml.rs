//! Reaction records from the USPTO CML patent extracts.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::DataSourceError;
use crate::formats::map_files;
use crate::fs_util::walk_files;
use crate::table::Table;

pub const PATENT_NAMESPACE: &[u8] = b"http://bitbucket.org/dan2097";

pub const COLUMNS: [&str; 6] = [
    "year",
    "document_id",
    "paragraph_number",
    "heading_text",
    "paragraph_text",
    "reaction_smiles",
];

const SOURCE_FIELDS: [&str; 4] = ["documentId", "paragraphNum", "headingText", "paragraphText"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CmlReaction {
    pub document_id: Option<String>,
    pub paragraph_number: Option<String>,
    pub heading_text: Option<String>,
    pub paragraph_text: Option<String>,
    pub reaction_smiles: Option<String>,
}

impl CmlReaction {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Source(0) => &mut self.document_id,
            Field::Source(1) => &mut self.paragraph_number,
            Field::Source(2) => &mut self.heading_text,
            Field::Source(_) => &mut self.paragraph_text,
            Field::ReactionSmiles => &mut self.reaction_smiles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source(usize),
    ReactionSmiles,
}

/// Text of the element being read. Like ElementTree's `.text`, it stops
/// at the first child element.
#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
    sealed: bool,
}

#[derive(Debug, Clone)]
struct Element {
    patent: bool,
    local: String,
}

/// Parses every child of the document root as one reaction. Fields come from
/// `dl:source/dl:*` and `dl:reactionSmiles`; the first occurrence wins.
pub fn parse_reactions(text: &str) -> Result<Vec<CmlReaction>, DataSourceError> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut reactions = Vec::new();
    let mut current: Option<CmlReaction> = None;
    let mut capture: Option<Capture> = None;

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|err| DataSourceError::Xml(err.to_string()))?;
        match event {
            Event::Start(start) => {
                if let Some(open) = capture.as_mut() {
                    open.sealed = true;
                }
                stack.push(Element {
                    patent: matches!(resolved, ResolveResult::Bound(Namespace(ns)) if ns == PATENT_NAMESPACE),
                    local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                });
                if stack.len() == 2 {
                    current = Some(CmlReaction::default());
                }
                if capture.is_none() {
                    let field = field_at(&stack);
                    if let (Some(field), Some(reaction)) = (field, current.as_mut()) {
                        if reaction.slot(field).is_none() {
                            capture = Some(Capture {
                                field,
                                depth: stack.len(),
                                text: String::new(),
                                sealed: false,
                            });
                        }
                    }
                }
            }
            Event::Empty(_) => {
                if let Some(open) = capture.as_mut() {
                    open.sealed = true;
                }
                if stack.len() == 1 {
                    reactions.push(CmlReaction::default());
                }
            }
            Event::Text(text) => {
                if let Some(open) = capture.as_mut().filter(|open| !open.sealed) {
                    let value = text
                        .unescape()
                        .map_err(|err| DataSourceError::Xml(err.to_string()))?;
                    open.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(open) = capture.as_mut().filter(|open| !open.sealed) {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if capture.as_ref().is_some_and(|open| open.depth == stack.len()) {
                    if let (Some(done), Some(reaction)) = (capture.take(), current.as_mut()) {
                        *reaction.slot(done.field) = Some(done.text);
                    }
                }
                if stack.len() == 2 {
                    if let Some(reaction) = current.take() {
                        reactions.push(reaction);
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(reactions)
}

fn field_at(stack: &[Element]) -> Option<Field> {
    match stack {
        [_, _, smiles] if smiles.patent && smiles.local == "reactionSmiles" => Some(Field::ReactionSmiles),
        [_, _, source, field] if source.patent && source.local == "source" && field.patent => SOURCE_FIELDS
            .iter()
            .position(|name| *name == field.local)
            .map(Field::Source),
        _ => None,
    }
}

/// The year of a file is the name of the directory holding it.
pub fn year_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_rows(path: &Path) -> Result<Vec<Vec<String>>, DataSourceError> {
    let bytes = fs::read(path)
        .map_err(|err| DataSourceError::Filesystem(format!("{}: {err}", path.display())))?;
    let text = String::from_utf8_lossy(&bytes);
    let year = year_of(path);
    let reactions = parse_reactions(&text)
        .map_err(|err| DataSourceError::Xml(format!("{}: {err}", path.display())))?;
    Ok(reactions
        .into_iter()
        .map(|reaction| {
            vec![
                year.clone(),
                reaction.document_id.unwrap_or_default(),
                reaction.paragraph_number.unwrap_or_default(),
                reaction.heading_text.unwrap_or_default(),
                reaction.paragraph_text.unwrap_or_default(),
                reaction.reaction_smiles.unwrap_or_default(),
            ]
        })
        .collect())
}

/// Parses every `*.xml` under `roots` on `workers` threads.
pub fn read_roots(roots: &[PathBuf], workers: usize) -> Result<Table, DataSourceError> {
    let mut files = Vec::new();
    for root in roots {
        files.extend(walk_files(root, ".xml")?);
    }
    let mut table = Table::new(COLUMNS);
    for rows in map_files(&files, workers, file_rows)? {
        for row in rows? {
            table.push_row(row);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<reactionList xmlns="http://www.xml-cml.org/schema" xmlns:dl="http://bitbucket.org/dan2097">
  <reaction>
    <dl:source>
      <dl:documentId>US03930836</dl:documentId>
      <dl:headingText>Example 1</dl:headingText>
      <dl:paragraphNum>0012</dl:paragraphNum>
      <dl:paragraphText>A &amp; B were <i>mixed</i>.</dl:paragraphText>
    </dl:source>
    <dl:reactionSmiles>CC.O&gt;&gt;CCO</dl:reactionSmiles>
    <productList><product><dl:reactionSmiles>ignored</dl:reactionSmiles></product></productList>
  </reaction>
  <reaction>
    <source><documentId>not-namespaced</documentId></source>
  </reaction>
</reactionList>
"#;

    #[test]
    fn reads_namespaced_source_fields() {
        let reactions = parse_reactions(DOCUMENT).unwrap();
        assert_eq!(reactions.len(), 2);
        let first = &reactions[0];
        assert_eq!(first.document_id.as_deref(), Some("US03930836"));
        assert_eq!(first.paragraph_number.as_deref(), Some("0012"));
        assert_eq!(first.heading_text.as_deref(), Some("Example 1"));
        assert_eq!(first.paragraph_text.as_deref(), Some("A & B were "));
        assert_eq!(first.reaction_smiles.as_deref(), Some("CC.O>>CCO"));
        assert_eq!(reactions[1], CmlReaction::default());
    }

    #[test]
    fn year_comes_from_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let year_dir = dir.path().join("grants").join("1976");
        std::fs::create_dir_all(&year_dir).unwrap();
        std::fs::write(year_dir.join("pftaps19760106_wk01.xml"), DOCUMENT).unwrap();

        let table = read_roots(&[dir.path().join("grants"), dir.path().join("applications")], 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], "1976");
        assert_eq!(table.rows()[0][5], "CC.O>>CCO");
        assert_eq!(table.rows()[1][1], "");
    }
}
