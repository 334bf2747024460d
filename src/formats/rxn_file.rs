use std::fs;
use std::path::Path;

use tracing::debug;

use crate::chem::ReactionBlockParser;
use crate::error::DataSourceError;

const RECORD_TAG: &str = "$RXN";

/// Reaction strings recovered from one file plus the number of records that
/// did not parse.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedRecords {
    pub reactions: Vec<String>,
    pub skipped: usize,
}

/// Splits text on the `$RXN` tag. Anything before the first tag (an RDF
/// header, for instance) is dropped and every record gets its tag back.
pub fn split_records(text: &str) -> Vec<String> {
    text.split(RECORD_TAG)
        .skip(1)
        .map(|body| format!("{RECORD_TAG}{body}"))
        .collect()
}

pub fn parse_records(text: &str, parser: &dyn ReactionBlockParser) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for (index, record) in split_records(text).iter().enumerate() {
        match parser.reaction_smiles(record) {
            Ok(smiles) if !smiles.is_empty() => parsed.reactions.push(smiles),
            Ok(_) => parsed.skipped += 1,
            Err(err) => {
                debug!(record = index, error = %err, "skipping reaction record");
                parsed.skipped += 1;
            }
        }
    }
    parsed
}

pub fn parse_file(path: &Path, parser: &dyn ReactionBlockParser) -> Result<ParsedRecords, DataSourceError> {
    let bytes = fs::read(path)
        .map_err(|err| DataSourceError::Filesystem(format!("{}: {err}", path.display())))?;
    Ok(parse_records(&String::from_utf8_lossy(&bytes), parser))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::{ChemError, MdlReactionParser};

    struct Echo;

    impl ReactionBlockParser for Echo {
        fn reaction_smiles(&self, block: &str) -> Result<String, ChemError> {
            let body = block.trim_start_matches(RECORD_TAG).trim();
            if body == "bad" {
                Err(ChemError::new("bad"))
            } else {
                Ok(body.to_string())
            }
        }
    }

    #[test]
    fn header_before_first_record_is_dropped() {
        let records = split_records("$RDFILE 1\n$DATM x\n$RXN\na\n$RXN\nb\n");
        assert_eq!(records, vec!["$RXN\na\n".to_string(), "$RXN\nb\n".to_string()]);
    }

    #[test]
    fn failures_and_empty_results_are_counted() {
        let parsed = parse_records("$RXN a $RXN bad $RXN  $RXN c", &Echo);
        assert_eq!(parsed.reactions, vec!["a", "c"]);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn parses_mdl_records() {
        let molfile = "\n  test\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0\nM  END\n";
        let text = format!(
            "$RDFILE 1\n$RFMT\n$RXN\n\n  demo\n\n  1  1\n$MOL\n{molfile}$MOL\n{molfile}$DTYPE note\n$DATUM x\n$RFMT\n$RXN\n\n\n\n  x  y\n"
        );
        let parsed = parse_records(&text, &MdlReactionParser);
        assert_eq!(parsed.reactions, vec!["C>>C".to_string()]);
        assert_eq!(parsed.skipped, 1);
    }
}
