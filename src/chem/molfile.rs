//! MDL V2000 connection tables and the `$RXN` blocks built from them.

use super::ChemError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub symbol: String,
    pub charge: i8,
    pub isotope: Option<u16>,
    pub map_number: u32,
    /// Unpaired electrons: 0 none, 1 doublet, 2 singlet or triplet.
    pub radical_electrons: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    Any,
}

impl BondOrder {
    /// Contribution to an atom's valence in half-bond units.
    pub fn half_units(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Any => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub reactants: Vec<Molecule>,
    pub products: Vec<Molecule>,
    pub agents: Vec<Molecule>,
}

/// Parses one V2000 molfile, header lines included. Reading stops at `M  END`.
pub fn parse_molfile(text: &str) -> Result<Molecule, ChemError> {
    let lines: Vec<&str> = text.lines().collect();
    parse_molfile_lines(&lines).map(|(molecule, _)| molecule)
}

/// Parses a V2000 `$RXN` block. Text after the last molecule is ignored.
pub fn parse_rxn_block(text: &str) -> Result<Reaction, ChemError> {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or_else(|| ChemError::new("empty reaction block"))?;
    let tag = lines[first].trim();
    if !tag.starts_with("$RXN") {
        return Err(ChemError::new("reaction block does not start with $RXN"));
    }
    if tag.contains("V3000") {
        return Err(ChemError::new("V3000 reaction blocks are not supported"));
    }

    let counts = lines
        .get(first + 4)
        .ok_or_else(|| ChemError::new("missing reaction counts line"))?;
    let (reactant_count, product_count, agent_count) = parse_rxn_counts(counts)?;

    let mut cursor = first + 5;
    let mut next_molecule = || -> Result<Molecule, ChemError> {
        while cursor < lines.len() && !lines[cursor].trim_start().starts_with("$MOL") {
            cursor += 1;
        }
        if cursor >= lines.len() {
            return Err(ChemError::new("fewer $MOL blocks than announced"));
        }
        cursor += 1;
        let (molecule, consumed) = parse_molfile_lines(&lines[cursor..])?;
        cursor += consumed;
        Ok(molecule)
    };

    let mut reaction = Reaction::default();
    for _ in 0..reactant_count {
        reaction.reactants.push(next_molecule()?);
    }
    for _ in 0..product_count {
        reaction.products.push(next_molecule()?);
    }
    for _ in 0..agent_count {
        reaction.agents.push(next_molecule()?);
    }
    Ok(reaction)
}

fn parse_rxn_counts(line: &str) -> Result<(usize, usize, usize), ChemError> {
    let fixed = [0..3, 3..6, 6..9].map(|range| fixed_field(line, range));
    let reactants = fixed[0].and_then(|field| field.parse().ok());
    let products = fixed[1].and_then(|field| field.parse().ok());
    if let (Some(reactants), Some(products)) = (reactants, products) {
        let agents = fixed[2].and_then(|field| field.parse().ok()).unwrap_or(0);
        return Ok((reactants, products, agents));
    }

    let tokens: Vec<usize> = line
        .split_whitespace()
        .map(|token| token.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| ChemError::new(format!("malformed reaction counts line '{line}'")))?;
    match tokens.as_slice() {
        [reactants, products] => Ok((*reactants, *products, 0)),
        [reactants, products, agents, ..] => Ok((*reactants, *products, *agents)),
        _ => Err(ChemError::new(format!("malformed reaction counts line '{line}'"))),
    }
}

/// Returns the molecule and the number of lines consumed, `M  END` included.
fn parse_molfile_lines(lines: &[&str]) -> Result<(Molecule, usize), ChemError> {
    let counts = lines
        .get(3)
        .ok_or_else(|| ChemError::new("molfile shorter than its header"))?;
    if counts.contains("V3000") {
        return Err(ChemError::new("V3000 molfiles are not supported"));
    }
    let atom_count = count_field(counts, 0..3)?;
    let bond_count = count_field(counts, 3..6)?;

    let mut molecule = Molecule::default();
    let atom_lines = lines
        .get(4..4 + atom_count)
        .ok_or_else(|| ChemError::new("molfile atom block is truncated"))?;
    for line in atom_lines {
        molecule.atoms.push(parse_atom_line(line)?);
    }

    let bond_start = 4 + atom_count;
    let bond_lines = lines
        .get(bond_start..bond_start + bond_count)
        .ok_or_else(|| ChemError::new("molfile bond block is truncated"))?;
    for line in bond_lines {
        let bond = parse_bond_line(line)?;
        if bond.begin >= atom_count || bond.end >= atom_count || bond.begin == bond.end {
            return Err(ChemError::new(format!("bond references unknown atom: '{line}'")));
        }
        molecule.bonds.push(bond);
    }

    let mut cursor = bond_start + bond_count;
    let mut properties_reset = false;
    while cursor < lines.len() {
        let line = lines[cursor];
        cursor += 1;
        if line.starts_with("M  END") {
            return Ok((molecule, cursor));
        }
        if line.starts_with("$MOL") || line.starts_with("$RXN") {
            // Some writers omit `M  END` before the next block.
            return Ok((molecule, cursor - 1));
        }
        if line.starts_with("A  ") || line.starts_with("G  ") || line.starts_with("V  ") {
            if !line.starts_with("V  ") {
                cursor += 1;
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("S  SKP") {
            cursor += rest.trim().parse::<usize>().unwrap_or(0);
            continue;
        }

        let property = line.get(0..6).unwrap_or("");
        match property {
            "M  CHG" | "M  RAD" => {
                if !properties_reset {
                    for atom in &mut molecule.atoms {
                        atom.charge = 0;
                        atom.radical_electrons = 0;
                    }
                    properties_reset = true;
                }
                for (index, value) in property_pairs(line, atom_count)? {
                    let atom = &mut molecule.atoms[index];
                    if property == "M  CHG" {
                        atom.charge = i8::try_from(value).map_err(|_| {
                            ChemError::new(format!("charge {value} out of range in '{line}'"))
                        })?;
                    } else {
                        atom.radical_electrons = match value {
                            2 => 1,
                            1 | 3 => 2,
                            _ => 0,
                        };
                    }
                }
            }
            "M  ISO" => {
                for (index, value) in property_pairs(line, atom_count)? {
                    molecule.atoms[index].isotope = u16::try_from(value).ok();
                }
            }
            _ => {}
        }
    }
    Ok((molecule, cursor))
}

fn parse_atom_line(line: &str) -> Result<Atom, ChemError> {
    let (symbol, charge_code, map_number) = if line.len() >= 34 {
        let symbol = fixed_field(line, 31..34).unwrap_or("");
        let charge_code = fixed_field(line, 36..39)
            .and_then(|field| field.parse::<u8>().ok())
            .unwrap_or(0);
        let map_number = fixed_field(line, 60..63)
            .and_then(|field| field.parse::<u32>().ok())
            .unwrap_or(0);
        (symbol.to_string(), charge_code, map_number)
    } else {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let symbol = tokens
            .get(3)
            .ok_or_else(|| ChemError::new(format!("malformed atom line '{line}'")))?;
        let charge_code = tokens
            .get(5)
            .and_then(|field| field.parse::<u8>().ok())
            .unwrap_or(0);
        (symbol.to_string(), charge_code, 0)
    };
    if symbol.is_empty() {
        return Err(ChemError::new(format!("atom line without a symbol '{line}'")));
    }

    let (charge, radical_electrons) = match charge_code {
        1 => (3, 0),
        2 => (2, 0),
        3 => (1, 0),
        4 => (0, 1),
        5 => (-1, 0),
        6 => (-2, 0),
        7 => (-3, 0),
        _ => (0, 0),
    };
    let (symbol, isotope) = match symbol.as_str() {
        "D" => ("H".to_string(), Some(2)),
        "T" => ("H".to_string(), Some(3)),
        _ => (symbol, None),
    };

    Ok(Atom {
        symbol,
        charge,
        isotope,
        map_number,
        radical_electrons,
    })
}

fn parse_bond_line(line: &str) -> Result<Bond, ChemError> {
    let fixed = [0..3, 3..6, 6..9].map(|range| {
        fixed_field(line, range).and_then(|field| field.parse::<usize>().ok())
    });
    let (begin, end, kind) = match fixed {
        [Some(begin), Some(end), Some(kind)] => (begin, end, kind),
        _ => {
            let tokens: Vec<usize> = line
                .split_whitespace()
                .take(3)
                .map(|token| token.parse::<usize>())
                .collect::<Result<_, _>>()
                .map_err(|_| ChemError::new(format!("malformed bond line '{line}'")))?;
            match tokens.as_slice() {
                [begin, end, kind] => (*begin, *end, *kind),
                _ => return Err(ChemError::new(format!("malformed bond line '{line}'"))),
            }
        }
    };
    let order = match kind {
        1 => BondOrder::Single,
        2 => BondOrder::Double,
        3 => BondOrder::Triple,
        4 => BondOrder::Aromatic,
        5..=8 => BondOrder::Any,
        _ => return Err(ChemError::new(format!("unknown bond type {kind}"))),
    };
    if begin == 0 || end == 0 {
        return Err(ChemError::new(format!("bond atom indices start at 1: '{line}'")));
    }
    Ok(Bond {
        begin: begin - 1,
        end: end - 1,
        order,
    })
}

/// `M  XXXnn8 aaa vvv ...` property lines as zero-based atom index and value.
fn property_pairs(line: &str, atom_count: usize) -> Result<Vec<(usize, i32)>, ChemError> {
    let malformed = || ChemError::new(format!("malformed property line '{line}'"));
    let mut tokens = line.get(6..).unwrap_or("").split_whitespace();
    let count: usize = tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(malformed)?;
    let values: Vec<i32> = tokens
        .map(|token| token.parse::<i32>().map_err(|_| malformed()))
        .collect::<Result<_, _>>()?;
    if count.checked_mul(2).is_none_or(|needed| values.len() < needed) {
        return Err(malformed());
    }
    values
        .chunks_exact(2)
        .take(count)
        .map(|pair| {
            let index = pair[0]
                .checked_sub(1)
                .and_then(|index| usize::try_from(index).ok())
                .ok_or_else(malformed)?;
            if index >= atom_count {
                return Err(malformed());
            }
            Ok((index, pair[1]))
        })
        .collect()
}

fn count_field(line: &str, range: std::ops::Range<usize>) -> Result<usize, ChemError> {
    if let Some(value) = fixed_field(line, range.clone()).and_then(|field| field.parse().ok()) {
        return Ok(value);
    }
    let position = range.start / 3;
    line.split_whitespace()
        .nth(position)
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| ChemError::new(format!("malformed counts line '{line}'")))
}

fn fixed_field(line: &str, range: std::ops::Range<usize>) -> Option<&str> {
    let end = range.end.min(line.len());
    let field = line.get(range.start..end)?.trim();
    (!field.is_empty()).then_some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const ETHANOL: &str = "\
ethanol
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  1  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  2  0  0
    2.5981    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  3  0  0
  1  2  1  0
  2  3  1  0
M  END
";

    #[test]
    fn reads_atoms_bonds_and_maps() {
        let molecule = parse_molfile(ETHANOL).unwrap();
        assert_eq!(molecule.atoms.len(), 3);
        assert_eq!(molecule.bonds.len(), 2);
        assert_eq!(molecule.atoms[2].symbol, "O");
        assert_eq!(molecule.atoms[2].map_number, 3);
        assert_eq!(molecule.bonds[1].begin, 1);
        assert_eq!(molecule.bonds[1].end, 2);
    }

    #[test]
    fn charge_property_overrides_atom_block() {
        let text = "\
acetate


  2  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  3  0  0  0  0  0  0  0  0  0  0
    1.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
M  CHG  1   2  -1
M  ISO  1   1  13
M  END
";
        let molecule = parse_molfile(text).unwrap();
        assert_eq!(molecule.atoms[0].charge, 0);
        assert_eq!(molecule.atoms[1].charge, -1);
        assert_eq!(molecule.atoms[0].isotope, Some(13));
    }

    fn ethanol_with(property: &str) -> String {
        ETHANOL.replace("M  END", &format!("{property}\nM  END"))
    }

    #[test]
    fn out_of_range_property_values_are_errors() {
        assert!(parse_molfile(&ethanol_with("M  CHG  1   1 200")).is_err());
        assert!(parse_molfile(&ethanol_with("M  CHG  1 -2147483648   1")).is_err());
        assert!(parse_molfile(&ethanol_with("M  ISO 9223372036854775807   1  13")).is_err());
        assert!(parse_molfile(&ethanol_with("M  CHG  1   4  -1")).is_err());
    }

    #[test]
    fn truncated_atom_block_is_an_error() {
        let text = "x\n\n\n  5  0  0  0  0  0  0  0  0  0999 V2000\n";
        assert!(parse_molfile(text).is_err());
    }

    #[test]
    fn rxn_block_reads_roles_in_order() {
        let block = format!("$RXN\n\n  test\n\n  1  1\n$MOL\n{ETHANOL}$MOL\n{ETHANOL}");
        let reaction = parse_rxn_block(&block).unwrap();
        assert_eq!(reaction.reactants.len(), 1);
        assert_eq!(reaction.products.len(), 1);
        assert!(reaction.agents.is_empty());
    }

    #[test]
    fn rxn_block_with_missing_molecule_fails() {
        let block = format!("$RXN\n\n\n\n  2  1\n$MOL\n{ETHANOL}");
        assert!(parse_rxn_block(&block).is_err());
    }
}
