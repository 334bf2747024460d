//! SMILES output for parsed connection tables.
//!
//! Atoms are ranked by iterative neighbourhood refinement so the written
//! string does not depend on the atom order of the input block. Stereo is not
//! perceived.

use std::collections::{BTreeSet, HashMap};

use super::elements::{atomic_number, can_be_aromatic, default_valences, in_organic_subset};
use super::molfile::{BondOrder, Molecule, Reaction};

pub fn reaction_smiles(reaction: &Reaction) -> String {
    let side = |molecules: &[Molecule]| {
        molecules
            .iter()
            .map(molecule_smiles)
            .filter(|smiles| !smiles.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    };
    format!(
        "{}>{}>{}",
        side(&reaction.reactants),
        side(&reaction.agents),
        side(&reaction.products)
    )
}

pub fn molecule_smiles(molecule: &Molecule) -> String {
    if molecule.atoms.is_empty() {
        return String::new();
    }
    let graph = Graph::new(molecule);
    let ranks = graph.canonical_ranks();

    let mut writer = Writer::new(&graph, &ranks);
    let mut fragments = Vec::new();
    let mut order: Vec<usize> = (0..graph.len()).collect();
    order.sort_by_key(|atom| ranks[*atom]);
    for start in order {
        if writer.visited[start] {
            continue;
        }
        fragments.push(writer.fragment(start));
    }
    fragments.sort();
    fragments.join(".")
}

struct Graph<'a> {
    molecule: &'a Molecule,
    neighbors: Vec<Vec<(usize, usize)>>,
    aromatic: Vec<bool>,
    hydrogens: Vec<u8>,
}

impl<'a> Graph<'a> {
    fn new(molecule: &'a Molecule) -> Self {
        let count = molecule.atoms.len();
        let mut neighbors = vec![Vec::new(); count];
        let mut aromatic = vec![false; count];
        let mut half_units = vec![0u16; count];
        for (index, bond) in molecule.bonds.iter().enumerate() {
            neighbors[bond.begin].push((bond.end, index));
            neighbors[bond.end].push((bond.begin, index));
            half_units[bond.begin] += u16::from(bond.order.half_units());
            half_units[bond.end] += u16::from(bond.order.half_units());
            if bond.order == BondOrder::Aromatic {
                aromatic[bond.begin] = true;
                aromatic[bond.end] = true;
            }
        }
        for (index, atom) in molecule.atoms.iter().enumerate() {
            aromatic[index] &= can_be_aromatic(&atom.symbol);
        }
        let hydrogens = molecule
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                implicit_hydrogens(
                    atomic_number(&atom.symbol),
                    atom.charge,
                    atom.radical_electrons,
                    half_units[index] / 2,
                )
            })
            .collect();
        Self {
            molecule,
            neighbors,
            aromatic,
            hydrogens,
        }
    }

    fn len(&self) -> usize {
        self.molecule.atoms.len()
    }

    fn canonical_ranks(&self) -> Vec<usize> {
        let invariants: Vec<_> = self
            .molecule
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                (
                    atomic_number(&atom.symbol),
                    atom.symbol.clone(),
                    self.neighbors[index].len(),
                    self.hydrogens[index],
                    atom.charge,
                    atom.isotope.unwrap_or(0),
                    self.aromatic[index],
                    atom.map_number,
                )
            })
            .collect();
        let mut ranks = dense_ranks(&invariants);
        loop {
            ranks = self.refine(ranks);
            let distinct = ranks.iter().collect::<BTreeSet<_>>().len();
            if distinct == ranks.len() {
                return ranks;
            }
            // Break the first tie by input position and refine again.
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for rank in &ranks {
                *counts.entry(*rank).or_default() += 1;
            }
            let Some(tied) = ranks
                .iter()
                .copied()
                .filter(|rank| counts[rank] > 1)
                .min()
            else {
                return ranks;
            };
            let Some(chosen) = ranks.iter().position(|rank| *rank == tied) else {
                return ranks;
            };
            let keys: Vec<(usize, u8)> = ranks
                .iter()
                .enumerate()
                .map(|(index, rank)| (*rank, u8::from(index != chosen)))
                .collect();
            ranks = dense_ranks(&keys);
        }
    }

    fn refine(&self, mut ranks: Vec<usize>) -> Vec<usize> {
        let mut distinct = ranks.iter().collect::<BTreeSet<_>>().len();
        loop {
            let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = (0..self.len())
                .map(|atom| {
                    let mut around: Vec<(usize, BondOrder)> = self.neighbors[atom]
                        .iter()
                        .map(|(neighbor, bond)| (ranks[*neighbor], self.molecule.bonds[*bond].order))
                        .collect();
                    around.sort();
                    (ranks[atom], around)
                })
                .collect();
            let next = dense_ranks(&keys);
            let next_distinct = next.iter().collect::<BTreeSet<_>>().len();
            if next_distinct == distinct {
                return next;
            }
            distinct = next_distinct;
            ranks = next;
        }
    }

    fn atom_text(&self, atom: usize) -> String {
        let data = &self.molecule.atoms[atom];
        let aromatic = self.aromatic[atom];
        let symbol = match (data.symbol.as_str(), atomic_number(&data.symbol)) {
            (_, 0) => "*".to_string(),
            (symbol, _) if aromatic => symbol.to_ascii_lowercase(),
            (symbol, _) => symbol.to_string(),
        };

        let bare = data.charge == 0
            && data.isotope.is_none()
            && data.map_number == 0
            && data.radical_electrons == 0
            && (symbol == "*" || in_organic_subset(&data.symbol));
        if bare {
            return symbol;
        }

        let mut text = String::from("[");
        if let Some(isotope) = data.isotope {
            text.push_str(&isotope.to_string());
        }
        text.push_str(&symbol);
        match self.hydrogens[atom] {
            0 => {}
            1 => text.push('H'),
            count => text.push_str(&format!("H{count}")),
        }
        match data.charge {
            0 => {}
            1 => text.push('+'),
            -1 => text.push('-'),
            charge if charge > 0 => text.push_str(&format!("+{charge}")),
            charge => text.push_str(&format!("-{}", -i16::from(charge))),
        }
        if data.map_number > 0 {
            text.push_str(&format!(":{}", data.map_number));
        }
        text.push(']');
        text
    }

    fn bond_text(&self, bond: usize) -> &'static str {
        let bond = &self.molecule.bonds[bond];
        let both_aromatic = self.aromatic[bond.begin] && self.aromatic[bond.end];
        match bond.order {
            BondOrder::Single if both_aromatic => "-",
            BondOrder::Single => "",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Aromatic if both_aromatic => "",
            BondOrder::Aromatic => ":",
            BondOrder::Any => "~",
        }
    }
}

fn implicit_hydrogens(atomic_number: u8, charge: i8, radicals: u8, valence: u16) -> u8 {
    if atomic_number == 0 {
        return 0;
    }
    // Charged atoms take the valences of their isoelectronic neighbour.
    let effective = i16::from(atomic_number) - i16::from(charge);
    let Ok(effective) = u8::try_from(effective) else {
        return 0;
    };
    let used = valence + u16::from(radicals);
    default_valences(effective)
        .iter()
        .map(|allowed| u16::from(*allowed))
        .find(|allowed| *allowed >= used)
        .map(|allowed| (allowed - used) as u8)
        .unwrap_or(0)
}

fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut sorted: Vec<&K> = keys.iter().collect();
    sorted.sort();
    sorted.dedup();
    keys.iter()
        .map(|key| sorted.partition_point(|other| *other < key))
        .collect()
}

struct Writer<'g, 'a> {
    graph: &'g Graph<'a>,
    ranks: &'g [usize],
    visited: Vec<bool>,
    bond_used: Vec<bool>,
    children: Vec<Vec<(usize, usize)>>,
    ring_marks: Vec<Vec<usize>>,
    open_rings: HashMap<usize, usize>,
    digits_in_use: BTreeSet<usize>,
}

impl<'g, 'a> Writer<'g, 'a> {
    fn new(graph: &'g Graph<'a>, ranks: &'g [usize]) -> Self {
        Self {
            graph,
            ranks,
            visited: vec![false; graph.len()],
            bond_used: vec![false; graph.molecule.bonds.len()],
            children: vec![Vec::new(); graph.len()],
            ring_marks: vec![Vec::new(); graph.len()],
            open_rings: HashMap::new(),
            digits_in_use: BTreeSet::new(),
        }
    }

    fn fragment(&mut self, start: usize) -> String {
        self.plan(start, None);
        let mut out = String::new();
        self.emit(start, None, &mut out);
        out
    }

    /// Depth-first pass that fixes the spanning tree and the ring closures.
    fn plan(&mut self, atom: usize, parent_bond: Option<usize>) {
        self.visited[atom] = true;
        let mut around = self.graph.neighbors[atom].clone();
        around.sort_by_key(|(neighbor, _)| self.ranks[*neighbor]);
        for (neighbor, bond) in around {
            if Some(bond) == parent_bond || self.bond_used[bond] {
                continue;
            }
            self.bond_used[bond] = true;
            if self.visited[neighbor] {
                self.ring_marks[neighbor].push(bond);
                self.ring_marks[atom].push(bond);
            } else {
                self.children[atom].push((neighbor, bond));
                self.plan(neighbor, Some(bond));
            }
        }
    }

    fn emit(&mut self, atom: usize, incoming: Option<usize>, out: &mut String) {
        if let Some(bond) = incoming {
            out.push_str(self.graph.bond_text(bond));
        }
        out.push_str(&self.graph.atom_text(atom));

        for bond in self.ring_marks[atom].clone() {
            if let Some(digit) = self.open_rings.remove(&bond) {
                self.digits_in_use.remove(&digit);
                out.push_str(&ring_digit(digit));
            } else {
                let digit = (1..)
                    .find(|digit| !self.digits_in_use.contains(digit))
                    .unwrap_or(1);
                self.digits_in_use.insert(digit);
                self.open_rings.insert(bond, digit);
                out.push_str(self.graph.bond_text(bond));
                out.push_str(&ring_digit(digit));
            }
        }

        let children = self.children[atom].clone();
        let last = children.len().saturating_sub(1);
        for (position, (child, bond)) in children.into_iter().enumerate() {
            if position < last {
                out.push('(');
                self.emit(child, Some(bond), out);
                out.push(')');
            } else {
                self.emit(child, Some(bond), out);
            }
        }
    }
}

fn ring_digit(digit: usize) -> String {
    if digit < 10 {
        digit.to_string()
    } else {
        format!("%{digit}")
    }
}

#[cfg(test)]
mod tests {
    use super::super::molfile::{Atom, Bond};
    use super::*;

    fn atom(symbol: &str) -> Atom {
        Atom {
            symbol: symbol.to_string(),
            charge: 0,
            isotope: None,
            map_number: 0,
            radical_electrons: 0,
        }
    }

    fn molecule(symbols: &[&str], bonds: &[(usize, usize, BondOrder)]) -> Molecule {
        Molecule {
            atoms: symbols.iter().map(|symbol| atom(symbol)).collect(),
            bonds: bonds
                .iter()
                .map(|(begin, end, order)| Bond {
                    begin: *begin,
                    end: *end,
                    order: *order,
                })
                .collect(),
        }
    }

    #[test]
    fn output_ignores_input_atom_order() {
        let forward = molecule(
            &["C", "C", "O"],
            &[(0, 1, BondOrder::Single), (1, 2, BondOrder::Single)],
        );
        let shuffled = molecule(
            &["O", "C", "C"],
            &[(2, 1, BondOrder::Single), (1, 0, BondOrder::Single)],
        );
        assert_eq!(molecule_smiles(&forward), molecule_smiles(&shuffled));
        assert_eq!(molecule_smiles(&forward).len(), 3);
    }

    #[test]
    fn benzene_uses_one_ring_closure() {
        let ring: Vec<_> = (0..6)
            .map(|index| (index, (index + 1) % 6, BondOrder::Aromatic))
            .collect();
        let benzene = molecule(&["C"; 6], &ring);
        assert_eq!(molecule_smiles(&benzene), "c1ccccc1");
    }

    #[test]
    fn charged_and_mapped_atoms_are_bracketed() {
        let mut acetate = molecule(
            &["C", "C", "O", "O"],
            &[
                (0, 1, BondOrder::Single),
                (1, 2, BondOrder::Double),
                (1, 3, BondOrder::Single),
            ],
        );
        acetate.atoms[3].charge = -1;
        acetate.atoms[0].map_number = 7;
        let smiles = molecule_smiles(&acetate);
        assert!(smiles.contains("[O-]"), "{smiles}");
        assert!(smiles.contains("[CH3:7]"), "{smiles}");
    }

    #[test]
    fn ammonium_gets_four_hydrogens() {
        let mut ammonium = molecule(&["N"], &[]);
        ammonium.atoms[0].charge = 1;
        assert_eq!(molecule_smiles(&ammonium), "[NH4+]");
    }

    #[test]
    fn disconnected_fragments_are_dot_separated() {
        let salt = molecule(&["Na", "Cl"], &[]);
        assert_eq!(molecule_smiles(&salt), "Cl.[Na]");
    }

    #[test]
    fn reaction_sides_are_joined_by_arrows() {
        let reaction = Reaction {
            reactants: vec![molecule(&["C"], &[]), molecule(&["O"], &[])],
            products: vec![molecule(&["C", "O"], &[(0, 1, BondOrder::Single)])],
            agents: Vec::new(),
        };
        assert_eq!(reaction_smiles(&reaction), "C.O>>CO");
    }
}
