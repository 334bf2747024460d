const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Atomic number of an element symbol; `0` for anything else (R groups,
/// query atoms, `*`).
pub fn atomic_number(symbol: &str) -> u8 {
    SYMBOLS
        .iter()
        .position(|candidate| *candidate == symbol)
        .map(|index| index as u8 + 1)
        .unwrap_or(0)
}

pub fn symbol(atomic_number: u8) -> Option<&'static str> {
    SYMBOLS.get(usize::from(atomic_number).checked_sub(1)?).copied()
}

/// Default valences used to infer implicit hydrogens.
pub fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        9 => &[1],
        14 => &[4],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        17 | 35 => &[1],
        33 => &[3, 5],
        34 => &[2, 4, 6],
        53 => &[1, 3, 5],
        _ => &[],
    }
}

/// Symbols that may be written without brackets.
pub fn in_organic_subset(symbol: &str) -> bool {
    matches!(
        symbol,
        "B" | "C" | "N" | "O" | "P" | "S" | "F" | "Cl" | "Br" | "I"
    )
}

pub fn can_be_aromatic(symbol: &str) -> bool {
    matches!(
        symbol,
        "B" | "C" | "N" | "O" | "P" | "S" | "As" | "Se" | "Te"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_agree() {
        assert_eq!(atomic_number("C"), 6);
        assert_eq!(atomic_number("Cl"), 17);
        assert_eq!(atomic_number("R#"), 0);
        assert_eq!(symbol(8), Some("O"));
        assert_eq!(symbol(0), None);
    }
}
