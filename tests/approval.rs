use ctabcrab::{parse_molfile, AtomKind, BondOrder, Molecule};
use serde::Deserialize;

#[derive(Deserialize)]
struct QueryEntry {
    elements: Vec<u8>,
    negated: bool,
}

#[derive(Deserialize)]
struct AtomEntry {
    symbol: String,
    charge: i8,
    hydrogens: Option<u8>,
    mass: Option<i32>,
    aromatic: bool,
    #[serde(default)]
    query: Option<QueryEntry>,
}

#[derive(Deserialize)]
struct BondEntry {
    begin: usize,
    end: usize,
    order: String,
    /// Concrete orders a query bond accepts.
    #[serde(default)]
    accepts: Vec<String>,
}

const CONCRETE_ORDERS: [(&str, u8, bool); 4] = [
    ("single", 1, false),
    ("double", 2, false),
    ("triple", 3, false),
    ("aromatic", 0, true),
];

#[derive(Deserialize)]
struct MolEntry {
    name: String,
    molfile: String,
    is_query: bool,
    atoms: Vec<AtomEntry>,
    bonds: Vec<BondEntry>,
}

fn order_label(order: BondOrder) -> &'static str {
    match order {
        BondOrder::Single => "single",
        BondOrder::Double => "double",
        BondOrder::Triple => "triple",
        BondOrder::Aromatic => "aromatic",
        BondOrder::Query(_) => "query",
    }
}

fn compare(entry: &MolEntry, molecule: &Molecule, failures: &mut Vec<String>) {
    if molecule.is_query != entry.is_query {
        failures.push(format!(
            "[{}] is_query: expected {}, got {}",
            entry.name, entry.is_query, molecule.is_query
        ));
    }
    if molecule.atom_count() != entry.atoms.len() {
        failures.push(format!(
            "[{}] atom count: expected {}, got {}",
            entry.name,
            entry.atoms.len(),
            molecule.atom_count()
        ));
        return;
    }
    for (i, expected) in entry.atoms.iter().enumerate() {
        let atom = molecule.atom(i);
        let got = (
            atom.symbol(),
            atom.formal_charge,
            atom.implicit_hydrogens,
            atom.mass_number,
            atom.is_aromatic,
        );
        let want = (
            expected.symbol.as_str(),
            expected.charge,
            expected.hydrogens,
            expected.mass,
            expected.aromatic,
        );
        if got != want {
            failures.push(format!("[{}] atom {i}: expected {want:?}, got {got:?}", entry.name));
        }
        if let Some(query) = &expected.query {
            check_atom_query(entry, i, &atom.kind, query, failures);
        }
    }
    if molecule.bond_count() != entry.bonds.len() {
        failures.push(format!(
            "[{}] bond count: expected {}, got {}",
            entry.name,
            entry.bonds.len(),
            molecule.bond_count()
        ));
        return;
    }
    for (i, expected) in entry.bonds.iter().enumerate() {
        let order = molecule.bond(i).order;
        let got = (molecule.bond_atoms(i), order_label(order));
        let want = (Some((expected.begin, expected.end)), expected.order.as_str());
        if got != want {
            failures.push(format!("[{}] bond {i}: expected {want:?}, got {got:?}", entry.name));
        }
        if let BondOrder::Query(expr) = order {
            let accepted: Vec<&str> = CONCRETE_ORDERS
                .iter()
                .filter(|(_, n, aromatic)| expr.matches(*n, *aromatic))
                .map(|(label, _, _)| *label)
                .collect();
            if accepted != expected.accepts {
                failures.push(format!(
                    "[{}] bond {i}: expected to accept {:?}, accepts {accepted:?}",
                    entry.name, expected.accepts
                ));
            }
        }
    }
}

fn check_atom_query(
    entry: &MolEntry,
    i: usize,
    kind: &AtomKind,
    query: &QueryEntry,
    failures: &mut Vec<String>,
) {
    let AtomKind::Query(expr) = kind else {
        failures.push(format!("[{}] atom {i}: expected a query atom, got {kind:?}", entry.name));
        return;
    };
    if expr.elements() != query.elements {
        failures.push(format!(
            "[{}] atom {i}: expected list {:?}, got {:?}",
            entry.name,
            query.elements,
            expr.elements()
        ));
    }
    for &z in &query.elements {
        if expr.matches(z, 0) == query.negated {
            failures.push(format!("[{}] atom {i}: list answer wrong for Z={z}", entry.name));
        }
    }
    // carbon is in none of the fixture lists
    if expr.matches(6, 0) != query.negated {
        failures.push(format!("[{}] atom {i}: list answer wrong for carbon", entry.name));
    }
}

#[test]
fn approval_molfiles() {
    let data: Vec<MolEntry> =
        serde_json::from_str(include_str!("approval_data/molfiles.json")).unwrap();

    let mut failures = Vec::new();
    for entry in &data {
        match parse_molfile(&entry.molfile) {
            Ok(molecule) => compare(entry, &molecule, &mut failures),
            Err(e) => failures.push(format!("[{}] failed to parse: {e}", entry.name)),
        }
    }

    if !failures.is_empty() {
        for f in &failures {
            eprintln!("{f}");
        }
        panic!("{} of {} molfile approvals failed", failures.len(), data.len());
    }
}
