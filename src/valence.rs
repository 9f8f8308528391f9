use petgraph::graph::NodeIndex;

use crate::atom::{Atom, AtomKind};
use crate::bond::Bond;
use crate::element::{outer_shell_electrons, Element};
use crate::mol::Mol;

/// Running bond-order sum for one atom while the bond block is decoded.
///
/// Any aromatic or query bond makes the sum meaningless; the accumulator
/// then stays `Indeterminate` no matter what else is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplicitValence {
    Sum(u8),
    Indeterminate,
}

impl Default for ExplicitValence {
    fn default() -> Self {
        ExplicitValence::Sum(0)
    }
}

impl ExplicitValence {
    pub fn add(&mut self, order: u8) {
        if let ExplicitValence::Sum(sum) = self {
            *sum = sum.saturating_add(order);
        }
    }

    pub fn mark_indeterminate(&mut self) {
        *self = ExplicitValence::Indeterminate;
    }

    pub fn sum(self) -> Option<u8> {
        match self {
            ExplicitValence::Sum(sum) => Some(sum),
            ExplicitValence::Indeterminate => None,
        }
    }
}

/// Standard valences for an atom with `electrons` valence electrons after
/// the charge shift. Second-period atoms cannot expand their octet.
fn standard_valences(electrons: i16, period: u8) -> &'static [u8] {
    match (electrons, period) {
        (1, _) => &[1],
        (2, _) => &[2],
        (3, _) => &[3],
        (4, _) => &[4],
        (5, _) => &[3, 5],
        (6, 1 | 2) => &[2],
        (6, _) => &[2, 4, 6],
        (7, 1 | 2) => &[1],
        (7, _) => &[1, 3, 5, 7],
        _ => &[],
    }
}

/// MDL implicit valence for a main-group element.
///
/// A charge shifts the element onto the valence list of its isoelectronic
/// neighbour (N+ behaves like C, O- like F). The smallest standard valence
/// that accommodates `explicit` is returned. Elements outside the model, or
/// atoms already above every standard valence, get `explicit` back so that
/// no hydrogens are added.
pub fn implicit_valence(element: Element, charge: i8, explicit: u8) -> u8 {
    let Some(group) = element.main_group() else {
        return explicit;
    };
    if group <= 2 && charge < 0 {
        return explicit;
    }
    let electrons = outer_shell_electrons(element.atomic_num()) as i16 - charge as i16;
    if element == Element::H && electrons != 1 {
        return explicit;
    }
    standard_valences(electrons, element.period())
        .iter()
        .copied()
        .find(|&v| v >= explicit)
        .unwrap_or(explicit)
}

/// Applies the MDL valence model to one atom.
///
/// `explicit` already includes `unpaired`. A declared valence fixes the
/// hydrogen count directly; otherwise the model picks a valence and records
/// it on the atom.
pub fn apply_mdl_valence(atom: &mut Atom, explicit: u8, unpaired: u8) {
    let element = match &atom.kind {
        AtomKind::Element(e) => *e,
        AtomKind::Pseudo(_) => {
            atom.implicit_hydrogens = Some(0);
            return;
        }
        AtomKind::Query(_) => {
            atom.implicit_hydrogens = None;
            return;
        }
    };

    if let Some(declared) = atom.valence {
        atom.implicit_hydrogens = Some(if declared >= explicit {
            declared - (explicit - unpaired)
        } else {
            0
        });
        return;
    }

    let chosen = implicit_valence(element, atom.formal_charge, explicit);
    if chosen < explicit {
        atom.valence = Some(explicit);
        atom.implicit_hydrogens = Some(0);
    } else {
        atom.valence = Some(chosen);
        atom.implicit_hydrogens = Some(chosen - explicit);
    }
}

/// Runs the valence model over every atom of a decoded molecule.
///
/// Returns `true` when some atom had an indeterminate explicit valence,
/// which makes the whole molecule query-typed.
pub fn apply_valence_model(mol: &mut Mol<Atom, Bond>, explicit: &[ExplicitValence]) -> bool {
    let mut indeterminate = false;
    for i in 0..mol.atom_count() {
        let idx = NodeIndex::new(i);
        let valence = explicit.get(i).copied().unwrap_or_default();
        match valence.sum() {
            None => {
                indeterminate = true;
                mol.atom_mut(idx).implicit_hydrogens = None;
            }
            Some(sum) => {
                let unpaired = mol.single_electron_count(idx).min(u8::MAX as usize) as u8;
                apply_mdl_valence(mol.atom_mut(idx), sum.saturating_add(unpaired), unpaired);
            }
        }
    }
    indeterminate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;

    fn element_atom(e: Element) -> Atom {
        Atom::new(AtomKind::Element(e))
    }

    #[test]
    fn accumulator_stays_indeterminate() {
        let mut v = ExplicitValence::default();
        v.add(2);
        assert_eq!(v.sum(), Some(2));
        v.mark_indeterminate();
        v.add(1);
        assert_eq!(v, ExplicitValence::Indeterminate);
        assert_eq!(v.sum(), None);
    }

    #[test]
    fn neutral_main_group() {
        assert_eq!(implicit_valence(Element::C, 0, 1), 4);
        assert_eq!(implicit_valence(Element::N, 0, 1), 3);
        assert_eq!(implicit_valence(Element::N, 0, 4), 5);
        assert_eq!(implicit_valence(Element::O, 0, 0), 2);
        assert_eq!(implicit_valence(Element::F, 0, 0), 1);
        assert_eq!(implicit_valence(Element::B, 0, 0), 3);
        assert_eq!(implicit_valence(Element::H, 0, 0), 1);
        assert_eq!(implicit_valence(Element::Na, 0, 0), 1);
        assert_eq!(implicit_valence(Element::Mg, 0, 0), 2);
    }

    #[test]
    fn heavier_elements_expand() {
        assert_eq!(implicit_valence(Element::S, 0, 0), 2);
        assert_eq!(implicit_valence(Element::S, 0, 3), 4);
        assert_eq!(implicit_valence(Element::S, 0, 5), 6);
        assert_eq!(implicit_valence(Element::P, 0, 4), 5);
        assert_eq!(implicit_valence(Element::Cl, 0, 2), 3);
        assert_eq!(implicit_valence(Element::I, 0, 6), 7);
    }

    #[test]
    fn charge_shifts_isoelectronic() {
        assert_eq!(implicit_valence(Element::N, 1, 0), 4);
        assert_eq!(implicit_valence(Element::O, -1, 0), 1);
        assert_eq!(implicit_valence(Element::O, 1, 0), 3);
        assert_eq!(implicit_valence(Element::C, -1, 0), 3);
        assert_eq!(implicit_valence(Element::B, -1, 0), 4);
    }

    #[test]
    fn no_hydrogens_for_ions_and_metals() {
        assert_eq!(implicit_valence(Element::Na, 1, 0), 0);
        assert_eq!(implicit_valence(Element::Na, -1, 0), 0);
        assert_eq!(implicit_valence(Element::H, 1, 0), 0);
        assert_eq!(implicit_valence(Element::H, -1, 0), 0);
        assert_eq!(implicit_valence(Element::Fe, 0, 2), 2);
        assert_eq!(implicit_valence(Element::Ar, 0, 0), 0);
    }

    #[test]
    fn overvalent_keeps_explicit() {
        assert_eq!(implicit_valence(Element::C, 0, 5), 5);
        assert_eq!(implicit_valence(Element::O, 0, 3), 3);
    }

    #[test]
    fn declared_valence_overrides_model() {
        let mut atom = element_atom(Element::C);
        atom.valence = Some(3);
        apply_mdl_valence(&mut atom, 1, 0);
        assert_eq!(atom.implicit_hydrogens, Some(2));

        let mut atom = element_atom(Element::C);
        atom.valence = Some(0);
        apply_mdl_valence(&mut atom, 1, 0);
        assert_eq!(atom.implicit_hydrogens, Some(0));
    }

    #[test]
    fn declared_valence_with_radical() {
        let mut atom = element_atom(Element::C);
        atom.valence = Some(3);
        // two single bonds plus one unpaired electron
        apply_mdl_valence(&mut atom, 3, 1);
        assert_eq!(atom.implicit_hydrogens, Some(2));
    }

    #[test]
    fn model_records_chosen_valence() {
        let mut atom = element_atom(Element::N);
        apply_mdl_valence(&mut atom, 4, 0);
        assert_eq!(atom.valence, Some(5));
        assert_eq!(atom.implicit_hydrogens, Some(1));

        let mut atom = element_atom(Element::C);
        apply_mdl_valence(&mut atom, 6, 0);
        assert_eq!(atom.valence, Some(6));
        assert_eq!(atom.implicit_hydrogens, Some(0));
    }

    #[test]
    fn radical_carbon_loses_hydrogen() {
        let mut atom = element_atom(Element::C);
        apply_mdl_valence(&mut atom, 1, 1);
        assert_eq!(atom.implicit_hydrogens, Some(3));
    }

    #[test]
    fn pseudo_and_query_atoms() {
        let mut pseudo = Atom::new(AtomKind::Pseudo("R1".into()));
        apply_mdl_valence(&mut pseudo, 1, 0);
        assert_eq!(pseudo.implicit_hydrogens, Some(0));

        let mut query = Atom::new(AtomKind::Query(crate::query::AtomExpr::True));
        apply_mdl_valence(&mut query, 1, 0);
        assert_eq!(query.implicit_hydrogens, None);
    }

    #[test]
    fn whole_molecule_pass() {
        let mut mol = Mol::<Atom, Bond>::new();
        let c = mol.add_atom(element_atom(Element::C));
        let o = mol.add_atom(element_atom(Element::O));
        let n = mol.add_atom(element_atom(Element::N));
        mol.add_bond(c, o, Bond::new(BondOrder::Double));
        mol.add_bond(c, n, Bond::new(BondOrder::Aromatic));
        let mut valences = vec![ExplicitValence::default(); 3];
        valences[0].add(2);
        valences[1].add(2);
        valences[0].mark_indeterminate();
        valences[2].mark_indeterminate();

        assert!(apply_valence_model(&mut mol, &valences));
        assert_eq!(mol.atom(c).implicit_hydrogens, None);
        assert_eq!(mol.atom(o).implicit_hydrogens, Some(0));
        assert_eq!(mol.atom(n).implicit_hydrogens, None);
    }
}
