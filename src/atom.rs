use crate::element::Element;
use crate::query::AtomExpr;

/// What an atom node stands for.
///
/// A molfile atom is either a periodic-table element, a non-elemental
/// placeholder (`*`, `A`, `Q`, `L`, `LP`, `R`, `R1`, or any label accepted in
/// relaxed mode), or a query built from an atom list or a hydrogen-count
/// field.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomKind {
    Element(Element),
    Pseudo(String),
    Query(AtomExpr),
}

impl Default for AtomKind {
    fn default() -> Self {
        AtomKind::Pseudo(String::from("*"))
    }
}

/// Radical state from `M  RAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpinMultiplicity {
    #[default]
    None,
    Singlet,
    Doublet,
    Triplet,
}

impl SpinMultiplicity {
    /// Decodes the `M  RAD` value field. Anything outside 1..=3 means no
    /// radical.
    pub fn from_mdl(value: i32) -> Self {
        match value {
            1 => SpinMultiplicity::Singlet,
            2 => SpinMultiplicity::Doublet,
            3 => SpinMultiplicity::Triplet,
            _ => SpinMultiplicity::None,
        }
    }

    /// Number of unpaired-electron placeholders the state contributes.
    pub fn single_electrons(self) -> usize {
        match self {
            SpinMultiplicity::None => 0,
            SpinMultiplicity::Singlet => 2,
            SpinMultiplicity::Doublet => 1,
            SpinMultiplicity::Triplet => 2,
        }
    }
}

/// An atom decoded from a molfile atom line and the property block.
///
/// Fields that the format leaves optional are `Option`s: a `None` mass
/// number means natural abundance, a `None` valence means no declared
/// override and no model result yet.
///
/// # Examples
///
/// ```
/// use ctabcrab::{Atom, AtomKind, Element};
///
/// let carbon = Atom {
///     kind: AtomKind::Element(Element::C),
///     point2d: Some([1.5, 0.0]),
///     ..Atom::default()
/// };
/// assert_eq!(carbon.atomic_num(), 6);
/// assert_eq!(carbon.symbol(), "C");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub point2d: Option<[f64; 2]>,
    pub point3d: Option<[f64; 3]>,
    pub formal_charge: i8,
    /// Absolute mass number. Negative values only exist transiently while
    /// decoding, when a mass difference could not be resolved.
    pub mass_number: Option<i32>,
    /// Declared valence from the atom block, replaced by the valence the MDL
    /// model settles on.
    pub valence: Option<u8>,
    /// Raw atom-block parity code: 0 none, 1 odd, 2 even, 3 either.
    pub stereo_parity: u8,
    /// Atom-atom mapping number, when non-zero.
    pub mapping: Option<u32>,
    /// Implicit hydrogen count computed by the valence model. `None` for
    /// query atoms and for atoms touching query or aromatic bonds.
    pub implicit_hydrogens: Option<u8>,
    pub is_aromatic: bool,
    pub spin_multiplicity: SpinMultiplicity,
    /// Display label from an `A  ` record on a non-pseudo atom.
    pub alias: Option<String>,
    /// Free text from a `V  ` record.
    pub comment: Option<String>,
    /// ACD/Labs numbering label from `M  ZZC`.
    pub acd_label: Option<String>,
}

impl Atom {
    pub fn new(kind: AtomKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn element(&self) -> Option<Element> {
        match self.kind {
            AtomKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Atomic number, or 0 for pseudo and query atoms.
    pub fn atomic_num(&self) -> u8 {
        self.element().map_or(0, Element::atomic_num)
    }

    pub fn symbol(&self) -> &str {
        match &self.kind {
            AtomKind::Element(e) => e.symbol(),
            AtomKind::Pseudo(label) => label,
            AtomKind::Query(_) => "*",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self.kind, AtomKind::Query(_))
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self.kind, AtomKind::Pseudo(_))
    }

    pub fn is_hydrogen(&self) -> bool {
        self.kind == AtomKind::Element(Element::H)
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        Atom::atomic_num(self)
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasMassNumber for Atom {
    fn mass_number(&self) -> Option<i32> {
        self.mass_number
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.implicit_hydrogens.unwrap_or(0)
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}

impl crate::traits::HasPosition2D for Atom {
    fn position_2d(&self) -> Option<[f64; 2]> {
        self.point2d
    }
}

impl crate::traits::HasPosition3D for Atom {
    fn position_3d(&self) -> Option<[f64; 3]> {
        self.point3d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_atom_is_star_pseudo() {
        let atom = Atom::default();
        assert!(atom.is_pseudo());
        assert_eq!(atom.symbol(), "*");
        assert_eq!(atom.atomic_num(), 0);
    }

    #[test]
    fn query_atoms_have_no_atomic_number() {
        let atom = Atom::new(AtomKind::Query(AtomExpr::any_of(&[7, 8])));
        assert!(atom.is_query());
        assert_eq!(atom.atomic_num(), 0);
        assert_eq!(atom.symbol(), "*");
    }

    #[test]
    fn spin_multiplicity_electrons() {
        assert_eq!(SpinMultiplicity::from_mdl(0), SpinMultiplicity::None);
        assert_eq!(SpinMultiplicity::from_mdl(1).single_electrons(), 2);
        assert_eq!(SpinMultiplicity::from_mdl(2).single_electrons(), 1);
        assert_eq!(SpinMultiplicity::from_mdl(3).single_electrons(), 2);
        assert_eq!(SpinMultiplicity::from_mdl(9), SpinMultiplicity::None);
    }

    #[test]
    fn hydrogen_detection() {
        assert!(Atom::new(AtomKind::Element(Element::H)).is_hydrogen());
        assert!(!Atom::new(AtomKind::Pseudo("H".into())).is_hydrogen());
    }
}
