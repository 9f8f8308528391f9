use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::molfile::DataItem;
use crate::sgroup::Sgroup;

/// A decoded molfile record.
///
/// Atoms and bonds keep their file order: atom `i` of the atom block is
/// `NodeIndex::new(i)` and bond `j` is `EdgeIndex::new(j)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub title: Option<String>,
    pub program: Option<String>,
    pub remark: Option<String>,
    /// Chiral flag from the counts line. When unset every tetrahedral
    /// centre belongs to a racemic stereo group.
    pub chiral: bool,
    /// Some atom or bond is a query, or the valence model could not run
    /// on every atom.
    pub is_query: bool,
    pub mol: Mol<Atom, Bond>,
    pub sgroups: Vec<Sgroup>,
    /// SD data items that followed `M  END`.
    pub data: Vec<DataItem>,
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.mol.atom_count()
    }

    pub fn bond_count(&self) -> usize {
        self.mol.bond_count()
    }

    /// Atom by 0-based file position.
    pub fn atom(&self, i: usize) -> &Atom {
        self.mol.atom(NodeIndex::new(i))
    }

    /// Bond by 0-based file position.
    pub fn bond(&self, i: usize) -> &Bond {
        self.mol.bond(EdgeIndex::new(i))
    }

    /// Endpoints of bond `i` as 0-based atom positions, in file order.
    pub fn bond_atoms(&self, i: usize) -> Option<(usize, usize)> {
        self.mol
            .bond_endpoints(EdgeIndex::new(i))
            .map(|(a, b)| (a.index(), b.index()))
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.mol.atoms().map(move |idx| self.mol.atom(idx))
    }

    /// Value of the first data item called `name`.
    pub fn data_value(&self, name: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.mol.atom_count() == 0
    }
}
