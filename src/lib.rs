//! Reader for MDL Molfile V2000 connection tables and SD files.
//!
//! Records decode into a [`Molecule`]: a petgraph-backed [`Mol`] of
//! [`Atom`]s and [`Bond`]s, with Sgroups, SD data items, implicit hydrogens
//! from the MDL valence model, and tetrahedral and double-bond stereo.

pub mod atom;
pub mod bond;
pub mod element;
pub mod mol;
pub mod molecule;
pub mod molfile;
pub mod query;
pub mod sgroup;
pub mod stereo;
pub mod traits;
pub mod valence;

pub use atom::{Atom, AtomKind, SpinMultiplicity};
pub use bond::{Bond, BondOrder, BondStereo};
pub use element::Element;
pub use mol::{
    Configuration, DoubleBondStereo, Mol, StereoGroup, TetrahedralStereo, Winding,
};
pub use molecule::Molecule;
pub use molfile::{
    parse_molfile, parse_molfile_with, DataItem, Diagnostic, ErrorKind, Mode, MolfileError,
    MolfileReader, ReaderOptions,
};
pub use query::{AtomExpr, BondExpr};
pub use sgroup::{Sgroup, SgroupBracket, SgroupDetail, SgroupRegistry, SgroupType};
pub use stereo::{perceive_double_bonds, perceive_tetrahedral, Dimensionality, Parities};
pub use traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasBondStereo, HasFormalCharge,
    HasHydrogenCount, HasMassNumber, HasPosition2D, HasPosition3D,
};
pub use valence::{apply_valence_model, implicit_valence, ExplicitValence};
