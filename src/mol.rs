use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Rotation sense of ligands 0, 1, 2 viewed with ligand 3 pointing away from
/// the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    Anticlockwise,
}

impl Winding {
    pub fn invert(self) -> Self {
        match self {
            Winding::Clockwise => Winding::Anticlockwise,
            Winding::Anticlockwise => Winding::Clockwise,
        }
    }
}

/// Enhanced-stereo grouping of a tetrahedral centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoGroup {
    /// The drawn configuration is the actual one.
    #[default]
    Absolute,
    /// The drawn configuration and its enantiomer are both present
    /// ("and" group).
    Racemic(u8),
}

/// A tetrahedral stereocentre.
///
/// When the focus has only three neighbours the focus itself stands in for
/// the missing (implicit hydrogen or lone pair) ligand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetrahedralStereo {
    pub focus: NodeIndex,
    pub ligands: [NodeIndex; 4],
    pub winding: Winding,
    pub group: StereoGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Configuration {
    /// Reference ligands on the same side (cis).
    Together,
    /// Reference ligands on opposite sides (trans).
    Opposite,
}

/// Configuration of a double bond, described by one reference ligand on each
/// end. `ligands[0]` hangs off the bond's first atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoubleBondStereo {
    pub bond: EdgeIndex,
    pub ligands: [NodeIndex; 2],
    pub configuration: Configuration,
}

/// Molecular graph over an undirected petgraph.
///
/// Node and edge indices follow insertion order, so the n-th atom line of a
/// molfile is `NodeIndex::new(n)` and the n-th bond line is
/// `EdgeIndex::new(n)`.
pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
    single_electrons: Vec<NodeIndex>,
    tetrahedral_stereo: Vec<TetrahedralStereo>,
    double_bond_stereo: Vec<DoubleBondStereo>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
            single_electrons: Vec::new(),
            tetrahedral_stereo: Vec::new(),
            double_bond_stereo: Vec::new(),
        }
    }

    pub fn with_capacity(atoms: usize, bonds: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(atoms, bonds),
            ..Self::new()
        }
    }

    pub fn graph(&self) -> &UnGraph<A, B> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut B {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    /// Incident bonds with their far atoms, ordered by bond index. petgraph
    /// walks adjacency lists newest-first, which is the reverse of file
    /// order.
    pub fn bonded_neighbors(&self, idx: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut out: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (e.id(), other)
            })
            .collect();
        out.sort_by_key(|(e, _)| e.index());
        out
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// First and second atom of the bond, in the order the bond was added.
    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// Records one unpaired electron on `atom`.
    pub fn add_single_electron(&mut self, atom: NodeIndex) {
        self.single_electrons.push(atom);
    }

    pub fn single_electrons(&self) -> &[NodeIndex] {
        &self.single_electrons
    }

    pub fn single_electron_count(&self, atom: NodeIndex) -> usize {
        self.single_electrons.iter().filter(|&&a| a == atom).count()
    }

    pub fn tetrahedral_stereo(&self) -> &[TetrahedralStereo] {
        &self.tetrahedral_stereo
    }

    pub fn set_tetrahedral_stereo(&mut self, stereo: Vec<TetrahedralStereo>) {
        self.tetrahedral_stereo = stereo;
    }

    pub fn tetrahedral_stereo_for(&self, focus: NodeIndex) -> Option<&TetrahedralStereo> {
        self.tetrahedral_stereo.iter().find(|s| s.focus == focus)
    }

    pub fn tetrahedral_stereo_mut(&mut self) -> &mut [TetrahedralStereo] {
        &mut self.tetrahedral_stereo
    }

    pub fn double_bond_stereo(&self) -> &[DoubleBondStereo] {
        &self.double_bond_stereo
    }

    pub fn set_double_bond_stereo(&mut self, stereo: Vec<DoubleBondStereo>) {
        self.double_bond_stereo = stereo;
    }

    pub fn double_bond_stereo_for(&self, bond: EdgeIndex) -> Option<&DoubleBondStereo> {
        self.double_bond_stereo.iter().find(|s| s.bond == bond)
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            single_electrons: self.single_electrons.clone(),
            tetrahedral_stereo: self.tetrahedral_stereo.clone(),
            double_bond_stereo: self.double_bond_stereo.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: PartialEq, B: PartialEq> PartialEq for Mol<A, B> {
    fn eq(&self, other: &Self) -> bool {
        if self.atom_count() != other.atom_count() || self.bond_count() != other.bond_count() {
            return false;
        }
        for idx in self.atoms() {
            if self.atom(idx) != other.atom(idx) {
                return false;
            }
        }
        for idx in self.bonds() {
            if self.bond(idx) != other.bond(idx) {
                return false;
            }
            if self.bond_endpoints(idx) != other.bond_endpoints(idx) {
                return false;
            }
        }
        self.single_electrons == other.single_electrons
            && self.tetrahedral_stereo == other.tetrahedral_stereo
            && self.double_bond_stereo == other.double_bond_stereo
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("single_electrons", &self.single_electrons)
            .field("tetrahedral_stereo", &self.tetrahedral_stereo)
            .field("double_bond_stereo", &self.double_bond_stereo)
            .finish()
    }
}
