//! Tetrahedral and double-bond stereo reconstruction.
//!
//! Two sources are supported: 0D parity codes stored on molfile atom lines,
//! and perception from atom coordinates (3D, or 2D with wedge bonds).

use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bond::{BondOrder, BondStereo};
use crate::mol::{
    Configuration, DoubleBondStereo, Mol, StereoGroup, TetrahedralStereo, Winding,
};
use crate::traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasBondStereo, HasFormalCharge,
    HasHydrogenCount, HasMassNumber, HasPosition2D, HasPosition3D,
};

/// Parity codes collected from the atom block, keyed by atom.
///
/// Produced by the atom decoder and consumed once by
/// [`stereo_from_parities`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parities(BTreeMap<NodeIndex, u8>);

impl Parities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a non-zero parity code. Zero means "no parity" and is ignored.
    pub fn record(&mut self, atom: NodeIndex, parity: u8) {
        if parity != 0 {
            self.0.insert(atom, parity);
        }
    }

    pub fn get(&self, atom: NodeIndex) -> Option<u8> {
        self.0.get(&atom).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, u8)> + '_ {
        self.0.iter().map(|(&a, &p)| (a, p))
    }
}

/// Builds tetrahedral centres from 0D parities.
///
/// Parity 1 is clockwise and 2 anticlockwise with the last ligand pointing
/// away; 3 (either) is skipped. Ligands are the focus's neighbours in bond
/// order. With three neighbours the focus itself is the fourth ligand. A
/// hydrogen neighbour is conventionally the back ligand, so a hydrogen at
/// position 0 or 2 flips the winding.
pub fn stereo_from_parities<A, B>(mol: &Mol<A, B>, parities: Parities) -> Vec<TetrahedralStereo>
where
    A: HasAtomicNum,
{
    let mut out = Vec::new();
    'centres: for (focus, parity) in parities.iter() {
        let winding = match parity {
            1 => Winding::Clockwise,
            2 => Winding::Anticlockwise,
            _ => continue,
        };
        let mut ligands = [focus; 4];
        let mut count = 0;
        let mut hydrogen: Option<usize> = None;
        for (_, nbr) in mol.bonded_neighbors(focus) {
            if count == 4 {
                continue 'centres;
            }
            if mol.atom(nbr).atomic_num() == 1 {
                if hydrogen.is_some() {
                    continue 'centres;
                }
                hydrogen = Some(count);
            }
            ligands[count] = nbr;
            count += 1;
        }
        if count < 3 || (count == 3 && hydrogen.is_some()) {
            continue;
        }
        // count == 3 leaves the focus in the last slot
        let winding = match hydrogen {
            Some(0) | Some(2) => winding.invert(),
            _ => winding,
        };
        out.push(TetrahedralStereo {
            focus,
            ligands,
            winding,
            group: StereoGroup::Absolute,
        });
    }
    out
}

/// Which coordinate set drives perception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    TwoD,
    ThreeD,
}

const EPSILON: f64 = 1e-6;

struct Fnv1aHasher(u64);

impl Fnv1aHasher {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| values[i]);
    let mut ranks = vec![0usize; n];
    for i in 1..n {
        ranks[order[i]] = if values[order[i]] == values[order[i - 1]] {
            ranks[order[i - 1]]
        } else {
            i
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Constitutional symmetry classes by iterative neighbour refinement.
/// Atoms with equal rank cannot be told apart without stereo.
pub fn symmetry_ranks<A, B>(mol: &Mol<A, B>) -> Vec<usize>
where
    A: HasAtomicNum + HasFormalCharge + HasMassNumber + HasHydrogenCount + HasAromaticity,
    B: HasBondOrder,
{
    let initial: Vec<u64> = mol
        .atoms()
        .map(|idx| {
            let atom = mol.atom(idx);
            let mut h = Fnv1aHasher::new();
            atom.atomic_num().hash(&mut h);
            atom.formal_charge().hash(&mut h);
            atom.mass_number().hash(&mut h);
            atom.hydrogen_count().hash(&mut h);
            atom.is_aromatic().hash(&mut h);
            mol.neighbors(idx).count().hash(&mut h);
            h.finish()
        })
        .collect();
    let mut ranks = ranks_from_values(&initial);
    let mut prev_distinct = count_distinct(&ranks);

    loop {
        let values: Vec<u64> = mol
            .atoms()
            .map(|idx| {
                let mut nbrs: Vec<(usize, u8)> = mol
                    .bonded_neighbors(idx)
                    .into_iter()
                    .map(|(e, nb)| (ranks[nb.index()], bond_code(mol.bond(e).bond_order())))
                    .collect();
                nbrs.sort_unstable();
                let mut h = Fnv1aHasher::new();
                ranks[idx.index()].hash(&mut h);
                nbrs.hash(&mut h);
                h.finish()
            })
            .collect();
        let next = ranks_from_values(&values);
        let distinct = count_distinct(&next);
        if distinct <= prev_distinct {
            return ranks;
        }
        ranks = next;
        prev_distinct = distinct;
    }
}

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
        BondOrder::Query(q) => q.mdl_type(),
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Signed volume of the tetrahedron; positive when 0, 1, 2 run clockwise
/// seen with 3 pointing away.
fn signed_volume(p: [[f64; 3]; 4]) -> f64 {
    let a = sub(p[1], p[0]);
    let b = sub(p[2], p[0]);
    let c = sub(p[3], p[0]);
    dot(cross(a, b), c)
}

fn position<A>(atom: &A, dim: Dimensionality) -> Option<[f64; 3]>
where
    A: HasPosition2D + HasPosition3D,
{
    match dim {
        Dimensionality::ThreeD => atom.position_3d(),
        Dimensionality::TwoD => atom.position_2d().map(|[x, y]| [x, y, 0.0]),
    }
}

/// Tetrahedral centres perceived from coordinates.
///
/// A candidate has only single bonds, four substituents counting implicit
/// hydrogens, at most one hydrogen, and constitutionally distinct
/// neighbours. In 2D the wide end of an up (down) wedge starting at the
/// focus is lifted to z = +1 (-1); a centre without such a wedge is left
/// undefined.
pub fn perceive_tetrahedral<A, B>(mol: &Mol<A, B>, dim: Dimensionality) -> Vec<TetrahedralStereo>
where
    A: HasAtomicNum
        + HasFormalCharge
        + HasMassNumber
        + HasHydrogenCount
        + HasAromaticity
        + HasPosition2D
        + HasPosition3D,
    B: HasBondOrder + HasBondStereo,
{
    let ranks = symmetry_ranks(mol);
    let mut out = Vec::new();

    'centres: for focus in mol.atoms() {
        let bonded = mol.bonded_neighbors(focus);
        let implicit = mol.atom(focus).hydrogen_count() as usize;
        if !(3..=4).contains(&bonded.len()) || bonded.len() + implicit != 4 {
            continue;
        }
        let explicit_h = bonded
            .iter()
            .filter(|(_, nb)| mol.atom(*nb).atomic_num() == 1)
            .count();
        if explicit_h + implicit > 1 {
            continue;
        }

        let mut nbr_ranks: Vec<usize> = bonded.iter().map(|(_, nb)| ranks[nb.index()]).collect();
        nbr_ranks.sort_unstable();
        nbr_ranks.dedup();
        if nbr_ranks.len() != bonded.len() {
            continue;
        }

        let Some(centre) = position(mol.atom(focus), dim) else {
            continue;
        };
        let mut points = [centre; 4];
        let mut ligands = [focus; 4];
        let mut wedged = false;
        for (slot, (edge, nb)) in bonded.iter().enumerate() {
            let bond = mol.bond(*edge);
            if bond.bond_order() != BondOrder::Single {
                continue 'centres;
            }
            let Some(mut p) = position(mol.atom(*nb), dim) else {
                continue 'centres;
            };
            if dim == Dimensionality::TwoD {
                let starts_here = mol.bond_endpoints(*edge).map(|(a, _)| a) == Some(focus);
                match (bond.bond_stereo(), starts_here) {
                    (BondStereo::UpOrDown, _) => continue 'centres,
                    (BondStereo::Up, true) => {
                        p[2] = 1.0;
                        wedged = true;
                    }
                    (BondStereo::Down, true) => {
                        p[2] = -1.0;
                        wedged = true;
                    }
                    _ => {}
                }
            }
            points[slot] = p;
            ligands[slot] = *nb;
        }
        if dim == Dimensionality::TwoD && !wedged {
            continue;
        }

        let volume = signed_volume(points);
        if volume.abs() < EPSILON {
            continue;
        }
        out.push(TetrahedralStereo {
            focus,
            ligands,
            winding: if volume > 0.0 {
                Winding::Clockwise
            } else {
                Winding::Anticlockwise
            },
            group: StereoGroup::Absolute,
        });
    }
    out
}

/// Length of the shortest path from `a` to `b` that avoids `skip`, capped
/// at `limit` bonds.
fn ring_path_len<A, B>(
    mol: &Mol<A, B>,
    a: NodeIndex,
    b: NodeIndex,
    skip: EdgeIndex,
    limit: usize,
) -> Option<usize> {
    let mut dist = vec![usize::MAX; mol.atom_count()];
    let mut queue = VecDeque::new();
    dist[a.index()] = 0;
    queue.push_back(a);
    while let Some(node) = queue.pop_front() {
        let d = dist[node.index()];
        if d >= limit {
            continue;
        }
        for (edge, nb) in mol.bonded_neighbors(node) {
            if edge == skip || dist[nb.index()] != usize::MAX {
                continue;
            }
            if nb == b {
                return Some(d + 1);
            }
            dist[nb.index()] = d + 1;
            queue.push_back(nb);
        }
    }
    None
}

/// Picks the reference ligand on one end of a double bond: the first
/// neighbour in bond order other than the far end. Two substituents with
/// the same rank leave the end without a defined reference.
fn reference_ligand<A, B>(
    mol: &Mol<A, B>,
    end: NodeIndex,
    other: NodeIndex,
    ranks: &[usize],
) -> Option<NodeIndex> {
    let subs: Vec<NodeIndex> = mol
        .bonded_neighbors(end)
        .into_iter()
        .map(|(_, nb)| nb)
        .filter(|&nb| nb != other)
        .collect();
    match subs.as_slice() {
        [one] => Some(*one),
        [first, second] if ranks[first.index()] != ranks[second.index()] => Some(*first),
        _ => None,
    }
}

/// Double-bond configurations perceived from coordinates.
///
/// Crossed (`EOrZ`) bonds and double bonds in rings smaller than eight
/// atoms are skipped.
pub fn perceive_double_bonds<A, B>(mol: &Mol<A, B>, dim: Dimensionality) -> Vec<DoubleBondStereo>
where
    A: HasAtomicNum
        + HasFormalCharge
        + HasMassNumber
        + HasHydrogenCount
        + HasAromaticity
        + HasPosition2D
        + HasPosition3D,
    B: HasBondOrder + HasBondStereo,
{
    let ranks = symmetry_ranks(mol);
    let mut out = Vec::new();

    for edge in mol.bonds() {
        let bond = mol.bond(edge);
        if bond.bond_order() != BondOrder::Double || bond.bond_stereo() == BondStereo::EOrZ {
            continue;
        }
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if ring_path_len(mol, a, b, edge, 6).is_some() {
            continue;
        }
        let (Some(la), Some(lb)) = (
            reference_ligand(mol, a, b, &ranks),
            reference_ligand(mol, b, a, &ranks),
        ) else {
            continue;
        };
        let points = [a, b, la, lb].map(|n| position(mol.atom(n), dim));
        let [Some(pa), Some(pb), Some(pla), Some(plb)] = points else {
            continue;
        };
        let axis = sub(pb, pa);
        let na = cross(axis, sub(pla, pa));
        let nb = cross(axis, sub(plb, pb));
        let side = dot(na, nb);
        if side.abs() < EPSILON {
            continue;
        }
        out.push(DoubleBondStereo {
            bond: edge,
            ligands: [la, lb],
            configuration: if side > 0.0 {
                Configuration::Together
            } else {
                Configuration::Opposite
            },
        });
    }
    out
}
