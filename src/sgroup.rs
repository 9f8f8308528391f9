//! Substructure groups (Sgroups) from the molfile property block.
//!
//! Records are collected into a [`SgroupRegistry`] keyed by the file's
//! Sgroup number, then [`SgroupRegistry::finish`] turns every entry into a
//! typed [`Sgroup`] and rewrites parent links to positions in the output
//! list.

use std::collections::HashMap;
use std::fmt;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SgroupType {
    /// `SUP`, formerly "superatom".
    Abbreviation,
    /// `MUL`
    Multiple,
    /// `SRU`
    StructureRepeatUnit,
    /// `MON`
    Monomer,
    /// `MER`
    Mer,
    /// `COP`
    Copolymer,
    /// `CRO`
    Crosslink,
    /// `MOD`
    Modification,
    /// `GRA`
    Graft,
    /// `COM`
    Component,
    /// `MIX`
    Mixture,
    /// `FOR`
    Formulation,
    /// `DAT`
    Data,
    /// `ANY`
    AnyPolymer,
    /// `GEN`, also the type of Sgroups referenced before declaration.
    #[default]
    Generic,
}

impl SgroupType {
    pub fn from_ctab_key(key: &str) -> Option<Self> {
        Some(match key {
            "SUP" => SgroupType::Abbreviation,
            "MUL" => SgroupType::Multiple,
            "SRU" => SgroupType::StructureRepeatUnit,
            "MON" => SgroupType::Monomer,
            "MER" => SgroupType::Mer,
            "COP" => SgroupType::Copolymer,
            "CRO" => SgroupType::Crosslink,
            "MOD" => SgroupType::Modification,
            "GRA" => SgroupType::Graft,
            "COM" => SgroupType::Component,
            "MIX" => SgroupType::Mixture,
            "FOR" => SgroupType::Formulation,
            "DAT" => SgroupType::Data,
            "ANY" => SgroupType::AnyPolymer,
            "GEN" => SgroupType::Generic,
            _ => return None,
        })
    }

    pub fn ctab_key(self) -> &'static str {
        match self {
            SgroupType::Abbreviation => "SUP",
            SgroupType::Multiple => "MUL",
            SgroupType::StructureRepeatUnit => "SRU",
            SgroupType::Monomer => "MON",
            SgroupType::Mer => "MER",
            SgroupType::Copolymer => "COP",
            SgroupType::Crosslink => "CRO",
            SgroupType::Modification => "MOD",
            SgroupType::Graft => "GRA",
            SgroupType::Component => "COM",
            SgroupType::Mixture => "MIX",
            SgroupType::Formulation => "FOR",
            SgroupType::Data => "DAT",
            SgroupType::AnyPolymer => "ANY",
            SgroupType::Generic => "GEN",
        }
    }

    fn is_polymer(self) -> bool {
        matches!(
            self,
            SgroupType::StructureRepeatUnit
                | SgroupType::Monomer
                | SgroupType::Mer
                | SgroupType::Copolymer
                | SgroupType::Crosslink
                | SgroupType::Modification
                | SgroupType::Graft
                | SgroupType::AnyPolymer
        )
    }
}

impl fmt::Display for SgroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ctab_key())
    }
}

/// Bracket drawn around an Sgroup, from `M  SDI`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgroupBracket {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Type-specific attributes of a finished Sgroup.
#[derive(Debug, Clone, PartialEq)]
pub enum SgroupDetail {
    Abbreviation {
        label: Option<String>,
        expanded: bool,
    },
    Multiple {
        multiplier: Option<String>,
        parent_atoms: Vec<usize>,
    },
    Polymer {
        subtype: Option<String>,
        connectivity: Option<String>,
    },
    Component {
        order: Option<i32>,
    },
    Data {
        name: Option<String>,
        format: Option<String>,
        units: Option<String>,
        display: Option<String>,
        value: Option<String>,
    },
    Generic,
}

/// A finished Sgroup. Atom and bond members are 0-based indices into the
/// molecule; parents are positions in the molecule's Sgroup list.
#[derive(Debug, Clone, PartialEq)]
pub struct Sgroup {
    pub ty: SgroupType,
    pub atoms: Vec<usize>,
    pub bonds: Vec<usize>,
    pub brackets: Vec<SgroupBracket>,
    pub bracket_style: Option<i32>,
    pub subscript: Option<String>,
    pub parents: Vec<usize>,
    pub detail: SgroupDetail,
}

/// Attributes gathered for one Sgroup number before its type is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSgroup {
    pub ty: SgroupType,
    pub atoms: Vec<usize>,
    pub bonds: Vec<usize>,
    pub brackets: Vec<SgroupBracket>,
    pub bracket_style: Option<i32>,
    pub subscript: Option<String>,
    pub subtype: Option<String>,
    pub connectivity: Option<String>,
    pub expanded: bool,
    pub parent_atoms: Vec<usize>,
    pub component_order: Option<i32>,
    pub data_name: Option<String>,
    pub data_format: Option<String>,
    pub data_units: Option<String>,
    pub data_display: Option<String>,
    pub data: Option<String>,
    parents: Vec<u32>,
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl RawSgroup {
    pub fn new(ty: SgroupType) -> Self {
        Self {
            ty,
            ..Self::default()
        }
    }

    pub fn add_atom(&mut self, atom: usize) {
        push_unique(&mut self.atoms, atom);
    }

    pub fn add_bond(&mut self, bond: usize) {
        push_unique(&mut self.bonds, bond);
    }

    pub fn add_parent_atom(&mut self, atom: usize) {
        push_unique(&mut self.parent_atoms, atom);
    }

    /// Appends a line of `SCD`/`SED` data.
    pub fn append_data(&mut self, text: &str) {
        self.data.get_or_insert_with(String::new).push_str(text);
    }

    fn detail(&self, number: u32) -> SgroupDetail {
        let ty = self.ty;
        let dropped = |what: &str, present: bool| {
            if present {
                debug!("sgroup {number} ({ty}): dropping {what}, not used by this type");
            }
        };

        if ty != SgroupType::Multiple {
            dropped("parent atom list", !self.parent_atoms.is_empty());
        }
        if ty != SgroupType::Abbreviation {
            dropped("expansion flag", self.expanded);
        }
        if !ty.is_polymer() {
            dropped("subtype", self.subtype.is_some());
            dropped("connectivity", self.connectivity.is_some());
        }
        if !matches!(
            ty,
            SgroupType::Component | SgroupType::Mixture | SgroupType::Formulation
        ) {
            dropped("component order", self.component_order.is_some());
        }
        if ty != SgroupType::Data {
            dropped(
                "data field",
                self.data_name.is_some() || self.data.is_some() || self.data_display.is_some(),
            );
        }

        match ty {
            SgroupType::Abbreviation => SgroupDetail::Abbreviation {
                label: self.subscript.clone(),
                expanded: self.expanded,
            },
            SgroupType::Multiple => SgroupDetail::Multiple {
                multiplier: self.subscript.clone(),
                parent_atoms: self.parent_atoms.clone(),
            },
            SgroupType::Component | SgroupType::Mixture | SgroupType::Formulation => {
                SgroupDetail::Component {
                    order: self.component_order,
                }
            }
            SgroupType::Data => SgroupDetail::Data {
                name: self.data_name.clone(),
                format: self.data_format.clone(),
                units: self.data_units.clone(),
                display: self.data_display.clone(),
                value: self.data.clone(),
            },
            SgroupType::Generic => SgroupDetail::Generic,
            _ => SgroupDetail::Polymer {
                subtype: self.subtype.clone(),
                connectivity: self.connectivity.clone(),
            },
        }
    }
}

/// Why a parent link was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgroupLinkError {
    pub child: u32,
    pub parent: u32,
}

impl fmt::Display for SgroupLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.child == self.parent {
            write!(f, "sgroup {} cannot be its own parent", self.child)
        } else {
            write!(
                f,
                "linking sgroup {} under {} would create a cycle",
                self.child, self.parent
            )
        }
    }
}

impl std::error::Error for SgroupLinkError {}

/// File-numbered Sgroups in first-reference order.
#[derive(Debug, Clone, Default)]
pub struct SgroupRegistry {
    entries: Vec<(u32, RawSgroup)>,
    positions: HashMap<u32, usize>,
}

impl SgroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.positions.contains_key(&number)
    }

    pub fn get(&self, number: u32) -> Option<&RawSgroup> {
        self.positions.get(&number).map(|&i| &self.entries[i].1)
    }

    /// Declares an Sgroup (`M  STY`). Redeclaring a number starts it over
    /// but keeps its original position.
    pub fn declare(&mut self, number: u32, ty: SgroupType) -> &mut RawSgroup {
        match self.positions.get(&number) {
            Some(&i) => {
                self.entries[i].1 = RawSgroup::new(ty);
                &mut self.entries[i].1
            }
            None => self.insert(number, RawSgroup::new(ty)),
        }
    }

    /// Returns the Sgroup for `number`, creating a generic one if the
    /// number was never declared.
    pub fn get_or_insert(&mut self, number: u32) -> &mut RawSgroup {
        match self.positions.get(&number) {
            Some(&i) => &mut self.entries[i].1,
            None => self.insert(number, RawSgroup::default()),
        }
    }

    fn insert(&mut self, number: u32, sgroup: RawSgroup) -> &mut RawSgroup {
        let pos = self.entries.len();
        self.entries.push((number, sgroup));
        self.positions.insert(number, pos);
        &mut self.entries[pos].1
    }

    /// Walks parent links upwards from `from` looking for `target`.
    fn reaches(&self, from: u32, target: u32) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(n) = stack.pop() {
            if n == target {
                return true;
            }
            if seen.contains(&n) {
                continue;
            }
            seen.push(n);
            if let Some(sg) = self.get(n) {
                stack.extend(sg.parents.iter().copied());
            }
        }
        false
    }

    /// Records `parent` as a parent of `child`. Both must already be in the
    /// registry. Self links and links that would close a cycle are refused.
    pub fn add_parent(&mut self, child: u32, parent: u32) -> Result<(), SgroupLinkError> {
        if child == parent || self.reaches(parent, child) {
            return Err(SgroupLinkError { child, parent });
        }
        let sg = self.get_or_insert(child);
        if !sg.parents.contains(&parent) {
            sg.parents.push(parent);
        }
        Ok(())
    }

    /// Produces the typed Sgroup list. Parent numbers become positions in
    /// the returned list.
    pub fn finish(&self) -> Vec<Sgroup> {
        self.entries
            .iter()
            .map(|(number, raw)| Sgroup {
                ty: raw.ty,
                atoms: raw.atoms.clone(),
                bonds: raw.bonds.clone(),
                brackets: raw.brackets.clone(),
                bracket_style: raw.bracket_style,
                subscript: raw.subscript.clone(),
                parents: raw
                    .parents
                    .iter()
                    .filter_map(|p| self.positions.get(p).copied())
                    .collect(),
                detail: raw.detail(*number),
            })
            .collect()
    }
}
