//! Property block dispatch.
//!
//! Every line is classified by its fixed prefix into a [`PropertyKey`] and
//! handed to one handler. Handlers that take a repeat count read fixed-width
//! tuples until either the count or the line runs out.

use std::io::BufRead;

use log::debug;
use petgraph::graph::NodeIndex;

use super::columns::{field, read_coordinate, read_molfile_int, read_uint, Coordinate};
use super::error::{ErrorKind, MolfileError, Reporter, Result};
use super::lines::{is_record_delimiter, LineSource};
use super::Mode;
use crate::atom::{Atom, AtomKind, SpinMultiplicity};
use crate::bond::Bond;
use crate::element::Element;
use crate::mol::Mol;
use crate::query::AtomExpr;
use crate::sgroup::{RawSgroup, SgroupBracket, SgroupRegistry, SgroupType};

/// Record kinds of the V2000 property block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// `A  aaa` followed by the alias text.
    AtomAlias,
    /// `V  aaa v...`
    AtomValue,
    /// `G  aaappp` followed by the abbreviation text.
    GroupAbbreviation,
    /// `S  SKPnnn`
    Skip,
    /// `aaa kSSSSn 111 222 ...` from the old atom list block.
    LegacyAtomList,
    AtomList,
    Charge,
    Isotope,
    Radical,
    RGroup,
    AcdLabel,
    SgroupType,
    SgroupSubtype,
    SgroupAtoms,
    SgroupBonds,
    SgroupParent,
    SgroupConnectivity,
    SgroupDisplay,
    SgroupSubscript,
    SgroupBracketStyle,
    SgroupExpansion,
    SgroupParentAtoms,
    SgroupComponent,
    DataFieldDescription,
    DataDisplay,
    DataContinue,
    DataEnd,
    End,
    Unknown,
}

impl PropertyKey {
    pub fn of(line: &str) -> PropertyKey {
        if let Some(rest) = line.strip_prefix("M  ") {
            return match field(rest, 0, 3) {
                "END" => PropertyKey::End,
                "ALS" => PropertyKey::AtomList,
                "CHG" => PropertyKey::Charge,
                "ISO" => PropertyKey::Isotope,
                "RAD" => PropertyKey::Radical,
                "RGP" => PropertyKey::RGroup,
                "ZZC" => PropertyKey::AcdLabel,
                "STY" => PropertyKey::SgroupType,
                "SST" => PropertyKey::SgroupSubtype,
                "SAL" => PropertyKey::SgroupAtoms,
                "SBL" => PropertyKey::SgroupBonds,
                "SPL" => PropertyKey::SgroupParent,
                "SCN" => PropertyKey::SgroupConnectivity,
                "SDI" => PropertyKey::SgroupDisplay,
                "SMT" => PropertyKey::SgroupSubscript,
                "SBT" => PropertyKey::SgroupBracketStyle,
                "SDS" => PropertyKey::SgroupExpansion,
                "SPA" => PropertyKey::SgroupParentAtoms,
                "SNC" => PropertyKey::SgroupComponent,
                "SDT" => PropertyKey::DataFieldDescription,
                "SDD" => PropertyKey::DataDisplay,
                "SCD" => PropertyKey::DataContinue,
                "SED" => PropertyKey::DataEnd,
                _ => PropertyKey::Unknown,
            };
        }
        if line.starts_with("A  ") {
            PropertyKey::AtomAlias
        } else if line.starts_with("V  ") {
            PropertyKey::AtomValue
        } else if line.starts_with("G  ") {
            PropertyKey::GroupAbbreviation
        } else if line.starts_with("S  SKP") {
            PropertyKey::Skip
        } else if is_legacy_atom_list(line) {
            PropertyKey::LegacyAtomList
        } else {
            PropertyKey::Unknown
        }
    }
}

/// `aaa kSSSSn 111`: an atom number, a `T`/`F` flag and at least one entry.
fn is_legacy_atom_list(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 14
        && bytes[..3].iter().all(|c| *c == b' ' || c.is_ascii_digit())
        && bytes[2].is_ascii_digit()
        && (matches!(bytes[3], b'T' | b'F') || matches!(bytes[4], b'T' | b'F'))
}

/// Mutable state shared by the property handlers of one record.
struct PropertyReader<'a, R> {
    src: &'a mut LineSource<R>,
    mol: &'a mut Mol<Atom, Bond>,
    sgroups: &'a mut SgroupRegistry,
    reporter: &'a mut Reporter,
    line_no: usize,
}

/// Reads property lines up to `M  END`. A record delimiter is left in
/// `src` for the data item reader.
pub(crate) fn read_properties<R: BufRead>(
    src: &mut LineSource<R>,
    mol: &mut Mol<Atom, Bond>,
    sgroups: &mut SgroupRegistry,
    reporter: &mut Reporter,
) -> Result<()> {
    let mut reader = PropertyReader {
        src,
        mol,
        sgroups,
        reporter,
        line_no: 0,
    };
    reader.run()?;
    reader.clear_unstable_masses();
    Ok(())
}

impl<R: BufRead> PropertyReader<'_, R> {
    fn run(&mut self) -> Result<()> {
        while let Some(line) = self.src.next_line()? {
            self.line_no = self.src.line_number();
            if is_record_delimiter(&line) {
                self.src.push_back(line);
                return Ok(());
            }
            let key = PropertyKey::of(&line);
            match key {
                PropertyKey::End => return Ok(()),
                PropertyKey::AtomAlias => {
                    let Some(label) = self.src.next_line()? else {
                        return Ok(());
                    };
                    self.atom_alias(&line, label)?;
                }
                PropertyKey::AtomValue => self.atom_value(&line)?,
                PropertyKey::GroupAbbreviation => {
                    debug!("line {}: legacy group abbreviation ignored", self.line_no);
                    if self.src.next_line()?.is_none() {
                        return Ok(());
                    }
                }
                PropertyKey::Skip => self.skip(&line)?,
                PropertyKey::LegacyAtomList => self.legacy_atom_list(&line)?,
                PropertyKey::AtomList => self.atom_list(&line)?,
                PropertyKey::Charge => self.charges(&line)?,
                PropertyKey::Isotope => self.isotopes(&line)?,
                PropertyKey::Radical => self.radicals(&line)?,
                PropertyKey::RGroup => self.rgroups(&line)?,
                PropertyKey::AcdLabel => self.acd_label(&line)?,
                PropertyKey::SgroupType => self.sgroup_types(&line)?,
                PropertyKey::SgroupSubtype => self.sgroup_subtypes(&line)?,
                PropertyKey::SgroupAtoms
                | PropertyKey::SgroupBonds
                | PropertyKey::SgroupParentAtoms => self.sgroup_members(&line, key)?,
                PropertyKey::SgroupParent => self.sgroup_parents(&line)?,
                PropertyKey::SgroupConnectivity => self.sgroup_connectivity(&line)?,
                PropertyKey::SgroupDisplay => self.sgroup_bracket(&line)?,
                PropertyKey::SgroupSubscript => {
                    let subscript = field(&line, 11, line.len()).trim().to_string();
                    self.sgroup(read_molfile_int(&line, 7))?.subscript = Some(subscript);
                }
                PropertyKey::SgroupBracketStyle | PropertyKey::SgroupComponent => {
                    self.sgroup_values(&line, key)?
                }
                PropertyKey::SgroupExpansion => self.sgroup_expansion(&line)?,
                PropertyKey::DataFieldDescription => self.data_field(&line)?,
                PropertyKey::DataDisplay => {
                    let display = field(&line, 11, line.len()).to_string();
                    self.sgroup(read_molfile_int(&line, 7))?.data_display = Some(display);
                }
                PropertyKey::DataContinue | PropertyKey::DataEnd => {
                    let data = field(&line, 11, 79).to_string();
                    self.sgroup(read_molfile_int(&line, 7))?.append_data(&data);
                }
                PropertyKey::Unknown => {
                    debug!("line {}: ignoring property {:?}", self.line_no, line);
                }
            }
        }
        Ok(())
    }

    fn strict(&self) -> bool {
        self.reporter.mode() == Mode::Strict
    }

    fn invalid_in_strict(&self, kind: ErrorKind, message: String) -> Result<()> {
        if self.strict() {
            return Err(MolfileError::parse(self.line_no, kind, message));
        }
        Ok(())
    }

    /// Resolves a 1-based atom number. Out-of-range numbers are reported
    /// and skipped.
    fn atom_index(&mut self, number: i32) -> Result<Option<NodeIndex>> {
        let count = self.mol.atom_count();
        if number < 1 || number as usize > count {
            self.reporter.recoverable(
                self.line_no,
                ErrorKind::AtomIndexOutOfRange,
                format!("atom {number} referenced, molecule has {count}"),
            )?;
            return Ok(None);
        }
        Ok(Some(NodeIndex::new(number as usize - 1)))
    }

    /// Resolves a 1-based bond number to a 0-based index.
    fn bond_index(&mut self, number: i32) -> Result<Option<usize>> {
        let count = self.mol.bond_count();
        if number < 1 || number as usize > count {
            self.reporter.recoverable(
                self.line_no,
                ErrorKind::AtomIndexOutOfRange,
                format!("bond {number} referenced, molecule has {count}"),
            )?;
            return Ok(None);
        }
        Ok(Some(number as usize - 1))
    }

    /// Looks up an Sgroup that some record refers to. Undeclared numbers
    /// are reported and then created as generic Sgroups.
    fn sgroup(&mut self, number: i32) -> Result<&mut RawSgroup> {
        let number = number.max(0) as u32;
        if !self.sgroups.contains(number) {
            self.reporter.recoverable(
                self.line_no,
                ErrorKind::UndeclaredSgroupReference,
                format!("sgroup {number} used before its STY declaration"),
            )?;
        }
        Ok(self.sgroups.get_or_insert(number))
    }

    /// Tuple offsets of an `nn8` record: start at column 10, 8 columns
    /// apart, each needing `width` columns.
    fn tuples(line: &str, count: i32, width: usize) -> impl Iterator<Item = usize> {
        let len = line.len();
        (0..count.max(0) as usize)
            .map(|i| 10 + i * 8)
            .take_while(move |st| st + width <= len)
    }

    /// Offsets of the 4-column entries of an `n15` list record.
    fn list_entries(line: &str, count: i32) -> impl Iterator<Item = usize> {
        let len = line.len();
        (0..count.max(0) as usize)
            .map(|i| 14 + i * 4)
            .take_while(move |st| st + 3 <= len)
    }

    fn atom_alias(&mut self, line: &str, label: String) -> Result<()> {
        let Some(idx) = self.atom_index(read_molfile_int(line, 3))? else {
            return Ok(());
        };
        let atom = self.mol.atom_mut(idx);
        if atom.is_pseudo() {
            atom.kind = AtomKind::Pseudo(label);
        } else {
            atom.alias = Some(label);
        }
        Ok(())
    }

    fn atom_value(&mut self, line: &str) -> Result<()> {
        if let Some(idx) = self.atom_index(read_molfile_int(line, 3))? {
            self.mol.atom_mut(idx).comment = Some(field(line, 7, line.len()).to_string());
        }
        Ok(())
    }

    fn skip(&mut self, line: &str) -> Result<()> {
        let n = read_molfile_int(line, 6).max(0);
        debug!("line {}: skipping {n} lines", self.line_no);
        for _ in 0..n {
            if self.src.next_line()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    fn set_query(&mut self, idx: NodeIndex, expr: AtomExpr) {
        self.mol.atom_mut(idx).kind = AtomKind::Query(expr);
    }

    fn legacy_atom_list(&mut self, line: &str) -> Result<()> {
        let Some(idx) = self.atom_index(read_uint(line, 0, 3))? else {
            return Ok(());
        };
        let bytes = line.as_bytes();
        let negate = bytes[3] == b'T' || bytes[4] == b'T';
        let elements: Vec<u8> = (11..line.len())
            .step_by(4)
            .map(|i| read_uint(line, i, 3))
            .filter(|z| (1..=118).contains(z))
            .map(|z| z as u8)
            .collect();
        let expr = AtomExpr::any_of(&elements);
        self.set_query(idx, if negate { expr.negate() } else { expr });
        Ok(())
    }

    fn atom_list(&mut self, line: &str) -> Result<()> {
        let Some(idx) = self.atom_index(read_uint(line, 7, 3))? else {
            return Ok(());
        };
        let bytes = line.as_bytes();
        let negate = [13, 14].iter().any(|&i| bytes.get(i) == Some(&b'T'));
        let elements: Vec<u8> = field(line, 16, line.len())
            .split_whitespace()
            .filter_map(Element::from_symbol)
            .map(Element::atomic_num)
            .collect();
        let expr = AtomExpr::any_of(&elements);
        self.set_query(idx, if negate { expr.negate() } else { expr });
        Ok(())
    }

    /// Reads the `aaa vvv` pairs of a CHG/ISO/RAD/RGP record.
    fn atom_values(&mut self, line: &str) -> Result<Vec<(NodeIndex, i32)>> {
        let count = read_uint(line, 6, 3);
        let mut out = Vec::new();
        for st in Self::tuples(line, count, 7) {
            let number = read_molfile_int(line, st);
            let value = read_molfile_int(line, st + 4);
            if let Some(idx) = self.atom_index(number)? {
                out.push((idx, value));
            }
        }
        Ok(out)
    }

    fn charges(&mut self, line: &str) -> Result<()> {
        for (idx, charge) in self.atom_values(line)? {
            self.mol.atom_mut(idx).formal_charge = charge.clamp(-15, 15) as i8;
        }
        Ok(())
    }

    fn isotopes(&mut self, line: &str) -> Result<()> {
        for (idx, mass) in self.atom_values(line)? {
            if mass < 0 {
                self.reporter.recoverable(
                    self.line_no,
                    ErrorKind::InvalidNumericField,
                    format!("absolute mass number should be >= 0, got {mass}"),
                )?;
            } else {
                self.mol.atom_mut(idx).mass_number = Some(mass);
            }
        }
        Ok(())
    }

    fn radicals(&mut self, line: &str) -> Result<()> {
        for (idx, value) in self.atom_values(line)? {
            let spin = SpinMultiplicity::from_mdl(value);
            self.mol.atom_mut(idx).spin_multiplicity = spin;
            for _ in 0..spin.single_electrons() {
                self.mol.add_single_electron(idx);
            }
        }
        Ok(())
    }

    fn rgroups(&mut self, line: &str) -> Result<()> {
        for (idx, number) in self.atom_values(line)? {
            self.mol.atom_mut(idx).kind = AtomKind::Pseudo(format!("R{number}"));
        }
        Ok(())
    }

    fn acd_label(&mut self, line: &str) -> Result<()> {
        if self.strict() {
            return Err(MolfileError::parse(
                self.line_no,
                ErrorKind::ProprietaryProperty,
                "M  ZZC is not allowed in strict mode",
            ));
        }
        if let Some(idx) = self.atom_index(read_molfile_int(line, 7))? {
            // label text keeps its blanks
            self.mol.atom_mut(idx).acd_label = Some(field(line, 11, line.len()).to_string());
        }
        Ok(())
    }

    fn sgroup_types(&mut self, line: &str) -> Result<()> {
        let count = read_molfile_int(line, 6);
        for st in Self::tuples(line, count, 7) {
            let number = read_molfile_int(line, st).max(0) as u32;
            if self.sgroups.contains(number) {
                self.reporter.recoverable(
                    self.line_no,
                    ErrorKind::UndeclaredSgroupReference,
                    format!("STY for sgroup {number} must precede every other record using it"),
                )?;
            }
            let key = field(line, st + 4, st + 7);
            let ty = SgroupType::from_ctab_key(key).unwrap_or_else(|| {
                debug!("line {}: unknown sgroup type {key:?}, using GEN", self.line_no);
                SgroupType::Generic
            });
            self.sgroups.declare(number, ty);
        }
        Ok(())
    }

    fn sgroup_subtypes(&mut self, line: &str) -> Result<()> {
        let count = read_molfile_int(line, 6);
        for st in Self::tuples(line, count, 7) {
            let number = read_molfile_int(line, st);
            let ty = self.sgroup(number)?.ty;
            if ty != SgroupType::Copolymer {
                self.invalid_in_strict(
                    ErrorKind::InvalidSgroupValue,
                    format!("SST given for sgroup {number} of type {ty}, expected COP"),
                )?;
            }
            let subtype = field(line, st + 4, st + 7);
            if !matches!(subtype, "ALT" | "RAN" | "BLO") {
                self.invalid_in_strict(
                    ErrorKind::InvalidSgroupValue,
                    format!("sgroup subtype {subtype:?}, expected ALT, RAN or BLO"),
                )?;
            }
            self.sgroup(number)?.subtype = Some(subtype.to_string());
        }
        Ok(())
    }

    /// SAL, SBL and SPA: `sssn15 iii ...` lists.
    fn sgroup_members(&mut self, line: &str, key: PropertyKey) -> Result<()> {
        let number = read_molfile_int(line, 7);
        self.sgroup(number)?;
        let count = read_molfile_int(line, 10);
        for st in Self::list_entries(line, count) {
            let entry = read_molfile_int(line, st);
            match key {
                PropertyKey::SgroupBonds => {
                    if let Some(bond) = self.bond_index(entry)? {
                        self.sgroup(number)?.add_bond(bond);
                    }
                }
                _ => {
                    if let Some(atom) = self.atom_index(entry)? {
                        let sgroup = self.sgroup(number)?;
                        if key == PropertyKey::SgroupParentAtoms {
                            sgroup.add_parent_atom(atom.index());
                        } else {
                            sgroup.add_atom(atom.index());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn sgroup_parents(&mut self, line: &str) -> Result<()> {
        let count = read_molfile_int(line, 6);
        for st in Self::tuples(line, count, 6) {
            let child = read_molfile_int(line, st);
            let parent = read_molfile_int(line, st + 4);
            self.sgroup(child)?;
            self.sgroup(parent)?;
            let (child, parent) = (child.max(0) as u32, parent.max(0) as u32);
            if let Err(err) = self.sgroups.add_parent(child, parent) {
                self.reporter
                    .recoverable(self.line_no, ErrorKind::SgroupCycle, err.to_string())?;
            }
        }
        Ok(())
    }

    fn sgroup_connectivity(&mut self, line: &str) -> Result<()> {
        let count = read_molfile_int(line, 6);
        for st in Self::tuples(line, count, 6) {
            let number = read_molfile_int(line, st);
            let con = field(line, st + 4, st + 7).trim().to_string();
            if !matches!(con.as_str(), "HH" | "HT" | "EU") {
                self.invalid_in_strict(
                    ErrorKind::InvalidSgroupValue,
                    format!("sgroup connectivity {con:?}, expected HH, HT or EU"),
                )?;
            }
            self.sgroup(number)?.connectivity = Some(con);
        }
        Ok(())
    }

    fn sgroup_bracket(&mut self, line: &str) -> Result<()> {
        let number = read_molfile_int(line, 7);
        let mut coords = [0.0; 4];
        for (slot, offset) in coords.iter_mut().zip([13, 23, 33, 43]) {
            let c = read_coordinate(line, offset);
            if !matches!(c, Coordinate::Exact(_)) {
                self.reporter.recoverable(
                    self.line_no,
                    ErrorKind::InvalidNumericField,
                    format!("bracket coordinate {:?}", field(line, offset, offset + 10)),
                )?;
            }
            *slot = c.value();
        }
        self.sgroup(number)?.brackets.push(SgroupBracket {
            start: [coords[0], coords[1]],
            end: [coords[2], coords[3]],
        });
        Ok(())
    }

    /// SBT and SNC: `nn8 sss vvv` integer attributes.
    fn sgroup_values(&mut self, line: &str, key: PropertyKey) -> Result<()> {
        let count = read_molfile_int(line, 6);
        for st in Self::tuples(line, count, 7) {
            let value = read_molfile_int(line, st + 4);
            let sgroup = self.sgroup(read_molfile_int(line, st))?;
            if key == PropertyKey::SgroupBracketStyle {
                sgroup.bracket_style = Some(value);
            } else {
                sgroup.component_order = Some(value);
            }
        }
        Ok(())
    }

    fn sgroup_expansion(&mut self, line: &str) -> Result<()> {
        if field(line, 7, 10) != "EXP" {
            return self.invalid_in_strict(
                ErrorKind::InvalidSgroupValue,
                "expected EXP to follow SDS".to_string(),
            );
        }
        let count = read_molfile_int(line, 10);
        for st in Self::list_entries(line, count) {
            self.sgroup(read_molfile_int(line, st))?.expanded = true;
        }
        Ok(())
    }

    /// `M  SDT sss` with the field name at 11, format at 41 and units at 43.
    fn data_field(&mut self, line: &str) -> Result<()> {
        let number = read_molfile_int(line, 7);
        self.sgroup(number)?;
        let len = line.len();
        if len < 11 {
            return Ok(());
        }
        let name = field(line, 11, 41).trim().to_string();
        self.sgroup(number)?.data_name = Some(name);
        if len < 41 {
            return Ok(());
        }
        let format = field(line, 41, 43).trim().to_string();
        if format.len() == 1 && !matches!(format.as_str(), "F" | "N" | "T") {
            self.reporter.recoverable(
                self.line_no,
                ErrorKind::InvalidSgroupValue,
                format!("data field format {format:?}, expected F, N or T"),
            )?;
        }
        if !format.is_empty() {
            self.sgroup(number)?.data_format = Some(format);
        }
        if len < 43 {
            return Ok(());
        }
        let units = field(line, 43, 63).trim();
        if !units.is_empty() {
            let units = units.to_string();
            self.sgroup(number)?.data_units = Some(units);
        }
        Ok(())
    }

    /// A mass delta on an element without a major isotope leaves a negative
    /// placeholder; anything still negative after `M  ISO` is dropped.
    fn clear_unstable_masses(&mut self) {
        for i in 0..self.mol.atom_count() {
            let idx = NodeIndex::new(i);
            let atom = self.mol.atom_mut(idx);
            if atom.mass_number.is_some_and(|m| m < 0) {
                atom.mass_number = None;
                let symbol = atom.symbol().to_string();
                self.reporter.warn(
                    self.line_no,
                    ErrorKind::UnstableMassDelta,
                    format!("unstable use of mass delta on {symbol}, use M  ISO"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::sgroup::{Sgroup, SgroupDetail};

    fn chain(n: usize) -> Mol<Atom, Bond> {
        let mut mol = Mol::new();
        let mut prev = None;
        for _ in 0..n {
            let idx = mol.add_atom(Atom::new(AtomKind::Element(Element::C)));
            if let Some(p) = prev {
                mol.add_bond(p, idx, Bond::new(BondOrder::Single));
            }
            prev = Some(idx);
        }
        mol
    }

    struct Outcome {
        mol: Mol<Atom, Bond>,
        sgroups: Vec<Sgroup>,
        kinds: Vec<ErrorKind>,
        rest: Option<String>,
    }

    fn run(mode: Mode, atoms: usize, text: &str) -> Result<Outcome> {
        let mut mol = chain(atoms);
        let mut registry = SgroupRegistry::new();
        let mut reporter = Reporter::new(mode);
        let mut src = LineSource::new(text.as_bytes());
        read_properties(&mut src, &mut mol, &mut registry, &mut reporter)?;
        Ok(Outcome {
            mol,
            sgroups: registry.finish(),
            kinds: reporter.into_diagnostics().iter().map(|d| d.kind).collect(),
            rest: src.next_line()?,
        })
    }

    fn atom(mol: &Mol<Atom, Bond>, i: usize) -> &Atom {
        mol.atom(NodeIndex::new(i))
    }

    #[test]
    fn keys() {
        assert_eq!(PropertyKey::of("M  END"), PropertyKey::End);
        assert_eq!(PropertyKey::of("M  CHG  1   1  -1"), PropertyKey::Charge);
        assert_eq!(PropertyKey::of("M  SED   1 data"), PropertyKey::DataEnd);
        assert_eq!(PropertyKey::of("A    2"), PropertyKey::AtomAlias);
        assert_eq!(PropertyKey::of("S  SKP  3"), PropertyKey::Skip);
        assert_eq!(PropertyKey::of("  1 F    2   6   7"), PropertyKey::LegacyAtomList);
        assert_eq!(PropertyKey::of("M  XYZ"), PropertyKey::Unknown);
        assert_eq!(PropertyKey::of(""), PropertyKey::Unknown);
    }

    #[test]
    fn charge_isotope_radical() {
        let out = run(
            Mode::Relaxed,
            3,
            "M  CHG  2   1  -1   3   2\nM  ISO  1   2  13\nM  RAD  1   3   2\nM  END\n",
        )
        .unwrap();
        assert_eq!(atom(&out.mol, 0).formal_charge, -1);
        assert_eq!(atom(&out.mol, 2).formal_charge, 2);
        assert_eq!(atom(&out.mol, 1).mass_number, Some(13));
        assert_eq!(atom(&out.mol, 2).spin_multiplicity, SpinMultiplicity::Doublet);
        assert_eq!(out.mol.single_electron_count(NodeIndex::new(2)), 1);
        assert!(out.kinds.is_empty());
        assert_eq!(out.rest, None);
    }

    #[test]
    fn count_limits_tuples() {
        let out = run(Mode::Relaxed, 2, "M  CHG  1   1  -1   2   1\nM  END\n").unwrap();
        assert_eq!(atom(&out.mol, 1).formal_charge, 0);
    }

    #[test]
    fn alias_and_value() {
        let mut mol = chain(2);
        mol.atom_mut(NodeIndex::new(1)).kind = AtomKind::Pseudo("R".to_string());
        let mut registry = SgroupRegistry::new();
        let mut reporter = Reporter::new(Mode::Relaxed);
        let text = "A    1\nMe\nA    2\nR12\nV    1 hello\nM  END\n";
        let mut src = LineSource::new(text.as_bytes());
        read_properties(&mut src, &mut mol, &mut registry, &mut reporter).unwrap();
        assert_eq!(atom(&mol, 0).alias.as_deref(), Some("Me"));
        assert_eq!(atom(&mol, 0).element(), Some(Element::C));
        assert_eq!(atom(&mol, 1).kind, AtomKind::Pseudo("R12".to_string()));
        assert_eq!(atom(&mol, 0).comment.as_deref(), Some("hello"));
    }

    #[test]
    fn atom_lists() {
        let out = run(
            Mode::Relaxed,
            2,
            "M  ALS   1  2 F N   O   \nM  ALS   2  2 T Cl  Br  \nM  END\n",
        )
        .unwrap();
        assert_eq!(
            atom(&out.mol, 0).kind,
            AtomKind::Query(AtomExpr::Or(vec![AtomExpr::Element(7), AtomExpr::Element(8)]))
        );
        assert_eq!(
            atom(&out.mol, 1).kind,
            AtomKind::Query(
                AtomExpr::Or(vec![AtomExpr::Element(17), AtomExpr::Element(35)]).negate()
            )
        );
    }

    #[test]
    fn legacy_atom_list() {
        let out = run(Mode::Relaxed, 1, "  1 T    2   6   7\nM  END\n").unwrap();
        assert_eq!(
            atom(&out.mol, 0).kind,
            AtomKind::Query(AtomExpr::Not(Box::new(AtomExpr::Or(vec![
                AtomExpr::Element(6),
                AtomExpr::Element(7)
            ]))))
        );
    }

    #[test]
    fn rgroup_labels() {
        let out = run(Mode::Relaxed, 2, "M  RGP  1   2   3\nM  END\n").unwrap();
        assert_eq!(atom(&out.mol, 1).kind, AtomKind::Pseudo("R3".to_string()));
    }

    #[test]
    fn acd_label_modes() {
        let out = run(Mode::Relaxed, 1, "M  ZZC   1  C-1 \nM  END\n").unwrap();
        assert_eq!(atom(&out.mol, 0).acd_label.as_deref(), Some(" C-1 "));
        let err = run(Mode::Strict, 1, "M  ZZC   1  C-1\nM  END\n").err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::ProprietaryProperty));
    }

    #[test]
    fn skip_lines() {
        let out = run(
            Mode::Relaxed,
            1,
            "S  SKP  2\nM  CHG  1   1   1\ngarbage\nM  CHG  1   1  -1\nM  END\n",
        )
        .unwrap();
        assert_eq!(atom(&out.mol, 0).formal_charge, -1);
    }

    #[test]
    fn superatom_sgroup() {
        let out = run(
            Mode::Strict,
            3,
            "M  STY  1   1 SUP\nM  SAL   1  2   2   3\nM  SBL   1  1   1\nM  SMT   1 OMe\nM  SDS EXP  1   1\nM  END\n",
        )
        .unwrap();
        assert_eq!(out.sgroups.len(), 1);
        let sg = &out.sgroups[0];
        assert_eq!(sg.ty, SgroupType::Abbreviation);
        assert_eq!(sg.atoms, vec![1, 2]);
        assert_eq!(sg.bonds, vec![0]);
        assert_eq!(
            sg.detail,
            SgroupDetail::Abbreviation {
                label: Some("OMe".to_string()),
                expanded: true
            }
        );
    }

    #[test]
    fn undeclared_sgroup() {
        let err = run(Mode::Strict, 2, "M  SAL   2  1   1\nM  END\n").err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::UndeclaredSgroupReference));

        let out = run(Mode::Relaxed, 2, "M  SAL   2  1   1\nM  END\n").unwrap();
        assert_eq!(out.sgroups[0].ty, SgroupType::Generic);
        assert_eq!(out.sgroups[0].atoms, vec![0]);
        assert_eq!(out.kinds, vec![ErrorKind::UndeclaredSgroupReference]);
    }

    #[test]
    fn duplicate_declaration_in_strict_mode() {
        let err = run(Mode::Strict, 1, "M  STY  2   1 SUP   1 MUL\nM  END\n")
            .err()
            .unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::UndeclaredSgroupReference));
    }

    #[test]
    fn sgroup_hierarchy_and_cycles() {
        let out = run(
            Mode::Relaxed,
            1,
            "M  STY  2   1 SRU   2 SRU\nM  SPL  1   2   1\nM  SPL  1   1   2\nM  END\n",
        )
        .unwrap();
        assert_eq!(out.sgroups[1].parents, vec![0]);
        assert!(out.sgroups[0].parents.is_empty());
        assert_eq!(out.kinds, vec![ErrorKind::SgroupCycle]);

        let err = run(
            Mode::Strict,
            1,
            "M  STY  1   1 SRU\nM  SPL  1   1   1\nM  END\n",
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::SgroupCycle));
    }

    #[test]
    fn same_sgroup_block_gives_equal_forests() {
        let text = concat!(
            "M  STY  3   1 SRU   2 SUP   3 DAT\n",
            "M  SAL   1  2   1   2\n",
            "M  SAL   2  1   3\n",
            "M  SPL  2   2   1   3   2\n",
            "M  SMT   2 Ph\n",
            "M  END\n",
        );
        let first = run(Mode::Strict, 3, text).unwrap();
        let second = run(Mode::Strict, 3, text).unwrap();
        assert_eq!(first.sgroups.len(), 3);
        assert_eq!(first.sgroups[1].parents, vec![0]);
        assert_eq!(first.sgroups[2].parents, vec![1]);
        assert_eq!(first.sgroups, second.sgroups);
    }

    #[test]
    fn polymer_attributes() {
        let out = run(
            Mode::Strict,
            2,
            "M  STY  1   1 COP\nM  SST  1   1 RAN\nM  SCN  1   1 HT \nM  SBT  1   1   1\nM  SDI   1  4   -1.0000    0.5000   -1.0000   -0.5000\nM  END\n",
        )
        .unwrap();
        let sg = &out.sgroups[0];
        assert_eq!(sg.bracket_style, Some(1));
        assert_eq!(
            sg.brackets,
            vec![SgroupBracket {
                start: [-1.0, 0.5],
                end: [-1.0, -0.5]
            }]
        );
        assert_eq!(
            sg.detail,
            SgroupDetail::Polymer {
                subtype: Some("RAN".to_string()),
                connectivity: Some("HT".to_string())
            }
        );
    }

    #[test]
    fn strict_subtype_checks() {
        let err = run(Mode::Strict, 1, "M  STY  1   1 SRU\nM  SST  1   1 RAN\nM  END\n")
            .err()
            .unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSgroupValue));
        let err = run(Mode::Strict, 1, "M  STY  1   1 SRU\nM  SCN  1   1 XX \nM  END\n")
            .err()
            .unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSgroupValue));
    }

    #[test]
    fn data_sgroup() {
        let text = concat!(
            "M  STY  1   1 DAT\n",
            "M  SAL   1  1   1\n",
            "M  SDT   1 pKa                           N                     \n",
            "M  SDD   1     0.5000   -0.2500    DA    ALL  1       5\n",
            "M  SCD   1 4.\n",
            "M  SED   1 75\n",
            "M  END\n",
        );
        let out = run(Mode::Strict, 1, text).unwrap();
        match &out.sgroups[0].detail {
            SgroupDetail::Data {
                name,
                format,
                units,
                display,
                value,
            } => {
                assert_eq!(name.as_deref(), Some("pKa"));
                assert_eq!(format.as_deref(), Some("N"));
                assert_eq!(*units, None);
                assert!(display.as_deref().unwrap().contains("ALL"));
                assert_eq!(value.as_deref(), Some("4.75"));
            }
            other => panic!("expected data sgroup, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_atom_relaxed() {
        let out = run(Mode::Relaxed, 1, "M  CHG  1   5  -1\nM  END\n").unwrap();
        assert_eq!(out.kinds, vec![ErrorKind::AtomIndexOutOfRange]);
        assert_eq!(atom(&out.mol, 0).formal_charge, 0);
        let err = run(Mode::Strict, 1, "M  CHG  1   5  -1\nM  END\n").err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::AtomIndexOutOfRange));
    }

    #[test]
    fn delimiter_is_left_for_data_reader() {
        let out = run(Mode::Relaxed, 1, "M  CHG  1   1   1\n$$$$\n").unwrap();
        assert_eq!(out.rest.as_deref(), Some("$$$$"));
    }

    #[test]
    fn unstable_mass_cleared() {
        let mut mol = chain(1);
        mol.atom_mut(NodeIndex::new(0)).mass_number = Some(-1);
        let mut registry = SgroupRegistry::new();
        let mut reporter = Reporter::new(Mode::Strict);
        let mut src = LineSource::new("M  END\n".as_bytes());
        read_properties(&mut src, &mut mol, &mut registry, &mut reporter).unwrap();
        assert_eq!(mol.atom(NodeIndex::new(0)).mass_number, None);
        assert_eq!(
            reporter.into_diagnostics()[0].kind,
            ErrorKind::UnstableMassDelta
        );
    }
}
