//! Atom block decoding.
//!
//! ```text
//!          1         2         3         4         5         6
//! 123456789012345678901234567890123456789012345678901234567890123456789
//! xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaaddcccssshhhbbbvvvHHHrrriiimmmnnneee
//! ```
//!
//! Lines may be truncated after the symbol. Each optional field is only
//! read when the line reaches the length at which it ends.

use std::io::BufRead;

use petgraph::graph::NodeIndex;

use super::columns::{
    charge_code, column, digit_value, field, length, read_coordinate, read_molfile_int, sign,
    Coordinate,
};
use super::error::{ErrorKind, MolfileError, Reporter, Result};
use super::lines::{is_property_line, is_record_delimiter, LineSource};
use super::ReaderOptions;
use crate::atom::{Atom, AtomKind};
use crate::element::Element;
use crate::query::AtomExpr;
use crate::stereo::Parities;

/// Longest atom line layout; anything beyond is ignored.
pub const MAX_ATOM_LINE: usize = 69;
/// Coordinates and symbol end at column 32.
pub const MIN_ATOM_LINE: usize = 32;

/// Labels accepted as non-elemental placeholders.
pub const PSEUDO_LABELS: [&str; 7] = ["*", "A", "Q", "L", "LP", "R", "R#"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailingField {
    Mapping,
    Valence,
    HydrogenCount,
    Parity,
    Charge,
    MassDelta,
}

/// `(minimum line length, field, first column)`, longest first.
const TRAILING_FIELDS: [(usize, TrailingField, usize); 6] = [
    (63, TrailingField::Mapping, 60),
    (51, TrailingField::Valence, 48),
    (45, TrailingField::HydrogenCount, 42),
    (42, TrailingField::Parity, 41),
    (39, TrailingField::Charge, 38),
    (36, TrailingField::MassDelta, 34),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TrailingValues {
    mapping: i32,
    valence: i32,
    hydrogen_count: i32,
    parity: i32,
    charge: i32,
    mass_delta: i32,
}

fn read_trailing(line: &str, len: usize) -> TrailingValues {
    let mut values = TrailingValues::default();
    for &(min, which, col) in TRAILING_FIELDS.iter() {
        if len < min {
            continue;
        }
        match which {
            TrailingField::Mapping => values.mapping = read_molfile_int(line, col),
            TrailingField::Valence => values.valence = read_molfile_int(line, col),
            TrailingField::HydrogenCount => values.hydrogen_count = read_molfile_int(line, col),
            TrailingField::Parity => values.parity = digit_value(column(line, col)),
            TrailingField::Charge => values.charge = charge_code(column(line, col)),
            TrailingField::MassDelta => {
                values.mass_delta = sign(column(line, col)) * digit_value(column(line, col + 1))
            }
        }
    }
    values
}

fn coordinate(
    line: &str,
    offset: usize,
    line_no: usize,
    reporter: &mut Reporter,
) -> Result<f64> {
    let c = read_coordinate(line, offset);
    match c {
        Coordinate::Exact(v) => return Ok(v),
        Coordinate::Tolerant(_) => reporter.recoverable(
            line_no,
            ErrorKind::InvalidNumericField,
            format!("coordinate not in xxxxx.xxxx form: {:?}", field(line, offset, offset + 10)),
        )?,
        Coordinate::Unparseable => reporter.recoverable(
            line_no,
            ErrorKind::InvalidNumericField,
            format!("unreadable coordinate {:?}, using 0", field(line, offset, offset + 10)),
        )?,
    }
    Ok(c.value())
}

/// Resolves an atom symbol to its kind, plus a mass number for hydrogen
/// isotope labels.
fn resolve_symbol(
    symbol: &str,
    line_no: usize,
    options: &ReaderOptions,
    reporter: &mut Reporter,
) -> Result<(AtomKind, Option<i32>)> {
    if let Some(element) = Element::from_symbol(symbol) {
        return Ok((AtomKind::Element(element), None));
    }
    if options.interpret_hydrogen_isotopes {
        let mass = match symbol {
            "D" => Some(2),
            "T" => Some(3),
            _ => None,
        };
        if let Some(mass) = mass {
            reporter.warn(
                line_no,
                ErrorKind::HydrogenIsotopeLabel,
                format!("{symbol} read as hydrogen with mass {mass}"),
            );
            return Ok((AtomKind::Element(Element::H), Some(mass)));
        }
    }
    if PSEUDO_LABELS.contains(&symbol) {
        let label = if symbol == "R#" { "R" } else { symbol };
        return Ok((AtomKind::Pseudo(label.to_string()), None));
    }
    reporter.recoverable(
        line_no,
        ErrorKind::UnknownElementSymbol,
        format!("unrecognised atom symbol {symbol:?}"),
    )?;
    Ok((AtomKind::Pseudo(symbol.to_string()), None))
}

/// Decodes one atom line.
///
/// The returned atom always carries `point3d`; the block decides later
/// whether the coordinates are really 2D or absent.
pub(crate) fn read_atom(
    line: &str,
    line_no: usize,
    options: &ReaderOptions,
    reporter: &mut Reporter,
) -> Result<Atom> {
    let len = length(line).min(MAX_ATOM_LINE);
    if len < MIN_ATOM_LINE {
        return Err(MolfileError::parse(
            line_no,
            ErrorKind::MalformedLineLength,
            format!("atom line has {len} columns, need at least {MIN_ATOM_LINE}"),
        ));
    }
    let values = read_trailing(line, len);

    let x = coordinate(line, 0, line_no, reporter)?;
    let y = coordinate(line, 10, line_no, reporter)?;
    let z = coordinate(line, 20, line_no, reporter)?;
    let symbol = field(line, 31, 34).trim();

    let (kind, isotope_mass) = resolve_symbol(symbol, line_no, options, reporter)?;
    let mut atom = Atom::new(kind);
    atom.mass_number = isotope_mass;

    if values.mass_delta != 0 {
        if let Some(element) = atom.element() {
            atom.mass_number = Some(match element.major_isotope() {
                Some(major) => major as i32 + values.mass_delta,
                None => -1,
            });
        }
    }

    if values.hydrogen_count != 0 {
        let base = match atom.element() {
            Some(element) => AtomExpr::Element(element.atomic_num()),
            None => AtomExpr::True,
        };
        let hydrogens = (values.hydrogen_count - 1).clamp(0, u8::MAX as i32) as u8;
        atom.kind = AtomKind::Query(AtomExpr::And(vec![
            base,
            AtomExpr::ImplicitHCount(hydrogens),
        ]));
    }

    atom.point3d = Some([x, y, z]);
    atom.formal_charge = values.charge as i8;
    atom.stereo_parity = values.parity.clamp(0, 3) as u8;
    if (1..16).contains(&values.valence) {
        atom.valence = Some(if values.valence == 15 {
            0
        } else {
            values.valence as u8
        });
    }
    if values.mapping > 0 {
        atom.mapping = Some(values.mapping as u32);
    }
    Ok(atom)
}

/// `true` for a short line that belongs to a later block: a bond line,
/// a property record or the record delimiter.
pub(crate) fn ends_atom_block(line: &str) -> bool {
    length(line) < MIN_ATOM_LINE
        && (is_record_delimiter(line) || is_property_line(line) || looks_like_bond_line(line))
}

fn looks_like_bond_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    let len = length(line);
    (9..=21).contains(&len)
        && bytes[..9].iter().all(|c| *c == b' ' || c.is_ascii_digit())
        && [2, 5, 8].iter().all(|&i| bytes[i].is_ascii_digit())
}

/// `true` for a line with the shape of an atom line (a decimal point at
/// column 5 and room for a symbol).
pub(crate) fn looks_like_atom_line(line: &str) -> bool {
    length(line) >= MIN_ATOM_LINE && column(line, 5) == b'.'
}

/// Atoms decoded so far, with the bookkeeping the later stages need.
#[derive(Debug, Default)]
pub(crate) struct AtomBlock {
    pub atoms: Vec<Atom>,
    pub parities: Parities,
    pub has_x: bool,
    pub has_y: bool,
    pub has_z: bool,
    /// An atom line turned an atom into a query.
    pub is_query: bool,
}

impl AtomBlock {
    pub(crate) fn push(&mut self, atom: Atom) {
        if let Some([x, y, z]) = atom.point3d {
            self.has_x |= x != 0.0;
            self.has_y |= y != 0.0;
            self.has_z |= z != 0.0;
        }
        self.parities
            .record(NodeIndex::new(self.atoms.len()), atom.stereo_parity);
        self.is_query |= atom.is_query();
        self.atoms.push(atom);
    }

    /// Coordinates exist in at least the x and y directions.
    pub(crate) fn has_coordinates(&self) -> bool {
        self.has_x && self.has_y
    }

    /// Settles the dimensionality of the coordinates.
    ///
    /// All-zero coordinates are dropped (a lone atom is placed at the 2D
    /// origin instead). With a flat z the coordinates become 2D unless the
    /// program line declares 3D or `force_3d` is set. Returns whether the
    /// molecule has 3D coordinates.
    pub(crate) fn settle_coordinates(&mut self, declared_3d: bool, force_3d: bool) -> bool {
        if !self.has_x && !self.has_y && !self.has_z {
            if self.atoms.len() == 1 {
                self.atoms[0].point2d = Some([0.0, 0.0]);
            } else {
                for atom in &mut self.atoms {
                    atom.point3d = None;
                }
            }
            return false;
        }
        if self.has_z {
            return true;
        }
        if declared_3d {
            return true;
        }
        if !force_3d {
            for atom in &mut self.atoms {
                if let Some([x, y, _]) = atom.point3d.take() {
                    atom.point2d = Some([x, y]);
                }
            }
        }
        false
    }
}

/// Reads up to `count` atom lines.
///
/// A short line that belongs to a later block ends the block early with an
/// `AtomCountMismatch` and is left for the next stage.
pub(crate) fn read_atom_block<R: BufRead>(
    src: &mut LineSource<R>,
    count: usize,
    options: &ReaderOptions,
    reporter: &mut Reporter,
) -> Result<AtomBlock> {
    let mut block = AtomBlock {
        atoms: Vec::with_capacity(count),
        ..AtomBlock::default()
    };
    while block.atoms.len() < count {
        let Some(line) = src.next_line()? else {
            return Err(MolfileError::parse(
                src.line_number() + 1,
                ErrorKind::UnexpectedEof,
                format!("expected {count} atoms, input ended after {}", block.atoms.len()),
            ));
        };
        if ends_atom_block(&line) {
            reporter.recoverable(
                src.line_number(),
                ErrorKind::AtomCountMismatch,
                format!("counts line declares {count} atoms, found {}", block.atoms.len()),
            )?;
            src.push_back(line);
            break;
        }
        let atom = read_atom(&line, src.line_number(), options, reporter)?;
        block.push(atom);
    }
    Ok(block)
}
