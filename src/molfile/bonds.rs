//! Bond block decoding.
//!
//! ```text
//!          1         2
//! 123456789012345678901
//! 111222tttsssxxxrrrccc
//! ```

use std::io::BufRead;

use super::atoms::{looks_like_atom_line, read_atom, AtomBlock};
use super::columns::{length, read_molfile_int, read_uint};
use super::error::{ErrorKind, MolfileError, Reporter, Result};
use super::lines::{is_property_line, is_record_delimiter, LineSource};
use super::ReaderOptions;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::query::BondExpr;
use crate::valence::ExplicitValence;

pub const MAX_BOND_LINE: usize = 21;
pub const MIN_BOND_LINE: usize = 9;
/// The stereo field ends at column 12.
const STEREO_FIELD_END: usize = 12;

/// A decoded bond line with 0-based endpoints.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BondRecord {
    pub begin: usize,
    pub end: usize,
    pub bond: Bond,
}

/// Validates a stereo code against the bond order. `None` marks a
/// combination the format does not allow.
fn to_stereo(code: i32, order: BondOrder) -> Option<BondStereo> {
    match (order, code) {
        (BondOrder::Single, 0) => Some(BondStereo::None),
        (BondOrder::Double, 0) => Some(BondStereo::EZByCoordinates),
        (BondOrder::Single, 1) => Some(BondStereo::Up),
        (BondOrder::Double, 3) => Some(BondStereo::EOrZ),
        (BondOrder::Single, 4) => Some(BondStereo::UpOrDown),
        (BondOrder::Single, 6) => Some(BondStereo::Down),
        _ => None,
    }
}

/// Decodes one bond line, flags aromatic endpoints and feeds the
/// explicit-valence accumulators.
pub(crate) fn read_bond(
    line: &str,
    line_no: usize,
    block: &mut AtomBlock,
    explicit: &mut Vec<ExplicitValence>,
    reporter: &mut Reporter,
) -> Result<BondRecord> {
    let len = length(line).min(MAX_BOND_LINE);
    if len < MIN_BOND_LINE {
        return Err(MolfileError::parse(
            line_no,
            ErrorKind::MalformedLineLength,
            format!("bond line has {len} columns, need at least {MIN_BOND_LINE}"),
        ));
    }
    let stereo_code = if len >= STEREO_FIELD_END {
        read_uint(line, 9, 3)
    } else {
        0
    };
    let u = read_molfile_int(line, 0) - 1;
    let v = read_molfile_int(line, 3) - 1;
    let ty = read_molfile_int(line, 6);

    let atom_count = block.atoms.len();
    let index = |i: i32| -> Result<usize> {
        if i < 0 || i as usize >= atom_count {
            return Err(MolfileError::parse(
                line_no,
                ErrorKind::AtomIndexOutOfRange,
                format!("bond references atom {} of {atom_count}", i + 1),
            ));
        }
        Ok(i as usize)
    };
    let (begin, end) = (index(u)?, index(v)?);

    let mut bond = match ty {
        1 => Bond::new(BondOrder::Single),
        2 => Bond::new(BondOrder::Double),
        3 => Bond::new(BondOrder::Triple),
        4 => Bond {
            order: BondOrder::Aromatic,
            stereo: BondStereo::None,
            is_aromatic: true,
        },
        5 => Bond::new(BondOrder::Query(BondExpr::SingleOrDouble)),
        6 => Bond::new(BondOrder::Query(BondExpr::SingleOrAromatic)),
        7 => Bond::new(BondOrder::Query(BondExpr::DoubleOrAromatic)),
        8 => Bond::new(BondOrder::Query(BondExpr::Any)),
        _ => {
            return Err(MolfileError::parse(
                line_no,
                ErrorKind::UnknownBondType,
                format!("unrecognised bond type {ty}"),
            ))
        }
    };

    if matches!(bond.order, BondOrder::Single | BondOrder::Double) {
        bond.stereo = match to_stereo(stereo_code, bond.order) {
            Some(stereo) => stereo,
            None => {
                reporter.recoverable(
                    line_no,
                    ErrorKind::InvalidBondStereoTypeCombination,
                    format!("stereo code {stereo_code} on bond type {ty}"),
                )?;
                to_stereo(0, bond.order).unwrap_or_default()
            }
        };
    }

    if bond.is_aromatic {
        block.atoms[begin].is_aromatic = true;
        block.atoms[end].is_aromatic = true;
    }

    if explicit.len() < atom_count {
        explicit.resize(atom_count, ExplicitValence::default());
    }
    match bond.order.numeric() {
        Some(order) => {
            explicit[begin].add(order);
            explicit[end].add(order);
        }
        None => {
            explicit[begin].mark_indeterminate();
            explicit[end].mark_indeterminate();
        }
    }

    Ok(BondRecord { begin, end, bond })
}

/// Bonds in file order plus the per-atom explicit valences.
#[derive(Debug, Default)]
pub(crate) struct BondBlock {
    pub bonds: Vec<BondRecord>,
    pub explicit: Vec<ExplicitValence>,
    /// A query bond type was read.
    pub is_query: bool,
}

/// Reads up to `count` bond lines.
///
/// A property line, the record delimiter or the end of input ends the block
/// early with `BondCountMismatch`. A line shaped like an atom line is taken
/// as an atom the counts line left out.
pub(crate) fn read_bond_block<R: BufRead>(
    src: &mut LineSource<R>,
    count: usize,
    atoms: &mut AtomBlock,
    options: &ReaderOptions,
    reporter: &mut Reporter,
) -> Result<BondBlock> {
    let mut block = BondBlock {
        bonds: Vec::with_capacity(count),
        explicit: vec![ExplicitValence::default(); atoms.atoms.len()],
        is_query: false,
    };
    let mismatch = |found: usize| format!("counts line declares {count} bonds, found {found}");

    while block.bonds.len() < count {
        let Some(line) = src.next_line()? else {
            reporter.recoverable(
                src.line_number(),
                ErrorKind::BondCountMismatch,
                mismatch(block.bonds.len()),
            )?;
            break;
        };
        if is_property_line(&line) || is_record_delimiter(&line) {
            reporter.recoverable(
                src.line_number(),
                ErrorKind::BondCountMismatch,
                mismatch(block.bonds.len()),
            )?;
            src.push_back(line);
            break;
        }
        if looks_like_atom_line(&line) {
            reporter.recoverable(
                src.line_number(),
                ErrorKind::AtomCountMismatch,
                "atom line found in the bond block",
            )?;
            let atom = read_atom(&line, src.line_number(), options, reporter)?;
            atoms.push(atom);
            block.explicit.push(ExplicitValence::default());
            continue;
        }
        let record = read_bond(
            &line,
            src.line_number(),
            atoms,
            &mut block.explicit,
            reporter,
        )?;
        block.is_query |= record.bond.order.is_query();
        block.bonds.push(record);
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molfile::Mode;

    fn two_carbons() -> AtomBlock {
        let mut block = AtomBlock::default();
        let mut rep = Reporter::new(Mode::Relaxed);
        for line in [
            "    0.0000    0.0000    0.0000 C",
            "    1.5000    0.0000    0.0000 C",
        ] {
            block.push(read_atom(line, 1, &ReaderOptions::default(), &mut rep).unwrap());
        }
        block
    }

    fn decode(line: &str, mode: Mode) -> (Result<BondRecord>, AtomBlock, Vec<ExplicitValence>) {
        let mut atoms = two_carbons();
        let mut explicit = Vec::new();
        let mut rep = Reporter::new(mode);
        let result = read_bond(line, 5, &mut atoms, &mut explicit, &mut rep);
        (result, atoms, explicit)
    }

    #[test]
    fn single_bond() {
        let (record, _, explicit) = decode("  1  2  1  0", Mode::Relaxed);
        let record = record.unwrap();
        assert_eq!((record.begin, record.end), (0, 1));
        assert_eq!(record.bond.order, BondOrder::Single);
        assert_eq!(record.bond.stereo, BondStereo::None);
        assert_eq!(explicit, vec![ExplicitValence::Sum(1); 2]);
    }

    #[test]
    fn short_bond_line_without_stereo() {
        let (record, _, _) = decode("  1  2  2", Mode::Relaxed);
        assert_eq!(record.unwrap().bond.stereo, BondStereo::EZByCoordinates);
    }

    #[test]
    fn stereo_table() {
        assert_eq!(to_stereo(1, BondOrder::Single), Some(BondStereo::Up));
        assert_eq!(to_stereo(6, BondOrder::Single), Some(BondStereo::Down));
        assert_eq!(to_stereo(4, BondOrder::Single), Some(BondStereo::UpOrDown));
        assert_eq!(to_stereo(3, BondOrder::Single), None);
        assert_eq!(to_stereo(3, BondOrder::Double), Some(BondStereo::EOrZ));
        assert_eq!(to_stereo(1, BondOrder::Double), None);
        assert_eq!(to_stereo(2, BondOrder::Single), None);
    }

    #[test]
    fn invalid_stereo_relaxed_and_strict() {
        let (record, _, _) = decode("  1  2  2  1", Mode::Relaxed);
        assert_eq!(record.unwrap().bond.stereo, BondStereo::EZByCoordinates);
        let (record, _, _) = decode("  1  2  2  1", Mode::Strict);
        assert_eq!(
            record.unwrap_err().kind(),
            Some(ErrorKind::InvalidBondStereoTypeCombination)
        );
    }

    #[test]
    fn triple_bond_ignores_stereo() {
        let (record, _, explicit) = decode("  1  2  3  1", Mode::Strict);
        let record = record.unwrap();
        assert_eq!(record.bond.stereo, BondStereo::None);
        assert_eq!(explicit[0], ExplicitValence::Sum(3));
    }

    #[test]
    fn aromatic_bond_flags_atoms() {
        let (record, atoms, explicit) = decode("  1  2  4  0", Mode::Relaxed);
        let record = record.unwrap();
        assert_eq!(record.bond.order, BondOrder::Aromatic);
        assert!(record.bond.is_aromatic);
        assert!(atoms.atoms.iter().all(|a| a.is_aromatic));
        assert_eq!(explicit, vec![ExplicitValence::Indeterminate; 2]);
    }

    #[test]
    fn query_bond_types() {
        for (ty, expr) in [
            (5, BondExpr::SingleOrDouble),
            (6, BondExpr::SingleOrAromatic),
            (7, BondExpr::DoubleOrAromatic),
            (8, BondExpr::Any),
        ] {
            let (record, _, explicit) = decode(&format!("  1  2  {ty}  0"), Mode::Relaxed);
            assert_eq!(record.unwrap().bond.order, BondOrder::Query(expr));
            assert_eq!(explicit[1], ExplicitValence::Indeterminate);
        }
    }

    #[test]
    fn fatal_bond_errors() {
        let (record, _, _) = decode("  1  2  9  0", Mode::Relaxed);
        assert_eq!(record.unwrap_err().kind(), Some(ErrorKind::UnknownBondType));
        let (record, _, _) = decode("  1  3  1  0", Mode::Relaxed);
        assert_eq!(record.unwrap_err().kind(), Some(ErrorKind::AtomIndexOutOfRange));
        let (record, _, _) = decode("  0  1  1  0", Mode::Relaxed);
        assert_eq!(record.unwrap_err().kind(), Some(ErrorKind::AtomIndexOutOfRange));
        let (record, _, _) = decode("  1  2", Mode::Relaxed);
        assert_eq!(record.unwrap_err().kind(), Some(ErrorKind::MalformedLineLength));
    }

    #[test]
    fn block_stops_at_property_line() {
        let mut atoms = two_carbons();
        let mut src = LineSource::new("  1  2  1  0\nM  END\n".as_bytes());
        let mut rep = Reporter::new(Mode::Relaxed);
        let block =
            read_bond_block(&mut src, 2, &mut atoms, &ReaderOptions::default(), &mut rep).unwrap();
        assert_eq!(block.bonds.len(), 1);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("M  END"));
        assert_eq!(rep.into_diagnostics()[0].kind, ErrorKind::BondCountMismatch);
    }

    #[test]
    fn block_stops_at_eof_strict() {
        let mut atoms = two_carbons();
        let mut src = LineSource::new("".as_bytes());
        let mut rep = Reporter::new(Mode::Strict);
        let err = read_bond_block(&mut src, 1, &mut atoms, &ReaderOptions::default(), &mut rep)
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BondCountMismatch));
    }

    #[test]
    fn extra_atom_in_bond_block() {
        let mut atoms = two_carbons();
        let text = "    3.0000    0.0000    0.0000 O\n  2  3  1  0\n";
        let mut src = LineSource::new(text.as_bytes());
        let mut rep = Reporter::new(Mode::Relaxed);
        let block =
            read_bond_block(&mut src, 1, &mut atoms, &ReaderOptions::default(), &mut rep).unwrap();
        assert_eq!(atoms.atoms.len(), 3);
        assert_eq!((block.bonds[0].begin, block.bonds[0].end), (1, 2));
        assert_eq!(block.explicit.len(), 3);
        assert_eq!(block.explicit[2], ExplicitValence::Sum(1));
        assert_eq!(rep.into_diagnostics()[0].kind, ErrorKind::AtomCountMismatch);
    }
}
