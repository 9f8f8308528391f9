//! MDL Molfile V2000 reader.
//!
//! A record is decoded in one pass: header and counts line, atom block,
//! bond block, property block up to `M  END`, then any SD data items up to
//! `$$$$`. The valence model and stereo reconstruction run once the whole
//! record has been read.
//!
//! ```
//! use ctabcrab::parse_molfile;
//!
//! let text = "\
//! ethane
//!   example 2D
//!
//!   2  1  0  0  0  0  0  0  0  0999 V2000
//!     0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
//!     1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
//!   1  2  1  0
//! M  END
//! ";
//! let molecule = parse_molfile(text).unwrap();
//! assert_eq!(molecule.atom_count(), 2);
//! assert_eq!(molecule.atom(0).implicit_hydrogens, Some(3));
//! ```

mod atoms;
mod bonds;
pub mod columns;
mod data;
pub mod error;
mod header;
mod lines;
mod properties;

use std::io::BufRead;

use log::{debug, error};
use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::{Mol, StereoGroup};
use crate::molecule::Molecule;
use crate::sgroup::SgroupRegistry;
use crate::stereo::{
    perceive_double_bonds, perceive_tetrahedral, stereo_from_parities, Dimensionality, Parities,
};
use crate::valence::apply_valence_model;
use atoms::{read_atom_block, AtomBlock};
use bonds::read_bond_block;
use columns::length;
use data::read_data_items;
use error::Reporter;
use lines::{is_record_delimiter, LineSource};
use properties::read_properties;

pub use data::DataItem;
pub use error::{Diagnostic, ErrorKind, MolfileError, Result};
pub use header::{is_3d_program, parse_counts, CountsLine, CtabVersion, Header};
pub use properties::PropertyKey;

/// How recoverable problems are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Every recoverable problem aborts the record.
    Strict,
    /// Recoverable problems are logged, collected as diagnostics and
    /// decoding continues.
    #[default]
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub mode: Mode,
    /// Keep flat (z = 0) coordinates as 3D instead of converting them to 2D.
    pub force_3d: bool,
    /// Read `D` and `T` as hydrogen with mass 2 and 3.
    pub interpret_hydrogen_isotopes: bool,
    /// Build tetrahedral and double-bond stereo.
    pub generate_stereo: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Relaxed,
            force_3d: false,
            interpret_hydrogen_isotopes: true,
            generate_stereo: true,
        }
    }
}

/// Decodes the first record of `text` with default options.
pub fn parse_molfile(text: &str) -> Result<Molecule> {
    parse_molfile_with(text, &ReaderOptions::default()).map(|(molecule, _)| molecule)
}

/// Decodes the first record of `text`, returning the relaxed-mode
/// diagnostics alongside the molecule.
pub fn parse_molfile_with(
    text: &str,
    options: &ReaderOptions,
) -> Result<(Molecule, Vec<Diagnostic>)> {
    let mut reader = MolfileReader::with_options(text.as_bytes(), options.clone());
    match reader.read_molecule()? {
        Some(molecule) => Ok((molecule, reader.diagnostics)),
        None => Err(MolfileError::parse(
            1,
            ErrorKind::UnexpectedEof,
            "input holds no molfile record",
        )),
    }
}

/// Streaming reader over the records of an SD file.
///
/// After a fatal error the reader skips past the failed record's `$$$$`,
/// so iteration continues with the next record. I/O errors end the
/// iteration.
#[derive(Debug)]
pub struct MolfileReader<R> {
    src: LineSource<R>,
    options: ReaderOptions,
    diagnostics: Vec<Diagnostic>,
    exhausted: bool,
}

impl<R: BufRead> MolfileReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        Self {
            src: LineSource::new(reader),
            options,
            diagnostics: Vec::new(),
            exhausted: false,
        }
    }

    /// Reads the next record. `Ok(None)` means the input is used up.
    pub fn read_molecule(&mut self) -> Result<Option<Molecule>> {
        self.src.begin_record();
        let mut reporter = Reporter::new(self.options.mode);
        let result = read_record(&mut self.src, &self.options, &mut reporter);
        self.diagnostics = reporter.into_diagnostics();
        match result {
            Ok(molecule) => Ok(molecule),
            Err(MolfileError::Io(err)) => {
                error!("reading molfile failed: {err}");
                self.exhausted = true;
                Err(MolfileError::Io(err))
            }
            Err(err) => {
                error!("skipping molfile record: {err}");
                if !self.src.delimiter_consumed() {
                    if let Err(skip_err) = self.src.skip_record() {
                        error!("could not skip to the next record: {skip_err}");
                        self.exhausted = true;
                    }
                }
                Err(err)
            }
        }
    }

    /// Diagnostics collected while reading the most recent record.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl<R: BufRead> Iterator for MolfileReader<R> {
    type Item = Result<Molecule>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_molecule() {
            Ok(Some(molecule)) => Some(Ok(molecule)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Scans past a record whose counts line is empty. Only trailing blank
/// lines at the end of the input pass silently.
fn skip_vacuous_record<R: BufRead>(
    src: &mut LineSource<R>,
    reporter: &mut Reporter,
    counts_line_no: usize,
    mut all_blank: bool,
) -> Result<Option<Molecule>> {
    loop {
        match src.next_line()? {
            None if all_blank => return Ok(None),
            None => {
                reporter.recoverable(counts_line_no, ErrorKind::EmptyCountsLine, "empty counts line")?;
                return Ok(None);
            }
            Some(line) if is_record_delimiter(&line) => {
                reporter.recoverable(counts_line_no, ErrorKind::EmptyCountsLine, "empty counts line")?;
                return Ok(Some(Molecule::default()));
            }
            Some(line) => all_blank &= line.trim().is_empty(),
        }
    }
}

fn read_record<R: BufRead>(
    src: &mut LineSource<R>,
    options: &ReaderOptions,
    reporter: &mut Reporter,
) -> Result<Option<Molecule>> {
    let Some(title) = src.next_line()? else {
        return Ok(None);
    };
    if is_record_delimiter(&title) {
        return Ok(Some(Molecule::default()));
    }

    let mut all_blank = title.trim().is_empty();
    let mut lines = vec![title];
    while lines.len() < 4 {
        match src.next_line()? {
            Some(line) if is_record_delimiter(&line) => {
                reporter.recoverable(
                    src.line_number(),
                    ErrorKind::UnexpectedEof,
                    "record ended inside the header",
                )?;
                return Ok(Some(Molecule::default()));
            }
            Some(line) => {
                all_blank &= line.trim().is_empty();
                lines.push(line);
            }
            None if all_blank => return Ok(None),
            None => {
                return Err(MolfileError::parse(
                    src.line_number() + 1,
                    ErrorKind::UnexpectedEof,
                    "input ended inside the header",
                ))
            }
        }
    }
    let counts_line = lines.pop().unwrap_or_default();
    let remark = lines.pop().unwrap_or_default();
    let program = lines.pop().unwrap_or_default();
    let title = lines.pop().unwrap_or_default();
    let header = Header::new(title, program, remark);

    if length(&counts_line) == 0 {
        let line_no = src.line_number();
        return skip_vacuous_record(src, reporter, line_no, all_blank);
    }

    let counts = parse_counts(&counts_line);
    match counts.version {
        CtabVersion::V2000 => {}
        CtabVersion::V3000 => {
            return Err(MolfileError::parse(
                src.line_number(),
                ErrorKind::UnsupportedVersion,
                "V3000 connection tables are not supported",
            ))
        }
        CtabVersion::Unspecified => reporter.recoverable(
            src.line_number(),
            ErrorKind::UnspecifiedVersion,
            "counts line carries no V2000 version stamp",
        )?,
    }

    let mut atom_block = read_atom_block(src, counts.atoms, options, reporter)?;
    let bond_block = read_bond_block(src, counts.bonds, &mut atom_block, options, reporter)?;
    let has_z = atom_block.settle_coordinates(header.is_3d(), options.force_3d);
    let has_coordinates = atom_block.has_coordinates();
    let mut is_query = atom_block.is_query || bond_block.is_query;

    let AtomBlock {
        atoms, parities, ..
    } = atom_block;
    let mut mol = Mol::with_capacity(atoms.len(), bond_block.bonds.len());
    for atom in atoms {
        mol.add_atom(atom);
    }
    for record in bond_block.bonds {
        mol.add_bond(
            NodeIndex::new(record.begin),
            NodeIndex::new(record.end),
            record.bond,
        );
    }

    let mut sgroups = SgroupRegistry::new();
    read_properties(src, &mut mol, &mut sgroups, reporter)?;
    is_query |= mol.atoms().any(|idx| mol.atom(idx).is_query());

    let data = read_data_items(src)?;

    is_query |= apply_valence_model(&mut mol, &bond_block.explicit);

    if options.generate_stereo && !is_query {
        let dimensionality = if has_z {
            Some(Dimensionality::ThreeD)
        } else if !options.force_3d {
            Some(Dimensionality::TwoD)
        } else {
            None
        };
        let coordinates = dimensionality.filter(|_| has_coordinates);
        assign_stereo(&mut mol, parities, coordinates);
    }
    if !counts.chiral {
        for centre in mol.tetrahedral_stereo_mut() {
            centre.group = StereoGroup::Racemic(1);
        }
    }

    Ok(Some(Molecule {
        title: header.title,
        program: header.program,
        remark: header.remark,
        chiral: counts.chiral,
        is_query,
        mol,
        sgroups: sgroups.finish(),
        data,
    }))
}

/// Parity-derived centres win; coordinates are used for tetrahedral
/// centres only when no parity gave one.
fn assign_stereo(
    mol: &mut Mol<Atom, Bond>,
    parities: Parities,
    coordinates: Option<Dimensionality>,
) {
    let mut tetrahedral = stereo_from_parities(mol, parities);
    if let Some(dim) = coordinates {
        if tetrahedral.is_empty() {
            tetrahedral = perceive_tetrahedral(mol, dim);
        }
        let double_bonds = perceive_double_bonds(mol, dim);
        debug!(
            "perceived {} tetrahedral and {} double-bond stereo elements",
            tetrahedral.len(),
            double_bonds.len()
        );
        mol.set_double_bond_stereo(double_bonds);
    }
    mol.set_tetrahedral_stereo(tetrahedral);
}
