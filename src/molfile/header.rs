use super::columns::{column, field, length, read_molfile_int};

/// The three free-text lines that open every molfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub title: Option<String>,
    pub program: Option<String>,
    pub remark: Option<String>,
}

impl Header {
    pub fn new(title: String, program: String, remark: String) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            title: non_empty(title),
            program: non_empty(program),
            remark: non_empty(remark),
        }
    }

    /// `true` when the program line carries `3D` in columns 21-22.
    pub fn is_3d(&self) -> bool {
        self.program.as_deref().is_some_and(is_3d_program)
    }
}

pub fn is_3d_program(program: &str) -> bool {
    field(program, 20, 22) == "3D"
}

/// Connection-table version named at the end of the counts line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtabVersion {
    V2000,
    V3000,
    Unspecified,
}

impl CtabVersion {
    /// Looks for `V2000`/`V3000` at columns 34-38. Only the digit after the
    /// `V` is checked.
    pub fn of_counts_line(line: &str) -> Self {
        if length(line) < 39 || !matches!(column(line, 34), b'V' | b'v') {
            return CtabVersion::Unspecified;
        }
        match column(line, 35) {
            b'2' => CtabVersion::V2000,
            b'3' => CtabVersion::V3000,
            _ => CtabVersion::Unspecified,
        }
    }
}

/// Fields of the counts line (`aaabbblllfffcccsssxxxrrrpppiiimmmvvvvvv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountsLine {
    pub atoms: usize,
    pub bonds: usize,
    pub chiral: bool,
    pub version: CtabVersion,
}

/// Decodes a non-empty counts line. Negative counts are read as zero.
pub fn parse_counts(line: &str) -> CountsLine {
    CountsLine {
        atoms: read_molfile_int(line, 0).max(0) as usize,
        bonds: read_molfile_int(line, 3).max(0) as usize,
        chiral: read_molfile_int(line, 12) != 0,
        version: CtabVersion::of_counts_line(line),
    }
}
