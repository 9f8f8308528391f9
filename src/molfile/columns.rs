//! Fixed-column field readers.
//!
//! Every reader treats columns past the end of the line as blank, so a
//! truncated line decodes its missing trailing fields as zero.

/// Length of `line` without trailing blanks.
pub fn length(line: &str) -> usize {
    line.trim_end_matches(' ').len()
}

/// Text in columns `[start, end)`, clamped to the line. Columns that split
/// a multi-byte character give an empty field.
pub fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    let start = start.min(end);
    line.get(start..end).unwrap_or("")
}

/// Character at column `i`, or a blank past the end of the line.
pub fn column(line: &str, i: usize) -> u8 {
    line.as_bytes().get(i).copied().unwrap_or(b' ')
}

/// Value of a plain digit column. Signs map to ±1 and anything else to 0.
pub fn digit_value(c: u8) -> i32 {
    match c {
        b'+' => 1,
        b'-' => -1,
        b'0'..=b'9' => (c - b'0') as i32,
        _ => 0,
    }
}

/// Value of the single-character atom-block charge column. Kept apart from
/// [`digit_value`] even though both tables currently agree.
pub fn charge_code(c: u8) -> i32 {
    match c {
        b'+' => 1,
        b'-' => -1,
        b'0'..=b'9' => (c - b'0') as i32,
        _ => 0,
    }
}

pub fn sign(c: u8) -> i32 {
    if c == b'-' {
        -1
    } else {
        1
    }
}

/// Reads the 3-column right-aligned integer starting at `offset`.
///
/// Leading blanks are skipped, a `-` sets the sign, and the first blank or
/// `-` after a non-zero digit ends the number. Any other character stops
/// the scan.
pub fn read_molfile_int(line: &str, offset: usize) -> i32 {
    let bytes = line.as_bytes();
    let mut sign = 1;
    let mut result = 0;
    for i in offset..offset + 3 {
        let Some(&c) = bytes.get(i) else {
            break;
        };
        match c {
            b' ' => {
                if result > 0 {
                    return sign * result;
                }
            }
            b'-' => {
                if result > 0 {
                    return sign * result;
                }
                sign = -1;
            }
            b'0'..=b'9' => result = result * 10 + (c - b'0') as i32,
            _ => return sign * result,
        }
    }
    sign * result
}

/// Reads `width` columns as decimal digits through [`digit_value`]. Columns
/// past the end of the line are not read.
pub fn read_uint(line: &str, offset: usize, width: usize) -> i32 {
    line.as_bytes()
        .iter()
        .skip(offset)
        .take(width)
        .fold(0, |acc, &c| acc * 10 + digit_value(c))
}

/// Outcome of reading a 10-column coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    /// `xxxxx.xxxx` layout, or a blank field.
    Exact(f64),
    /// Readable, but not in the fixed 4-decimal layout.
    Tolerant(f64),
    /// Not a number at all.
    Unparseable,
}

impl Coordinate {
    pub fn value(self) -> f64 {
        match self {
            Coordinate::Exact(v) | Coordinate::Tolerant(v) => v,
            Coordinate::Unparseable => 0.0,
        }
    }
}

/// Reads the 10-column coordinate at `offset`, expecting the decimal point
/// at `offset + 5`.
pub fn read_coordinate(line: &str, offset: usize) -> Coordinate {
    let bytes = line.as_bytes();
    if bytes.get(offset + 5) == Some(&b'.') {
        let mut start = offset;
        while start < offset + 5 && bytes[start] == b' ' {
            start += 1;
        }
        let sign = sign(bytes[start]);
        if sign < 0 {
            start += 1;
        }
        let integral = read_uint(line, start, offset + 5 - start) as i64;
        let mut fraction: i64 = 0;
        for k in 0..4 {
            let digit = match bytes.get(offset + 6 + k) {
                Some(&c) => digit_value(c) as i64,
                None => 0,
            };
            fraction = fraction * 10 + digit;
        }
        return Coordinate::Exact(sign as f64 * (integral * 10000 + fraction) as f64 / 10000.0);
    }

    let text = field(line, offset, offset + 10).trim();
    if text.is_empty() {
        return Coordinate::Exact(0.0);
    }
    match text.parse::<f64>() {
        Ok(v) => Coordinate::Tolerant(v),
        Err(_) => Coordinate::Unparseable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_blank_length() {
        assert_eq!(length("M  END   "), 6);
        assert_eq!(length("   "), 0);
        assert_eq!(length(""), 0);
        assert_eq!(length("  1\t"), 4);
    }

    #[test]
    fn molfile_int_layouts() {
        assert_eq!(read_molfile_int("  2  1", 0), 2);
        assert_eq!(read_molfile_int("  2  1", 3), 1);
        assert_eq!(read_molfile_int(" 12", 0), 12);
        assert_eq!(read_molfile_int("123", 0), 123);
        assert_eq!(read_molfile_int(" -1", 0), -1);
        assert_eq!(read_molfile_int("-12", 0), -12);
        assert_eq!(read_molfile_int("   ", 0), 0);
        assert_eq!(read_molfile_int("1 2", 0), 1);
        assert_eq!(read_molfile_int(" 1-", 0), 1);
        assert_eq!(read_molfile_int("  x", 0), 0);
        assert_eq!(read_molfile_int(" 4x", 0), 4);
    }

    #[test]
    fn molfile_int_past_end() {
        assert_eq!(read_molfile_int("  7", 3), 0);
        assert_eq!(read_molfile_int(" 7", 0), 7);
        assert_eq!(read_molfile_int("", 10), 0);
    }

    #[test]
    fn uint_digit_table() {
        assert_eq!(read_uint("  12", 0, 4), 12);
        assert_eq!(read_uint("0042", 0, 4), 42);
        assert_eq!(read_uint("1a3", 0, 3), 103);
        assert_eq!(read_uint("12", 0, 3), 12);
    }

    #[test]
    fn digit_and_charge_tables_agree() {
        for c in 0u8..=127 {
            assert_eq!(digit_value(c), charge_code(c), "column byte {c}");
        }
        assert_eq!(charge_code(b'+'), 1);
        assert_eq!(charge_code(b'-'), -1);
        assert_eq!(charge_code(b'7'), 7);
        assert_eq!(charge_code(b'x'), 0);
        assert_eq!(sign(b'-'), -1);
        assert_eq!(sign(b'5'), 1);
    }

    #[test]
    fn fixed_coordinates() {
        let line = "    1.5000   -0.2500    0.0000 C   0  0";
        assert_eq!(read_coordinate(line, 0), Coordinate::Exact(1.5));
        assert_eq!(read_coordinate(line, 10), Coordinate::Exact(-0.25));
        assert_eq!(read_coordinate(line, 20), Coordinate::Exact(0.0));
        assert_eq!(
            read_coordinate("-1234.5678", 0),
            Coordinate::Exact(-1234.5678)
        );
    }

    #[test]
    fn coordinates_format_back_to_four_decimals() {
        for text in ["    0.0000", "   -0.0010", "   12.3456", "-9999.9999", " 1234.5000"] {
            let value = read_coordinate(text, 0).value();
            assert_eq!(format!("{:>10.4}", value), text);
        }
    }

    #[test]
    fn tolerant_coordinates() {
        assert_eq!(read_coordinate("   1.25   ", 0), Coordinate::Tolerant(1.25));
        assert_eq!(read_coordinate("     -3.5 ", 0), Coordinate::Tolerant(-3.5));
        assert_eq!(read_coordinate("      1e2 ", 0), Coordinate::Tolerant(100.0));
        assert_eq!(read_coordinate("          ", 0), Coordinate::Exact(0.0));
        assert_eq!(read_coordinate("", 0), Coordinate::Exact(0.0));
        assert_eq!(read_coordinate("   abc    ", 0), Coordinate::Unparseable);
        assert_eq!(Coordinate::Unparseable.value(), 0.0);
    }
}
