use std::io::BufRead;

use super::error::Result;

/// Marker line closing an SD record.
pub const RECORD_DELIMITER: &str = "$$$$";

pub fn is_record_delimiter(line: &str) -> bool {
    line.starts_with(RECORD_DELIMITER)
}

/// True for the line prefixes that can open the property block.
pub fn is_property_line(line: &str) -> bool {
    ["M  ", "A  ", "V  ", "G  ", "S  "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Line reader with one line of pushback and 1-based line numbering.
#[derive(Debug)]
pub(crate) struct LineSource<R> {
    reader: R,
    line_number: usize,
    pushed: Option<String>,
    delimiter_consumed: bool,
}

impl<R: BufRead> LineSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            pushed: None,
            delimiter_consumed: false,
        }
    }

    /// Number of the line most recently returned.
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next line without its terminator, or `None` at end of input.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        let line = match self.pushed.take() {
            Some(line) => line,
            None => {
                let mut line = String::new();
                if self.reader.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                line
            }
        };
        self.line_number += 1;
        self.delimiter_consumed = is_record_delimiter(&line);
        Ok(Some(line))
    }

    /// Returns `line` to the source; the next call to `next_line` yields it
    /// again.
    pub(crate) fn push_back(&mut self, line: String) {
        debug_assert!(self.pushed.is_none(), "only one line of pushback");
        self.line_number -= 1;
        self.delimiter_consumed = false;
        self.pushed = Some(line);
    }

    /// Starts a new record; forgets whether the last line was a delimiter.
    pub(crate) fn begin_record(&mut self) {
        self.delimiter_consumed = false;
    }

    /// Whether the most recently returned line closed the record.
    pub(crate) fn delimiter_consumed(&self) -> bool {
        self.delimiter_consumed
    }

    /// Discards lines up to and including the next record delimiter.
    pub(crate) fn skip_record(&mut self) -> Result<()> {
        while let Some(line) = self.next_line()? {
            if is_record_delimiter(&line) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings_and_counts() {
        let mut src = LineSource::new("a\r\nb\nc".as_bytes());
        assert_eq!(src.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(src.line_number(), 2);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(src.next_line().unwrap(), None);
        assert_eq!(src.line_number(), 3);
    }

    #[test]
    fn pushback_replays_line() {
        let mut src = LineSource::new("one\ntwo\n".as_bytes());
        let first = src.next_line().unwrap().unwrap();
        src.push_back(first);
        assert_eq!(src.line_number(), 0);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("one"));
        assert_eq!(src.line_number(), 1);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn delimiter_tracking() {
        let mut src = LineSource::new("x\n$$$$\ny\n".as_bytes());
        src.next_line().unwrap();
        assert!(!src.delimiter_consumed());
        let delim = src.next_line().unwrap().unwrap();
        assert!(src.delimiter_consumed());
        src.push_back(delim);
        assert!(!src.delimiter_consumed());
        src.skip_record().unwrap();
        assert!(src.delimiter_consumed());
        assert_eq!(src.next_line().unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn property_prefixes() {
        assert!(is_property_line("M  END"));
        assert!(is_property_line("A    1"));
        assert!(is_property_line("S  SKP  2"));
        assert!(!is_property_line("  1  2  1  0"));
        assert!(!is_property_line("M END"));
    }
}
