//! Cell address and range types
//!
//! Addresses use A1 notation: bijective base-26 column letters followed by a
//! 1-based row number. Internally both coordinates are 0-based.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Canonical A1 form: upper-case letters, row without leading zeros.
fn a1_pattern() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| Regex::new(r"^([A-Z]+)([1-9][0-9]*)$").expect("valid regex"))
}

/// A cell address (e.g., "A1", "AB12")
///
/// Ordering is row-major: by row, then by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Encode a (row, col) pair as A1 text
    ///
    /// ```
    /// use sheetcalc_core::CellAddress;
    ///
    /// assert_eq!(CellAddress::encode(0, 0), "A1");
    /// assert_eq!(CellAddress::encode(9, 27), "AB10");
    /// ```
    pub fn encode(row: u32, col: u16) -> String {
        let mut result = Self::column_to_letters(col);
        result.push_str(&(u64::from(row) + 1).to_string());
        result
    }

    /// Decode canonical A1 text, returning `None` for anything malformed or
    /// outside the addressable space
    ///
    /// ```
    /// use sheetcalc_core::CellAddress;
    ///
    /// assert_eq!(CellAddress::decode("B3"), Some(CellAddress::new(2, 1)));
    /// assert_eq!(CellAddress::decode("B"), None);
    /// assert_eq!(CellAddress::decode("3B"), None);
    /// ```
    pub fn decode(s: &str) -> Option<Self> {
        Self::parse(s).ok()
    }

    /// Parse canonical A1 text, reporting why it was rejected
    pub fn parse(s: &str) -> Result<Self> {
        let caps = a1_pattern()
            .captures(s)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' is not in A1 form", s)))?;

        let col = Self::letters_to_column(&caps[1])?;

        let row: u64 = caps[2]
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        let row = row - 1;
        if row >= u64::from(MAX_ROWS) {
            return Err(Error::RowOutOfBounds(
                u32::try_from(row).unwrap_or(u32::MAX),
                MAX_ROWS - 1,
            ));
        }

        Ok(Self {
            row: row as u32,
            col,
        })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    ///
    /// Bijective base-26: there is no zero digit, so after emitting
    /// `col % 26` the remaining value is `col / 26 - 1`.
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::new();
        let mut n = i64::from(col);

        while n >= 0 {
            letters.push((b'A' + (n % 26) as u8) as char);
            n = n / 26 - 1;
        }

        letters.iter().rev().collect()
    }

    /// Convert upper-case column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c as u64 - 'A' as u64 + 1);
            if col > u64::from(MAX_COLS) {
                return Err(Error::ColumnOutOfBounds(
                    u32::try_from(col - 1).unwrap_or(u32::MAX),
                    MAX_COLS - 1,
                ));
            }
        }

        Ok((col - 1) as u16)
    }

    /// Whether the address lies inside the addressable space, i.e. whether
    /// its A1 form decodes back to it
    pub fn is_addressable(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        Self::encode(self.row, self.col)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
///
/// Always normalized: `start` is the top-left corner and `end` the
/// bottom-right one, whichever way round the endpoints were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from A1:B10 notation; a bare address is a one-cell range
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some((start, end)) = s.split_once(':') {
            let start = CellAddress::parse(start)
                .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
            let end = CellAddress::parse(end)
                .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s)?;
            Ok(Self::single(addr))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        (self.end.row - self.start.row).saturating_add(1)
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        (self.end.col - self.start.col).saturating_add(1)
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        let rows = u64::from(self.end.row - self.start.row) + 1;
        let cols = u64::from(self.end.col - self.start.col) + 1;
        rows * cols
    }

    /// Iterate over all cell addresses in the range (rows outer, columns inner)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count(),
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    remaining: u64,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let addr = CellAddress::new(self.current_row, self.current_col);
        if self.remaining == 0 {
            return Some(addr);
        }

        if self.current_col == self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(1), "B");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(27), "AB");
        assert_eq!(CellAddress::column_to_letters(51), "AZ");
        assert_eq!(CellAddress::column_to_letters(52), "BA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("Z").unwrap(), 25);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 701);
        assert_eq!(CellAddress::letters_to_column("AAA").unwrap(), 702);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);

        assert!(CellAddress::letters_to_column("XFE").is_err());
        assert!(CellAddress::letters_to_column("a").is_err());
        assert!(CellAddress::letters_to_column("").is_err());
    }

    #[test]
    fn test_encode() {
        assert_eq!(CellAddress::encode(0, 0), "A1");
        assert_eq!(CellAddress::encode(2, 1), "B3");
        assert_eq!(CellAddress::encode(99, 26), "AA100");
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
    }

    #[test]
    fn test_decode() {
        assert_eq!(CellAddress::decode("A1"), Some(CellAddress::new(0, 0)));
        assert_eq!(CellAddress::decode("B2"), Some(CellAddress::new(1, 1)));
        assert_eq!(CellAddress::decode("AA100"), Some(CellAddress::new(99, 26)));
        assert_eq!(
            CellAddress::decode("XFD1048576"),
            Some(CellAddress::new(1_048_575, 16383))
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(CellAddress::decode(""), None);
        assert_eq!(CellAddress::decode("A"), None);
        assert_eq!(CellAddress::decode("1"), None);
        assert_eq!(CellAddress::decode("A1B"), None);
        assert_eq!(CellAddress::decode("A1 "), None);
        assert_eq!(CellAddress::decode("$A$1"), None);
        // Non-canonical spellings would break the bijection
        assert_eq!(CellAddress::decode("a1"), None);
        assert_eq!(CellAddress::decode("A01"), None);
        assert_eq!(CellAddress::decode("A0"), None);
        // Outside the addressable space
        assert_eq!(CellAddress::decode("A1048577"), None);
        assert_eq!(CellAddress::decode("XFE1"), None);
        assert_eq!(CellAddress::decode("ZZZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_parse_reports_bounds() {
        assert!(matches!(
            CellAddress::parse("A1048577"),
            Err(Error::RowOutOfBounds(..))
        ));
        assert!(matches!(
            CellAddress::parse("XFE1"),
            Err(Error::ColumnOutOfBounds(..))
        ));
        assert!(matches!(
            CellAddress::parse("A-1"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_round_trip_small_grid() {
        for row in 0..200 {
            for col in 0..800u16 {
                let text = CellAddress::encode(row, col);
                assert_eq!(CellAddress::decode(&text), Some(CellAddress::new(row, col)));
            }
        }
    }

    #[test]
    fn test_cell_range_normalizes() {
        let range = CellRange::new(CellAddress::new(4, 3), CellAddress::new(1, 0));
        assert_eq!(range.start, CellAddress::new(1, 0));
        assert_eq!(range.end, CellAddress::new(4, 3));

        // Anti-diagonal corners
        let range = CellRange::parse("C1:A3").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(2, 2));
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("A1:B2").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(1, 1));

        let range = CellRange::parse("C3").unwrap();
        assert_eq!(range, CellRange::single(CellAddress::new(2, 2)));

        assert!(CellRange::parse("A1:").is_err());
        assert!(CellRange::parse("A1:B").is_err());
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2:D4").unwrap();

        assert!(range.contains(&CellAddress::new(1, 1)));
        assert!(range.contains(&CellAddress::new(3, 3)));
        assert!(range.contains(&CellAddress::new(2, 2)));

        assert!(!range.contains(&CellAddress::new(0, 0)));
        assert!(!range.contains(&CellAddress::new(4, 1)));
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("B2:A1").unwrap();
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(
            cells,
            vec![
                CellAddress::new(0, 0),
                CellAddress::new(0, 1),
                CellAddress::new(1, 0),
                CellAddress::new(1, 1),
            ]
        );
        assert_eq!(range.cells().len(), 4);
    }

    #[test]
    fn test_cell_range_iterator_last_column() {
        let last = MAX_COLS - 1;
        let range = CellRange::from_indices(0, last - 1, 1, last);
        assert_eq!(range.cells().count(), 4);
    }

    #[test]
    fn test_cell_range_iterator_last_row() {
        let range = CellRange::from_indices(u32::MAX, 0, u32::MAX, 0);
        assert_eq!(
            range.cells().collect::<Vec<_>>(),
            vec![CellAddress::new(u32::MAX, 0)]
        );

        let range = CellRange::from_indices(u32::MAX - 1, 3, u32::MAX, 4);
        assert_eq!(range.cells().count(), 4);
        assert_eq!(range.cells().last(), Some(CellAddress::new(u32::MAX, 4)));

        let whole = CellRange::from_indices(0, 0, u32::MAX, u16::MAX);
        assert_eq!(whole.cell_count(), (1u64 << 32) * (1u64 << 16));
    }

    #[test]
    fn test_is_addressable() {
        assert!(CellAddress::new(0, 0).is_addressable());
        assert!(CellAddress::new(MAX_ROWS - 1, MAX_COLS - 1).is_addressable());
        assert!(!CellAddress::new(MAX_ROWS, 0).is_addressable());
        assert!(!CellAddress::new(0, MAX_COLS).is_addressable());

        // Exactly the addresses whose text form decodes back
        for addr in [CellAddress::new(MAX_ROWS - 1, 7), CellAddress::new(MAX_ROWS, 7)] {
            assert_eq!(
                CellAddress::decode(&addr.to_string()).is_some(),
                addr.is_addressable()
            );
        }
    }

    #[test]
    fn test_cell_range_display() {
        assert_eq!(CellRange::parse("A1:B10").unwrap().to_string(), "A1:B10");
        assert_eq!(CellRange::parse("C3").unwrap().to_string(), "C3");
    }
}
