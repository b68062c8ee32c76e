use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;

static CELL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)([0-9]+)$").expect("cell reference pattern is valid")
});

/// Converts a spreadsheet address such as `C4` into zero-based `(row, col)`.
///
/// Column letters are case-insensitive and read as a base-26 numeral with
/// digit values 1-26, so `A` is column 0 and `AA` is column 26. No bounds
/// checking happens here; callers decide what an out-of-range index means.
pub fn resolve(cell_ref: &str) -> Result<(u32, u32), AppError> {
    let invalid = || AppError::InvalidReference(cell_ref.to_string());

    let caps = CELL_PATTERN.captures(cell_ref.trim()).ok_or_else(invalid)?;

    let mut col_number: u32 = 0;
    for c in caps[1].chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col_number = col_number
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(invalid)?;
    }

    let row_number: u32 = caps[2].parse().map_err(|_| invalid())?;
    if row_number == 0 {
        return Err(invalid());
    }

    Ok((row_number - 1, col_number - 1))
}

/// Inverse of the column half of [`resolve`]: 0 -> `A`, 26 -> `AA`.
pub fn column_name(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A parsed cell or range reference, keeping the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Cell {
        text: String,
        row: u32,
        col: u32,
    },
    /// Endpoints are normalised so `start <= end` on both axes.
    Range {
        text: String,
        start: (u32, u32),
        end: (u32, u32),
    },
}

impl Reference {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let text = text.trim();

        match text.split_once(':') {
            Some((first, second)) => {
                let (r1, c1) = resolve(first).map_err(|_| AppError::InvalidReference(text.to_string()))?;
                let (r2, c2) = resolve(second).map_err(|_| AppError::InvalidReference(text.to_string()))?;
                Ok(Reference::Range {
                    text: text.to_string(),
                    start: (r1.min(r2), c1.min(c2)),
                    end: (r1.max(r2), c1.max(c2)),
                })
            }
            None => {
                let (row, col) = resolve(text)?;
                Ok(Reference::Cell {
                    text: text.to_string(),
                    row,
                    col,
                })
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reference::Cell { text, .. } | Reference::Range { text, .. } => text,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Reference::Range { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_basic_addresses() {
        assert_eq!(resolve("A1").unwrap(), (0, 0));
        assert_eq!(resolve("C4").unwrap(), (3, 2));
        assert_eq!(resolve("c4").unwrap(), (3, 2));
        assert_eq!(resolve(" B5 ").unwrap(), (4, 1));
    }

    #[test]
    fn column_letters_are_bijective_base26() {
        let letters: Vec<String> = ('A'..='Z').map(|c| c.to_string()).collect();
        for (i, l) in letters.iter().enumerate() {
            assert_eq!(resolve(&format!("{}1", l)).unwrap(), (0, i as u32));
        }
        assert_eq!(resolve("AA1").unwrap().1, 26);
        assert_eq!(resolve("AZ1").unwrap().1, 51);
        assert_eq!(resolve("BA1").unwrap().1, 52);
        assert_eq!(resolve("XFD1").unwrap().1, 16383);
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in ["4A", "A", "1", "", "A0", "A1B", "A-1", "$A$1", "C4x"] {
            match resolve(bad) {
                Err(AppError::InvalidReference(text)) => assert_eq!(text, bad),
                other => panic!("expected InvalidReference for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn rejects_overflowing_numbers() {
        assert!(resolve("A99999999999").is_err());
        assert!(resolve("ZZZZZZZZZZ1").is_err());
    }

    #[test]
    fn column_name_round_trips_resolve() {
        for col in [0, 1, 25, 26, 27, 51, 52, 701, 702, 16383] {
            let name = column_name(col);
            assert_eq!(resolve(&format!("{}7", name)).unwrap(), (6, col));
        }
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(26), "AA");
    }

    #[test]
    fn range_endpoints_are_normalised() {
        let forward = Reference::parse("A1:C3").unwrap();
        let backward = Reference::parse("C3:A1").unwrap();
        let mixed = Reference::parse("A3:C1").unwrap();

        for r in [&forward, &backward, &mixed] {
            match r {
                Reference::Range { start, end, .. } => {
                    assert_eq!(*start, (0, 0));
                    assert_eq!(*end, (2, 2));
                }
                _ => panic!("expected a range"),
            }
        }
        assert_eq!(backward.text(), "C3:A1");
        assert!(forward.is_range());
    }

    #[test]
    fn malformed_range_reports_whole_text() {
        match Reference::parse("A1:3") {
            Err(AppError::InvalidReference(text)) => assert_eq!(text, "A1:3"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Reference::parse("A1:B2:C3").is_err());
    }
}
