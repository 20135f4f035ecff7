//! A small reader for tab-separated values, as exported by spreadsheet
//! applications.
//!
//! The first non-blank line is the header row. Cells that start with a
//! double quote are read as quoted fields, in which case tabs and newlines
//! are part of the value and `""` stands for a single quote.
//!
//! ```
//! let doc = tsvary::Document::parse("Name\tScore\nCeleste\t97\n").unwrap();
//! let score = doc.column("score").unwrap();
//! assert_eq!(doc.records()[0].get(score), Some("97"));
//! ```

mod error;

pub use error::Error;

/// A parsed TSV document: a header row and zero or more records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    headers: Vec<String>,
    records: Vec<Record>,
}

/// A single row of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line: usize,
    fields: Vec<String>,
}

impl Record {
    /// The 1-based line in the source where this record starts.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The trimmed cell at `column`, or `None` if the cell is missing or blank.
    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields
            .get(column)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    }

    /// The raw cells of this record, untrimmed.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut rows = Reader::new(input);

        let header = loop {
            match rows.next_row()? {
                None => return Err(Error::MissingHeader),
                Some(row) if row.is_blank() => continue,
                Some(row) => break row,
            }
        };

        let headers: Vec<String> = header
            .fields
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        for (i, name) in headers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if headers[..i].iter().any(|h| same_name(h, name)) {
                return Err(Error::DuplicateHeader {
                    name: name.clone(),
                    line: header.line,
                });
            }
        }

        let mut records = Vec::new();
        while let Some(row) = rows.next_row()? {
            if !row.is_blank() {
                records.push(row);
            }
        }

        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Index of the header named `name`, ignoring surrounding whitespace and
    /// case.
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers
            .iter()
            .position(|h| same_name(h, name))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Header names match regardless of case, accented letters included.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn next_row(&mut self) -> Result<Option<Record>, Error> {
        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let line = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut at_field_start = true;

        loop {
            match self.chars.next() {
                None => {
                    fields.push(field);
                    break;
                }
                Some('"') if at_field_start => {
                    self.quoted(&mut field, line)?;
                    at_field_start = false;
                }
                Some('\t') => {
                    fields.push(std::mem::take(&mut field));
                    at_field_start = true;
                }
                Some('\r') if self.chars.peek() == Some(&'\n') => {}
                Some('\n') => {
                    self.line += 1;
                    fields.push(field);
                    break;
                }
                Some(c) => {
                    field.push(c);
                    at_field_start = false;
                }
            }
        }

        Ok(Some(Record { line, fields }))
    }

    /// Reads the rest of a quoted field. Text following the closing quote up
    /// to the next separator is appended as-is.
    fn quoted(&mut self, field: &mut String, start: usize) -> Result<(), Error> {
        loop {
            match self.chars.next() {
                None => return Err(Error::UnterminatedQuote { line: start }),
                Some('"') => {
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        field.push('"');
                    } else {
                        return Ok(());
                    }
                }
                Some('\n') => {
                    self.line += 1;
                    field.push('\n');
                }
                Some(c) => field.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn cells(doc: &Document) -> Vec<Vec<Option<&str>>> {
        doc.records()
            .iter()
            .map(|r| (0..doc.headers().len()).map(|i| r.get(i)).collect())
            .collect()
    }

    #[test]
    fn reads_headers_and_rows() {
        let doc = Document::parse("Titolo\tPiattaforma\nHades\tPC, Switch\nCeleste\tPC\n").unwrap();
        assert_eq!(doc.headers(), &["Titolo", "Piattaforma"]);
        assert_eq!(
            cells(&doc),
            vec![
                vec![Some("Hades"), Some("PC, Switch")],
                vec![Some("Celeste"), Some("PC")],
            ]
        );
        assert_eq!(doc.records()[1].line(), 3);
    }

    #[rstest]
    #[case::crlf("a\tb\r\n1\t2\r\n")]
    #[case::bom("\u{feff}a\tb\n1\t2")]
    #[case::leading_blank_lines("\n\n a \tb\n1\t2\n\n")]
    #[case::blank_rows_between("a\tb\n\t\n1\t2\n")]
    fn tolerates_spreadsheet_noise(#[case] input: &str) {
        let doc = Document::parse(input).unwrap();
        assert_eq!(doc.headers(), &["a", "b"]);
        assert_eq!(cells(&doc), vec![vec![Some("1"), Some("2")]]);
    }

    #[test]
    fn short_rows_read_as_missing() {
        let doc = Document::parse("a\tb\tc\n1\n2\t\t3\t4\n").unwrap();
        assert_eq!(
            cells(&doc),
            vec![
                vec![Some("1"), None, None],
                vec![Some("2"), None, Some("3")],
            ]
        );
        assert_eq!(doc.records()[1].fields().len(), 4);
    }

    #[test]
    fn quoted_fields_keep_tabs_newlines_and_quotes() {
        let doc = Document::parse("a\tb\n\"multi\nline\"\t\"say \"\"hi\"\"\tthere\"\nx\ty\n").unwrap();
        assert_eq!(
            cells(&doc),
            vec![
                vec![Some("multi\nline"), Some("say \"hi\"\tthere")],
                vec![Some("x"), Some("y")],
            ]
        );
        assert_eq!(doc.records()[1].line(), 4);
    }

    #[test]
    fn quotes_inside_a_cell_are_literal() {
        let doc = Document::parse("a\nThe \"Best\" Game\n").unwrap();
        assert_eq!(cells(&doc), vec![vec![Some("The \"Best\" Game")]]);
    }

    #[test]
    fn column_lookup_ignores_case_and_padding() {
        let doc = Document::parse("Voto Totale\t% Trofei\n").unwrap();
        assert_eq!(doc.column(" voto totale "), Some(0));
        assert_eq!(doc.column("% TROFEI"), Some(1));
        assert_eq!(doc.column("Stato"), None);
        assert!(doc.is_empty());
    }

    #[test]
    fn column_lookup_folds_accented_capitals() {
        let doc = Document::parse("Titolo\tDifficoltà\n").unwrap();
        assert_eq!(doc.column("DIFFICOLTÀ"), Some(1));
        assert_eq!(doc.column("difficolta"), None);
    }

    #[rstest]
    #[case::empty("", Error::MissingHeader)]
    #[case::only_blank("\n \n\t\n", Error::MissingHeader)]
    #[case::unterminated("a\n\"oops\n", Error::UnterminatedQuote { line: 2 })]
    #[case::duplicate("a\tb\tA\n", Error::DuplicateHeader { name: "A".to_string(), line: 1 })]
    #[case::duplicate_accented(
        "Città\tCITTÀ\n",
        Error::DuplicateHeader { name: "CITTÀ".to_string(), line: 1 }
    )]
    fn rejects_malformed_input(#[case] input: &str, #[case] expected: Error) {
        assert_eq!(Document::parse(input).unwrap_err(), expected);
    }
}
