//! Fileproof - Quote-aware field splitting
//!
//! A quoted span opens at a quote character and closes at the next matching
//! quote of the same kind. Inside a span, a doubled quote is a literal quote
//! and delimiters do not separate fields. There is no backslash escaping.
//!
//! A span that opens after other content in the same field (`ab"c,d"`) does
//! not make the field quoted. A delimiter swallowed by such a span is
//! remembered on the field so the validator can report it.

use std::iter::Peekable;
use std::str::Chars;

/// Quote characters recognised by default: double and single quotes.
pub const DEFAULT_QUOTES: &[char] = &['"', '\''];

/// A single parsed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field content with enclosing quotes removed and doubled quotes collapsed
    pub text: String,
    /// True when the field's first non-whitespace character opened a quoted span
    pub quoted: bool,
    /// A delimiter was taken in by a span that opened mid-field
    pub hidden_delimiter: bool,
}

/// Result of splitting one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRow {
    pub fields: Vec<Field>,
    /// The line ended while a quoted span was still open
    pub unclosed: bool,
}

impl SplitRow {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

enum Token {
    /// Character outside any span
    Text(char),
    /// Character inside a span, including a collapsed doubled quote
    Quoted(char),
    Delimiter,
    OpenQuote,
}

/// Character scanner that tracks the active quote
struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    delimiter: char,
    quotes: &'a [char],
    active: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str, delimiter: char, quotes: &'a [char]) -> Self {
        Self {
            chars: line.chars().peekable(),
            delimiter,
            quotes,
            active: None,
        }
    }

    fn in_quote(&self) -> bool {
        self.active.is_some()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let c = self.chars.next()?;
            match self.active {
                Some(q) if c == q => {
                    if self.chars.peek() == Some(&q) {
                        self.chars.next();
                        return Some(Token::Quoted(q));
                    }
                    self.active = None;
                }
                Some(_) => return Some(Token::Quoted(c)),
                None if c == self.delimiter => return Some(Token::Delimiter),
                None if self.quotes.contains(&c) => {
                    self.active = Some(c);
                    return Some(Token::OpenQuote);
                }
                None => return Some(Token::Text(c)),
            }
        }
    }
}

/// Count occurrences of `delimiter` outside quoted spans.
pub fn count_outside_quotes(line: &str, delimiter: char, quotes: &[char]) -> usize {
    Scanner::new(line, delimiter, quotes)
        .filter(|t| matches!(t, Token::Delimiter))
        .count()
}

/// Split a line into fields.
///
/// An unterminated quote does not abort the split: the fields found so far
/// are returned and `unclosed` is set.
pub fn split_row(line: &str, delimiter: char, quotes: &[char]) -> SplitRow {
    let mut scanner = Scanner::new(line, delimiter, quotes);
    let mut fields = Vec::new();
    let mut field = FieldBuilder::default();

    for token in scanner.by_ref() {
        match token {
            Token::Delimiter => fields.push(std::mem::take(&mut field).finish()),
            Token::OpenQuote => {
                field.mid_span = field.has_content;
                if !field.has_content {
                    field.quoted = true;
                }
                field.has_content = true;
            }
            Token::Quoted(c) => {
                if c == delimiter && field.mid_span {
                    field.hidden_delimiter = true;
                }
                field.text.push(c);
            }
            Token::Text(c) => {
                if !c.is_whitespace() {
                    field.has_content = true;
                }
                field.text.push(c);
            }
        }
    }
    fields.push(field.finish());

    SplitRow {
        fields,
        unclosed: scanner.in_quote(),
    }
}

#[derive(Default)]
struct FieldBuilder {
    text: String,
    quoted: bool,
    hidden_delimiter: bool,
    /// Non-whitespace text or a span has been seen in this field
    has_content: bool,
    /// The most recent span opened after other content
    mid_span: bool,
}

impl FieldBuilder {
    fn finish(self) -> Field {
        Field {
            text: self.text,
            quoted: self.quoted,
            hidden_delimiter: self.hidden_delimiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str, delimiter: char) -> Vec<String> {
        split_row(line, delimiter, DEFAULT_QUOTES)
            .fields
            .into_iter()
            .map(|f| f.text)
            .collect()
    }

    fn row_texts(row: &SplitRow) -> Vec<&str> {
        row.fields.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn test_plain_split() {
        assert_eq!(texts("a,b,c", ','), vec!["a", "b", "c"]);
        assert_eq!(texts("a,,c,", ','), vec!["a", "", "c", ""]);
        assert_eq!(texts("", ','), vec![""]);
    }

    #[test]
    fn test_quoted_delimiter_stays_in_field() {
        let row = split_row(r#""a,b",c"#, ',', DEFAULT_QUOTES);
        assert_eq!(row.field_count(), 2);
        assert_eq!(row.fields[0].text, "a,b");
        assert!(row.fields[0].quoted);
        assert!(!row.fields[1].quoted);
        assert!(!row.unclosed);
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        let row = split_row(r#""say ""hi""",x"#, ',', DEFAULT_QUOTES);
        assert_eq!(row_texts(&row), vec![r#"say "hi""#, "x"]);
        assert!(!row.unclosed);
    }

    #[test]
    fn test_single_quotes_span_too() {
        assert_eq!(texts("'a|b'|c", '|'), vec!["a|b", "c"]);
        // A double quote inside a single-quoted span is plain text
        assert_eq!(texts(r#"'5" pipe',x"#, ','), vec![r#"5" pipe"#, "x"]);
    }

    #[test]
    fn test_unclosed_quote_keeps_best_effort_fields() {
        let row = split_row(r#"1,"unterminated,field"#, ',', DEFAULT_QUOTES);
        assert!(row.unclosed);
        assert_eq!(row_texts(&row), vec!["1", "unterminated,field"]);
    }

    #[test]
    fn test_mid_field_quote_is_not_a_quoted_field() {
        let row = split_row(r#"1,ab"c,d"e,3"#, ',', DEFAULT_QUOTES);
        assert_eq!(row_texts(&row), vec!["1", "abc,de", "3"]);
        assert!(!row.fields[1].quoted);
        assert!(row.fields[1].hidden_delimiter);
    }

    #[test]
    fn test_whitespace_before_opening_quote() {
        let row = split_row(r#"1, "Smith, John", 3"#, ',', DEFAULT_QUOTES);
        assert_eq!(row.field_count(), 3);
        assert_eq!(row.fields[1].text, " Smith, John");
        assert!(row.fields[1].quoted);
        assert!(!row.fields[1].hidden_delimiter);
    }

    #[test]
    fn test_reopened_span_hides_delimiter() {
        let row = split_row(r#"1,"x"y"p,q",3"#, ',', DEFAULT_QUOTES);
        assert_eq!(row_texts(&row), vec!["1", "xyp,q", "3"]);
        assert!(row.fields[1].quoted);
        assert!(row.fields[1].hidden_delimiter);

        // A leading span holding the delimiter is the normal quoted case
        let plain = split_row(r#""p,q"x,3"#, ',', DEFAULT_QUOTES);
        assert!(!plain.fields[0].hidden_delimiter);
    }

    #[test]
    fn test_restricting_quote_characters() {
        let row = split_row("O'Brien,5", ',', &['"']);
        assert_eq!(row_texts(&row), vec!["O'Brien", "5"]);
        assert!(!row.unclosed);
        assert!(split_row("O'Brien,5", ',', DEFAULT_QUOTES).unclosed);
    }

    #[test]
    fn test_count_outside_quotes() {
        assert_eq!(count_outside_quotes("a,b,c", ',', DEFAULT_QUOTES), 2);
        assert_eq!(count_outside_quotes(r#""a,b",c"#, ',', DEFAULT_QUOTES), 1);
        assert_eq!(count_outside_quotes("a\tb\tc", '\t', DEFAULT_QUOTES), 2);
        assert_eq!(count_outside_quotes(r#""a,b,c"#, ',', DEFAULT_QUOTES), 0);
    }
}
