use std::iter::Peekable;
use std::str::Chars;

use super::normalize_technology;
use crate::pipeline::processing::dictionaries::Dictionaries;
use crate::types::CellValue;

/// Parse a skills cell into canonical technology names.
///
/// Bracketed text goes through [`parse_list_literal`]; anything malformed there yields an
/// empty list. Other text is split on commas and semicolons. Order and duplicates are kept.
pub fn normalize_skills_list(dicts: &Dictionaries, value: &CellValue) -> Vec<String> {
    let tokens: Vec<String> = match value {
        CellValue::Null => return Vec::new(),
        CellValue::List(items) => items.clone(),
        CellValue::Text(text) => {
            if text.trim_start().starts_with('[') {
                parse_list_literal(text).unwrap_or_default()
            } else {
                text.split([',', ';']).map(str::to_string).collect()
            }
        }
        other => other.as_text().into_iter().collect(),
    };

    tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter_map(|t| normalize_technology(dicts, Some(t)))
        .collect()
}

/// Strict parser for bracketed lists of strings.
///
/// Accepts a JSON array of strings/numbers, or a list literal using single or double
/// quoted strings such as `['Python', 'SQL']`. Returns `None` for anything else.
pub fn parse_list_literal(input: &str) -> Option<Vec<String>> {
    let input = input.trim();
    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(input) {
        return values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect();
    }
    LiteralParser::new(input).parse()
}

struct LiteralParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn parse(mut self) -> Option<Vec<String>> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.chars.peek() == Some(&']') {
            self.chars.next();
            return self.finish(items);
        }
        loop {
            self.skip_whitespace();
            items.push(self.quoted()?);
            self.skip_whitespace();
            match self.chars.next()? {
                ',' => {
                    self.skip_whitespace();
                    // trailing comma
                    if self.chars.peek() == Some(&']') {
                        self.chars.next();
                        return self.finish(items);
                    }
                }
                ']' => return self.finish(items),
                _ => return None,
            }
        }
    }

    fn finish(mut self, items: Vec<String>) -> Option<Vec<String>> {
        self.skip_whitespace();
        match self.chars.next() {
            None => Some(items),
            Some(_) => None,
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.chars.next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let mut out = String::new();
        loop {
            match self.chars.next()? {
                '\\' => match self.chars.next()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    other => out.push(other),
                },
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        self.skip_whitespace();
        (self.chars.next()? == expected).then_some(())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }
}
