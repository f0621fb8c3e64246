//! Parsing of GN-style list arguments.
//!
//! Build rules pass lists of paths and flags on the command line as GN list
//! literals, such as `["a.java", "b.java"]`. A bare value is treated as a
//! single-item list so callers may pass either form.

use anyhow::{bail, format_err};

use crate::util::FreshenResult;

/// Converts a GN list argument into a list of strings.
///
/// * `""` gives an empty list.
/// * `"asdf"` gives `["asdf"]`.
/// * `["a", "b"]` gives `["a", "b"]`.
///
/// Integer and boolean list items are returned in their textual form.
pub fn parse_gn_list(value: &str) -> FreshenResult<Vec<String>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    if value.starts_with('[') {
        return Parser::new(value)
            .parse_list()
            .map_err(|e| e.context(format!("failed to parse GN list `{}`", value)));
    }
    Ok(vec![value.to_string()])
}

/// Parses each argument with [`parse_gn_list`] and flattens the results.
pub fn parse_gn_lists<I, S>(values: I) -> FreshenResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ret = Vec::new();
    for value in values {
        ret.extend(parse_gn_list(value.as_ref())?);
    }
    Ok(ret)
}

/// Renders `items` as a GN list literal that [`parse_gn_list`] reads back.
pub fn to_gn_string<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("[");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        for c in item.as_ref().chars() {
            if matches!(c, '"' | '$' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
    out.push(']');
    out
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Parser<'a> {
        Parser { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn parse_list(&mut self) -> FreshenResult<Vec<String>> {
        self.skip_whitespace();
        if self.bump() != Some('[') {
            bail!("expected `[` at offset {}", self.pos);
        }
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.bump();
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some(']') => break,
                Some(c) => bail!("expected `,` or `]` but found `{}` at offset {}", c, self.pos),
                None => bail!("unterminated list"),
            }
        }
        self.skip_whitespace();
        if self.pos != self.input.len() {
            bail!("trailing input after list at offset {}", self.pos);
        }
        Ok(items)
    }

    fn parse_value(&mut self) -> FreshenResult<String> {
        match self.peek() {
            Some('"') => self.parse_string(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_bool(),
            Some(c) => bail!("unexpected `{}` at offset {}", c, self.pos),
            None => bail!("expected a value but the input ended"),
        }
    }

    fn parse_string(&mut self) -> FreshenResult<String> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(s),
                Some('\\') => match self.peek() {
                    Some(c @ ('"' | '$' | '\\')) => {
                        self.bump();
                        s.push(c);
                    }
                    _ => s.push('\\'),
                },
                Some(c) => s.push(c),
                None => bail!("unterminated string"),
            }
        }
    }

    fn parse_number(&mut self) -> FreshenResult<String> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.input[start..self.pos];
        text.parse::<i64>()
            .map_err(|_| format_err!("invalid integer `{}` at offset {}", text, start))?;
        Ok(text.to_string())
    }

    fn parse_bool(&mut self) -> FreshenResult<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.input[start..self.pos] {
            word @ ("true" | "false") => Ok(word.to_string()),
            word => bail!("unexpected identifier `{}` at offset {}", word, start),
        }
    }
}
