//! Path-pattern lexer and parser.
//!
//! Turns a pattern string into a flat list of [`Token`]s: literal text,
//! parameters ([`Key`]) and parameterless optional groups. The token list is
//! compiled to a regex by [`PathPattern`](crate::PathPattern).

use crate::path_pattern::{Key, Modifier};
use crate::PatternError;

/// Characters that, directly before a parameter, become its prefix.
const PREFIXES: [char; 2] = ['.', '/'];

/// Default parameter pattern: one or more characters up to the next delimiter.
pub(crate) const DEFAULT_PATTERN: &str = "[^/#?]+?";

/// Pattern for a bare `*` wildcard.
const WILDCARD_PATTERN: &str = ".*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexKind {
    Open,
    Close,
    Pattern,
    Name,
    Char,
    EscapedChar,
    Modifier,
    End,
}

impl LexKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Pattern => "PATTERN",
            Self::Name => "NAME",
            Self::Char => "CHAR",
            Self::EscapedChar => "ESCAPED_CHAR",
            Self::Modifier => "MODIFIER",
            Self::End => "END",
        }
    }
}

#[derive(Debug, Clone)]
struct LexToken {
    kind: LexKind,
    index: usize,
    value: String,
}

impl LexToken {
    fn new(kind: LexKind, index: usize, value: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            value: value.into(),
        }
    }
}

/// A parsed pattern token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Literal text, matched verbatim.
    Literal(String),
    /// A parameter (named, positional, or wildcard).
    Param(Key),
    /// A `{...}` group without a parameter, e.g. `{.json}?`.
    Group {
        text: String,
        modifier: Option<Modifier>,
    },
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(input: &str) -> Result<Vec<LexToken>, PatternError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' | '+' | '?' => {
                tokens.push(LexToken::new(LexKind::Modifier, i, c));
                i += 1;
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or(PatternError::TrailingEscape { index: i })?;
                tokens.push(LexToken::new(LexKind::EscapedChar, i, *escaped));
                i += 2;
            }
            '{' => {
                tokens.push(LexToken::new(LexKind::Open, i, c));
                i += 1;
            }
            '}' => {
                tokens.push(LexToken::new(LexKind::Close, i, c));
                i += 1;
            }
            ':' => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && is_name_char(chars[j]) {
                    j += 1;
                }
                if j == start {
                    return Err(PatternError::MissingName { index: i });
                }
                let name: String = chars[start..j].iter().collect();
                tokens.push(LexToken::new(LexKind::Name, i, name));
                i = j;
            }
            '(' => {
                let (pattern, next) = lex_pattern(&chars, i)?;
                tokens.push(LexToken::new(LexKind::Pattern, i, pattern));
                i = next;
            }
            _ => {
                tokens.push(LexToken::new(LexKind::Char, i, c));
                i += 1;
            }
        }
    }

    tokens.push(LexToken::new(LexKind::End, chars.len(), ""));
    Ok(tokens)
}

/// Lex a `(...)` custom pattern starting at `open`. Returns the inner pattern
/// and the offset just past the closing `)`.
fn lex_pattern(chars: &[char], open: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 1usize;
    let mut pattern = String::new();
    let mut j = open + 1;

    if chars.get(j) == Some(&'?') {
        return Err(PatternError::LeadingQuestionMark { index: j });
    }

    while j < chars.len() {
        match chars[j] {
            '\\' => {
                pattern.push('\\');
                if let Some(&next) = chars.get(j + 1) {
                    pattern.push(next);
                }
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    j += 1;
                    break;
                }
            }
            '(' => {
                depth += 1;
                if chars.get(j + 1) != Some(&'?') {
                    return Err(PatternError::CapturingGroup { index: j });
                }
            }
            _ => {}
        }
        pattern.push(chars[j]);
        j += 1;
    }

    if depth > 0 {
        return Err(PatternError::UnbalancedPattern { index: open });
    }
    if pattern.is_empty() {
        return Err(PatternError::MissingPattern { index: open });
    }
    Ok((pattern, j))
}

struct Parser {
    tokens: Vec<LexToken>,
    pos: usize,
    next_positional: usize,
}

impl Parser {
    fn peek(&self) -> Option<&LexToken> {
        self.tokens.get(self.pos)
    }

    fn try_consume(&mut self, kind: LexKind) -> Option<String> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Some(token.value.clone())
            }
            _ => None,
        }
    }

    fn must_consume(&mut self, kind: LexKind) -> Result<String, PatternError> {
        if let Some(value) = self.try_consume(kind) {
            return Ok(value);
        }
        let (found, index) = self
            .peek()
            .map_or((LexKind::End, 0), |token| (token.kind, token.index));
        Err(PatternError::UnexpectedToken {
            found: found.as_str(),
            index,
            expected: kind.as_str(),
        })
    }

    fn try_modifier(&mut self) -> Option<Modifier> {
        self.try_consume(LexKind::Modifier)
            .and_then(|m| Modifier::from_char(m.chars().next()?))
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(value) = self
            .try_consume(LexKind::Char)
            .or_else(|| self.try_consume(LexKind::EscapedChar))
        {
            text.push_str(&value);
        }
        text
    }

    fn positional(&mut self) -> String {
        let name = self.next_positional.to_string();
        self.next_positional += 1;
        name
    }

    fn parse(mut self) -> Result<Vec<Token>, PatternError> {
        let mut result = Vec::new();
        let mut path = String::new();

        while self.pos < self.tokens.len() {
            let ch = self.try_consume(LexKind::Char);
            let name = self.try_consume(LexKind::Name);
            let pattern = self.try_consume(LexKind::Pattern);

            if name.is_some() || pattern.is_some() {
                let mut prefix = ch.unwrap_or_default();
                if !prefix.chars().all(|c| PREFIXES.contains(&c)) {
                    path.push_str(&prefix);
                    prefix.clear();
                }
                flush(&mut path, &mut result);

                let name = match name {
                    Some(name) => name,
                    None => self.positional(),
                };
                let modifier = self.try_modifier();
                result.push(Token::Param(Key::new(
                    name,
                    prefix,
                    String::new(),
                    pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_owned()),
                    modifier,
                )));
                continue;
            }

            if let Some(value) = ch.or_else(|| self.try_consume(LexKind::EscapedChar)) {
                path.push_str(&value);
                continue;
            }

            flush(&mut path, &mut result);

            if self.try_consume(LexKind::Open).is_some() {
                let prefix = self.consume_text();
                let name = self.try_consume(LexKind::Name);
                let pattern = self.try_consume(LexKind::Pattern);
                let suffix = self.consume_text();
                self.must_consume(LexKind::Close)?;
                let modifier = self.try_modifier();

                if name.is_none() && pattern.is_none() {
                    result.push(Token::Group {
                        text: prefix + &suffix,
                        modifier,
                    });
                    continue;
                }

                let name = match name {
                    Some(name) => name,
                    None => self.positional(),
                };
                result.push(Token::Param(Key::new(
                    name,
                    prefix,
                    suffix,
                    pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_owned()),
                    modifier,
                )));
                continue;
            }

            // Bare `*`: Express-style wildcard over the rest of the path.
            if matches!(self.peek(), Some(t) if t.kind == LexKind::Modifier && t.value == "*") {
                self.pos += 1;
                let name = self.positional();
                result.push(Token::Param(Key::new(
                    name,
                    String::new(),
                    String::new(),
                    WILDCARD_PATTERN.to_owned(),
                    None,
                )));
                continue;
            }

            self.must_consume(LexKind::End)?;
        }

        Ok(result)
    }
}

fn flush(path: &mut String, result: &mut Vec<Token>) {
    if !path.is_empty() {
        result.push(Token::Literal(std::mem::take(path)));
    }
}

/// Parse a path pattern into tokens.
pub(crate) fn parse(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let parser = Parser {
        tokens: lex(pattern)?,
        pos: 0,
        next_positional: 0,
    };
    parser.parse()
}
