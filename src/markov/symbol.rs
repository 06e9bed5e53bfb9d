//! Chain alphabet and context keys

use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

pub const START_MARKER: &str = "<START>";
pub const END_MARKER: &str = "<END>";

/// One chain symbol. Items are split into characters; the markers pad
/// them on the left and terminate them on the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Start,
    End,
    Char(char),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Start => f.write_str(START_MARKER),
            Symbol::End => f.write_str(END_MARKER),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            START_MARKER => Ok(Symbol::Start),
            END_MARKER => Ok(Symbol::End),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Symbol::Char(c)),
                    _ => Err(Error::Format(format!("unknown symbol {:?}", s))),
                }
            }
        }
    }
}

/// The last `order` symbols, oldest first
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context(Box<[Symbol]>);

impl Context {
    /// `order` START markers
    pub fn initial(order: usize) -> Self {
        Context(vec![Symbol::Start; order].into_boxed_slice())
    }

    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        Context(symbols.into())
    }

    /// Drop the oldest symbol and append `next`.
    pub fn advance(&self, next: Symbol) -> Self {
        if self.0.is_empty() {
            return self.clone();
        }
        let mut symbols = Vec::with_capacity(self.0.len());
        symbols.extend_from_slice(&self.0[1..]);
        symbols.push(next);
        Context(symbols.into_boxed_slice())
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array of symbol strings, e.g. `["<START>","p"]`
    pub fn to_key(&self) -> Result<String> {
        let parts: Vec<String> = self.0.iter().map(Symbol::to_string).collect();
        Ok(serde_json::to_string(&parts)?)
    }

    /// Inverse of [`Context::to_key`]; any JSON spacing is accepted.
    pub fn from_key(key: &str) -> Result<Self> {
        let parts: Vec<String> = serde_json::from_str(key)
            .map_err(|e| Error::Format(format!("bad context key {:?}: {}", key, e)))?;
        let symbols = parts
            .iter()
            .map(|part| part.parse())
            .collect::<Result<Vec<Symbol>>>()?;
        Ok(Context(symbols.into_boxed_slice()))
    }
}

impl Borrow<[Symbol]> for Context {
    fn borrow(&self) -> &[Symbol] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_slides_window() {
        let context = Context::initial(2).advance(Symbol::Char('p'));
        assert_eq!(context.as_slice(), &[Symbol::Start, Symbol::Char('p')]);
        let context = context.advance(Symbol::Char('i'));
        assert_eq!(context.as_slice(), &[Symbol::Char('p'), Symbol::Char('i')]);
    }

    #[test]
    fn test_key_accepts_spaced_json() {
        let spaced = Context::from_key(r#"["<START>", "p"]"#).unwrap();
        let compact = Context::from_key(r#"["<START>","p"]"#).unwrap();
        assert_eq!(spaced, compact);
        assert_eq!(compact.to_key().unwrap(), r#"["<START>","p"]"#);
    }

    #[test]
    fn test_rejects_multichar_symbol() {
        assert!(Context::from_key(r#"["ab"]"#).is_err());
        assert!("<MID>".parse::<Symbol>().is_err());
    }
}
