//! Unit string parser
//!
//! Grammar (after sanitizing):
//!
//! ```text
//! expr   := factor (('*' | '/') factor)*
//! factor := atom | '(' expr ')' power?
//! atom   := prefix? base power?
//! power  := '^' ('+' | '-')? [1-9][0-9]*
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{DataError, DataResult};

/// SI prefixes with their decimal exponent
pub(crate) const PREFIXES: &[(&str, i32)] = &[
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("da", 1),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

const BASES: &[&str] = &[
    "m", "g", "s", "A", "K", "mol", "cd", "Hz", "N", "Pa", "J", "W", "C", "V", "F", "S", "Wb",
    "T", "H", "lm", "lx", "Bq", "Gy", "Sv", "kat", "l", "L", "Ohm", "%", "dB", "rad",
];

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 32;

static ATOM: OnceLock<Regex> = OnceLock::new();

fn atom_regex() -> &'static Regex {
    ATOM.get_or_init(|| {
        let prefixes: Vec<&str> = PREFIXES.iter().map(|(p, _)| *p).collect();
        let pattern = format!(
            "^(?:({}))?({})$",
            prefixes.join("|"),
            BASES
                .iter()
                .map(|b| regex::escape(b))
                .collect::<Vec<_>>()
                .join("|")
        );
        // built from the constant tables above
        Regex::new(&pattern).unwrap_or_else(|e| panic!("unit atom pattern: {}", e))
    })
}

/// A prefixed base unit with an optional exponent, e.g. `mV^2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitAtom {
    pub prefix: Option<String>,
    pub base: String,
    pub power: Option<i32>,
}

impl UnitAtom {
    /// Exponent, defaulting to 1
    pub fn exponent(&self) -> i32 {
        self.power.unwrap_or(1)
    }

    /// Decimal exponent of the prefix, 0 without one
    pub fn prefix_exponent(&self) -> i32 {
        self.prefix
            .as_deref()
            .and_then(|p| PREFIXES.iter().find(|(name, _)| *name == p))
            .map(|(_, exp)| *exp)
            .unwrap_or(0)
    }
}

impl fmt::Display for UnitAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}", prefix)?;
        }
        write!(f, "{}", self.base)?;
        write_power(f, self.power)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOp {
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitFactor {
    Atom(UnitAtom),
    Group { inner: Box<UnitExpr>, power: Option<i32> },
}

impl fmt::Display for UnitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitFactor::Atom(atom) => write!(f, "{}", atom),
            UnitFactor::Group { inner, power } => {
                write!(f, "({})", inner)?;
                write_power(f, *power)
            }
        }
    }
}

/// A parsed unit expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitExpr {
    pub first: UnitFactor,
    pub rest: Vec<(UnitOp, UnitFactor)>,
}

impl UnitExpr {
    /// The single atom, if the expression is exactly one unparenthesized atom
    pub fn as_atom(&self) -> Option<&UnitAtom> {
        match (&self.first, self.rest.is_empty()) {
            (UnitFactor::Atom(atom), true) => Some(atom),
            _ => None,
        }
    }

    /// All atoms in reading order
    pub fn atoms(&self) -> Vec<&UnitAtom> {
        let mut out = Vec::new();
        collect_atoms(&self.first, &mut out);
        for (_, factor) in &self.rest {
            collect_atoms(factor, &mut out);
        }
        out
    }
}

fn collect_atoms<'a>(factor: &'a UnitFactor, out: &mut Vec<&'a UnitAtom>) {
    match factor {
        UnitFactor::Atom(atom) => out.push(atom),
        UnitFactor::Group { inner, .. } => {
            collect_atoms(&inner.first, out);
            for (_, f) in &inner.rest {
                collect_atoms(f, out);
            }
        }
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, factor) in &self.rest {
            let sym = match op {
                UnitOp::Mul => '*',
                UnitOp::Div => '/',
            };
            write!(f, "{}{}", sym, factor)?;
        }
        Ok(())
    }
}

fn write_power(f: &mut fmt::Formatter<'_>, power: Option<i32>) -> fmt::Result {
    match power {
        Some(p) => write!(f, "^{}", p),
        None => Ok(()),
    }
}

/// Strip whitespace and fold micro and ohm spellings onto their canonical
/// atoms.
pub fn sanitize(unit: &str) -> String {
    let compact: String = unit.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace(&['\u{00B5}', '\u{03BC}'][..], "u").replace("mu", "u");

    let mut out = String::with_capacity(compact.len());
    let mut rest = compact.as_str();
    while !rest.is_empty() {
        if rest.len() >= 3 && rest.is_char_boundary(3) && rest[..3].eq_ignore_ascii_case("ohm") {
            out.push_str("Ohm");
            rest = &rest[3..];
        } else {
            let c = rest.chars().next().unwrap_or_default();
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// Parse a sanitized, non-empty unit string.
pub fn parse(unit: &str) -> DataResult<UnitExpr> {
    let mut parser = Parser {
        src: unit,
        chars: unit.char_indices().collect(),
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.chars.len() {
        return Err(parser.reject());
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    // open parentheses around the current position
    depth: usize,
}

impl<'a> Parser<'a> {
    fn reject(&self) -> DataError {
        DataError::InvalidUnit(self.src.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn expr(&mut self) -> DataResult<UnitExpr> {
        let first = self.factor()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some('*') => UnitOp::Mul,
                Some('/') => UnitOp::Div,
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.factor()?));
        }
        Ok(UnitExpr { first, rest })
    }

    fn factor(&mut self) -> DataResult<UnitFactor> {
        if self.peek() == Some('(') {
            self.pos += 1;
            if self.depth == MAX_NESTING {
                return Err(self.reject());
            }
            self.depth += 1;
            let inner = self.expr()?;
            self.depth -= 1;
            if self.peek() != Some(')') {
                return Err(self.reject());
            }
            self.pos += 1;
            let power = self.power()?;
            return Ok(UnitFactor::Group {
                inner: Box::new(inner),
                power,
            });
        }
        self.atom().map(UnitFactor::Atom)
    }

    fn atom(&mut self) -> DataResult<UnitAtom> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '%') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.reject());
        }
        let word = self.slice(start, self.pos);

        let caps = atom_regex().captures(word).ok_or_else(|| self.reject())?;
        let prefix = caps.get(1).map(|m| m.as_str().to_string());
        let base = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| self.reject())?;
        let power = self.power()?;
        Ok(UnitAtom { prefix, base, power })
    }

    fn power(&mut self) -> DataResult<Option<i32>> {
        if self.peek() != Some('^') {
            return Ok(None);
        }
        self.pos += 1;

        let start = self.pos;
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.pos += 1;
        }
        let digits = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if digits == self.pos || self.chars[digits].1 == '0' {
            return Err(self.reject());
        }
        self.slice(start, self.pos)
            .trim_start_matches('+')
            .parse::<i32>()
            .map(Some)
            .map_err(|_| self.reject())
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        let begin = self.chars[from].0;
        let end = self.chars.get(to).map_or(self.src.len(), |(i, _)| *i);
        &self.src[begin..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(unit: &str) -> String {
        parse(&sanitize(unit)).unwrap().to_string()
    }

    #[test]
    fn test_atoms() {
        for unit in ["m", "mm", "mol", "cd", "Hz", "kHz", "Pa", "mV", "dB", "%", "Ohm", "kat"] {
            assert_eq!(roundtrip(unit), unit);
        }
    }

    #[test]
    fn test_prefix_and_base_split() {
        let expr = parse("mm").unwrap();
        let atom = expr.as_atom().unwrap();
        assert_eq!(atom.prefix.as_deref(), Some("m"));
        assert_eq!(atom.base, "m");

        let expr = parse("mol").unwrap();
        let atom = expr.as_atom().unwrap();
        assert_eq!(atom.prefix, None);
        assert_eq!(atom.base, "mol");
    }

    #[test]
    fn test_exponents() {
        assert_eq!(roundtrip("mV^2"), "mV^2");
        assert_eq!(roundtrip("s^-1"), "s^-1");
        assert_eq!(roundtrip("s^+1"), "s^1");
        assert!(parse("s^").is_err());
        assert!(parse("s^0").is_err());
        assert!(parse("s^02").is_err());
        assert!(parse("s^x").is_err());
    }

    #[test]
    fn test_compound() {
        assert_eq!(roundtrip("mV*s"), "mV*s");
        assert_eq!(roundtrip("m/s^2"), "m/s^2");
        assert_eq!(roundtrip("(mV*s)/Hz"), "(mV*s)/Hz");
        assert_eq!(roundtrip("(m/s)^2"), "(m/s)^2");
    }

    #[test]
    fn test_rejects_free_text() {
        assert!(parse("somestring").is_err());
        assert!(parse("meter").is_err());
        assert!(parse("mV*").is_err());
        assert!(parse("*mV").is_err());
        assert!(parse("(mV").is_err());
        assert!(parse("mV)").is_err());
        assert!(parse("()").is_err());
        assert!(parse("m V").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}m{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse(&nested(MAX_NESTING)).unwrap().to_string(), nested(MAX_NESTING));
        assert!(matches!(
            parse(&nested(MAX_NESTING + 1)),
            Err(DataError::InvalidUnit(_))
        ));
        assert!(parse(&nested(200_000)).is_err());
        assert!(parse(&"(".repeat(200_000)).is_err());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(" m V ^ 2 "), "mV^2");
        assert_eq!(sanitize("muV"), "uV");
        assert_eq!(sanitize("\u{00B5}V"), "uV");
        assert_eq!(sanitize("kohm"), "kOhm");
    }

    #[test]
    fn test_atoms_of_compound() {
        let expr = parse("(mV*s)/Hz^2").unwrap();
        let bases: Vec<&str> = expr.atoms().iter().map(|a| a.base.as_str()).collect();
        assert_eq!(bases, vec!["V", "s", "Hz"]);
        assert!(expr.as_atom().is_none());
    }
}
