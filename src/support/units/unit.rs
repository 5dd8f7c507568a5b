use std::{fmt, str::FromStr};

use super::UnitError;

/// Exponents of the seven SI base dimensions.
///
/// The order follows the ISQ used by [`uom`]: length, mass, time, electric
/// current, thermodynamic temperature, amount of substance, luminous intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimension([i8; 7]);

const BASE_SYMBOLS: [&str; 7] = ["m", "kg", "s", "A", "K", "mol", "cd"];

impl Dimension {
    pub const NONE: Self = Self([0; 7]);
    pub const LENGTH: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    pub const LUMINOUS: Self = Self::new(0, 0, 0, 0, 0, 0, 1);

    #[must_use]
    pub const fn new(l: i8, m: i8, t: i8, i: i8, th: i8, n: i8, j: i8) -> Self {
        Self([l, m, t, i, th, n, j])
    }

    /// Returns `true` for a pure number.
    #[must_use]
    pub fn is_dimensionless(self) -> bool {
        self == Self::NONE
    }

    /// Raises every exponent to `power`, or `None` if an exponent overflows.
    #[must_use]
    pub fn pow(self, power: i8) -> Option<Self> {
        let mut out = self.0;
        for e in &mut out {
            *e = e.checked_mul(power)?;
        }
        Some(Self(out))
    }

    /// Combines two dimensions as a product, or `None` if an exponent
    /// overflows.
    #[must_use]
    pub fn times(self, other: Self) -> Option<Self> {
        let mut out = self.0;
        for (e, o) in out.iter_mut().zip(other.0) {
            *e = e.checked_add(o)?;
        }
        Some(Self(out))
    }
}

struct Symbol {
    symbol: &'static str,
    scale: f64,
    dimension: Dimension,
    prefixable: bool,
}

const fn symbol(symbol: &'static str, scale: f64, dimension: Dimension, prefixable: bool) -> Symbol {
    Symbol {
        symbol,
        scale,
        dimension,
        prefixable,
    }
}

const SYMBOLS: &[Symbol] = &[
    symbol("m", 1.0, Dimension::LENGTH, true),
    symbol("g", 1e-3, Dimension::MASS, true),
    symbol("s", 1.0, Dimension::TIME, true),
    symbol("min", 60.0, Dimension::TIME, false),
    symbol("h", 3600.0, Dimension::TIME, false),
    symbol("day", 86_400.0, Dimension::TIME, false),
    symbol("mol", 1.0, Dimension::AMOUNT, true),
    symbol("l", 1e-3, Dimension::new(3, 0, 0, 0, 0, 0, 0), true),
    symbol("L", 1e-3, Dimension::new(3, 0, 0, 0, 0, 0, 0), true),
    symbol("K", 1.0, Dimension::TEMPERATURE, false),
    symbol("A", 1.0, Dimension::CURRENT, true),
    symbol("cd", 1.0, Dimension::LUMINOUS, false),
    symbol("Hz", 1.0, Dimension::new(0, 0, -1, 0, 0, 0, 0), true),
    symbol("N", 1.0, Dimension::new(1, 1, -2, 0, 0, 0, 0), true),
    symbol("Pa", 1.0, Dimension::new(-1, 1, -2, 0, 0, 0, 0), true),
    symbol("J", 1.0, Dimension::new(2, 1, -2, 0, 0, 0, 0), true),
    symbol("W", 1.0, Dimension::new(2, 1, -3, 0, 0, 0, 0), true),
];

const PREFIXES: &[(&str, f64)] = &[
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("\u{b5}", 1e-6),
    ("\u{3bc}", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("k", 1e3),
    ("M", 1e6),
];

fn lookup(name: &str) -> Option<(f64, Dimension)> {
    if let Some(s) = SYMBOLS.iter().find(|s| s.symbol == name) {
        return Some((s.scale, s.dimension));
    }
    PREFIXES.iter().find_map(|(prefix, factor)| {
        let rest = name.strip_prefix(prefix)?;
        SYMBOLS
            .iter()
            .find(|s| s.prefixable && s.symbol == rest)
            .map(|s| (factor * s.scale, s.dimension))
    })
}

/// A physical unit parsed at runtime.
///
/// Holds the text it was parsed from, the factor converting one of this unit
/// into SI base units, and its [`Dimension`].
///
/// Accepted syntax is a product of symbols joined by `*` or `/`, each with an
/// optional integer exponent written `**n` or `^n`. SI prefixes from pico to
/// mega apply to the prefixable symbols (`mm`, `umol`, `kg`, `ml`). A lone
/// `1` or an empty string is dimensionless.
#[derive(Debug, Clone)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dimension: Dimension,
}

impl Unit {
    /// Parses a unit string.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Parse`] if the text contains an unknown symbol,
    /// malformed syntax, or a dimension exponent outside the `i8` range.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let symbol = text.trim();
        if symbol.is_empty() || symbol == "1" {
            return Ok(Self::dimensionless());
        }

        let mut scanner = Scanner::new(symbol);
        let mut scale = 1.0;
        let mut dimension = Dimension::NONE;
        let mut sign: i8 = 1;

        loop {
            scanner.skip_whitespace();
            let (atom_scale, atom_dim) = if scanner.eat("1") {
                (1.0, Dimension::NONE)
            } else {
                let name = scanner.take_while(char::is_alphabetic);
                if name.is_empty() {
                    return Err(UnitError::parse(symbol, "expected a unit symbol"));
                }
                lookup(name)
                    .ok_or_else(|| UnitError::parse(symbol, format!("unknown symbol {name:?}")))?
            };

            scanner.skip_whitespace();
            let exponent = if scanner.eat("**") || scanner.eat("^") {
                scanner.exponent().ok_or_else(|| {
                    UnitError::parse(symbol, "expected an integer exponent")
                })?
            } else {
                1
            };

            let power = sign * exponent;
            scale *= atom_scale.powi(i32::from(power));
            dimension = atom_dim
                .pow(power)
                .and_then(|atom| dimension.times(atom))
                .ok_or_else(|| UnitError::parse(symbol, "exponent out of range"))?;

            scanner.skip_whitespace();
            match scanner.bump() {
                None => break,
                Some('*') => sign = 1,
                Some('/') => sign = -1,
                Some(c) => {
                    return Err(UnitError::parse(symbol, format!("unexpected {c:?}")));
                }
            }
        }

        Ok(Self {
            symbol: symbol.to_owned(),
            scale,
            dimension,
        })
    }

    /// The unit of a pure number.
    #[must_use]
    pub fn dimensionless() -> Self {
        Self {
            symbol: "1".to_owned(),
            scale: 1.0,
            dimension: Dimension::NONE,
        }
    }

    /// The metre, used for all mesh coordinates.
    #[must_use]
    pub fn meter() -> Self {
        Self {
            symbol: "m".to_owned(),
            scale: 1.0,
            dimension: Dimension::LENGTH,
        }
    }

    /// Builds the SI base unit for a dimension, e.g. `mol/m**3`.
    #[must_use]
    pub fn base(dimension: Dimension) -> Self {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (sym, exp) in BASE_SYMBOLS.iter().zip(dimension.0) {
            let part = match exp.unsigned_abs() {
                0 => continue,
                1 => (*sym).to_owned(),
                n => format!("{sym}**{n}"),
            };
            if exp > 0 {
                numerator.push(part);
            } else {
                denominator.push(part);
            }
        }

        let mut symbol = if numerator.is_empty() {
            "1".to_owned()
        } else {
            numerator.join("*")
        };
        for part in denominator {
            symbol.push('/');
            symbol.push_str(&part);
        }

        Self {
            symbol,
            scale: 1.0,
            dimension,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Factor converting one of this unit into SI base units.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Returns `true` if values in `self` can be expressed in `other`.
    #[must_use]
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Returns the factor `f` such that `x self == x * f other`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Incompatible`] if the dimensions differ.
    pub fn factor_to(&self, other: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(other) {
            return Err(UnitError::Incompatible {
                from: self.symbol.clone(),
                to: other.symbol.clone(),
            });
        }
        Ok(self.scale / other.scale)
    }

    /// Returns the SI base unit with the same dimension as `self`.
    #[must_use]
    pub fn to_base(&self) -> Self {
        Self::base(self.dimension)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && (self.scale - other.scale).abs() <= 1e-12 * self.scale.abs().max(other.scale.abs())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.text[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn exponent(&mut self) -> Option<i8> {
        let parens = self.eat("(");
        let negative = if self.eat("-") {
            true
        } else {
            self.eat("+");
            false
        };
        let digits = self.take_while(|c| c.is_ascii_digit());
        let value: i8 = digits.parse().ok()?;
        if parens && !self.eat(")") {
            return None;
        }
        Some(if negative { -value } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn concentrations() {
        let molar = Unit::parse("mol/l").unwrap();
        assert_relative_eq!(molar.scale(), 1e3, max_relative = 1e-12);
        assert_eq!(molar.dimension(), Dimension::new(-3, 0, 0, 0, 0, 1, 0));

        let micro = Unit::parse("umol/cm**3").unwrap();
        assert_relative_eq!(micro.scale(), 1.0, epsilon = 1e-15);
        assert!(micro.is_compatible(&molar));
        assert_relative_eq!(molar.factor_to(&micro).unwrap(), 1e3, max_relative = 1e-12);
    }

    #[test]
    fn inverse_lengths() {
        let per_cm = Unit::parse("1/cm").unwrap();
        assert_eq!(per_cm.dimension(), Dimension::LENGTH.pow(-1).unwrap());
        assert_relative_eq!(per_cm.scale(), 100.0, max_relative = 1e-12);

        let per_m = Unit::parse("m^-1").unwrap();
        assert_relative_eq!(per_cm.factor_to(&per_m).unwrap(), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn division_binds_one_factor() {
        let rate = Unit::parse("mmol/m**2/s").unwrap();
        assert_eq!(rate.dimension(), Dimension::new(-2, 0, -1, 0, 0, 1, 0));
        assert_relative_eq!(rate.scale(), 1e-3, max_relative = 1e-12);

        let flux = Unit::parse("kg/s*m").unwrap();
        assert_eq!(flux.dimension(), Dimension::new(1, 1, -1, 0, 0, 0, 0));
    }

    #[test]
    fn exact_symbols_win_over_prefixes() {
        assert_relative_eq!(Unit::parse("min").unwrap().scale(), 60.0, max_relative = 1e-12);
        assert_relative_eq!(Unit::parse("mm").unwrap().scale(), 1e-3, max_relative = 1e-12);
        assert_relative_eq!(Unit::parse("Pa").unwrap().scale(), 1.0, max_relative = 1e-12);
        assert_relative_eq!(Unit::parse("h").unwrap().scale(), 3600.0, max_relative = 1e-12);
        assert_relative_eq!(Unit::parse("\u{b5}m").unwrap().scale(), 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn dimensionless_forms() {
        assert!(Unit::parse("").unwrap().is_dimensionless());
        assert!(Unit::parse("1").unwrap().is_dimensionless());
        assert!(Unit::parse("m/m").unwrap().is_dimensionless());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Unit::parse("junk"), Err(UnitError::Parse { .. })));
        assert!(Unit::parse("mol/").is_err());
        assert!(Unit::parse("m**x").is_err());
        assert!(Unit::parse("m + s").is_err());
        assert!(Unit::parse("kg m").is_err());
    }

    #[test]
    fn huge_exponents_are_rejected() {
        for text in ["l**50", "m**100*m**100", "s**-127/s**2"] {
            assert!(
                matches!(Unit::parse(text), Err(UnitError::Parse { .. })),
                "{text}"
            );
        }
        let deep = Unit::parse("m**-127").unwrap();
        assert_eq!(deep.dimension(), Dimension::new(-127, 0, 0, 0, 0, 0, 0));
    }

    #[test]
    fn incompatible_conversion() {
        let err = Unit::parse("mol/l")
            .unwrap()
            .factor_to(&Unit::parse("1/cm").unwrap())
            .unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));
    }

    #[test]
    fn base_symbol_round_trips() {
        let molar = Unit::parse("mmol/l").unwrap();
        let base = molar.to_base();
        assert_eq!(base.symbol(), "mol/m**3");
        assert_eq!(Unit::parse(base.symbol()).unwrap(), base);
        assert_eq!(Unit::base(Dimension::LENGTH.pow(-1).unwrap()).symbol(), "1/m");
    }
}
