//! Dice and notation parsing for combat resolution.
//!
//! Two notations pass through here: damage notation ("1d6+2", "2d4-1", or a
//! bare integer) and armor-class notation ("14", "12 + Dex", "14 + Dex (max +2)").
//! Everything else in the engine goes through these typed parsers instead of
//! pattern-matching strings directly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for notation parsing.
#[derive(Debug, Error)]
pub enum NotationError {
    #[error("Invalid damage notation: {0}")]
    InvalidDamage(String),
    #[error("Invalid armor notation: {0}")]
    InvalidArmor(String),
    #[error("Empty notation")]
    Empty,
}

/// Error type for the random-number source.
///
/// Unlike malformed notation, which degrades to a safe default, a failing
/// random source is fatal: combat cannot resolve without dice.
#[derive(Debug, Error)]
pub enum RollError {
    #[error("Random source failed: {0}")]
    Source(String),
    #[error("Scripted rolls exhausted after {consumed} rolls")]
    Exhausted { consumed: usize },
}

/// The random-number seam of the engine.
///
/// Injected everywhere dice are rolled so resolution can be replayed
/// deterministically in tests.
pub trait DiceRoller {
    /// Roll one die, uniform in `[1, sides]`.
    fn die(&mut self, sides: u32) -> Result<u32, RollError>;

    fn d20(&mut self) -> Result<u32, RollError> {
        self.die(20)
    }

    /// Uniform integer in `[0, upper)`.
    fn uniform(&mut self, upper: u32) -> Result<u32, RollError> {
        if upper <= 1 {
            Ok(0)
        } else {
            Ok(self.die(upper)? - 1)
        }
    }
}

/// A [`DiceRoller`] backed by any [`rand::Rng`].
pub struct RngRoller<R: Rng> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRoller<StdRng> {
    /// A roller with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RngRoller<StdRng> {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> DiceRoller for RngRoller<R> {
    fn die(&mut self, sides: u32) -> Result<u32, RollError> {
        Ok(self.rng.gen_range(1..=sides.max(1)))
    }
}

/// A parsed damage notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageExpr {
    /// `count` dice of `sides` sides plus a signed modifier.
    Dice { count: u32, sides: u32, modifier: i32 },
    /// A fixed amount.
    Flat(i32),
}

impl DamageExpr {
    /// The default formula when nothing better is specified: `1d4`.
    pub fn unarmed() -> Self {
        DamageExpr::Dice {
            count: 1,
            sides: 4,
            modifier: 0,
        }
    }

    /// Parse `NdM`, `NdM+K`, `NdM-K`, or a bare integer.
    pub fn parse(notation: &str) -> Result<Self, NotationError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(NotationError::Empty);
        }
        if let Ok(flat) = notation.parse::<i32>() {
            return Ok(DamageExpr::Flat(flat));
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| NotationError::InvalidDamage(notation.clone()))?;

        let count_str = notation[..d_pos].trim();
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| NotationError::InvalidDamage(notation.clone()))?
        };

        let rest = &notation[d_pos + 1..];
        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let sign: i32 = if rest.as_bytes()[pos] == b'+' { 1 } else { -1 };
                let value: i32 = rest[pos + 1..]
                    .trim()
                    .parse()
                    .map_err(|_| NotationError::InvalidDamage(notation.clone()))?;
                (&rest[..pos], sign * value)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .trim()
            .parse()
            .map_err(|_| NotationError::InvalidDamage(notation.clone()))?;

        if count == 0 || sides == 0 {
            return Err(NotationError::InvalidDamage(notation));
        }

        Ok(DamageExpr::Dice {
            count,
            sides,
            modifier,
        })
    }

    /// The flat modifier embedded in the notation ("+2" in "1d6+2").
    ///
    /// A bare-integer notation is all modifier and no dice.
    pub fn modifier(&self) -> i32 {
        match *self {
            DamageExpr::Dice { modifier, .. } => modifier,
            DamageExpr::Flat(amount) => amount,
        }
    }

    /// The dice portion, if the notation has one.
    pub fn dice(&self) -> Option<(u32, u32)> {
        match *self {
            DamageExpr::Dice { count, sides, .. } => Some((count, sides)),
            DamageExpr::Flat(_) => None,
        }
    }

    /// The same dice with a different flat modifier.
    pub fn with_modifier(&self, modifier: i32) -> DamageExpr {
        match *self {
            DamageExpr::Dice { count, sides, .. } => DamageExpr::Dice {
                count,
                sides,
                modifier,
            },
            DamageExpr::Flat(_) => DamageExpr::Flat(modifier),
        }
    }

    /// Roll the expression. The result is always at least 1.
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> Result<i32, RollError> {
        let total = match *self {
            DamageExpr::Flat(amount) => amount,
            DamageExpr::Dice {
                count,
                sides,
                modifier,
            } => {
                let mut sum = 0i32;
                for _ in 0..count {
                    sum += roller.die(sides)? as i32;
                }
                sum + modifier
            }
        };
        Ok(total.max(1))
    }
}

impl FromStr for DamageExpr {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DamageExpr::parse(s)
    }
}

impl fmt::Display for DamageExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DamageExpr::Flat(amount) => write!(f, "{amount}"),
            DamageExpr::Dice {
                count,
                sides,
                modifier,
            } => {
                write!(f, "{count}d{sides}")?;
                if modifier > 0 {
                    write!(f, "+{modifier}")?;
                } else if modifier < 0 {
                    write!(f, "{modifier}")?;
                }
                Ok(())
            }
        }
    }
}

/// Roll a damage notation, degrading malformed input to 1 instead of failing.
///
/// This is the entry point for ad hoc amounts (consumable effects, NPC damage
/// strings of unknown provenance) where a bad string must not abort the turn.
pub fn roll_damage(notation: &str, roller: &mut dyn DiceRoller) -> Result<i32, RollError> {
    match DamageExpr::parse(notation) {
        Ok(expr) => expr.roll(roller),
        Err(_) => Ok(1),
    }
}

/// A parsed armor-class notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorNotation {
    /// A bare integer: fixed armor class.
    Flat(i32),
    /// `N + Dex` or `N + Dex (max +M)`: base plus the wearer's dexterity
    /// modifier, optionally capped.
    DexScaling { base: i32, cap: Option<i32> },
}

impl ArmorNotation {
    /// Parse `"14"`, `"12 + Dex"`, or `"14 + Dex (max +2)"`, case-insensitive.
    pub fn parse(notation: &str) -> Result<Self, NotationError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(NotationError::Empty);
        }
        if let Ok(flat) = notation.parse::<i32>() {
            return Ok(ArmorNotation::Flat(flat));
        }

        let (base_str, rest) = notation
            .split_once('+')
            .ok_or_else(|| NotationError::InvalidArmor(notation.clone()))?;
        let base: i32 = base_str
            .trim()
            .parse()
            .map_err(|_| NotationError::InvalidArmor(notation.clone()))?;

        let rest = rest.trim();
        let tail = rest
            .strip_prefix("dex")
            .ok_or_else(|| NotationError::InvalidArmor(notation.clone()))?
            .trim();

        if tail.is_empty() {
            return Ok(ArmorNotation::DexScaling { base, cap: None });
        }

        // "(max +M)"
        let inner = tail
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .and_then(|t| t.trim().strip_prefix("max"))
            .ok_or_else(|| NotationError::InvalidArmor(notation.clone()))?
            .trim();
        let inner = inner.strip_prefix('+').unwrap_or(inner).trim();
        let cap: i32 = inner
            .parse()
            .map_err(|_| NotationError::InvalidArmor(notation.clone()))?;

        Ok(ArmorNotation::DexScaling {
            base,
            cap: Some(cap),
        })
    }

    /// Armor class for a wearer with the given dexterity modifier.
    pub fn armor_class(&self, dex_modifier: i32) -> i32 {
        match *self {
            ArmorNotation::Flat(ac) => ac,
            ArmorNotation::DexScaling { base, cap } => {
                let dex = match cap {
                    Some(cap) => dex_modifier.min(cap),
                    None => dex_modifier,
                };
                base + dex
            }
        }
    }
}

impl FromStr for ArmorNotation {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArmorNotation::parse(s)
    }
}

impl fmt::Display for ArmorNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ArmorNotation::Flat(ac) => write!(f, "{ac}"),
            ArmorNotation::DexScaling { base, cap: None } => write!(f, "{base} + Dex"),
            ArmorNotation::DexScaling {
                base,
                cap: Some(cap),
            } => write!(f, "{base} + Dex (max +{cap})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRoller;

    #[test]
    fn test_parse_simple() {
        let expr = DamageExpr::parse("1d6").unwrap();
        assert_eq!(
            expr,
            DamageExpr::Dice {
                count: 1,
                sides: 6,
                modifier: 0
            }
        );
    }

    #[test]
    fn test_parse_with_modifier() {
        assert_eq!(
            DamageExpr::parse("2d4+3").unwrap(),
            DamageExpr::Dice {
                count: 2,
                sides: 4,
                modifier: 3
            }
        );
        assert_eq!(
            DamageExpr::parse("1d8-2").unwrap(),
            DamageExpr::Dice {
                count: 1,
                sides: 8,
                modifier: -2
            }
        );
    }

    #[test]
    fn test_parse_bare_integer() {
        assert_eq!(DamageExpr::parse("5").unwrap(), DamageExpr::Flat(5));
    }

    #[test]
    fn test_parse_implicit_count() {
        assert_eq!(
            DamageExpr::parse("d6").unwrap(),
            DamageExpr::Dice {
                count: 1,
                sides: 6,
                modifier: 0
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DamageExpr::parse("").is_err());
        assert!(DamageExpr::parse("axe").is_err());
        assert!(DamageExpr::parse("1d").is_err());
        assert!(DamageExpr::parse("0d6").is_err());
        assert!(DamageExpr::parse("1d0").is_err());
        assert!(DamageExpr::parse("1d6+x").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for notation in ["1d6", "2d4+3", "1d8-2", "5"] {
            let expr = DamageExpr::parse(notation).unwrap();
            assert_eq!(expr.to_string(), notation);
        }
    }

    #[test]
    fn test_roll_floors_at_one() {
        // 1d4-10 can never produce less than 1
        let expr = DamageExpr::parse("1d4-10").unwrap();
        let mut roller = RngRoller::seeded(7);
        for _ in 0..100 {
            assert_eq!(expr.roll(&mut roller).unwrap(), 1);
        }
    }

    #[test]
    fn test_roll_range() {
        let expr = DamageExpr::parse("2d6+1").unwrap();
        let mut roller = RngRoller::seeded(11);
        for _ in 0..100 {
            let total = expr.roll(&mut roller).unwrap();
            assert!((3..=13).contains(&total));
        }
    }

    #[test]
    fn test_roll_scripted() {
        let expr = DamageExpr::parse("2d6+1").unwrap();
        let mut roller = ScriptedRoller::new([4, 5]);
        assert_eq!(expr.roll(&mut roller).unwrap(), 10);
    }

    #[test]
    fn test_roll_damage_degrades_malformed_to_one() {
        let mut roller = RngRoller::seeded(3);
        assert_eq!(roll_damage("garbage", &mut roller).unwrap(), 1);
        assert_eq!(roll_damage("", &mut roller).unwrap(), 1);
        // Valid notation still rolls normally
        assert!(roll_damage("1d6", &mut roller).unwrap() >= 1);
    }

    #[test]
    fn test_exhausted_script_is_fatal() {
        let expr = DamageExpr::parse("3d6").unwrap();
        let mut roller = ScriptedRoller::new([4]);
        assert!(matches!(
            expr.roll(&mut roller),
            Err(RollError::Exhausted { consumed: 1 })
        ));
    }

    #[test]
    fn test_armor_flat() {
        let armor = ArmorNotation::parse("16").unwrap();
        assert_eq!(armor.armor_class(3), 16);
    }

    #[test]
    fn test_armor_dex_scaling() {
        let armor = ArmorNotation::parse("12 + Dex").unwrap();
        assert_eq!(armor.armor_class(3), 15);
        assert_eq!(armor.armor_class(-1), 11);
    }

    #[test]
    fn test_armor_dex_cap() {
        let armor = ArmorNotation::parse("14 + Dex (max +2)").unwrap();
        assert_eq!(armor.armor_class(3), 16);
        assert_eq!(armor.armor_class(1), 15);
        // Negative modifiers are not lifted by the cap
        assert_eq!(armor.armor_class(-2), 12);
    }

    #[test]
    fn test_armor_cap_never_exceeded() {
        let armor = ArmorNotation::parse("14 + Dex (max +2)").unwrap();
        for dex_modifier in -5..=10 {
            assert!(armor.armor_class(dex_modifier) <= 16);
        }
    }

    #[test]
    fn test_armor_invalid() {
        assert!(ArmorNotation::parse("").is_err());
        assert!(ArmorNotation::parse("heavy").is_err());
        assert!(ArmorNotation::parse("14 + Str").is_err());
        assert!(ArmorNotation::parse("14 + Dex (max two)").is_err());
    }
}
