//! Per-orbit rule tables.
//!
//! A rule is evaluated once per orbit at the orbit's representative and the
//! result is stored by orbit id, so a cell update is two table lookups. This
//! only reproduces the rule when the rule is itself invariant under quarter
//! turns. That is the caller's promise: a non-invariant rule is silently
//! reduced to its value on each representative. `check_rotation_invariance`
//! is available for callers who want to verify it up front.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::orbit::{OrbitId, OrbitTable, Pattern};

const COUNT_MASK: u16 = 0x1FF;

/// Outer-totalistic birth/survival rule, indexed by live neighbor count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BirthSurvival {
    /// Bit `n` set: a dead cell with `n` live neighbors becomes alive.
    birth: u16,
    /// Bit `n` set: a live cell with `n` live neighbors stays alive.
    survival: u16,
}

impl BirthSurvival {
    pub const fn new(birth: u16, survival: u16) -> Self {
        Self {
            birth: birth & COUNT_MASK,
            survival: survival & COUNT_MASK,
        }
    }

    /// B3/S23
    pub const fn conway() -> Self {
        Self::new(1 << 3, (1 << 2) | (1 << 3))
    }

    /// B36/S23
    pub const fn highlife() -> Self {
        Self::new((1 << 3) | (1 << 6), (1 << 2) | (1 << 3))
    }

    /// B3678/S34678
    pub const fn day_and_night() -> Self {
        Self::new(
            (1 << 3) | (1 << 6) | (1 << 7) | (1 << 8),
            (1 << 3) | (1 << 4) | (1 << 6) | (1 << 7) | (1 << 8),
        )
    }

    /// B2/S
    pub const fn seeds() -> Self {
        Self::new(1 << 2, 0)
    }

    pub fn birth_mask(self) -> u16 {
        self.birth
    }

    pub fn survival_mask(self) -> u16 {
        self.survival
    }

    #[inline]
    pub fn next_state(self, pattern: Pattern) -> bool {
        let mask = if pattern.center() {
            self.survival
        } else {
            self.birth
        };
        (mask >> pattern.neighbor_count()) & 1 == 1
    }
}

impl Default for BirthSurvival {
    fn default() -> Self {
        Self::conway()
    }
}

impl fmt::Display for BirthSurvival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |mask: u16| -> String {
            (0..=8u16)
                .filter(|n| (mask >> n) & 1 == 1)
                .map(|n| char::from(b'0' + n as u8))
                .collect()
        };
        write!(f, "B{}/S{}", digits(self.birth), digits(self.survival))
    }
}

impl FromStr for BirthSurvival {
    type Err = Error;

    /// Accepts `B3/S23` style strings, case-insensitive, in either order.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRulestring(s.to_string());
        let mut birth = None;
        let mut survival = None;

        for part in s.trim().split('/') {
            let mut chars = part.chars();
            let slot = match chars.next().map(|c| c.to_ascii_uppercase()) {
                Some('B') => &mut birth,
                Some('S') => &mut survival,
                _ => return Err(invalid()),
            };
            if slot.is_some() {
                return Err(invalid());
            }
            let mut mask = 0u16;
            for c in chars {
                let n = c.to_digit(10).filter(|&n| n <= 8).ok_or_else(invalid)?;
                if (mask >> n) & 1 == 1 {
                    return Err(invalid());
                }
                mask |= 1 << n;
            }
            *slot = Some(mask);
        }

        match (birth, survival) {
            (Some(birth), Some(survival)) => Ok(Self::new(birth, survival)),
            _ => Err(invalid()),
        }
    }
}

/// Alive when at least five of the nine cells are alive.
pub fn majority(pattern: Pattern) -> bool {
    pattern.live_count() >= 5
}

/// Verify that `rule` gives every member of every orbit the same output.
pub fn check_rotation_invariance<F>(table: &OrbitTable, rule: F) -> Result<()>
where
    F: Fn(Pattern) -> bool,
{
    for orbit in table.orbits() {
        let representative = orbit.representative();
        let expected = rule(representative);
        if let Some(&pattern) = orbit.members().iter().find(|&&m| rule(m) != expected) {
            return Err(Error::NonInvariantRule {
                orbit: orbit.id(),
                pattern,
                representative,
            });
        }
    }
    Ok(())
}

/// Output bit per orbit, bound to the table that numbers the orbits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSet {
    table: Arc<OrbitTable>,
    outputs: Vec<bool>,
}

impl RuleSet {
    /// Sample `rule` once per orbit at its representative.
    pub fn from_rule_fn<F>(table: Arc<OrbitTable>, rule: F) -> Self
    where
        F: Fn(Pattern) -> bool,
    {
        let outputs: Vec<bool> = table
            .orbits()
            .iter()
            .map(|orbit| rule(orbit.representative()))
            .collect();
        log::debug!(
            "derived rule set: {} of {} orbits alive",
            outputs.iter().filter(|&&alive| alive).count(),
            outputs.len()
        );
        Self { table, outputs }
    }

    /// Like `from_rule_fn`, but first rejects rules that are not rotation invariant.
    pub fn from_rule_fn_checked<F>(table: Arc<OrbitTable>, rule: F) -> Result<Self>
    where
        F: Fn(Pattern) -> bool,
    {
        check_rotation_invariance(&table, &rule)?;
        Ok(Self::from_rule_fn(table, rule))
    }

    pub fn from_birth_survival(table: Arc<OrbitTable>, rule: BirthSurvival) -> Self {
        Self::from_rule_fn(table, |pattern| rule.next_state(pattern))
    }

    /// Use `outputs[id]` directly as the output of orbit `id`.
    pub fn from_orbit_outputs(table: Arc<OrbitTable>, outputs: Vec<bool>) -> Result<Self> {
        if outputs.len() != table.orbit_count() {
            return Err(Error::OutputCountMismatch {
                expected: table.orbit_count(),
                got: outputs.len(),
            });
        }
        Ok(Self { table, outputs })
    }

    /// Parse the hex form produced by `descriptor`.
    pub fn from_descriptor(table: Arc<OrbitTable>, descriptor: &str) -> Result<Self> {
        let orbit_count = table.orbit_count();
        let expected_len = orbit_count.div_ceil(4);
        if descriptor.len() != expected_len {
            return Err(Error::InvalidDescriptor(format!(
                "expected {expected_len} hex digits, got {}",
                descriptor.len()
            )));
        }

        let mut outputs = vec![false; orbit_count];
        for (nibble, c) in descriptor.chars().rev().enumerate() {
            let value = c
                .to_digit(16)
                .ok_or_else(|| Error::InvalidDescriptor(format!("non-hex digit {c:?}")))?;
            for bit in 0..4 {
                let alive = (value >> bit) & 1 == 1;
                match outputs.get_mut(nibble * 4 + bit) {
                    Some(slot) => *slot = alive,
                    None if alive => {
                        return Err(Error::InvalidDescriptor(
                            "bits set past the last orbit".to_string(),
                        ));
                    }
                    None => {}
                }
            }
        }
        Ok(Self { table, outputs })
    }

    #[inline(always)]
    pub fn apply(&self, pattern: Pattern) -> bool {
        self.outputs[self.table.orbit_of(pattern).index()]
    }

    /// Checked form of `apply` for raw values.
    pub fn apply_bits(&self, bits: u32) -> Result<bool> {
        Pattern::try_from(bits).map(|pattern| self.apply(pattern))
    }

    pub fn output(&self, id: OrbitId) -> Option<bool> {
        self.outputs.get(id.index()).copied()
    }

    pub fn outputs(&self) -> &[bool] {
        &self.outputs
    }

    pub fn table(&self) -> &Arc<OrbitTable> {
        &self.table
    }

    /// Orbits whose output is alive.
    pub fn live_orbits(&self) -> impl Iterator<Item = OrbitId> + '_ {
        self.outputs
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(id, _)| OrbitId(id as u16))
    }

    /// Output bits as hex, orbit 0 in the lowest bit, most significant digit first.
    pub fn descriptor(&self) -> String {
        let nibbles = self.outputs.len().div_ceil(4);
        (0..nibbles)
            .rev()
            .map(|nibble| {
                let value = (0..4)
                    .filter(|&bit| self.outputs.get(nibble * 4 + bit) == Some(&true))
                    .fold(0u32, |acc, bit| acc | (1 << bit));
                char::from_digit(value, 16).unwrap_or('0')
            })
            .collect()
    }
}
