//! Rotation orbits of the 512 neighborhood patterns.
//!
//! Orbit ids are handed out in the order orbits are first met while scanning
//! patterns `0..512` ascending. That numbering is the wire format for rule
//! descriptors and persisted tables, so it must never change.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::pattern::{PATTERN_COUNT, Pattern};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrbitId(pub u16);

impl OrbitId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OrbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One equivalence class of patterns under quarter turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Orbit {
    id: OrbitId,
    members: Vec<Pattern>,
}

impl Orbit {
    /// `members` is sorted and deduplicated here; the representative is its minimum.
    pub fn new(id: OrbitId, mut members: Vec<Pattern>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { id, members }
    }

    fn closure_of(id: OrbitId, pattern: Pattern) -> Self {
        Self::new(id, pattern.rotations().to_vec())
    }

    pub fn id(&self) -> OrbitId {
        self.id
    }

    /// Smallest member.
    pub fn representative(&self) -> Pattern {
        self.members[0]
    }

    pub fn members(&self) -> &[Pattern] {
        &self.members
    }

    /// 1, 2 or 4.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, pattern: Pattern) -> bool {
        self.members.binary_search(&pattern).is_ok()
    }
}

/// Pattern -> orbit lookup plus the orbit list itself.
///
/// Built once and shared read-only (typically behind an `Arc`) by every
/// rule set and engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrbitTable {
    lookup: Box<[OrbitId; PATTERN_COUNT]>,
    orbits: Vec<Orbit>,
}

impl OrbitTable {
    /// Enumerate every pattern and group it with its rotations.
    pub fn build() -> Self {
        const UNASSIGNED: OrbitId = OrbitId(u16::MAX);
        let mut lookup = Box::new([UNASSIGNED; PATTERN_COUNT]);
        let mut orbits: Vec<Orbit> = Vec::new();

        for pattern in Pattern::all() {
            // The closure's minimum is met first in an ascending scan, so an
            // unassigned pattern always starts a new orbit.
            if lookup[pattern.index()] != UNASSIGNED {
                continue;
            }
            let id = OrbitId(orbits.len() as u16);
            let orbit = Orbit::closure_of(id, pattern);
            debug_assert_eq!(orbit.representative(), pattern);
            for member in orbit.members() {
                lookup[member.index()] = id;
            }
            orbits.push(orbit);
        }

        log::debug!("built orbit table: {} orbits over {PATTERN_COUNT} patterns", orbits.len());
        Self { lookup, orbits }
    }

    /// Rebuild from an orbit list, checking that it is exactly the table
    /// `build()` would produce.
    pub fn from_orbits(orbits: Vec<Orbit>) -> Result<Self> {
        let malformed = |msg: String| Err(Error::MalformedOrbitTable(msg));
        let mut lookup = Box::new([OrbitId(u16::MAX); PATTERN_COUNT]);
        let mut seen = 0usize;

        for (position, orbit) in orbits.iter().enumerate() {
            if orbit.id().index() != position {
                return malformed(format!("orbit at position {position} has id {}", orbit.id()));
            }
            if !matches!(orbit.size(), 1 | 2 | 4) {
                return malformed(format!("orbit {} has size {}", orbit.id(), orbit.size()));
            }
            let closure = Orbit::closure_of(orbit.id(), orbit.representative());
            if closure.members() != orbit.members() {
                return malformed(format!("orbit {} is not a rotation closure", orbit.id()));
            }
            for member in orbit.members() {
                if lookup[member.index()] != OrbitId(u16::MAX) {
                    return malformed(format!("pattern {member} appears in more than one orbit"));
                }
                lookup[member.index()] = orbit.id();
                seen += 1;
            }
        }
        if seen != PATTERN_COUNT {
            return malformed(format!("orbits cover {seen} of {PATTERN_COUNT} patterns"));
        }

        let table = Self { lookup, orbits };
        // Representatives in ascending order is what pins discovery-order ids.
        if table
            .orbits
            .windows(2)
            .any(|pair| pair[0].representative() >= pair[1].representative())
        {
            return malformed("orbit ids are not in discovery order".to_string());
        }
        Ok(table)
    }

    #[inline(always)]
    pub fn orbit_of(&self, pattern: Pattern) -> OrbitId {
        self.lookup[pattern.index()]
    }

    /// Checked lookup for raw values coming from outside the crate.
    pub fn orbit_of_bits(&self, bits: u32) -> Result<OrbitId> {
        Pattern::try_from(bits).map(|pattern| self.orbit_of(pattern))
    }

    pub fn orbit(&self, id: OrbitId) -> Option<&Orbit> {
        self.orbits.get(id.index())
    }

    pub fn orbits(&self) -> &[Orbit] {
        &self.orbits
    }

    pub fn orbit_count(&self) -> usize {
        self.orbits.len()
    }

    /// Orbit count keyed by orbit size.
    pub fn size_distribution(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for orbit in &self.orbits {
            *sizes.entry(orbit.size()).or_insert(0) += 1;
        }
        sizes
    }
}
