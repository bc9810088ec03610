//! JSON document form of the orbit table.
//!
//! Each member is written four ways (value, binary string, 3x3 grid, rendered
//! grid); loading checks they agree before rebuilding the 512-entry lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::pattern::{PATTERN_COUNT, Pattern, SIDE};
use super::table::{Orbit, OrbitId, OrbitTable};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitDocument {
    pub summary: OrbitSummary,
    pub orbits: Vec<OrbitRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitSummary {
    pub total_orbits: usize,
    /// Orbit count keyed by orbit size.
    pub size_distribution: BTreeMap<usize, usize>,
    pub total_patterns: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitRecord {
    pub id: u16,
    pub representative: u16,
    pub size: usize,
    pub members: Vec<MemberRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub value: u16,
    pub binary: String,
    pub grid: [[u8; SIDE]; SIDE],
    pub display: String,
}

impl MemberRecord {
    fn from_pattern(pattern: Pattern) -> Self {
        Self {
            value: pattern.bits(),
            binary: pattern.binary_string(),
            grid: pattern.grid_rows(),
            display: pattern.render(),
        }
    }

    fn to_pattern(&self) -> Result<Pattern> {
        let pattern = Pattern::new(self.value)?;
        if *self != Self::from_pattern(pattern) {
            return Err(Error::MalformedOrbitTable(format!(
                "member {} has inconsistent renderings",
                self.value
            )));
        }
        Ok(pattern)
    }
}

impl OrbitTable {
    pub fn to_document(&self) -> OrbitDocument {
        let orbits = self
            .orbits()
            .iter()
            .map(|orbit| OrbitRecord {
                id: orbit.id().0,
                representative: orbit.representative().bits(),
                size: orbit.size(),
                members: orbit
                    .members()
                    .iter()
                    .map(|&member| MemberRecord::from_pattern(member))
                    .collect(),
            })
            .collect();

        OrbitDocument {
            summary: OrbitSummary {
                total_orbits: self.orbit_count(),
                size_distribution: self.size_distribution(),
                total_patterns: PATTERN_COUNT,
            },
            orbits,
        }
    }

    pub fn from_document(document: &OrbitDocument) -> Result<Self> {
        let mut orbits = Vec::with_capacity(document.orbits.len());
        for record in &document.orbits {
            let members = record
                .members
                .iter()
                .map(MemberRecord::to_pattern)
                .collect::<Result<Vec<_>>>()?;
            let orbit = Orbit::new(OrbitId(record.id), members);
            if orbit.size() != record.size || orbit.size() != record.members.len() {
                return Err(Error::MalformedOrbitTable(format!(
                    "orbit {} declares size {} but lists {} distinct members",
                    record.id,
                    record.size,
                    orbit.size()
                )));
            }
            if orbit.size() > 0 && orbit.representative().bits() != record.representative {
                return Err(Error::MalformedOrbitTable(format!(
                    "orbit {} declares representative {}",
                    record.id, record.representative
                )));
            }
            orbits.push(orbit);
        }

        let table = OrbitTable::from_orbits(orbits)?;
        let summary = &document.summary;
        if summary.total_patterns != PATTERN_COUNT
            || summary.total_orbits != table.orbit_count()
            || summary.size_distribution != table.size_distribution()
        {
            return Err(Error::MalformedOrbitTable(
                "summary disagrees with orbit list".to_string(),
            ));
        }
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: OrbitDocument = serde_json::from_str(json)?;
        Self::from_document(&document)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let table = Self::from_json(&fs::read_to_string(path.as_ref())?)?;
        log::debug!("loaded orbit table from {}", path.as_ref().display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::orbit::OrbitTable;

    #[test]
    fn document_summary_describes_table() {
        let document = OrbitTable::build().to_document();
        assert_eq!(document.summary.total_orbits, 140);
        assert_eq!(document.summary.total_patterns, 512);
        assert_eq!(document.summary.size_distribution[&4], 120);

        let first_corner = &document.orbits[1];
        assert_eq!(first_corner.representative, 1);
        assert_eq!(first_corner.size, 4);
        assert_eq!(first_corner.members[0].binary, "000000001");
        assert_eq!(first_corner.members[0].grid, [[1, 0, 0], [0, 0, 0], [0, 0, 0]]);
        assert_eq!(first_corner.members[0].display, "100\n000\n000");
    }

    #[test]
    fn json_reload_rebuilds_identical_lookup() {
        let table = OrbitTable::build();
        let json = table.to_json().unwrap();
        assert!(json.contains("\"size_distribution\""));
        let reloaded = OrbitTable::from_json(&json).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn rejects_inconsistent_member_rendering() {
        let mut document = OrbitTable::build().to_document();
        document.orbits[3].members[0].binary = "111111111".to_string();
        assert!(matches!(
            OrbitTable::from_document(&document),
            Err(Error::MalformedOrbitTable(_))
        ));
    }

    #[test]
    fn rejects_summary_mismatch() {
        let mut document = OrbitTable::build().to_document();
        document.summary.total_orbits = 139;
        assert!(OrbitTable::from_document(&document).is_err());
    }

    #[test]
    fn rejects_out_of_range_member() {
        let mut document = OrbitTable::build().to_document();
        document.orbits[0].members[0].value = 600;
        assert!(matches!(
            OrbitTable::from_document(&document),
            Err(Error::InvalidPattern(600))
        ));
    }

    #[test]
    fn file_round_trip() {
        let table = OrbitTable::build();
        let path = std::env::temp_dir().join(format!("orbit-table-{}.json", std::process::id()));
        table.write_json(&path).unwrap();
        let loaded = OrbitTable::read_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, table);
    }
}
