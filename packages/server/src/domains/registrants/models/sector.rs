//! Sector catalogue and the sector → member id prefix table.
//!
//! The table is built once at startup (defaults, optionally overridden from a
//! JSON file) and shared read-only behind an `Arc`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Prefix for registrants whose sector is missing or unrecognised.
pub const GENERIC_PREFIX: &str = "GEN";

/// Status-coded prefix for registrants marked incomplete.
pub const INCOMPLETE_PREFIX: &str = "INC";

/// Status-coded prefix for registrants marked non-compliant.
pub const NON_COMPLIANT_PREFIX: &str = "NOC";

const RESERVED_PREFIXES: [&str; 3] = [GENERIC_PREFIX, INCOMPLETE_PREFIX, NON_COMPLIANT_PREFIX];

/// Demographic / occupational group a registrant belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Student,
    MadarisStudents,
    Teacher,
    Farmer,
    Fisherman,
    Ofw,
    CancerPatient,
    DialysisPatient,
    HealthWorker,
    Pwd,
    SeniorCitizen,
    SoloParent,
    IndigenousPeople,
    LgbtqCommunity,
    Women,
    Youth,
}

impl Sector {
    pub const ALL: [Sector; 16] = [
        Sector::Student,
        Sector::MadarisStudents,
        Sector::Teacher,
        Sector::Farmer,
        Sector::Fisherman,
        Sector::Ofw,
        Sector::CancerPatient,
        Sector::DialysisPatient,
        Sector::HealthWorker,
        Sector::Pwd,
        Sector::SeniorCitizen,
        Sector::SoloParent,
        Sector::IndigenousPeople,
        Sector::LgbtqCommunity,
        Sector::Women,
        Sector::Youth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Student => "student",
            Sector::MadarisStudents => "madaris_students",
            Sector::Teacher => "teacher",
            Sector::Farmer => "farmer",
            Sector::Fisherman => "fisherman",
            Sector::Ofw => "ofw",
            Sector::CancerPatient => "cancer_patient",
            Sector::DialysisPatient => "dialysis_patient",
            Sector::HealthWorker => "health_worker",
            Sector::Pwd => "pwd",
            Sector::SeniorCitizen => "senior_citizen",
            Sector::SoloParent => "solo_parent",
            Sector::IndigenousPeople => "indigenous_people",
            Sector::LgbtqCommunity => "lgbtq_community",
            Sector::Women => "women",
            Sector::Youth => "youth",
        }
    }

    /// Normalise a user-supplied sector slug: trimmed, lowercased, blank → `None`.
    pub fn normalize_slug(raw: Option<&str>) -> Option<String> {
        raw.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Sector::ALL
            .into_iter()
            .find(|sector| sector.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown sector: {}", s))
    }
}

/// Reporting group a sector rolls up into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SectorCategory {
    Education,
    Livelihood,
    Health,
    SocialWelfare,
}

impl SectorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorCategory::Education => "education",
            SectorCategory::Livelihood => "livelihood",
            SectorCategory::Health => "health",
            SectorCategory::SocialWelfare => "social_welfare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorEntry {
    pub prefix: String,
    pub category: SectorCategory,
}

impl SectorEntry {
    fn new(prefix: &str, category: SectorCategory) -> Self {
        Self {
            prefix: prefix.to_string(),
            category,
        }
    }
}

/// Immutable sector → (prefix, category) map
#[derive(Debug, Clone)]
pub struct SectorTable {
    entries: HashMap<Sector, SectorEntry>,
}

impl SectorTable {
    /// Build a table, rejecting malformed, duplicated or reserved prefixes and
    /// missing sectors.
    pub fn new(entries: HashMap<Sector, SectorEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for sector in Sector::ALL {
            let entry = entries
                .get(&sector)
                .ok_or_else(|| anyhow::anyhow!("Sector table is missing {}", sector))?;
            let prefix = entry.prefix.as_str();

            if prefix.is_empty()
                || prefix.len() > 8
                || !prefix.bytes().all(|b| b.is_ascii_uppercase())
            {
                anyhow::bail!(
                    "Prefix {:?} for {} must be 1-8 uppercase ASCII letters",
                    prefix,
                    sector
                );
            }
            if RESERVED_PREFIXES.contains(&prefix) {
                anyhow::bail!("Prefix {} for {} is reserved", prefix, sector);
            }
            if !seen.insert(prefix.to_string()) {
                anyhow::bail!("Prefix {} is assigned to more than one sector", prefix);
            }
        }

        Ok(Self { entries })
    }

    /// Load overrides from a JSON object keyed by sector slug. Sectors absent
    /// from the file keep their default entry.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sector table {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid sector table {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let overrides: HashMap<Sector, SectorEntry> = serde_json::from_str(raw)?;
        let mut entries = Self::default_entries();
        entries.extend(overrides);
        Self::new(entries)
    }

    fn default_entries() -> HashMap<Sector, SectorEntry> {
        use SectorCategory::*;

        HashMap::from([
            (Sector::Student, SectorEntry::new("STU", Education)),
            (Sector::MadarisStudents, SectorEntry::new("MS", Education)),
            (Sector::Teacher, SectorEntry::new("TCH", Education)),
            (Sector::Farmer, SectorEntry::new("FRM", Livelihood)),
            (Sector::Fisherman, SectorEntry::new("FSH", Livelihood)),
            (Sector::Ofw, SectorEntry::new("OFW", Livelihood)),
            (Sector::CancerPatient, SectorEntry::new("CP", Health)),
            (Sector::DialysisPatient, SectorEntry::new("DP", Health)),
            (Sector::HealthWorker, SectorEntry::new("HW", Health)),
            (Sector::Pwd, SectorEntry::new("PWD", SocialWelfare)),
            (Sector::SeniorCitizen, SectorEntry::new("SC", SocialWelfare)),
            (Sector::SoloParent, SectorEntry::new("SP", SocialWelfare)),
            (Sector::IndigenousPeople, SectorEntry::new("IP", SocialWelfare)),
            (Sector::LgbtqCommunity, SectorEntry::new("LGBTQ", SocialWelfare)),
            (Sector::Women, SectorEntry::new("WMN", SocialWelfare)),
            (Sector::Youth, SectorEntry::new("YTH", SocialWelfare)),
        ])
    }

    pub fn prefix(&self, sector: Sector) -> &str {
        // Construction guarantees every sector has an entry.
        self.entries
            .get(&sector)
            .map(|e| e.prefix.as_str())
            .unwrap_or(GENERIC_PREFIX)
    }

    pub fn category(&self, sector: Sector) -> Option<SectorCategory> {
        self.entries.get(&sector).map(|e| e.category)
    }

    /// Resolve a raw sector slug. `None` for blank or unrecognised slugs.
    pub fn lookup(&self, slug: Option<&str>) -> Option<Sector> {
        let slug = Sector::normalize_slug(slug)?;
        slug.parse().ok()
    }

    /// Every prefix a member id can carry, sector-coded and reserved.
    pub fn all_prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = Sector::ALL.iter().map(|s| self.prefix(*s)).collect();
        prefixes.extend(RESERVED_PREFIXES);
        prefixes
    }

    /// Sectors grouped by category, in a stable order.
    pub fn sectors_by_category(&self) -> BTreeMap<SectorCategory, Vec<Sector>> {
        let mut grouped: BTreeMap<SectorCategory, Vec<Sector>> = BTreeMap::new();
        for sector in Sector::ALL {
            if let Some(category) = self.category(sector) {
                grouped.entry(category).or_default().push(sector);
            }
        }
        grouped
    }
}

impl Default for SectorTable {
    fn default() -> Self {
        Self {
            entries: Self::default_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let table = SectorTable::new(SectorTable::default_entries()).unwrap();
        assert_eq!(table.prefix(Sector::MadarisStudents), "MS");
        assert_eq!(table.prefix(Sector::LgbtqCommunity), "LGBTQ");
        assert_eq!(table.all_prefixes().len(), 19);
    }

    #[test]
    fn lookup_normalises_slugs() {
        let table = SectorTable::default();
        assert_eq!(table.lookup(Some(" Farmer ")), Some(Sector::Farmer));
        assert_eq!(table.lookup(Some("")), None);
        assert_eq!(table.lookup(Some("astronaut")), None);
        assert_eq!(table.lookup(None), None);
    }

    #[test]
    fn json_overrides_replace_single_entries() {
        let table = SectorTable::from_json_str(
            r#"{"farmer": {"prefix": "AGRI", "category": "livelihood"}}"#,
        )
        .unwrap();
        assert_eq!(table.prefix(Sector::Farmer), "AGRI");
        assert_eq!(table.prefix(Sector::Student), "STU");
    }

    #[test]
    fn reserved_and_duplicate_prefixes_are_rejected() {
        let reserved = SectorTable::from_json_str(
            r#"{"youth": {"prefix": "INC", "category": "social_welfare"}}"#,
        );
        assert!(reserved.is_err());

        let duplicate = SectorTable::from_json_str(
            r#"{"youth": {"prefix": "STU", "category": "education"}}"#,
        );
        assert!(duplicate.is_err());

        let lowercase = SectorTable::from_json_str(
            r#"{"youth": {"prefix": "yth", "category": "social_welfare"}}"#,
        );
        assert!(lowercase.is_err());
    }

    #[test]
    fn unknown_sector_keys_fail_to_parse() {
        let result = SectorTable::from_json_str(
            r#"{"astronaut": {"prefix": "AST", "category": "education"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn every_sector_has_a_category() {
        let table = SectorTable::default();
        let total: usize = table.sectors_by_category().values().map(Vec::len).sum();
        assert_eq!(total, Sector::ALL.len());
    }
}
