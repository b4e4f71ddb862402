//! Derived display values for origin details.
//!
//! Some origin details are not typed by the player but echoed from their
//! selection: a clan's signature spell, the technique a curse grade manifests
//! and the focus of a mutant core. This module is the only place those values
//! are defined; parsing fills them in from here and validation compares
//! against here.

use serde::{Deserialize, Serialize};

use crate::catalog::catalog_enum;

catalog_enum! {
    /// Sorcerer clans available to inherited characters.
    pub enum Clan ("clan") {
        Zenin => "Zenin",
        Gojo => "Gojo",
        Kamo => "Kamo",
        Inumaki => "Inumaki",
    }
}

catalog_enum! {
    /// The dominant core of a mutant body.
    pub enum PrimaryCore ("primary core") {
        Physical => "Physical",
        Technical => "Technical",
        Hybrid => "Hybrid",
    }
}

/// Grade of a curse-born character's inner curse, 1 (strongest) to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CurseGrade(u8);

impl CurseGrade {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(grade: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&grade).then_some(Self(grade))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for CurseGrade {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for CurseGrade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CurseGrade::new(value).ok_or_else(|| format!("curse grade must be 1 to 4, got {value}"))
    }
}

impl From<CurseGrade> for u8 {
    fn from(grade: CurseGrade) -> Self {
        grade.0
    }
}

impl std::fmt::Display for CurseGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Grade {}", self.0)
    }
}

impl std::str::FromStr for CurseGrade {
    type Err = crate::catalog::UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("Grade ")
            .or_else(|| trimmed.strip_prefix("grade "))
            .unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .ok()
            .and_then(CurseGrade::new)
            .ok_or_else(|| crate::catalog::UnknownOption {
                kind: "curse grade",
                value: s.to_string(),
            })
    }
}

impl Clan {
    /// Display name of the clan.
    pub fn title(&self) -> &'static str {
        match self {
            Clan::Zenin => "Zenin Clan",
            Clan::Gojo => "Gojo Clan",
            Clan::Kamo => "Kamo Clan",
            Clan::Inumaki => "Inumaki Clan",
        }
    }
}

/// Signature spell inherited from a clan.
pub fn clan_spell(clan: Clan) -> &'static str {
    match clan {
        Clan::Zenin => "Ten Shadows",
        Clan::Gojo => "Divine Illusion",
        Clan::Kamo => "Red Blood",
        Clan::Inumaki => "Cursed Speech",
    }
}

/// Technique manifested by an inner curse of the given grade.
pub fn curse_technique(grade: CurseGrade) -> &'static str {
    match grade.value() {
        1 => "First Grade Curse Manifestation",
        2 => "Second Grade Curse Manifestation",
        3 => "Third Grade Curse Manifestation",
        _ => "Fourth Grade Curse Manifestation",
    }
}

/// What a mutant body's primary core is built around.
pub fn core_focus(core: PrimaryCore) -> &'static str {
    match core {
        PrimaryCore::Physical => "Melee combat, strength and endurance",
        PrimaryCore::Technical => "Spells, technique and energy manipulation",
        PrimaryCore::Hybrid => "Balance between physical and technical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_clan_has_a_spell() {
        for clan in Clan::ALL {
            assert!(!clan_spell(*clan).is_empty());
        }
        assert_eq!(clan_spell(Clan::Zenin), "Ten Shadows");
    }

    #[test]
    fn test_curse_grade_bounds() {
        assert!(CurseGrade::new(0).is_none());
        assert!(CurseGrade::new(5).is_none());
        assert_eq!(CurseGrade::default().value(), 1);
        assert_eq!("3".parse::<CurseGrade>().map(|g| g.value()), Ok(3));
        assert_eq!("Grade 2".parse::<CurseGrade>().map(|g| g.value()), Ok(2));
        assert!("9".parse::<CurseGrade>().is_err());
    }

    #[test]
    fn test_curse_grade_serde() {
        let grade: CurseGrade = serde_json::from_str("4").unwrap();
        assert_eq!(grade.value(), 4);
        assert!(serde_json::from_str::<CurseGrade>("7").is_err());
        assert_eq!(serde_json::to_string(&grade).unwrap(), "4");
    }
}
