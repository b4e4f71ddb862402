//! Fixed catalogs the player picks from.
//!
//! Each catalog is a closed enum whose serialized form is its display label.
//! Parsing is lenient about case, hyphens and whitespace so that
//! `"attribute-increment"`, `"Attribute  Increment"` and `"attribute increment"`
//! all name the same talent.

use thiserror::Error;

/// A value that is not part of the catalog it was parsed against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

/// Canonical form used to compare catalog labels.
pub fn normalize_label(raw: &str) -> String {
    raw.replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Declares a closed catalog enum with its labels.
///
/// Generates `ALL`, `name()`, `Display` and a normalizing `FromStr`.
macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::catalog::UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = $crate::catalog::normalize_label(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| $crate::catalog::normalize_label(option.name()) == wanted)
                    .ok_or_else(|| $crate::catalog::UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

pub(crate) use catalog_enum;

// ============================================================================
// Skills
// ============================================================================

catalog_enum! {
    /// Trained skills.
    pub enum Skill ("skill") {
        Acrobatics => "Acrobatics",
        Athletics => "Athletics",
        Performance => "Performance",
        Stealth => "Stealth",
        History => "History",
        Intimidation => "Intimidation",
        Investigation => "Investigation",
        Medicine => "Medicine",
        Nature => "Nature",
        Craft => "Craft",
        Perception => "Perception",
        Persuasion => "Persuasion",
        SleightOfHand => "Sleight of Hand",
        Religion => "Religion",
        Survival => "Survival",
        Sorcery => "Sorcery",
        Occultism => "Occultism",
    }
}

impl Skill {
    /// Sorcery and Occultism only ever come from a specialization grant.
    pub fn is_freely_selectable(&self) -> bool {
        !matches!(self, Skill::Sorcery | Skill::Occultism)
    }

    pub fn selectable() -> impl Iterator<Item = Skill> {
        Self::ALL.iter().copied().filter(Skill::is_freely_selectable)
    }
}

catalog_enum! {
    /// Sub-specialties of the Craft skill.
    pub enum Craft ("craft") {
        Blacksmith => "Blacksmith",
        Channeler => "Channeler",
        Tailor => "Tailor",
        Locksmith => "Locksmith",
        Alchemist => "Alchemist",
        Carpenter => "Carpenter",
    }
}

catalog_enum! {
    /// Resistance saves a specialization may train.
    pub enum Resistance ("resistance") {
        Fortitude => "Fortitude",
        Reflexes => "Reflexes",
        Cunning => "Cunning",
        Will => "Will",
    }
}

catalog_enum! {
    /// Changes a technique specialist makes to the foundations of their technique.
    pub enum FoundationChange ("foundation change") {
        CruelSpell => "Cruel Spell",
        QuickSpell => "Quick Spell",
        QuickTechnique => "Quick Technique",
    }
}

catalog_enum! {
    pub enum WeaponProficiency ("weapon proficiency") {
        Simple => "Simple",
        Martial => "Martial",
        Ranged => "Ranged",
        Shield => "Shield",
    }
}

// ============================================================================
// Talents and Spells
// ============================================================================

catalog_enum! {
    /// Natural talents. Only the first-level pick is made during creation.
    pub enum Talent ("talent") {
        TechniqueAffinity => "Technique Affinity",
        AttributeIncrement => "Attribute Increment",
        EmergencyVow => "Emergency Vow",
        SeizeOpportunity => "Seize Opportunity",
        CursedArtisan => "Cursed Artisan",
        MedicineAdept => "Medicine Adept",
        BrawlAdept => "Brawl Adept",
        SorceryAdept => "Sorcery Adept",
        UnbreakableSoul => "Unbreakable Soul",
        PhysicalResilience => "Physical Resilience",
        ConstantLeaper => "Constant Leaper",
        ThrowingMaster => "Throwing Master",
        TechniqueDominance => "Technique Dominance",
        AptitudeIncrement => "Aptitude Increment",
        EnlightenedKnowledge => "Enlightened Knowledge",
        AbsoluteSoulAwareness => "Absolute Soul Awareness",
        LegendaryResilience => "Legendary Resilience",
        OneWithTheWorld => "One with the World",
    }
}

catalog_enum! {
    pub enum Spell ("spell") {
        EnergyStrike => "Energy Strike",
        EnergyShield => "Energy Shield",
        DetectCurse => "Detect Curse",
        CursedFocus => "Cursed Focus",
        InstinctiveReflex => "Instinctive Reflex",
        ExplosiveCharge => "Explosive Charge",
        PressureAura => "Pressure Aura",
        ShockBurst => "Shock Burst",
        MomentaryBarrier => "Momentary Barrier",
        SharpenedFocus => "Sharpened Focus",
        PiercingPunch => "Piercing Punch",
    }
}

// ============================================================================
// Equipment
// ============================================================================

catalog_enum! {
    pub enum Weapon ("weapon") {
        Dagger => "Dagger",
        Staff => "Staff",
        Spear => "Spear",
        Axe => "Axe",
        Shortsword => "Shortsword",
        Longsword => "Longsword",
        Katana => "Katana",
        Battleaxe => "Battleaxe",
        Warhammer => "Warhammer",
        Nunchaku => "Nunchaku",
        Rapier => "Rapier",
        Halberd => "Halberd",
        Pike => "Pike",
        Greataxe => "Greataxe",
        Maul => "Maul",
        HeavyNunchaku => "Heavy Nunchaku",
        Shortbow => "Shortbow",
        LightCrossbow => "Light Crossbow",
        Pistol => "Pistol",
    }
}

impl Weapon {
    /// The proficiency needed to wield this weapon well.
    pub fn category(&self) -> WeaponProficiency {
        match self {
            Weapon::Dagger | Weapon::Staff | Weapon::Spear | Weapon::Axe => {
                WeaponProficiency::Simple
            }
            Weapon::Shortbow | Weapon::LightCrossbow | Weapon::Pistol => {
                WeaponProficiency::Ranged
            }
            _ => WeaponProficiency::Martial,
        }
    }
}

catalog_enum! {
    pub enum Shield ("shield") {
        Light => "Light Shield",
        Small => "Small Shield",
        Medium => "Medium Shield",
        Heavy => "Heavy Shield",
    }
}

catalog_enum! {
    pub enum Uniform ("uniform") {
        Common => "Common Uniform",
        LightlyReinforced => "Lightly Reinforced Uniform",
        ModeratelyReinforced => "Moderately Reinforced Uniform",
        HeavilyReinforced => "Heavily Reinforced Uniform",
    }
}

catalog_enum! {
    pub enum Toolkit ("toolkit") {
        Blacksmith => "Blacksmith's Tools",
        Channeler => "Channeler's Tools",
        Tailor => "Tailor's Tools",
        Alchemist => "Alchemist's Tools",
        Apothecary => "Apothecary's Tools",
        Locksmith => "Locksmith's Tools",
    }
}

// ============================================================================
// Anatomy
// ============================================================================

catalog_enum! {
    /// Body traits available to curse-born characters.
    pub enum Anatomy ("anatomy") {
        CursedSoul => "Cursed Soul",
        IncomprehensibleAnatomy => "Incomprehensible Anatomy",
        NaturalWeapon => "Natural Weapon",
        ExtendedJoints => "Extended Joints",
        ExtraArms => "Extra Arms",
        Flight => "Flight",
        MutantCarapace => "Mutant Carapace",
        SpecializedBody => "Specialized Body",
        ExaggeratedGrowth => "Exaggerated Growth",
        EnergyDevourer => "Energy Devourer",
        BloodthirstyInstinct => "Bloodthirsty Instinct",
        ShadowedEyes => "Shadowed Eyes",
        ExtraLegs => "Extra Legs",
        NefariousPresence => "Nefarious Presence",
        ToxicBlood => "Toxic Blood",
    }
}
