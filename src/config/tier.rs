//! Precedence tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A precedence level. Higher tiers shadow lower ones.
///
/// The base tier is authoritative for shape: only a base load can create or
/// remove properties and namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Base,
    User,
    Project,
}

impl Tier {
    /// Number of tiers.
    pub const COUNT: usize = 3;

    /// All tiers, lowest precedence first.
    pub const ALL: [Tier; Tier::COUNT] = [Tier::Base, Tier::User, Tier::Project];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_base(self) -> bool {
        self == Tier::Base
    }

    /// Tiers with strictly higher precedence than `self`.
    pub fn higher(self) -> &'static [Tier] {
        match self {
            Tier::Base => &[Tier::User, Tier::Project],
            Tier::User => &[Tier::Project],
            Tier::Project => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Base => "base",
            Tier::User => "user",
            Tier::Project => "project",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownTier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_index() {
        assert!(Tier::Base < Tier::User);
        assert!(Tier::User < Tier::Project);
        for (i, tier) in Tier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn test_higher() {
        assert_eq!(Tier::Base.higher(), &[Tier::User, Tier::Project]);
        assert_eq!(Tier::User.higher(), &[Tier::Project]);
        assert!(Tier::Project.higher().is_empty());
    }

    #[test]
    fn test_parse() {
        assert_eq!("Project".parse::<Tier>().unwrap(), Tier::Project);
        assert!(matches!(
            "global".parse::<Tier>(),
            Err(ConfigError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_serde_lowercase() {
        let tier: Tier = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(tier, Tier::User);
        assert_eq!(serde_json::to_string(&Tier::Base).unwrap(), "\"base\"");
    }
}
