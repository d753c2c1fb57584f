use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A selectable companion identity with its own persisted state and
/// flavor-text style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persona {
    Mika,
    Kana,
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Persona::Mika => write!(f, "Mika"),
            Persona::Kana => write!(f, "Kana"),
        }
    }
}

impl std::str::FromStr for Persona {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mika" => Ok(Persona::Mika),
            "kana" => Ok(Persona::Kana),
            _ => Err(anyhow!("Unknown persona: {} (expected mika or kana)", s)),
        }
    }
}

impl Persona {
    /// The other persona variant. Incidents are narratively blamed on her.
    pub fn other(self) -> Persona {
        match self {
            Persona::Mika => Persona::Kana,
            Persona::Kana => Persona::Mika,
        }
    }

    /// Lowercase identifier used in storage keys.
    pub fn key_name(self) -> &'static str {
        match self {
            Persona::Mika => "mika",
            Persona::Kana => "kana",
        }
    }

    /// Short personality description embedded in flavor-text prompts.
    pub fn description(self) -> &'static str {
        match self {
            Persona::Mika => "You are Mika: bubbly, playful, possessive, energetic catgirl.",
            Persona::Kana => "You are Kana: sarcastic, grumpy, aloof, witty catgirl.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Persona::from_str("MIKA").unwrap(), Persona::Mika);
        assert_eq!(Persona::from_str("kana").unwrap(), Persona::Kana);
        assert!(Persona::from_str("rin").is_err());
    }

    #[test]
    fn test_blame_target_is_the_other_variant() {
        assert_eq!(Persona::Mika.other(), Persona::Kana);
        assert_eq!(Persona::Kana.other(), Persona::Mika);
    }
}
