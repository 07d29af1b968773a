//! Tool name collision policy

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What happens when two backends advertise a tool with the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The backend registered last owns the name
    #[default]
    LastWins,
    /// The backend registered first keeps the name
    FirstWins,
    /// Startup fails
    Reject,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::LastWins => "last-wins",
            CollisionPolicy::FirstWins => "first-wins",
            CollisionPolicy::Reject => "reject",
        }
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-wins" | "last" => Ok(CollisionPolicy::LastWins),
            "first-wins" | "first" => Ok(CollisionPolicy::FirstWins),
            "reject" | "error" => Ok(CollisionPolicy::Reject),
            other => Err(format!(
                "Invalid collision policy: '{}'. Valid: last-wins, first-wins, reject",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_last_wins() {
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::LastWins);
    }

    #[test]
    fn test_parse() {
        assert_eq!("first".parse::<CollisionPolicy>(), Ok(CollisionPolicy::FirstWins));
        assert_eq!("REJECT".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Reject));
        assert!("random".parse::<CollisionPolicy>().is_err());
    }
}
