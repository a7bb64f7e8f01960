//! Subscription plan types

use serde::{Deserialize, Serialize};

/// Purchasable plan tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier - 10 generations/month
    Hobby,
    /// Pro tier - $19/mo, 2000 generations/month
    Pro,
    /// Team tier - $49/mo, unlimited generations
    Team,
}

impl Plan {
    /// Generation quota per billing month. `None` means unlimited.
    pub const fn monthly_quota(&self) -> Option<u64> {
        match self {
            Self::Hobby => Some(10),
            Self::Pro => Some(2_000),
            Self::Team => None,
        }
    }

    /// Monthly price in cents
    pub const fn price_cents(&self) -> u32 {
        match self {
            Self::Hobby => 0,
            Self::Pro => 1_900,
            Self::Team => 4_900,
        }
    }

    /// Whether this plan is purchased through the payment processor
    pub const fn is_paid(&self) -> bool {
        !matches!(self, Self::Hobby)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hobby => write!(f, "hobby"),
            Self::Pro => write!(f, "pro"),
            Self::Team => write!(f, "team"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hobby" => Ok(Self::Hobby),
            "pro" => Ok(Self::Pro),
            "team" => Ok(Self::Team),
            _ => Err(PlanParseError(s.to_string())),
        }
    }
}

/// Error parsing a plan string
#[derive(Debug, Clone)]
pub struct PlanParseError(pub String);

impl std::fmt::Display for PlanParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid plan: {}", self.0)
    }
}

impl std::error::Error for PlanParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for plan in [Plan::Hobby, Plan::Pro, Plan::Team] {
            let parsed: Plan = plan.to_string().parse().unwrap();
            assert_eq!(parsed, plan);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("PRO".parse::<Plan>().unwrap(), Plan::Pro);
        assert_eq!("Team".parse::<Plan>().unwrap(), Plan::Team);
    }

    #[test]
    fn unknown_plan_fails_to_parse() {
        assert!("enterprise".parse::<Plan>().is_err());
        assert!("".parse::<Plan>().is_err());
    }

    #[test]
    fn quota_table() {
        assert_eq!(Plan::Hobby.monthly_quota(), Some(10));
        assert_eq!(Plan::Pro.monthly_quota(), Some(2_000));
        assert_eq!(Plan::Team.monthly_quota(), None);
    }
}
