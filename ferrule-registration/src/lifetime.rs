use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// How many instances of a registered component exist relative to resolution
/// calls and lifetime scopes.
#[derive(Debug, Default, Copy, Clone, Serialize, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance for every resolution. Backends need no scoping call.
    #[default]
    PerRequest,
    /// One instance per active lifetime scope.
    PerScope,
    /// One instance for the whole process.
    Singleton,
}

/// Scoping instruction handed to a backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstanceScope {
    LifetimeScope,
    SingleInstance,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::PerRequest => "PerRequest",
            Lifetime::PerScope => "PerScope",
            Lifetime::Singleton => "Singleton",
        }
    }

    /// The scoping instruction this lifetime requires, if any.
    pub fn scope(&self) -> Option<InstanceScope> {
        match self {
            Lifetime::PerRequest => None,
            Lifetime::PerScope => Some(InstanceScope::LifetimeScope),
            Lifetime::Singleton => Some(InstanceScope::SingleInstance),
        }
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        const VARIANTS: [&str; 3] = ["per_request", "per_scope", "singleton"];

        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| <D::Error as serde::de::Error>::unknown_variant(&s, &VARIANTS))
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct ParseLifetimeError;

impl fmt::Display for ParseLifetimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown lifetime")
    }
}

impl std::error::Error for ParseLifetimeError {}

impl FromStr for Lifetime {
    type Err = ParseLifetimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "perrequest" | "perdependency" | "transient" => Ok(Lifetime::PerRequest),
            "perscope" | "perlifetimescope" | "scoped" => Ok(Lifetime::PerScope),
            "singleton" | "singleinstance" => Ok(Lifetime::Singleton),
            _ => Err(ParseLifetimeError),
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
