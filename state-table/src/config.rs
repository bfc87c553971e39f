use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::table::StateTable`].
///
/// Defaults mirror FreeRADIUS's conservative out-of-the-box `state` config:
/// a few thousand in-flight sessions, a half-minute window to complete a
/// multi-round exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateTableConfig {
    /// Upper bound on concurrently tracked sessions. `create` fails with
    /// [`crate::Error::TableFull`] once this is reached, after reaping.
    pub max_sessions: u32,

    /// How long an entry may sit unused before it becomes eligible for
    /// reaping.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Operator-configured seed byte overwriting token offset 3, for sites
    /// that want a fixed diagnostic marker baked into every token.
    pub state_seed: Option<u8>,
}

impl Default for StateTableConfig {
    fn default() -> Self {
        Self {
            max_sessions: 4096,
            timeout: Duration::from_secs(30),
            state_seed: None,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_conservative_freeradius_values() {
        let config = StateTableConfig::default();
        assert_eq!(config.max_sessions, 4096);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.state_seed, None);
    }

    #[test]
    fn custom_values_are_preserved() {
        let config = StateTableConfig {
            max_sessions: 10,
            timeout: Duration::from_secs(5),
            state_seed: Some(9),
        };
        assert_eq!(config.max_sessions, 10);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.state_seed, Some(9));
    }
}
