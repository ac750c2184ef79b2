use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumString};
use swf_common::prelude::*;

/// How activity ids and default child workflow ids are produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IdStrategy {
    /// UUIDv5 derived from the decision round, so replaying a history yields the same ids.
    Seeded,
    /// UUIDv4.
    Random,
}

#[derive(Clone, Debug)]
pub struct DeciderProperties {
    /// Upper bound on partitions of one fan-out step scheduled in a single decision round.
    max_partitions_per_decision: usize,
    /// Characters kept from a failure reason in the fail decision. CHARACTERS
    reason_max_length: usize,
    id_strategy: IdStrategy,
    /// Replay every unit of work through its lifecycle before deciding.
    strict_replay: bool,
}

impl DeciderProperties {
    pub const MAX_PARTITIONS_ENV: &'static str = "SWF_MAX_PARTITIONS_PER_DECISION";
    pub const ID_STRATEGY_ENV: &'static str = "SWF_ID_STRATEGY";
    pub const STRICT_REPLAY_ENV: &'static str = "SWF_STRICT_REPLAY";

    /// Defaults overridden by the `SWF_*` environment variables that are set.
    pub fn from_env() -> SwfResult<Self> {
        let mut properties = Self::default();
        if let Ok(value) = std::env::var(Self::MAX_PARTITIONS_ENV) {
            let max = value.trim().parse::<usize>().map_err(|_| {
                ErrorCode::IllegalArgument(format!(
                    "{} must be a positive integer, got '{}'",
                    Self::MAX_PARTITIONS_ENV,
                    value
                ))
            })?;
            properties = properties.with_max_partitions_per_decision(max)?;
        }
        if let Ok(value) = std::env::var(Self::ID_STRATEGY_ENV) {
            let strategy = IdStrategy::from_str(value.trim()).map_err(|_| {
                ErrorCode::IllegalArgument(format!(
                    "{} must be 'seeded' or 'random', got '{}'",
                    Self::ID_STRATEGY_ENV,
                    value
                ))
            })?;
            properties = properties.with_id_strategy(strategy);
        }
        if let Ok(value) = std::env::var(Self::STRICT_REPLAY_ENV) {
            let strict = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
            properties = properties.with_strict_replay(strict);
        }
        debug!("decider properties: {:?}", properties);
        Ok(properties)
    }

    pub fn max_partitions_per_decision(&self) -> usize {
        self.max_partitions_per_decision
    }

    pub fn reason_max_length(&self) -> usize {
        self.reason_max_length
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    pub fn is_strict_replay(&self) -> bool {
        self.strict_replay
    }

    pub fn with_max_partitions_per_decision(mut self, max: usize) -> SwfResult<Self> {
        if max == 0 {
            return str_err!(
                IllegalArgument,
                "max_partitions_per_decision must be at least 1"
            );
        }
        self.max_partitions_per_decision = max;
        Ok(self)
    }

    pub fn with_reason_max_length(mut self, length: usize) -> Self {
        self.reason_max_length = length;
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn with_strict_replay(mut self, strict_replay: bool) -> Self {
        self.strict_replay = strict_replay;
        self
    }
}

impl Default for DeciderProperties {
    fn default() -> Self {
        Self {
            max_partitions_per_decision: 100, // service cap on decisions per response
            reason_max_length: 256,
            id_strategy: IdStrategy::Seeded,
            strict_replay: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_partitions_is_rejected() {
        assert!(DeciderProperties::default()
            .with_max_partitions_per_decision(0)
            .is_err());
        let properties = DeciderProperties::default()
            .with_max_partitions_per_decision(2)
            .unwrap();
        assert_eq!(properties.max_partitions_per_decision(), 2);
        assert_eq!(properties.reason_max_length(), 256);
        assert_eq!(properties.id_strategy(), IdStrategy::Seeded);
    }
}
