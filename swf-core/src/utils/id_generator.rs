use swf_common::prelude::*;
use uuid::Uuid;

use crate::config::IdStrategy;

/// Produces `{prefix}-{uuid}` identifiers for scheduled work. The seeded flavour hashes the round
/// seed, the prefix and a sequence number into a UUIDv5, so a round replayed over the same history
/// gets the same ids.
#[derive(Clone, Debug)]
pub enum IdGenerator {
    Random,
    Seeded { seed: String, sequence: u64 },
}

impl IdGenerator {
    pub fn new(strategy: IdStrategy, seed: impl Into<String>) -> Self {
        match strategy {
            IdStrategy::Random => Self::Random,
            IdStrategy::Seeded => Self::Seeded {
                seed: seed.into(),
                sequence: 0,
            },
        }
    }

    pub fn generate(&mut self, prefix: &str) -> InlineStr {
        let uuid = match self {
            Self::Random => Uuid::new_v4(),
            Self::Seeded { seed, sequence } => {
                let name = format!("{}/{}/{}", seed, prefix, sequence);
                *sequence += 1;
                Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
            }
        };
        format!("{}-{}", prefix, uuid.hyphenated()).into()
    }
}
