//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room a [`RoomManager`](crate::RoomManager)
/// creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Capacity of the room's command channel. Callers wait when it is full.
    pub channel_size: usize,

    /// Whether joiners beyond the two players are seated as spectators.
    pub allow_spectators: bool,

    /// Spectator limit. `0` means unlimited when spectators are allowed.
    pub max_spectators: usize,
}

impl RoomConfig {
    /// Returns `true` if one more spectator fits next to `current` ones.
    pub fn admits_spectator(&self, current: usize) -> bool {
        self.allow_spectators
            && (self.max_spectators == 0 || current < self.max_spectators)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            allow_spectators: false,
            max_spectators: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.channel_size, 64);
        assert!(!config.allow_spectators);
        assert!(!config.admits_spectator(0));
    }

    #[test]
    fn test_unlimited_spectators() {
        let config = RoomConfig {
            allow_spectators: true,
            ..RoomConfig::default()
        };
        assert!(config.admits_spectator(0));
        assert!(config.admits_spectator(1_000));
    }

    #[test]
    fn test_spectator_limit() {
        let config = RoomConfig {
            allow_spectators: true,
            max_spectators: 2,
            ..RoomConfig::default()
        };
        assert!(config.admits_spectator(1));
        assert!(!config.admits_spectator(2));
    }
}
