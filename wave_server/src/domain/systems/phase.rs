use crate::domain::state::Phase;
use std::fmt;
use std::str::FromStr;

/// Discrete triggers that may move the world between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Every enemy of the current wave has died.
    WaveCleared,
    /// The ready quorum stood in the portal.
    PortalTaken,
    /// The ready quorum stood in the hub exit.
    HubExitTaken,
}

impl Phase {
    /// The single transition table. `None` means the event is meaningless in this phase.
    pub fn next(self, event: PhaseEvent) -> Option<Phase> {
        match (self, event) {
            (Phase::Wave, PhaseEvent::WaveCleared | PhaseEvent::PortalTaken) => Some(Phase::Hub),
            (Phase::Hub, PhaseEvent::HubExitTaken) => Some(Phase::Wave),
            _ => None,
        }
    }
}

/// How many connected players must be ready at an exit for the phase to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyQuorum {
    /// One ready player is enough.
    Any,
    /// Every connected player must be ready.
    #[default]
    All,
}

impl ReadyQuorum {
    pub fn is_met(self, eligible: usize, connected: usize) -> bool {
        match self {
            ReadyQuorum::Any => eligible > 0,
            ReadyQuorum::All => connected > 0 && eligible == connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuorum(pub String);

impl fmt::Display for UnknownQuorum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ready quorum '{}' (expected any|all)", self.0)
    }
}

impl std::error::Error for UnknownQuorum {}

impl FromStr for ReadyQuorum {
    type Err = UnknownQuorum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(ReadyQuorum::Any),
            "all" => Ok(ReadyQuorum::All),
            other => Err(UnknownQuorum(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_in_wave_then_clear_or_portal_leads_to_hub() {
        assert_eq!(Phase::Wave.next(PhaseEvent::WaveCleared), Some(Phase::Hub));
        assert_eq!(Phase::Wave.next(PhaseEvent::PortalTaken), Some(Phase::Hub));
        assert_eq!(Phase::Wave.next(PhaseEvent::HubExitTaken), None);
    }

    #[test]
    fn when_in_hub_then_only_the_exit_starts_a_wave() {
        assert_eq!(Phase::Hub.next(PhaseEvent::HubExitTaken), Some(Phase::Wave));
        assert_eq!(Phase::Hub.next(PhaseEvent::WaveCleared), None);
        assert_eq!(Phase::Hub.next(PhaseEvent::PortalTaken), None);
    }

    #[test]
    fn when_quorum_is_all_then_every_player_must_be_eligible() {
        assert!(ReadyQuorum::All.is_met(2, 2));
        assert!(!ReadyQuorum::All.is_met(1, 2));
        assert!(!ReadyQuorum::All.is_met(0, 0));
    }

    #[test]
    fn when_quorum_is_any_then_one_player_suffices() {
        assert!(ReadyQuorum::Any.is_met(1, 3));
        assert!(!ReadyQuorum::Any.is_met(0, 3));
    }

    #[test]
    fn when_parsing_quorum_then_case_and_whitespace_are_ignored() {
        assert_eq!(" ANY ".parse::<ReadyQuorum>(), Ok(ReadyQuorum::Any));
        assert_eq!("all".parse::<ReadyQuorum>(), Ok(ReadyQuorum::All));
        assert!("most".parse::<ReadyQuorum>().is_err());
    }
}
