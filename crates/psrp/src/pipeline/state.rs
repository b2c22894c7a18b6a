use crate::{PsrpError, Result};

/// A pipeline's lifecycle state (MS-PSRP §2.2.3, client and server share
/// this enumeration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PSInvocationState {
    NotStarted = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
    Completed = 4,
    Failed = 5,
    Disconnected = 6,
}

impl PSInvocationState {
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::NotStarted => 0,
            Self::Running => 1,
            Self::Stopping => 2,
            Self::Stopped => 3,
            Self::Completed => 4,
            Self::Failed => 5,
            Self::Disconnected => 6,
        }
    }

    /// No further `PipelineState` transitions follow a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

impl TryFrom<i32> for PSInvocationState {
    type Error = PsrpError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::NotStarted),
            1 => Ok(Self::Running),
            2 => Ok(Self::Stopping),
            3 => Ok(Self::Stopped),
            4 => Ok(Self::Completed),
            5 => Ok(Self::Failed),
            6 => Ok(Self::Disconnected),
            other => Err(PsrpError::InvalidMessage(format!(
                "invalid PSInvocationState value: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_discriminant() {
        for value in 0..=6 {
            let state = PSInvocationState::try_from(value).unwrap();
            assert_eq!(state.as_i32(), value);
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(PSInvocationState::try_from(7).is_err());
        assert!(PSInvocationState::try_from(-1).is_err());
    }

    #[test]
    fn only_stopped_failed_completed_are_terminal() {
        assert!(PSInvocationState::Stopped.is_terminal());
        assert!(PSInvocationState::Failed.is_terminal());
        assert!(PSInvocationState::Completed.is_terminal());
        assert!(!PSInvocationState::NotStarted.is_terminal());
        assert!(!PSInvocationState::Running.is_terminal());
        assert!(!PSInvocationState::Stopping.is_terminal());
        assert!(!PSInvocationState::Disconnected.is_terminal());
    }
}
