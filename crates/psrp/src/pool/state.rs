/// A runspace pool's lifecycle state (MS-PSRP §2.2.3's `RunspacePoolState`),
/// shared by the client and server halves of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunspacePoolState {
    BeforeOpen,
    Opening,
    NegotiationSent,
    NegotiationSucceeded,
    Opened,
    Connecting,
    Disconnecting,
    Disconnected,
    Closing,
    Closed,
    Broken,
}

impl RunspacePoolState {
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::BeforeOpen => 0,
            Self::Opening => 1,
            Self::Opened => 2,
            Self::Closed => 3,
            Self::Closing => 4,
            Self::Broken => 5,
            Self::NegotiationSent => 6,
            Self::NegotiationSucceeded => 7,
            Self::Connecting => 8,
            Self::Disconnected => 9,
            Self::Disconnecting => 10,
        }
    }
}

impl TryFrom<i32> for RunspacePoolState {
    type Error = crate::PsrpError;

    fn try_from(value: i32) -> crate::Result<Self> {
        match value {
            0 => Ok(Self::BeforeOpen),
            1 => Ok(Self::Opening),
            2 => Ok(Self::Opened),
            3 => Ok(Self::Closed),
            4 => Ok(Self::Closing),
            5 => Ok(Self::Broken),
            6 => Ok(Self::NegotiationSent),
            7 => Ok(Self::NegotiationSucceeded),
            8 => Ok(Self::Connecting),
            9 => Ok(Self::Disconnected),
            10 => Ok(Self::Disconnecting),
            other => Err(crate::PsrpError::InvalidMessage(format!(
                "invalid RunspacePoolState value: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_discriminant() {
        for value in 0..=10 {
            let state = RunspacePoolState::try_from(value).unwrap();
            assert_eq!(state.as_i32(), value);
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(RunspacePoolState::try_from(11).is_err());
        assert!(RunspacePoolState::try_from(-1).is_err());
    }
}
