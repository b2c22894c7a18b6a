use crate::value::{PsType, PsValue};
use crate::{PsrpError, Result};

/// `System.Management.Automation.Runspaces.ApartmentState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApartmentState {
    Sta = 0,
    Mta = 1,
    Unknown = 2,
}

impl ApartmentState {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn to_ps_value(self) -> PsValue {
        let name = match self {
            Self::Sta => "STA",
            Self::Mta => "MTA",
            Self::Unknown => "Unknown",
        };
        PsValue::from_enum(PsType::apartment_state(), name, self.as_i32())
    }
}

impl TryFrom<i32> for ApartmentState {
    type Error = PsrpError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Sta),
            1 => Ok(Self::Mta),
            2 => Ok(Self::Unknown),
            other => Err(PsrpError::InvalidMessage(format!("invalid ApartmentState value: {other}"))),
        }
    }
}

/// `System.Management.Automation.Runspaces.PSThreadOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PSThreadOptions {
    Default = 0,
    UseNewThread = 1,
    ReuseThread = 2,
    UseCurrentThread = 3,
}

impl PSThreadOptions {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn to_ps_value(self) -> PsValue {
        let name = match self {
            Self::Default => "Default",
            Self::UseNewThread => "UseNewThread",
            Self::ReuseThread => "ReuseThread",
            Self::UseCurrentThread => "UseCurrentThread",
        };
        PsValue::from_enum(PsType::ps_thread_options(), name, self.as_i32())
    }
}

impl TryFrom<i32> for PSThreadOptions {
    type Error = PsrpError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::UseNewThread),
            2 => Ok(Self::ReuseThread),
            3 => Ok(Self::UseCurrentThread),
            other => Err(PsrpError::InvalidMessage(format!(
                "invalid PSThreadOptions value: {other}"
            ))),
        }
    }
}

/// `System.Management.Automation.Runspaces.PipelineResultTypes`, a bitflag
/// enum used by `RemoteStreamOptions` and `AddCommand`'s merge instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineResultTypes(pub i32);

impl PipelineResultTypes {
    pub const NONE: Self = Self(0);
    pub const OUTPUT: Self = Self(1);
    pub const ERROR: Self = Self(2);
    pub const WARNING: Self = Self(3);
    pub const VERBOSE: Self = Self(4);
    pub const DEBUG: Self = Self(5);
    pub const INFORMATION: Self = Self(6);
    pub const ALL: Self = Self(7);
    /// Redirect the stream to nowhere; drops it instead of merging it in.
    pub const NULL: Self = Self(-1);

    pub fn to_ps_value(self) -> PsValue {
        PsValue::from_enum(PsType::pipeline_result_types(), self.0.to_string(), self.0)
    }

    /// A `Command`/pipeline redirection target is only ever `None`,
    /// `Output`, or `Null` -- other streams can't themselves be a merge
    /// destination.
    pub fn is_valid_redirection_target(self) -> bool {
        matches!(self, Self::NONE | Self::OUTPUT | Self::NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apartment_state_round_trips() {
        for value in 0..=2 {
            let state = ApartmentState::try_from(value).unwrap();
            assert_eq!(state.as_i32(), value);
        }
        assert!(ApartmentState::try_from(3).is_err());
    }

    #[test]
    fn ps_thread_options_round_trips() {
        for value in 0..=3 {
            let opts = PSThreadOptions::try_from(value).unwrap();
            assert_eq!(opts.as_i32(), value);
        }
        assert!(PSThreadOptions::try_from(4).is_err());
    }

    #[test]
    fn apartment_state_serializes_as_enum_value() {
        let value = ApartmentState::Mta.to_ps_value();
        let PsValue::Object(obj) = &value else {
            panic!("expected an Object");
        };
        assert_eq!(obj.as_enum_value(), Some(1));
        assert_eq!(obj.to_string.as_deref(), Some("MTA"));
    }
}
