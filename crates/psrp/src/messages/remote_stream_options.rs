use crate::value::{PsType, PsValue};
use crate::{PsrpError, Result};
use std::borrow::Cow;

/// `System.Management.Automation.Runspaces.RemoteStreamOptions`: a flags
/// enum controlling whether invocation info gets stamped onto the stream
/// records a pipeline emits (MS-PSRP §2.2.3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RemoteStreamOptions(pub i32);

impl RemoteStreamOptions {
    pub const NONE: Self = Self(0);
    pub const ADD_INVOCATION_INFO_TO_ERROR_RECORD: Self = Self(1);
    pub const ADD_INVOCATION_INFO_TO_WARNING_RECORD: Self = Self(2);
    pub const ADD_INVOCATION_INFO_TO_DEBUG_RECORD: Self = Self(4);
    pub const ADD_INVOCATION_INFO_TO_VERBOSE_RECORD: Self = Self(8);

    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    fn type_def() -> PsType {
        PsType::new(vec![
            Cow::Borrowed("System.Management.Automation.Runspaces.RemoteStreamOptions"),
            Cow::Borrowed("System.Enum"),
            Cow::Borrowed("System.ValueType"),
            Cow::Borrowed("System.Object"),
        ])
    }

    pub fn to_ps_value(self) -> PsValue {
        PsValue::from_enum(Self::type_def(), self.0.to_string(), self.0)
    }

    pub fn from_ps_value(value: &PsValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("RemoteStreamOptions is not an Object".to_string()))?;
        let flags = obj
            .as_enum_value()
            .ok_or_else(|| PsrpError::InvalidMessage("RemoteStreamOptions is not an enum value".to_string()))?;
        Ok(Self(flags))
    }
}

impl std::ops::BitOr for RemoteStreamOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_flags_round_trip() {
        let flags =
            RemoteStreamOptions::ADD_INVOCATION_INFO_TO_ERROR_RECORD | RemoteStreamOptions::ADD_INVOCATION_INFO_TO_WARNING_RECORD;
        let value = flags.to_ps_value();
        let restored = RemoteStreamOptions::from_ps_value(&value).unwrap();
        assert_eq!(flags, restored);
        assert!(restored.contains(RemoteStreamOptions::ADD_INVOCATION_INFO_TO_ERROR_RECORD));
        assert!(!restored.contains(RemoteStreamOptions::ADD_INVOCATION_INFO_TO_DEBUG_RECORD));
    }
}
