use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Shared wire shape for `DebugRecord`/`VerboseRecord`/`WarningRecord`
/// (MS-PSRP §2.2.3.3/§2.2.3.4/§2.2.3.5): just a message and the optional
/// invocation info PowerShell attaches when `$InformationPreference`-style
/// settings ask for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRecord {
    pub message: String,
    pub invocation_info: Option<PsValue>,
}

pub fn to_complex_object(record: &SimpleRecord) -> ComplexObject {
    let mut obj = ComplexObject::standard().with_extended("Message", record.message.as_str());
    if let Some(v) = &record.invocation_info {
        obj = obj.with_extended("InvocationInfo_Serialized", v.clone());
    }
    obj
}

pub fn from_complex_object(value: &ComplexObject) -> Result<SimpleRecord> {
    let message = value
        .require_extended("Message")?
        .as_str()
        .ok_or_else(|| PsrpError::InvalidMessage("Message is not a string".to_string()))?
        .to_string();
    Ok(SimpleRecord {
        message,
        invocation_info: value.get_extended("InvocationInfo_Serialized").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let record = SimpleRecord {
            message: "working...".to_string(),
            invocation_info: None,
        };
        let obj = to_complex_object(&record);
        let restored = from_complex_object(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
