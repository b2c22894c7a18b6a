use crate::envelope::MessageType;
use crate::messages::simple_record::{self, SimpleRecord};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Server-to-client `Write-Warning` stream record (MS-PSRP §2.2.3.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRecord(pub SimpleRecord);

impl PsObjectWithType for WarningRecord {
    fn message_type(&self) -> MessageType {
        MessageType::WarningRecord
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<WarningRecord> for ComplexObject {
    fn from(record: WarningRecord) -> Self {
        simple_record::to_complex_object(&record.0)
    }
}

impl TryFrom<&ComplexObject> for WarningRecord {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self(simple_record::from_complex_object(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let record = WarningRecord(SimpleRecord {
            message: "deprecated cmdlet".to_string(),
            invocation_info: None,
        });
        let obj: ComplexObject = record.clone().into();
        let restored = WarningRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
