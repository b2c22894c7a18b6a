use crate::envelope::MessageType;
use crate::messages::simple_record::{self, SimpleRecord};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Server-to-client `Write-Verbose` stream record (MS-PSRP §2.2.3.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerboseRecord(pub SimpleRecord);

impl PsObjectWithType for VerboseRecord {
    fn message_type(&self) -> MessageType {
        MessageType::VerboseRecord
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<VerboseRecord> for ComplexObject {
    fn from(record: VerboseRecord) -> Self {
        simple_record::to_complex_object(&record.0)
    }
}

impl TryFrom<&ComplexObject> for VerboseRecord {
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
        let record = VerboseRecord(SimpleRecord {
            message: "fetching 10 items".to_string(),
            invocation_info: None,
        });
        let obj: ComplexObject = record.clone().into();
        let restored = VerboseRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
