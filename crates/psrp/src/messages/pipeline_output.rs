use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::PsValue;

/// Server-to-client pipeline output object (MS-PSRP §2.2.2.20). Unlike
/// every other message in the catalog this one carries no wrapper: the
/// envelope's data blob IS the serialized output value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub data: PsValue,
}

impl PsObjectWithType for PipelineOutput {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineOutput
    }

    fn to_ps_object(&self) -> PsValue {
        self.data.clone()
    }
}

impl From<PsValue> for PipelineOutput {
    fn from(data: PsValue) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_the_bare_value() {
        let output = PipelineOutput::from(PsValue::from("hello"));
        assert_eq!(output.to_ps_object(), PsValue::from("hello"));
    }
}
