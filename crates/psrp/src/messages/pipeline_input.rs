use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{PsPrimitiveValue, PsValue};

/// Client-to-server pipeline input object (MS-PSRP §2.2.2.18). Bare value,
/// no wrapper, matching `PipelineOutput`'s shape in the other direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInput {
    pub data: PsValue,
}

impl PsObjectWithType for PipelineInput {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineInput
    }

    fn to_ps_object(&self) -> PsValue {
        self.data.clone()
    }
}

impl From<PsValue> for PipelineInput {
    fn from(data: PsValue) -> Self {
        Self { data }
    }
}

/// Client-to-server end-of-input marker (MS-PSRP §2.2.2.19). Serialized as
/// an empty string, same convention as `PublicKeyRequest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndOfPipelineInput;

impl PsObjectWithType for EndOfPipelineInput {
    fn message_type(&self) -> MessageType {
        MessageType::EndOfPipelineInput
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Primitive(PsPrimitiveValue::Str(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_input_wraps_the_bare_value() {
        let input = PipelineInput::from(PsValue::from(42));
        assert_eq!(input.to_ps_object(), PsValue::from(42));
    }

    #[test]
    fn end_of_pipeline_input_is_empty_string() {
        let marker = EndOfPipelineInput;
        assert_eq!(
            marker.to_ps_object(),
            PsValue::Primitive(PsPrimitiveValue::Str(String::new()))
        );
    }
}
