use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsType, PsValue};
use crate::{PsrpError, Result};

/// `System.Management.Automation.ErrorCategoryInfo`'s wire shape, carried
/// inside `ErrorRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCategory {
    pub category: i32,
    pub activity: Option<String>,
    pub reason: Option<String>,
    pub target_name: Option<String>,
    pub target_type: Option<String>,
    pub message: Option<String>,
}

impl From<ErrorCategory> for ComplexObject {
    fn from(cat: ErrorCategory) -> Self {
        let mut obj = ComplexObject::standard().with_extended("Category", cat.category);
        if let Some(v) = cat.activity {
            obj = obj.with_extended("Activity", v);
        }
        if let Some(v) = cat.reason {
            obj = obj.with_extended("Reason", v);
        }
        if let Some(v) = cat.target_name {
            obj = obj.with_extended("TargetName", v);
        }
        if let Some(v) = cat.target_type {
            obj = obj.with_extended("TargetType", v);
        }
        if let Some(v) = cat.message {
            obj = obj.with_extended("Message", v);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for ErrorCategory {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let category = value
            .require_extended("Category")?
            .as_i32()
            .ok_or_else(|| PsrpError::InvalidMessage("Category is not an I32".to_string()))?;
        let string_field = |name: &str| value.get_extended(name).and_then(PsValue::as_str).map(str::to_string);

        Ok(Self {
            category,
            activity: string_field("Activity"),
            reason: string_field("Reason"),
            target_name: string_field("TargetName"),
            target_type: string_field("TargetType"),
            message: string_field("Message"),
        })
    }
}

/// `System.Management.Automation.ErrorRecord`'s wire shape (MS-PSRP
/// §2.2.3.1), delivered as the payload of a `PipelineHostCall`'s `me`
/// field, an `ErrorRecord` stream record, or a `PipelineState`/
/// `RunspacePoolState` transition's `ExceptionAsErrorRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: Option<String>,
    pub command_name: Option<String>,
    pub was_thrown_from_throw_statement: bool,
    pub fully_qualified_error_id: Option<String>,
    pub target_object: Option<PsValue>,
    pub exception: Option<PsValue>,
    pub error_category: Option<ErrorCategory>,
    pub invocation_info: Option<PsValue>,
}

impl PsObjectWithType for ErrorRecord {
    fn message_type(&self) -> MessageType {
        MessageType::ErrorRecord
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<ErrorRecord> for ComplexObject {
    fn from(record: ErrorRecord) -> Self {
        let mut obj = ComplexObject::standard()
            .with_type(PsType::error_record())
            .with_extended(
                "wasThrownFromThrowStatement",
                record.was_thrown_from_throw_statement,
            );
        if let Some(v) = record.message {
            obj = obj.with_extended("Message", v);
        }
        if let Some(v) = record.command_name {
            obj = obj.with_extended("CommandName", v);
        }
        if let Some(v) = record.fully_qualified_error_id {
            obj = obj.with_extended("FullyQualifiedErrorId", v);
        }
        if let Some(v) = record.target_object {
            obj = obj.with_extended("TargetObject", v);
        }
        if let Some(v) = record.exception {
            obj = obj.with_extended("Exception", v);
        }
        if let Some(v) = record.error_category {
            obj = obj.with_extended("ErrorCategory_Category", PsValue::Object(v.into()));
        }
        if let Some(v) = record.invocation_info {
            obj = obj.with_extended("InvocationInfo", v);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for ErrorRecord {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let string_field = |name: &str| value.get_extended(name).and_then(PsValue::as_str).map(str::to_string);
        let was_thrown_from_throw_statement = value
            .get_extended("wasThrownFromThrowStatement")
            .and_then(PsValue::as_bool)
            .unwrap_or(false);

        let error_category = value
            .get_extended("ErrorCategory_Category")
            .and_then(PsValue::as_object)
            .map(ErrorCategory::try_from)
            .transpose()?;

        Ok(Self {
            message: string_field("Message"),
            command_name: string_field("CommandName"),
            was_thrown_from_throw_statement,
            fully_qualified_error_id: string_field("FullyQualifiedErrorId"),
            target_object: value.get_extended("TargetObject").cloned(),
            exception: value.get_extended("Exception").cloned(),
            error_category,
            invocation_info: value.get_extended("InvocationInfo").cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ErrorRecord {
        ErrorRecord {
            message: Some("boom".to_string()),
            command_name: Some("Get-Thing".to_string()),
            was_thrown_from_throw_statement: false,
            fully_qualified_error_id: Some("BoomError,Get-Thing".to_string()),
            target_object: None,
            exception: None,
            error_category: Some(ErrorCategory {
                category: 1,
                activity: Some("Get-Thing".to_string()),
                reason: Some("InvalidOperationException".to_string()),
                target_name: None,
                target_type: None,
                message: Some("boom".to_string()),
            }),
            invocation_info: None,
        }
    }

    #[test]
    fn round_trips() {
        let record = sample();
        let obj: ComplexObject = record.clone().into();
        let restored = ErrorRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn round_trips_without_category() {
        let mut record = sample();
        record.error_category = None;
        let obj: ComplexObject = record.clone().into();
        let restored = ErrorRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
