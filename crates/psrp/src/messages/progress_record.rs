use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsType, PsValue};
use crate::{PsrpError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRecordType {
    Processing,
    Completed,
}

impl ProgressRecordType {
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Processing => 0,
            Self::Completed => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Completed => "Completed",
        }
    }
}

impl TryFrom<i32> for ProgressRecordType {
    type Error = PsrpError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Processing),
            1 => Ok(Self::Completed),
            other => Err(PsrpError::InvalidMessage(format!(
                "invalid ProgressRecordType value: {other}"
            ))),
        }
    }
}

/// `System.Management.Automation.ProgressRecord`'s wire shape (MS-PSRP
/// §2.2.3.2), carried by a `ProgressRecord` stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub activity: String,
    pub activity_id: i32,
    pub status_description: Option<String>,
    pub current_operation: Option<String>,
    pub parent_activity_id: Option<i32>,
    pub percent_complete: i32,
    pub progress_type: ProgressRecordType,
    pub seconds_remaining: Option<i32>,
}

impl ProgressRecord {
    /// `percent_complete` outside `-1..=100` is clamped to `-1` ("unknown"),
    /// matching PowerShell's own `ProgressRecord` constructor.
    pub fn new(activity: impl Into<String>, activity_id: i32) -> Self {
        Self {
            activity: activity.into(),
            activity_id,
            status_description: None,
            current_operation: None,
            parent_activity_id: None,
            percent_complete: -1,
            progress_type: ProgressRecordType::Processing,
            seconds_remaining: None,
        }
    }

    pub fn with_percent_complete(mut self, percent: i32) -> Self {
        self.percent_complete = if (-1..=100).contains(&percent) { percent } else { -1 };
        self
    }
}

impl PsObjectWithType for ProgressRecord {
    fn message_type(&self) -> MessageType {
        MessageType::ProgressRecord
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<ProgressRecord> for ComplexObject {
    fn from(record: ProgressRecord) -> Self {
        let mut obj = ComplexObject::standard()
            .with_extended("Activity", record.activity)
            .with_extended("ActivityId", record.activity_id)
            .with_extended("PercentComplete", record.percent_complete)
            .with_extended(
                "Type",
                PsValue::from_enum(
                    PsType::new(vec![
                        std::borrow::Cow::Borrowed("System.Management.Automation.ProgressRecordType"),
                        std::borrow::Cow::Borrowed("System.Enum"),
                        std::borrow::Cow::Borrowed("System.ValueType"),
                        std::borrow::Cow::Borrowed("System.Object"),
                    ]),
                    record.progress_type.as_str(),
                    record.progress_type.as_i32(),
                ),
            );
        if let Some(v) = record.status_description {
            obj = obj.with_extended("StatusDescription", v);
        }
        if let Some(v) = record.current_operation {
            obj = obj.with_extended("CurrentOperation", v);
        }
        if let Some(v) = record.parent_activity_id {
            obj = obj.with_extended("ParentActivityId", v);
        }
        if let Some(v) = record.seconds_remaining {
            obj = obj.with_extended("SecondsRemaining", v);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for ProgressRecord {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let activity = value
            .require_extended("Activity")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("Activity is not a string".to_string()))?
            .to_string();
        let activity_id = value
            .require_extended("ActivityId")?
            .as_i32()
            .ok_or_else(|| PsrpError::InvalidMessage("ActivityId is not an I32".to_string()))?;
        let percent_complete = value
            .require_extended("PercentComplete")?
            .as_i32()
            .ok_or_else(|| PsrpError::InvalidMessage("PercentComplete is not an I32".to_string()))?;

        let progress_type = value
            .get_extended("Type")
            .and_then(PsValue::as_object)
            .and_then(ComplexObject::as_enum_value)
            .map_or(Ok(ProgressRecordType::Processing), ProgressRecordType::try_from)?;

        let string_field = |name: &str| value.get_extended(name).and_then(PsValue::as_str).map(str::to_string);
        let int_field = |name: &str| value.get_extended(name).and_then(PsValue::as_i32);

        Ok(Self {
            activity,
            activity_id,
            status_description: string_field("StatusDescription"),
            current_operation: string_field("CurrentOperation"),
            parent_activity_id: int_field("ParentActivityId"),
            percent_complete,
            progress_type,
            seconds_remaining: int_field("SecondsRemaining"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let mut record = ProgressRecord::new("Downloading", 1).with_percent_complete(42);
        record.current_operation = Some("file.txt".to_string());
        let obj: ComplexObject = record.clone().into();
        let restored = ProgressRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn out_of_range_percent_is_clamped() {
        let record = ProgressRecord::new("Test", 0).with_percent_complete(150);
        assert_eq!(record.percent_complete, -1);
    }

    #[test]
    fn completed_round_trips() {
        let mut record = ProgressRecord::new("Done", 1).with_percent_complete(100);
        record.progress_type = ProgressRecordType::Completed;
        let obj: ComplexObject = record.clone().into();
        let restored = ProgressRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
