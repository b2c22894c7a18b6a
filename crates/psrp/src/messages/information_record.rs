use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsType, PsValue};
use crate::{PsrpError, Result};

/// The payload `Write-Host` sends down as an `InformationRecord` so the
/// client can render it exactly as the server intended (colors, newline
/// suppression).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostInformationMessage {
    pub message: String,
    pub foreground_color: Option<i32>,
    pub background_color: Option<i32>,
    pub no_new_line: bool,
}

impl From<HostInformationMessage> for ComplexObject {
    fn from(msg: HostInformationMessage) -> Self {
        let mut obj = ComplexObject::standard()
            .with_extended("Message", msg.message)
            .with_extended("NoNewLine", msg.no_new_line);
        if let Some(v) = msg.foreground_color {
            obj = obj.with_extended("ForegroundColor", v);
        }
        if let Some(v) = msg.background_color {
            obj = obj.with_extended("BackgroundColor", v);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for HostInformationMessage {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let message = value
            .require_extended("Message")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("Message is not a string".to_string()))?
            .to_string();
        let no_new_line = value.get_extended("NoNewLine").and_then(PsValue::as_bool).unwrap_or(false);

        Ok(Self {
            message,
            foreground_color: value.get_extended("ForegroundColor").and_then(PsValue::as_i32),
            background_color: value.get_extended("BackgroundColor").and_then(PsValue::as_i32),
            no_new_line,
        })
    }
}

/// The three shapes an `InformationRecord`'s payload can take (MS-PSRP
/// §2.2.3.17).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InformationMessageData {
    String(String),
    HostInformationMessage(HostInformationMessage),
    Object(PsValue),
}

impl InformationMessageData {
    fn to_ps_value(&self) -> PsValue {
        match self {
            Self::String(s) => PsValue::from(s.as_str()),
            Self::HostInformationMessage(msg) => PsValue::Object(msg.clone().into()),
            Self::Object(value) => value.clone(),
        }
    }

    fn from_ps_value(value: &PsValue) -> Self {
        match value {
            PsValue::Primitive(crate::value::PsPrimitiveValue::Str(s)) => Self::String(s.clone()),
            PsValue::Object(obj) if obj.get_extended("Message").is_some() => {
                HostInformationMessage::try_from(obj)
                    .map(Self::HostInformationMessage)
                    .unwrap_or_else(|_| Self::Object(value.clone()))
            }
            other => Self::Object(other.clone()),
        }
    }
}

/// `System.Management.Automation.InformationRecord`'s wire shape (MS-PSRP
/// §2.2.3.17), carried by an `InformationRecord` stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationRecord {
    pub message_data: InformationMessageData,
    pub source: Option<String>,
    pub time_generated: Option<String>,
    pub tags: Option<Vec<String>>,
    pub user: Option<String>,
    pub computer: Option<String>,
    pub process_id: Option<i32>,
    pub native_thread_id: Option<i32>,
    pub managed_thread_id: Option<i32>,
}

impl InformationRecord {
    pub fn new(message_data: InformationMessageData) -> Self {
        Self {
            message_data,
            source: None,
            time_generated: None,
            tags: None,
            user: None,
            computer: None,
            process_id: None,
            native_thread_id: None,
            managed_thread_id: None,
        }
    }
}

impl PsObjectWithType for InformationRecord {
    fn message_type(&self) -> MessageType {
        MessageType::InformationRecord
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<InformationRecord> for ComplexObject {
    fn from(record: InformationRecord) -> Self {
        let mut obj = ComplexObject::standard()
            .with_type(PsType::information_record())
            .with_extended("MessageData", record.message_data.to_ps_value());
        if let Some(v) = record.source {
            obj = obj.with_extended("Source", v);
        }
        if let Some(v) = record.time_generated {
            obj = obj.with_extended("TimeGenerated", v);
        }
        if let Some(tags) = record.tags {
            obj = obj.with_extended("Tags", PsValue::from_string_list(tags));
        }
        if let Some(v) = record.user {
            obj = obj.with_extended("User", v);
        }
        if let Some(v) = record.computer {
            obj = obj.with_extended("Computer", v);
        }
        if let Some(v) = record.process_id {
            obj = obj.with_extended("ProcessId", v);
        }
        if let Some(v) = record.native_thread_id {
            obj = obj.with_extended("NativeThreadId", v);
        }
        if let Some(v) = record.managed_thread_id {
            obj = obj.with_extended("ManagedThreadId", v);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for InformationRecord {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let message_data = InformationMessageData::from_ps_value(value.require_extended("MessageData")?);
        let string_field = |name: &str| value.get_extended(name).and_then(PsValue::as_str).map(str::to_string);
        let int_field = |name: &str| value.get_extended(name).and_then(PsValue::as_i32);

        let tags = value.get_extended("Tags").and_then(|v| {
            let obj = v.as_object()?;
            let crate::value::ComplexObjectContent::Container(crate::value::Container::List(items)) = &obj.content
            else {
                return None;
            };
            Some(items.iter().filter_map(PsValue::as_str).map(str::to_string).collect())
        });

        Ok(Self {
            message_data,
            source: string_field("Source"),
            time_generated: string_field("TimeGenerated"),
            tags,
            user: string_field("User"),
            computer: string_field("Computer"),
            process_id: int_field("ProcessId"),
            native_thread_id: int_field("NativeThreadId"),
            managed_thread_id: int_field("ManagedThreadId"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_message_round_trips() {
        let record = InformationRecord::new(InformationMessageData::String("hello".to_string()));
        let obj: ComplexObject = record.clone().into();
        let restored = InformationRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn host_information_message_round_trips() {
        let record = InformationRecord::new(InformationMessageData::HostInformationMessage(
            HostInformationMessage {
                message: "colored".to_string(),
                foreground_color: Some(12),
                background_color: None,
                no_new_line: true,
            },
        ));
        let obj: ComplexObject = record.clone().into();
        let restored = InformationRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn round_trips_with_metadata_and_tags() {
        let mut record = InformationRecord::new(InformationMessageData::String("tagged".to_string()));
        record.tags = Some(vec!["a".to_string(), "b".to_string()]);
        record.user = Some("alice".to_string());
        record.process_id = Some(4242);
        let obj: ComplexObject = record.clone().into();
        let restored = InformationRecord::try_from(&obj).unwrap();
        assert_eq!(record, restored);
    }
}
