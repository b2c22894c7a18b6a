use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, ComplexObjectContent, Container, PsType, PsValue};
use crate::{PsrpError, Result};
use std::borrow::Cow;

/// `System.Management.Automation.CommandTypes`, a flags enum restricting a
/// `GetCommandMetadata` query to certain kinds of command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandTypes(pub i32);

impl CommandTypes {
    pub const ALIAS: Self = Self(1);
    pub const FUNCTION: Self = Self(2);
    pub const FILTER: Self = Self(4);
    pub const CMDLET: Self = Self(8);
    pub const EXTERNAL_SCRIPT: Self = Self(32);
    pub const APPLICATION: Self = Self(64);
    pub const SCRIPT: Self = Self(128);
    pub const WORKFLOW: Self = Self(256);
    pub const CONFIGURATION: Self = Self(512);
    pub const ALL: Self = Self(975);

    fn type_def() -> PsType {
        PsType::new(vec![
            Cow::Borrowed("System.Management.Automation.CommandTypes"),
            Cow::Borrowed("System.Enum"),
            Cow::Borrowed("System.ValueType"),
            Cow::Borrowed("System.Object"),
        ])
    }

    fn to_ps_value(self) -> PsValue {
        PsValue::from_enum(Self::type_def(), self.0.to_string(), self.0)
    }

    fn from_ps_value(value: &PsValue) -> Result<Self> {
        let flags = value
            .as_object()
            .and_then(ComplexObject::as_enum_value)
            .ok_or_else(|| PsrpError::InvalidMessage("CommandType is not an enum value".to_string()))?;
        Ok(Self(flags))
    }
}

/// Client-to-server command-discovery query, as issued by
/// `Get-Command`/tab completion over a remote session (MS-PSRP §2.2.2.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCommandMetadata {
    pub name: Vec<String>,
    pub command_type: CommandTypes,
    pub namespace: Vec<String>,
    pub argument_list: Vec<PsValue>,
}

impl GetCommandMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: vec![name.into()],
            command_type: CommandTypes::ALL,
            namespace: Vec::new(),
            argument_list: Vec::new(),
        }
    }
}

impl PsObjectWithType for GetCommandMetadata {
    fn message_type(&self) -> MessageType {
        MessageType::GetCommandMetadata
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<GetCommandMetadata> for ComplexObject {
    fn from(query: GetCommandMetadata) -> Self {
        ComplexObject::standard()
            .with_extended("Name", PsValue::from_string_list(query.name))
            .with_extended("CommandType", query.command_type.to_ps_value())
            .with_extended("Namespace", PsValue::from_string_list(query.namespace))
            .with_extended("ArgumentList", PsValue::from_list(query.argument_list))
    }
}

impl TryFrom<&ComplexObject> for GetCommandMetadata {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let string_list = |v: &PsValue| -> Result<Vec<String>> {
            let obj = v
                .as_object()
                .ok_or_else(|| PsrpError::InvalidMessage("expected a list Object".to_string()))?;
            let ComplexObjectContent::Container(Container::List(items)) = &obj.content else {
                return Err(PsrpError::InvalidMessage("expected a List".to_string()));
            };
            Ok(items.iter().filter_map(PsValue::as_str).map(str::to_string).collect())
        };

        let name = string_list(value.require_extended("Name")?)?;
        let command_type = CommandTypes::from_ps_value(value.require_extended("CommandType")?)?;
        let namespace = string_list(value.require_extended("Namespace")?)?;

        let args_obj = value
            .require_extended("ArgumentList")?
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("ArgumentList is not an Object".to_string()))?;
        let argument_list = match &args_obj.content {
            ComplexObjectContent::Container(Container::List(items)) => items.clone(),
            _ => Vec::new(),
        };

        Ok(Self {
            name,
            command_type,
            namespace,
            argument_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let query = GetCommandMetadata::new("Get-*");
        let obj: ComplexObject = query.clone().into();
        let restored = GetCommandMetadata::try_from(&obj).unwrap();
        assert_eq!(query, restored);
    }

    #[test]
    fn round_trips_with_namespace_and_args() {
        let query = GetCommandMetadata {
            name: vec!["Get-Foo".to_string()],
            command_type: CommandTypes::CMDLET,
            namespace: vec!["MyModule".to_string()],
            argument_list: vec![PsValue::from(1)],
        };
        let obj: ComplexObject = query.clone().into();
        let restored = GetCommandMetadata::try_from(&obj).unwrap();
        assert_eq!(query, restored);
    }
}
