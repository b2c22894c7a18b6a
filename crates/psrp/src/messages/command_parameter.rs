use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// One entry of a `Command`'s argument list: a named parameter
/// (`-Name value`) or a positional one (bare `value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParameter {
    pub name: Option<String>,
    pub value: PsValue,
}

impl From<CommandParameter> for ComplexObject {
    fn from(param: CommandParameter) -> Self {
        let mut obj = ComplexObject::standard().with_extended("V", param.value);
        obj = obj.with_extended("N", param.name.map_or(PsValue::nil(), |n| PsValue::from(n.as_str())));
        obj
    }
}

impl TryFrom<&ComplexObject> for CommandParameter {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let name = value
            .get_extended("N")
            .and_then(PsValue::as_str)
            .map(str::to_string);
        let param_value = value.require_extended("V")?.clone();
        Ok(Self {
            name,
            value: param_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_round_trips() {
        let param = CommandParameter {
            name: Some("Path".to_string()),
            value: PsValue::from("/tmp"),
        };
        let obj: ComplexObject = param.clone().into();
        let restored = CommandParameter::try_from(&obj).unwrap();
        assert_eq!(param, restored);
    }

    #[test]
    fn positional_round_trips() {
        let param = CommandParameter {
            name: None,
            value: PsValue::from(5),
        };
        let obj: ComplexObject = param.clone().into();
        let restored = CommandParameter::try_from(&obj).unwrap();
        assert_eq!(param, restored);
    }
}
