use crate::envelope::ProtocolVersion;
use crate::messages::command::Command;
use crate::value::{ComplexObject, ComplexObjectContent, Container, PsValue};
use crate::{PsrpError, Result};

fn commands_to_ps_value(commands: &[Command], peer_version: ProtocolVersion) -> PsValue {
    PsValue::Object(ComplexObject {
        content: ComplexObjectContent::Container(Container::List(
            commands
                .iter()
                .map(|c| PsValue::Object(c.to_complex_object(peer_version)))
                .collect(),
        )),
        ..ComplexObject::standard()
    })
}

fn commands_from_ps_value(value: &PsValue) -> Result<Vec<Command>> {
    let obj = value
        .as_object()
        .ok_or_else(|| PsrpError::InvalidMessage("command list is not an Object".to_string()))?;
    let ComplexObjectContent::Container(Container::List(items)) = &obj.content else {
        return Err(PsrpError::InvalidMessage("command list is not a List".to_string()));
    };
    items
        .iter()
        .map(|v| {
            v.as_object()
                .ok_or_else(|| PsrpError::InvalidMessage("command entry is not an Object".to_string()))
                .and_then(Command::from_complex_object)
        })
        .collect()
}

/// The `PowerShell` object nested inside `CreatePipeline` (MS-PSRP
/// §2.2.3.8): the command chain to run, plus any subsequent chains queued
/// on the same runspace via `AddStatement`/`Invoke` reuse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PowerShellPipeline {
    pub is_nested: bool,
    pub commands: Vec<Command>,
    pub extra_commands: Vec<Vec<Command>>,
    pub history: Option<String>,
    pub redirect_shell_error_output_pipe: bool,
}

impl PowerShellPipeline {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            is_nested: false,
            commands,
            extra_commands: Vec::new(),
            history: None,
            redirect_shell_error_output_pipe: true,
        }
    }

    pub fn to_complex_object(&self, peer_version: ProtocolVersion) -> ComplexObject {
        let extra_cmds = PsValue::Object(ComplexObject {
            content: ComplexObjectContent::Container(Container::List(
                self.extra_commands
                    .iter()
                    .map(|chain| commands_to_ps_value(chain, peer_version))
                    .collect(),
            )),
            ..ComplexObject::standard()
        });

        ComplexObject::standard()
            .with_extended("IsNested", self.is_nested)
            .with_extended("Cmds", commands_to_ps_value(&self.commands, peer_version))
            .with_extended("ExtraCmds", extra_cmds)
            .with_extended(
                "History",
                self.history.clone().map_or(PsValue::nil(), |h| PsValue::from(h.as_str())),
            )
            .with_extended(
                "RedirectShellErrorOutputPipe",
                self.redirect_shell_error_output_pipe,
            )
    }

    pub fn from_complex_object(value: &ComplexObject) -> Result<Self> {
        let is_nested = value
            .require_extended("IsNested")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("IsNested is not a bool".to_string()))?;
        let commands = commands_from_ps_value(value.require_extended("Cmds")?)?;

        let extra_obj = value
            .require_extended("ExtraCmds")?
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("ExtraCmds is not an Object".to_string()))?;
        let extra_commands = match &extra_obj.content {
            ComplexObjectContent::Container(Container::List(chains)) => chains
                .iter()
                .map(commands_from_ps_value)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let history = value.get_extended("History").and_then(PsValue::as_str).map(str::to_string);
        let redirect_shell_error_output_pipe = value
            .require_extended("RedirectShellErrorOutputPipe")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("RedirectShellErrorOutputPipe is not a bool".to_string()))?;

        Ok(Self {
            is_nested,
            commands,
            extra_commands,
            history,
            redirect_shell_error_output_pipe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let pipeline = PowerShellPipeline::new(vec![Command::new("Get-Process")]);
        let obj = pipeline.to_complex_object(ProtocolVersion::CURRENT);
        let restored = PowerShellPipeline::from_complex_object(&obj).unwrap();
        assert_eq!(pipeline, restored);
    }

    #[test]
    fn round_trips_with_extra_commands() {
        let mut pipeline = PowerShellPipeline::new(vec![Command::new("Get-Process")]);
        pipeline.extra_commands = vec![vec![Command::new("Get-Service")]];
        let obj = pipeline.to_complex_object(ProtocolVersion::CURRENT);
        let restored = PowerShellPipeline::from_complex_object(&obj).unwrap();
        assert_eq!(pipeline, restored);
    }
}
