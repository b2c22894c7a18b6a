use crate::envelope::ProtocolVersion;
use crate::messages::command_parameter::CommandParameter;
use crate::messages::init_runspace_pool::PipelineResultTypes;
use crate::value::{ComplexObject, ComplexObjectContent, Container, PsValue};
use crate::{PsrpError, Result};

/// One command in a `PowerShellPipeline`'s command chain (MS-PSRP
/// §2.2.3.7). `Get-Process | Select-Object Name` is two of these.
///
/// The `merge_*` fields route one stream into another (`2>&1`-style
/// redirection). `MergeError`/`MergeWarning`/`MergeVerbose`/`MergeDebug`
/// only serialize when the peer negotiated protocol >= 2.2;
/// `merge_information` only when it negotiated >= 2.3 -- older peers don't
/// know the property and choke on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub command_text: String,
    pub is_script: bool,
    pub use_local_scope: Option<bool>,
    pub parameters: Vec<CommandParameter>,
    pub merge_my_result: PipelineResultTypes,
    pub merge_to_result: PipelineResultTypes,
    pub merge_previous_results: PipelineResultTypes,
    pub merge_error: Option<PipelineResultTypes>,
    pub merge_warning: Option<PipelineResultTypes>,
    pub merge_verbose: Option<PipelineResultTypes>,
    pub merge_debug: Option<PipelineResultTypes>,
    pub merge_information: Option<PipelineResultTypes>,
}

impl Command {
    pub fn new(command_text: impl Into<String>) -> Self {
        Self {
            command_text: command_text.into(),
            is_script: false,
            use_local_scope: None,
            parameters: Vec::new(),
            merge_my_result: PipelineResultTypes::NONE,
            merge_to_result: PipelineResultTypes::NONE,
            merge_previous_results: PipelineResultTypes::NONE,
            merge_error: None,
            merge_warning: None,
            merge_verbose: None,
            merge_debug: None,
            merge_information: None,
        }
    }

    pub fn with_argument(mut self, value: impl Into<PsValue>) -> Self {
        self.parameters.push(CommandParameter {
            name: None,
            value: value.into(),
        });
        self
    }

    pub fn with_named_argument(mut self, name: impl Into<String>, value: impl Into<PsValue>) -> Self {
        self.parameters.push(CommandParameter {
            name: Some(name.into()),
            value: value.into(),
        });
        self
    }

    /// Redirects this command's error stream into `stream`, which must be
    /// `None`, `Output`, or `Null`; any other value fails with
    /// [`PsrpError::InvalidRedirection`].
    pub fn redirect_error(mut self, stream: PipelineResultTypes) -> Result<Self> {
        Self::require_redirection_target(stream)?;
        if stream == PipelineResultTypes::NONE {
            self.merge_my_result = PipelineResultTypes::NONE;
            self.merge_to_result = PipelineResultTypes::NONE;
        } else if stream != PipelineResultTypes::NULL {
            self.merge_my_result = PipelineResultTypes::ERROR;
            self.merge_to_result = stream;
        }
        self.merge_error = Some(stream);
        Ok(self)
    }

    pub fn redirect_warning(mut self, stream: PipelineResultTypes) -> Result<Self> {
        Self::require_redirection_target(stream)?;
        self.merge_warning = Some(stream);
        Ok(self)
    }

    pub fn redirect_verbose(mut self, stream: PipelineResultTypes) -> Result<Self> {
        Self::require_redirection_target(stream)?;
        self.merge_verbose = Some(stream);
        Ok(self)
    }

    pub fn redirect_debug(mut self, stream: PipelineResultTypes) -> Result<Self> {
        Self::require_redirection_target(stream)?;
        self.merge_debug = Some(stream);
        Ok(self)
    }

    pub fn redirect_information(mut self, stream: PipelineResultTypes) -> Result<Self> {
        Self::require_redirection_target(stream)?;
        self.merge_information = Some(stream);
        Ok(self)
    }

    /// Redirects every stream into `stream` at once (MS-PSRP's `2>&1 3>&1
    /// 4>&1 5>&1 6>&1`-equivalent shorthand).
    pub fn redirect_all(mut self, stream: PipelineResultTypes) -> Result<Self> {
        if stream == PipelineResultTypes::NONE {
            self.merge_my_result = stream;
            self.merge_to_result = stream;
        }
        self = self.redirect_error(stream)?;
        self = self.redirect_warning(stream)?;
        self = self.redirect_verbose(stream)?;
        self = self.redirect_debug(stream)?;
        self = self.redirect_information(stream)?;
        Ok(self)
    }

    fn require_redirection_target(stream: PipelineResultTypes) -> Result<()> {
        if stream.is_valid_redirection_target() {
            Ok(())
        } else {
            Err(PsrpError::InvalidRedirection)
        }
    }

    pub fn to_complex_object(&self, peer_version: ProtocolVersion) -> ComplexObject {
        let args = ComplexObject {
            content: ComplexObjectContent::Container(Container::List(
                self.parameters
                    .iter()
                    .cloned()
                    .map(|p| PsValue::Object(p.into()))
                    .collect(),
            )),
            ..ComplexObject::standard()
        };

        let mut obj = ComplexObject::standard()
            .with_extended("Cmd", self.command_text.as_str())
            .with_extended("IsScript", self.is_script)
            .with_extended(
                "UseLocalScope",
                self.use_local_scope.map_or(PsValue::nil(), PsValue::from),
            )
            .with_extended("MergeMyResult", self.merge_my_result.to_ps_value())
            .with_extended("MergeToResult", self.merge_to_result.to_ps_value())
            .with_extended(
                "MergePreviousResults",
                self.merge_previous_results.to_ps_value(),
            )
            .with_extended("Args", PsValue::Object(args));

        if peer_version >= ProtocolVersion::new(2, 2) {
            obj = obj
                .with_extended(
                    "MergeError",
                    self.merge_error.unwrap_or(PipelineResultTypes::NONE).to_ps_value(),
                )
                .with_extended(
                    "MergeWarning",
                    self.merge_warning.unwrap_or(PipelineResultTypes::NONE).to_ps_value(),
                )
                .with_extended(
                    "MergeVerbose",
                    self.merge_verbose.unwrap_or(PipelineResultTypes::NONE).to_ps_value(),
                )
                .with_extended(
                    "MergeDebug",
                    self.merge_debug.unwrap_or(PipelineResultTypes::NONE).to_ps_value(),
                );
        }
        if peer_version >= ProtocolVersion::new(2, 3) {
            obj = obj.with_extended(
                "MergeInformation",
                self.merge_information.unwrap_or(PipelineResultTypes::NONE).to_ps_value(),
            );
        }

        obj
    }

    pub fn from_complex_object(value: &ComplexObject) -> Result<Self> {
        let command_text = value
            .require_extended("Cmd")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("Cmd is not a string".to_string()))?
            .to_string();
        let is_script = value
            .require_extended("IsScript")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("IsScript is not a bool".to_string()))?;
        let use_local_scope = value.get_extended("UseLocalScope").and_then(PsValue::as_bool);

        let merge = |name: &str| -> Result<PipelineResultTypes> {
            let raw = value
                .require_extended(name)?
                .as_object()
                .and_then(ComplexObject::as_enum_value)
                .ok_or_else(|| PsrpError::InvalidMessage(format!("{name} is not an enum value")))?;
            Ok(PipelineResultTypes(raw))
        };
        let merge_optional = |name: &str| -> Result<Option<PipelineResultTypes>> {
            let Some(stream) = value
                .get_extended(name)
                .and_then(PsValue::as_object)
                .and_then(ComplexObject::as_enum_value)
                .map(PipelineResultTypes)
            else {
                return Ok(None);
            };
            Self::require_redirection_target(stream)?;
            Ok(Some(stream))
        };

        let args_obj = value
            .require_extended("Args")?
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("Args is not an Object".to_string()))?;
        let parameters = match &args_obj.content {
            ComplexObjectContent::Container(Container::List(items)) => items
                .iter()
                .map(|v| {
                    v.as_object()
                        .ok_or_else(|| PsrpError::InvalidMessage("Args entry is not an Object".to_string()))
                        .and_then(CommandParameter::try_from)
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            command_text,
            is_script,
            use_local_scope,
            parameters,
            merge_my_result: merge("MergeMyResult")?,
            merge_to_result: merge("MergeToResult")?,
            merge_previous_results: merge("MergePreviousResults")?,
            merge_error: merge_optional("MergeError")?,
            merge_warning: merge_optional("MergeWarning")?,
            merge_verbose: merge_optional("MergeVerbose")?,
            merge_debug: merge_optional("MergeDebug")?,
            merge_information: merge_optional("MergeInformation")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_current_protocol() {
        let cmd = Command::new("Get-Process")
            .with_named_argument("Name", "pwsh")
            .with_argument(42);
        let obj = cmd.to_complex_object(ProtocolVersion::CURRENT);
        let restored = Command::from_complex_object(&obj).unwrap();
        assert_eq!(cmd, restored);
    }

    #[test]
    fn elides_merge_fields_below_2_2() {
        let cmd = Command::new("Get-Process");
        let obj = cmd.to_complex_object(ProtocolVersion::new(2, 1));
        assert!(obj.get_extended("MergeError").is_none());
        assert!(obj.get_extended("MergeInformation").is_none());
    }

    #[test]
    fn elides_merge_information_below_2_3() {
        let cmd = Command::new("Get-Process");
        let obj = cmd.to_complex_object(ProtocolVersion::new(2, 2));
        assert!(obj.get_extended("MergeError").is_some());
        assert!(obj.get_extended("MergeInformation").is_none());
    }

    #[test]
    fn redirect_rejects_anything_but_none_output_or_null() {
        let cmd = Command::new("Get-Process");
        assert!(matches!(
            cmd.redirect_error(PipelineResultTypes::VERBOSE),
            Err(PsrpError::InvalidRedirection)
        ));
    }

    #[test]
    fn redirect_all_routes_every_stream_to_output() {
        let cmd = Command::new("Get-Process")
            .redirect_all(PipelineResultTypes::OUTPUT)
            .unwrap();
        assert_eq!(cmd.merge_my_result, PipelineResultTypes::ERROR);
        assert_eq!(cmd.merge_to_result, PipelineResultTypes::OUTPUT);
        assert_eq!(cmd.merge_error, Some(PipelineResultTypes::OUTPUT));
        assert_eq!(cmd.merge_warning, Some(PipelineResultTypes::OUTPUT));
        assert_eq!(cmd.merge_verbose, Some(PipelineResultTypes::OUTPUT));
        assert_eq!(cmd.merge_debug, Some(PipelineResultTypes::OUTPUT));
        assert_eq!(cmd.merge_information, Some(PipelineResultTypes::OUTPUT));
    }

    #[test]
    fn redirect_to_null_drops_the_stream() {
        let cmd = Command::new("Get-Process")
            .redirect_error(PipelineResultTypes::NULL)
            .unwrap();
        assert_eq!(cmd.merge_error, Some(PipelineResultTypes::NULL));
        // Null isn't a merge target, so MergeMyResult/MergeToResult stay unset.
        assert_eq!(cmd.merge_my_result, PipelineResultTypes::NONE);
        assert_eq!(cmd.merge_to_result, PipelineResultTypes::NONE);
    }

    #[test]
    fn deserialize_rejects_an_invalid_merge_target() {
        let obj = Command::new("Get-Process")
            .to_complex_object(ProtocolVersion::CURRENT)
            .with_extended("MergeError", PipelineResultTypes::VERBOSE.to_ps_value());
        assert!(matches!(
            Command::from_complex_object(&obj),
            Err(PsrpError::InvalidRedirection)
        ));
    }
}
