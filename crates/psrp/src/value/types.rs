use std::borrow::Cow;
use std::hash;

/// An ordered type-name stack, most-derived first.
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/2784bd9c-267d-4297-b603-722c727f85f1>
#[derive(Debug, Clone, Eq, Default)]
pub struct PsType {
    pub type_names: Vec<Cow<'static, str>>,
}

impl PsType {
    pub fn new(type_names: Vec<Cow<'static, str>>) -> Self {
        Self { type_names }
    }

    pub fn ps_primitive_dictionary() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.PSPrimitiveDictionary"),
                Cow::Borrowed("System.Collections.Hashtable"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn hashtable() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Collections.Hashtable"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn remote_host_method_id() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.Remoting.RemoteHostMethodId"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn array_list() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Collections.ArrayList"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn pipeline_result_types() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.Runspaces.PipelineResultTypes"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn apartment_state() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.Runspaces.ApartmentState"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn ps_thread_options() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.Runspaces.PSThreadOptions"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn error_record() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.ErrorRecord"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn progress_record() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.ProgressRecord"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    pub fn information_record() -> Self {
        Self {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.InformationRecord"),
                Cow::Borrowed("System.Object"),
            ],
        }
    }

    /// When no registered rehydrator matches, all type names are prefixed
    /// `Deserialized.` per spec §4.4.
    #[must_use]
    pub fn into_deserialized(self) -> Self {
        Self {
            type_names: self
                .type_names
                .into_iter()
                .map(|name| Cow::Owned(format!("Deserialized.{name}")))
                .collect(),
        }
    }
}

/// Equality and hashing compare only the zipped common prefix of the two
/// type-name stacks, so `["Deserialized.Foo", "Object"]` still compares
/// equal to `["Foo", "Object"]` when matching against a shorter reference
/// stack elsewhere in the object graph.
impl PartialEq for PsType {
    fn eq(&self, other: &Self) -> bool {
        for (ty1, ty2) in self.type_names.iter().zip(other.type_names.iter()) {
            if ty1.as_ref() != ty2.as_ref() {
                return false;
            }
        }
        true
    }
}

impl hash::Hash for PsType {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for ty in &self.type_names {
            ty.hash(state);
        }
    }
}
