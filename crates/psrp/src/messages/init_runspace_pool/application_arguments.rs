use indexmap::IndexMap;

use crate::value::{ComplexObject, ComplexObjectContent, Container, PsPrimitiveValue, PsType, PsValue};
use crate::{PsrpError, Result};

/// `$PSVersionTable`, sent by the client inside `ApplicationArguments` so
/// the server can see what it's talking to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsVersionTable {
    pub ps_semantic_version: String,
    pub ps_remoting_protocol_version: String,
    pub ps_compatible_versions: Vec<String>,
    pub wsman_stack_version: String,
    pub serialization_version: String,
    pub os: String,
    pub ps_edition: String,
    pub ps_version: String,
    pub platform: String,
    pub git_commit_id: String,
}

fn entry(map: &mut IndexMap<PsValue, PsValue>, key: &str, value: PsValue) {
    map.insert(PsValue::from(key), value);
}

fn string_list(values: &[String]) -> PsValue {
    PsValue::from_list(values.iter().map(|v| PsValue::from(v.as_str())).collect())
}

fn get_str(dict: &IndexMap<PsValue, PsValue>, key: &str) -> Result<String> {
    dict.get(&PsValue::from(key))
        .and_then(PsValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("PSVersionTable missing key {key}")))
}

fn get_string_list(dict: &IndexMap<PsValue, PsValue>, key: &str) -> Result<Vec<String>> {
    let value = dict
        .get(&PsValue::from(key))
        .ok_or_else(|| PsrpError::InvalidMessage(format!("PSVersionTable missing key {key}")))?;
    let PsValue::Object(obj) = value else {
        return Err(PsrpError::InvalidMessage(format!("PSVersionTable key {key} is not a list")));
    };
    let ComplexObjectContent::Container(Container::List(items)) = &obj.content else {
        return Err(PsrpError::InvalidMessage(format!("PSVersionTable key {key} is not a list")));
    };
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| PsrpError::InvalidMessage(format!("PSVersionTable key {key} has a non-string entry")))
        })
        .collect()
}

impl PsVersionTable {
    pub fn to_dictionary(&self) -> IndexMap<PsValue, PsValue> {
        let mut map = IndexMap::new();
        entry(&mut map, "PSVersion", PsValue::from(self.ps_semantic_version.as_str()));
        entry(
            &mut map,
            "PSRemotingProtocolVersion",
            PsValue::from(self.ps_remoting_protocol_version.as_str()),
        );
        entry(&mut map, "PSCompatibleVersions", string_list(&self.ps_compatible_versions));
        entry(&mut map, "WSManStackVersion", PsValue::from(self.wsman_stack_version.as_str()));
        entry(&mut map, "SerializationVersion", PsValue::from(self.serialization_version.as_str()));
        entry(&mut map, "OS", PsValue::from(self.os.as_str()));
        entry(&mut map, "PSEdition", PsValue::from(self.ps_edition.as_str()));
        entry(&mut map, "PSVersionString", PsValue::from(self.ps_version.as_str()));
        entry(&mut map, "Platform", PsValue::from(self.platform.as_str()));
        entry(&mut map, "GitCommitId", PsValue::from(self.git_commit_id.as_str()));
        map
    }

    pub fn from_dictionary(dict: &IndexMap<PsValue, PsValue>) -> Result<Self> {
        Ok(Self {
            ps_semantic_version: get_str(dict, "PSVersion")?,
            ps_remoting_protocol_version: get_str(dict, "PSRemotingProtocolVersion")?,
            ps_compatible_versions: get_string_list(dict, "PSCompatibleVersions")?,
            wsman_stack_version: get_str(dict, "WSManStackVersion")?,
            serialization_version: get_str(dict, "SerializationVersion")?,
            os: get_str(dict, "OS")?,
            ps_edition: get_str(dict, "PSEdition")?,
            ps_version: get_str(dict, "PSVersionString")?,
            platform: get_str(dict, "Platform")?,
            git_commit_id: get_str(dict, "GitCommitId")?,
        })
    }

    fn to_ps_value(&self) -> PsValue {
        PsValue::Object(ComplexObject {
            type_def: Some(PsType::ps_primitive_dictionary()),
            content: ComplexObjectContent::Container(Container::Dictionary(self.to_dictionary())),
            ..ComplexObject::standard()
        })
    }
}

/// `$args` to `Invoke-Command`'s remote session setup, carried as a
/// `Hashtable` with an optional nested `PSVersionTable` plus whatever
/// arbitrary key/value pairs the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationArguments {
    pub ps_version_table: Option<PsVersionTable>,
    pub extra: IndexMap<String, PsValue>,
}

impl ApplicationArguments {
    pub fn is_empty(&self) -> bool {
        self.ps_version_table.is_none() && self.extra.is_empty()
    }

    pub fn to_ps_value(&self) -> PsValue {
        if self.is_empty() {
            return PsValue::nil();
        }
        let mut dict = IndexMap::new();
        if let Some(table) = &self.ps_version_table {
            entry(&mut dict, "PSVersionTable", table.to_ps_value());
        }
        for (key, value) in &self.extra {
            entry(&mut dict, key, value.clone());
        }
        PsValue::Object(ComplexObject {
            type_def: Some(PsType::hashtable()),
            content: ComplexObjectContent::Container(Container::Dictionary(dict)),
            ..ComplexObject::standard()
        })
    }

    pub fn from_ps_value(value: &PsValue) -> Result<Self> {
        if matches!(value, PsValue::Primitive(PsPrimitiveValue::Nil)) {
            return Ok(Self::default());
        }
        let PsValue::Object(obj) = value else {
            return Err(PsrpError::InvalidMessage("ApplicationArguments is not an Object".to_string()));
        };
        let ComplexObjectContent::Container(Container::Dictionary(dict)) = &obj.content else {
            return Err(PsrpError::InvalidMessage("ApplicationArguments is not a Dictionary".to_string()));
        };

        let mut ps_version_table = None;
        let mut extra = IndexMap::new();
        for (key, value) in dict {
            let Some(key) = key.as_str() else {
                return Err(PsrpError::InvalidMessage("ApplicationArguments key is not a string".to_string()));
            };
            if key == "PSVersionTable" {
                let PsValue::Object(table_obj) = value else {
                    return Err(PsrpError::InvalidMessage("PSVersionTable is not an Object".to_string()));
                };
                let ComplexObjectContent::Container(Container::Dictionary(table_dict)) = &table_obj.content else {
                    return Err(PsrpError::InvalidMessage("PSVersionTable is not a Dictionary".to_string()));
                };
                ps_version_table = Some(PsVersionTable::from_dictionary(table_dict)?);
            } else {
                extra.insert(key.to_string(), value.clone());
            }
        }

        Ok(Self { ps_version_table, extra })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> PsVersionTable {
        PsVersionTable {
            ps_semantic_version: "7.4.0".to_string(),
            ps_remoting_protocol_version: "2.3".to_string(),
            ps_compatible_versions: vec!["1.0".to_string(), "7.4.0".to_string()],
            wsman_stack_version: "3.0".to_string(),
            serialization_version: "1.1.0.1".to_string(),
            os: "Linux".to_string(),
            ps_edition: "Core".to_string(),
            ps_version: "7.4.0".to_string(),
            platform: "Unix".to_string(),
            git_commit_id: "7.4.0".to_string(),
        }
    }

    #[test]
    fn ps_version_table_round_trips() {
        let table = sample_table();
        let dict = table.to_dictionary();
        let restored = PsVersionTable::from_dictionary(&dict).unwrap();
        assert_eq!(table, restored);
    }

    #[test]
    fn empty_application_arguments_is_nil() {
        let args = ApplicationArguments::default();
        assert!(matches!(args.to_ps_value(), PsValue::Primitive(PsPrimitiveValue::Nil)));
        let restored = ApplicationArguments::from_ps_value(&args.to_ps_value()).unwrap();
        assert_eq!(args, restored);
    }

    #[test]
    fn application_arguments_round_trips_with_version_table_and_extras() {
        let mut extra = IndexMap::new();
        extra.insert("Foo".to_string(), PsValue::from("bar"));
        let args = ApplicationArguments {
            ps_version_table: Some(sample_table()),
            extra,
        };
        let value = args.to_ps_value();
        let restored = ApplicationArguments::from_ps_value(&value).unwrap();
        assert_eq!(args, restored);
    }
}
