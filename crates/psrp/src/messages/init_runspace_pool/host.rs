use indexmap::IndexMap;

use crate::value::{ComplexObject, ComplexObjectContent, Container, PsPrimitiveValue, PsType, PsValue};
use crate::{PsrpError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// The `_hostDefaultData` dictionary carried by `HostInfo` (MS-PSRP
/// §2.2.3.14): a fixed 12-entry `Hashtable` keyed by small integers, each
/// value tagged with its .NET type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDefaultData {
    pub foreground_color: i32,
    pub background_color: i32,
    pub cursor_position: Coordinates,
    pub window_position: Coordinates,
    pub cursor_size: i32,
    pub buffer_size: Size,
    pub window_size: Size,
    pub max_window_size: Size,
    pub max_physical_window_size: Size,
    pub window_title: String,
    pub locale: String,
    pub ui_locale: String,
}

impl Default for HostDefaultData {
    fn default() -> Self {
        Self {
            foreground_color: 7,
            background_color: 0,
            cursor_position: Coordinates::default(),
            window_position: Coordinates::default(),
            cursor_size: 25,
            buffer_size: Size { width: 120, height: 3000 },
            window_size: Size { width: 120, height: 50 },
            max_window_size: Size { width: 120, height: 50 },
            max_physical_window_size: Size { width: 120, height: 50 },
            window_title: "PowerShell".to_string(),
            locale: "en-US".to_string(),
            ui_locale: "en-US".to_string(),
        }
    }
}

fn wrap(type_name: &str, value: PsValue) -> PsValue {
    PsValue::Object(
        ComplexObject::standard()
            .with_extended("T", type_name)
            .with_extended("V", value),
    )
}

fn coordinates_object(c: Coordinates) -> PsValue {
    PsValue::Object(
        ComplexObject::standard()
            .with_extended("x", c.x)
            .with_extended("y", c.y),
    )
}

fn size_object(s: Size) -> PsValue {
    PsValue::Object(
        ComplexObject::standard()
            .with_extended("width", s.width)
            .with_extended("height", s.height),
    )
}

fn unwrap_i32(dict: &IndexMap<PsValue, PsValue>, key: i32, field: &str) -> Result<i32> {
    let wrapper = dict
        .get(&PsValue::from(key))
        .and_then(PsValue::as_object)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("missing HostDefaultData field {field}")))?;
    wrapper
        .require_extended("V")?
        .as_i32()
        .ok_or_else(|| PsrpError::InvalidMessage(format!("HostDefaultData field {field} is not an I32")))
}

fn unwrap_string(dict: &IndexMap<PsValue, PsValue>, key: i32, field: &str) -> Result<String> {
    let wrapper = dict
        .get(&PsValue::from(key))
        .and_then(PsValue::as_object)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("missing HostDefaultData field {field}")))?;
    wrapper
        .require_extended("V")?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("HostDefaultData field {field} is not a String")))
}

fn unwrap_coordinates(dict: &IndexMap<PsValue, PsValue>, key: i32, field: &str) -> Result<Coordinates> {
    let wrapper = dict
        .get(&PsValue::from(key))
        .and_then(PsValue::as_object)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("missing HostDefaultData field {field}")))?;
    let obj = wrapper
        .require_extended("V")?
        .as_object()
        .ok_or_else(|| PsrpError::InvalidMessage(format!("HostDefaultData field {field} is not an Object")))?;
    Ok(Coordinates {
        x: obj.require_extended("x")?.as_i32().unwrap_or_default(),
        y: obj.require_extended("y")?.as_i32().unwrap_or_default(),
    })
}

fn unwrap_size(dict: &IndexMap<PsValue, PsValue>, key: i32, field: &str) -> Result<Size> {
    let wrapper = dict
        .get(&PsValue::from(key))
        .and_then(PsValue::as_object)
        .ok_or_else(|| PsrpError::InvalidMessage(format!("missing HostDefaultData field {field}")))?;
    let obj = wrapper
        .require_extended("V")?
        .as_object()
        .ok_or_else(|| PsrpError::InvalidMessage(format!("HostDefaultData field {field} is not an Object")))?;
    Ok(Size {
        width: obj.require_extended("width")?.as_i32().unwrap_or_default(),
        height: obj.require_extended("height")?.as_i32().unwrap_or_default(),
    })
}

impl HostDefaultData {
    fn to_dictionary(&self) -> IndexMap<PsValue, PsValue> {
        let mut map = IndexMap::new();
        map.insert(PsValue::from(0), wrap("System.ConsoleColor", PsValue::from(self.foreground_color)));
        map.insert(PsValue::from(1), wrap("System.ConsoleColor", PsValue::from(self.background_color)));
        map.insert(PsValue::from(2), wrap("System.Management.Automation.Host.Coordinates", coordinates_object(self.cursor_position)));
        map.insert(PsValue::from(3), wrap("System.Management.Automation.Host.Coordinates", coordinates_object(self.window_position)));
        map.insert(PsValue::from(4), wrap("System.Int32", PsValue::from(self.cursor_size)));
        map.insert(PsValue::from(5), wrap("System.Management.Automation.Host.Size", size_object(self.buffer_size)));
        map.insert(PsValue::from(6), wrap("System.Management.Automation.Host.Size", size_object(self.window_size)));
        map.insert(PsValue::from(7), wrap("System.Management.Automation.Host.Size", size_object(self.max_window_size)));
        map.insert(PsValue::from(8), wrap("System.Management.Automation.Host.Size", size_object(self.max_physical_window_size)));
        map.insert(PsValue::from(9), wrap("System.String", PsValue::from(self.window_title.as_str())));
        map.insert(PsValue::from(10), wrap("System.String", PsValue::from(self.locale.as_str())));
        map.insert(PsValue::from(11), wrap("System.String", PsValue::from(self.ui_locale.as_str())));
        map
    }

    fn from_dictionary(dict: &IndexMap<PsValue, PsValue>) -> Result<Self> {
        Ok(Self {
            foreground_color: unwrap_i32(dict, 0, "foreground_color")?,
            background_color: unwrap_i32(dict, 1, "background_color")?,
            cursor_position: unwrap_coordinates(dict, 2, "cursor_position")?,
            window_position: unwrap_coordinates(dict, 3, "window_position")?,
            cursor_size: unwrap_i32(dict, 4, "cursor_size")?,
            buffer_size: unwrap_size(dict, 5, "buffer_size")?,
            window_size: unwrap_size(dict, 6, "window_size")?,
            max_window_size: unwrap_size(dict, 7, "max_window_size")?,
            max_physical_window_size: unwrap_size(dict, 8, "max_physical_window_size")?,
            window_title: unwrap_string(dict, 9, "window_title")?,
            locale: unwrap_string(dict, 10, "locale")?,
            ui_locale: unwrap_string(dict, 11, "ui_locale")?,
        })
    }
}

/// `System.Management.Automation.Remoting.RemoteHostUserInterface`'s wire
/// shape, sent to the server inside `InitRunspacePool`/`CreatePipeline` so
/// it knows whether (and how) to route host calls back to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub is_host_null: bool,
    pub is_host_ui_null: bool,
    pub is_host_raw_ui_null: bool,
    pub use_runspace_host: bool,
    pub host_default_data: Option<HostDefaultData>,
}

impl HostInfo {
    /// A host that answers every call itself (the common client posture).
    pub fn enabled(host_default_data: HostDefaultData) -> Self {
        Self {
            is_host_null: false,
            is_host_ui_null: false,
            is_host_raw_ui_null: false,
            use_runspace_host: false,
            host_default_data: Some(host_default_data),
        }
    }

    /// No host at all: every `PipelineHostCall` the server sends back goes
    /// unanswered.
    pub fn null() -> Self {
        Self {
            is_host_null: true,
            is_host_ui_null: true,
            is_host_raw_ui_null: true,
            use_runspace_host: true,
            host_default_data: None,
        }
    }

    pub fn to_ps_object(&self) -> ComplexObject {
        let mut obj = ComplexObject::standard()
            .with_extended("_isHostNull", self.is_host_null)
            .with_extended("_isHostUINull", self.is_host_ui_null)
            .with_extended("_isHostRawUINull", self.is_host_raw_ui_null)
            .with_extended("_useRunspaceHost", self.use_runspace_host);

        let data_value = match &self.host_default_data {
            Some(data) => PsValue::Object(ComplexObject {
                type_def: Some(PsType::hashtable()),
                content: ComplexObjectContent::Container(Container::Dictionary(data.to_dictionary())),
                ..ComplexObject::standard()
            }),
            None => PsValue::nil(),
        };
        obj = obj.with_extended(
            "_hostDefaultData",
            PsValue::Object(ComplexObject::standard().with_extended("data", data_value)),
        );
        obj
    }

    pub fn from_ps_object(obj: &ComplexObject) -> Result<Self> {
        let is_host_null = obj.require_extended("_isHostNull")?.as_bool().unwrap_or(true);
        let is_host_ui_null = obj.require_extended("_isHostUINull")?.as_bool().unwrap_or(true);
        let is_host_raw_ui_null = obj.require_extended("_isHostRawUINull")?.as_bool().unwrap_or(true);
        let use_runspace_host = obj.require_extended("_useRunspaceHost")?.as_bool().unwrap_or(false);

        let default_data_wrapper = obj.require_extended("_hostDefaultData")?;
        let data_value = default_data_wrapper
            .as_object()
            .and_then(|o| o.get_extended("data"))
            .ok_or_else(|| PsrpError::InvalidMessage("missing _hostDefaultData.data".to_string()))?;

        let host_default_data = match data_value {
            PsValue::Primitive(PsPrimitiveValue::Nil) => None,
            PsValue::Object(data_obj) => match &data_obj.content {
                ComplexObjectContent::Container(Container::Dictionary(dict)) => {
                    Some(HostDefaultData::from_dictionary(dict)?)
                }
                _ => {
                    return Err(PsrpError::InvalidMessage(
                        "_hostDefaultData.data is not a Dictionary".to_string(),
                    ));
                }
            },
            _ => return Err(PsrpError::InvalidMessage("_hostDefaultData.data is malformed".to_string())),
        };

        Ok(Self {
            is_host_null,
            is_host_ui_null,
            is_host_raw_ui_null,
            use_runspace_host,
            host_default_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_info_enabled_round_trips() {
        let info = HostInfo::enabled(HostDefaultData::default());
        let obj = info.to_ps_object();
        let restored = HostInfo::from_ps_object(&obj).unwrap();
        assert_eq!(info, restored);
    }

    #[test]
    fn host_info_null_round_trips() {
        let info = HostInfo::null();
        let obj = info.to_ps_object();
        let restored = HostInfo::from_ps_object(&obj).unwrap();
        assert_eq!(info, restored);
        assert!(restored.host_default_data.is_none());
    }
}
