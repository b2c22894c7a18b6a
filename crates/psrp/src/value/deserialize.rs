use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine;
use indexmap::IndexMap;
use psrp_xml::parser::Node;

use crate::{PsrpError, Result};

use super::serialize::unescape_string;
use super::{
    ComplexObject, ComplexObjectContent, Container, PsEnum, PsPrimitiveValue, PsProperty, PsType,
    PsValue,
};

/// Tracks, across one document, which `RefId`s have been assigned to which
/// objects and which `TN`/`TNRef` ids map to which type-name stacks, so a
/// later `<Ref RefId="N">`/`<TNRef RefId="M">` resolves to the same data
/// (and, for `Ref`, the same `Rc` identity) seen earlier in the document.
#[derive(Default)]
pub struct DeserializationContext {
    type_refs: HashMap<u32, PsType>,
    object_refs: HashMap<u32, Rc<RefCell<ComplexObject>>>,
    /// The session key `<SS>` elements are decrypted with. `None` before
    /// key exchange completes, in which case deserializing a `SecureString`
    /// fails with [`PsrpError::MissingCipher`].
    cipher: Option<[u8; 32]>,
}

impl DeserializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cipher(cipher: [u8; 32]) -> Self {
        Self {
            cipher: Some(cipher),
            ..Self::default()
        }
    }
}

fn local_tag<'a>(node: &Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Deserializes a single CLIXML value node (a primitive leaf or an `Obj`).
pub fn deserialize_value(ctx: &mut DeserializationContext, node: Node<'_, '_>) -> Result<PsValue> {
    let tag = local_tag(&node);
    match tag {
        "Obj" => deserialize_complex_object(ctx, node),
        "Ref" => {
            let ref_id = ref_id_attr(&node)?;
            let shared = ctx
                .object_refs
                .get(&ref_id)
                .ok_or_else(|| {
                    PsrpError::MalformedClixml(format!("Ref to unknown RefId {ref_id}"))
                })?
                .clone();
            Ok(PsValue::Shared(shared))
        }
        _ => Ok(PsValue::Primitive(deserialize_primitive(ctx, tag, node)?)),
    }
}

fn ref_id_attr(node: &Node<'_, '_>) -> Result<u32> {
    node.attribute("RefId")
        .ok_or_else(|| PsrpError::MalformedClixml(format!("<{}> missing RefId", local_tag(node))))?
        .parse::<u32>()
        .map_err(|_| PsrpError::MalformedClixml("RefId is not a valid integer".to_string()))
}

fn deserialize_primitive(
    ctx: &DeserializationContext,
    tag: &str,
    node: Node<'_, '_>,
) -> Result<PsPrimitiveValue> {
    let text = node.text().unwrap_or("");
    Ok(match tag {
        "S" => PsPrimitiveValue::Str(unescape_string(text)),
        "C" => PsPrimitiveValue::Char(parse_int(text)?),
        "B" => PsPrimitiveValue::Bool(parse_bool(text)?),
        "SB" => PsPrimitiveValue::SByte(parse_int(text)?),
        "By" => PsPrimitiveValue::Byte(parse_int(text)?),
        "I16" => PsPrimitiveValue::I16(parse_int(text)?),
        "U16" => PsPrimitiveValue::U16(parse_int(text)?),
        "I32" => PsPrimitiveValue::I32(parse_int(text)?),
        "U32" => PsPrimitiveValue::U32(parse_int(text)?),
        "I64" => PsPrimitiveValue::I64(parse_int(text)?),
        "U64" => PsPrimitiveValue::U64(parse_int(text)?),
        "Sg" => PsPrimitiveValue::Single(parse_float(text)?),
        "Db" => PsPrimitiveValue::Double(parse_float(text)?),
        "D" => PsPrimitiveValue::Decimal(text.to_string()),
        "G" => PsPrimitiveValue::Guid(text.to_string()),
        "Nil" => PsPrimitiveValue::Nil,
        "BA" => PsPrimitiveValue::ByteArray(
            base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|e| PsrpError::MalformedClixml(format!("invalid base64 in <BA>: {e}")))?,
        ),
        "Version" => PsPrimitiveValue::Version(text.to_string()),
        "DT" => PsPrimitiveValue::DateTime(text.to_string()),
        "TS" => PsPrimitiveValue::Duration(text.to_string()),
        "URI" => PsPrimitiveValue::Uri(unescape_string(text)),
        "XD" => PsPrimitiveValue::XmlDocument(unescape_string(text)),
        "SBK" => PsPrimitiveValue::ScriptBlock(unescape_string(text)),
        "SS" => {
            let cipher = ctx.cipher.ok_or(PsrpError::MissingCipher)?;
            let ciphertext = base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|e| PsrpError::MalformedClixml(format!("invalid base64 in <SS>: {e}")))?;
            let plaintext = crate::crypto::decrypt_secure_string(&cipher, &ciphertext)?;
            PsPrimitiveValue::SecureString(crate::crypto::utf16le_decode(&plaintext)?)
        }
        other => {
            return Err(PsrpError::MalformedClixml(format!(
                "unrecognized CLIXML element <{other}>"
            )));
        }
    })
}

fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(PsrpError::MalformedClixml(format!(
            "invalid <B> value: {other}"
        ))),
    }
}

fn parse_int<T: std::str::FromStr>(text: &str) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| PsrpError::MalformedClixml(format!("invalid integer literal: {text}")))
}

fn parse_float<T: std::str::FromStr>(text: &str) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| PsrpError::MalformedClixml(format!("invalid floating point literal: {text}")))
}

/// Deserializes `<Obj RefId="N">`, allocating its `Rc<RefCell<ComplexObject>>`
/// slot and registering it in `object_refs` *before* descending into
/// children, so a nested `<Ref RefId="N">` resolves to this (possibly
/// still-being-built) object.
fn deserialize_complex_object(ctx: &mut DeserializationContext, node: Node<'_, '_>) -> Result<PsValue> {
    let ref_id = ref_id_attr(&node)?;
    let shared = Rc::new(RefCell::new(ComplexObject::default()));
    ctx.object_refs.insert(ref_id, shared.clone());

    let mut type_def = None;
    let mut content = ComplexObjectContent::Standard;
    let mut adapted_properties = IndexMap::new();
    let mut extended_properties = IndexMap::new();
    let mut to_string = None;

    for child in node.children() {
        match local_tag(&child) {
            "TN" => {
                let tn_ref_id = ref_id_attr(&child)?;
                let names = child
                    .children()
                    .filter(|n| local_tag(n) == "T")
                    .map(|n| std::borrow::Cow::Owned(n.text().unwrap_or_default().to_string()))
                    .collect();
                let parsed = PsType::new(names);
                ctx.type_refs.insert(tn_ref_id, parsed.clone());
                type_def = Some(parsed);
            }
            "TNRef" => {
                let tn_ref_id = ref_id_attr(&child)?;
                type_def = Some(ctx.type_refs.get(&tn_ref_id).cloned().ok_or_else(|| {
                    PsrpError::MalformedClixml(format!("TNRef to unknown RefId {tn_ref_id}"))
                })?);
            }
            "Props" => {
                for prop_node in child.children() {
                    let prop = deserialize_property(ctx, prop_node)?;
                    adapted_properties.insert(prop.name.clone(), prop);
                }
            }
            "MS" => {
                for prop_node in child.children() {
                    let prop = deserialize_property(ctx, prop_node)?;
                    extended_properties.insert(prop.name.clone(), prop);
                }
            }
            "ToString" => {
                to_string = Some(unescape_string(child.text().unwrap_or_default()));
            }
            "LST" | "IE" => {
                content = ComplexObjectContent::Container(Container::List(
                    deserialize_items(ctx, child)?,
                ));
            }
            "STK" => {
                content = ComplexObjectContent::Container(Container::Stack(
                    deserialize_items(ctx, child)?,
                ));
            }
            "QUE" => {
                content = ComplexObjectContent::Container(Container::Queue(
                    deserialize_items(ctx, child)?,
                ));
            }
            "DCT" => {
                let mut entries = IndexMap::new();
                for entry in child.children() {
                    if local_tag(&entry) != "En" {
                        continue;
                    }
                    let mut key = None;
                    let mut value = None;
                    for kv in entry.children() {
                        match kv.attribute("N") {
                            Some("Key") => key = Some(deserialize_value(ctx, kv)?),
                            Some("Value") => value = Some(deserialize_value(ctx, kv)?),
                            _ => {}
                        }
                    }
                    let (Some(key), Some(value)) = (key, value) else {
                        return Err(PsrpError::MalformedClixml(
                            "<En> missing Key or Value".to_string(),
                        ));
                    };
                    entries.insert(key, value);
                }
                content = ComplexObjectContent::Container(Container::Dictionary(entries));
            }
            // Primitive leaf directly under Obj (e.g. an enum's underlying I32).
            _ if type_def.is_some() && matches!(content, ComplexObjectContent::Standard) => {
                let primitive = deserialize_primitive(ctx, local_tag(&child), child)?;
                let value = match primitive {
                    PsPrimitiveValue::I32(v) => v,
                    other => {
                        return Err(PsrpError::MalformedClixml(format!(
                            "enum leaf under <Obj> was not an I32: {other:?}"
                        )));
                    }
                };
                content = ComplexObjectContent::EnumValue(PsEnum { value });
            }
            _ => {}
        }
    }

    // Rehydration: unregistered type names are prefixed `Deserialized.`.
    // This crate registers no rehydrators of its own (PSRP leaves that to
    // the host application), so every typed object stays generic, matching
    // spec §4.4's "no match found" branch.
    if let Some(t) = &type_def {
        type_def = Some(t.clone().into_deserialized());
    }

    *shared.borrow_mut() = ComplexObject {
        type_def,
        to_string,
        content,
        adapted_properties,
        extended_properties,
    };

    // `shared` plus the `object_refs` entry account for a strong count of 2
    // when nothing pointed back at this RefId while we built it; anything
    // above that means some descendant (a cycle, or just shared structure)
    // holds a `Ref` to this exact object, so its identity must survive the
    // return — handing back a fresh clone would sever that, breaking
    // `obj.self is obj`-style round trips.
    if Rc::strong_count(&shared) > 2 {
        Ok(PsValue::Shared(shared))
    } else {
        ctx.object_refs.remove(&ref_id);
        Ok(PsValue::Object(Rc::try_unwrap(shared).unwrap().into_inner()))
    }
}

fn deserialize_items(ctx: &mut DeserializationContext, node: Node<'_, '_>) -> Result<Vec<PsValue>> {
    node.children().map(|n| deserialize_value(ctx, n)).collect()
}

fn deserialize_property(ctx: &mut DeserializationContext, node: Node<'_, '_>) -> Result<PsProperty> {
    let name = node
        .attribute("N")
        .ok_or_else(|| PsrpError::MalformedClixml("property element missing N attribute".to_string()))?
        .to_string();
    let value = deserialize_value(ctx, node)?;
    Ok(PsProperty { name, value })
}
