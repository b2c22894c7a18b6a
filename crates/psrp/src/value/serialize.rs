use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine;
use psrp_xml::builder::{Attribute, Element};

use crate::{PsrpError, Result};

use super::{ComplexObject, ComplexObjectContent, Container, PsPrimitiveValue, PsType, PsValue};

/// Tracks which object identities and which type-name stacks have already
/// been emitted, so repeats become `<Ref RefId>`/`<TNRef RefId>` instead of
/// being serialized again.
#[derive(Default)]
pub struct SerializationContext {
    next_ref_id: u32,
    /// Keyed by the `Rc` pointer address of a `PsValue::Shared` handle.
    object_ref_ids: HashMap<usize, u32>,
    next_tn_ref_id: u32,
    /// Keyed by the joined type-name stack.
    type_name_ref_ids: HashMap<Vec<String>, u32>,
    /// The session key `<SS>` elements are encrypted under. `None` before
    /// key exchange completes, in which case serializing a `SecureString`
    /// fails with [`PsrpError::MissingCipher`].
    cipher: Option<[u8; 32]>,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cipher(cipher: [u8; 32]) -> Self {
        Self {
            cipher: Some(cipher),
            ..Self::default()
        }
    }

    fn alloc_ref_id(&mut self) -> u32 {
        let id = self.next_ref_id;
        self.next_ref_id += 1;
        id
    }

    fn type_name_ref(&mut self, type_def: &PsType) -> (u32, bool) {
        let key: Vec<String> = type_def.type_names.iter().map(|c| c.to_string()).collect();
        if let Some(&id) = self.type_name_ref_ids.get(&key) {
            (id, false)
        } else {
            let id = self.next_tn_ref_id;
            self.next_tn_ref_id += 1;
            self.type_name_ref_ids.insert(key, id);
            (id, true)
        }
    }
}

/// Serializes a value to a standalone `Element`, named by `tag_name` (the
/// element name a caller should use, e.g. `"Obj"` at the document root, or
/// an `N="..."` attributed wrapper inside a property bag).
pub fn serialize_value(
    ctx: &mut SerializationContext,
    value: &PsValue,
    name_attr: Option<String>,
) -> Result<Element<'static>> {
    let element = match value {
        PsValue::Primitive(p) => serialize_primitive(ctx, p)?,
        PsValue::Object(obj) => serialize_complex_object(ctx, obj, None)?,
        PsValue::Shared(rc) => {
            let ptr = Rc::as_ptr(rc) as usize;
            if let Some(&ref_id) = ctx.object_ref_ids.get(&ptr) {
                Element::new("Ref").add_attribute(Attribute::new("RefId", ref_id.to_string()))
            } else {
                let ref_id = ctx.alloc_ref_id();
                ctx.object_ref_ids.insert(ptr, ref_id);
                let obj = rc.borrow();
                serialize_complex_object(ctx, &obj, Some(ref_id))?
            }
        }
    };
    Ok(match name_attr {
        Some(n) => element.add_attribute(Attribute::new("N", n)),
        None => element,
    })
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' {
            out.push_str("_x005F_");
        } else if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

pub fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '_' && bytes.get(i + 1) == Some(&'x') {
            if let Some(end) = bytes[i + 2..].iter().position(|&c| c == '_') {
                let hex: String = bytes[i + 2..i + 2 + end].iter().collect();
                if hex.len() == 4 {
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                            i += 2 + end + 1;
                            continue;
                        }
                    }
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn leaf(tag: &'static str, text: String) -> Element<'static> {
    Element::new(tag).set_text(text)
}

fn serialize_primitive(ctx: &SerializationContext, p: &PsPrimitiveValue) -> Result<Element<'static>> {
    Ok(match p {
        PsPrimitiveValue::Str(s) => leaf("S", escape_string(s)),
        PsPrimitiveValue::Char(c) => leaf("C", c.to_string()),
        PsPrimitiveValue::Bool(b) => leaf("B", b.to_string()),
        PsPrimitiveValue::SByte(i) => leaf("SB", i.to_string()),
        PsPrimitiveValue::Byte(u) => leaf("By", u.to_string()),
        PsPrimitiveValue::I16(i) => leaf("I16", i.to_string()),
        PsPrimitiveValue::U16(u) => leaf("U16", u.to_string()),
        PsPrimitiveValue::I32(i) => leaf("I32", i.to_string()),
        PsPrimitiveValue::U32(u) => leaf("U32", u.to_string()),
        PsPrimitiveValue::I64(i) => leaf("I64", i.to_string()),
        PsPrimitiveValue::U64(u) => leaf("U64", u.to_string()),
        PsPrimitiveValue::Single(v) => leaf("Sg", v.to_string()),
        PsPrimitiveValue::Double(v) => leaf("Db", v.to_string()),
        PsPrimitiveValue::Decimal(d) => leaf("D", d.clone()),
        PsPrimitiveValue::Guid(g) => leaf("G", g.clone()),
        PsPrimitiveValue::Nil => Element::new("Nil"),
        PsPrimitiveValue::ByteArray(bytes) => {
            leaf("BA", base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        PsPrimitiveValue::Version(v) => leaf("Version", v.clone()),
        PsPrimitiveValue::DateTime(d) => leaf("DT", d.clone()),
        PsPrimitiveValue::Duration(d) => leaf("TS", d.clone()),
        PsPrimitiveValue::Uri(u) => leaf("URI", escape_string(u)),
        PsPrimitiveValue::XmlDocument(x) => leaf("XD", escape_string(x)),
        PsPrimitiveValue::ScriptBlock(s) => leaf("SBK", escape_string(s)),
        PsPrimitiveValue::SecureString(plaintext) => {
            let cipher = ctx.cipher.ok_or(PsrpError::MissingCipher)?;
            let ciphertext = crate::crypto::encrypt_secure_string(
                &cipher,
                &crate::crypto::utf16le_encode(plaintext),
            )?;
            leaf("SS", base64::engine::general_purpose::STANDARD.encode(ciphertext))
        }
    })
}

fn serialize_complex_object(
    ctx: &mut SerializationContext,
    obj: &ComplexObject,
    forced_ref_id: Option<u32>,
) -> Result<Element<'static>> {
    let ref_id = forced_ref_id.unwrap_or_else(|| ctx.alloc_ref_id());
    let mut element =
        Element::new("Obj").add_attribute(Attribute::new("RefId", ref_id.to_string()));

    if let Some(type_def) = &obj.type_def {
        let (tn_ref_id, is_first) = ctx.type_name_ref(type_def);
        element = element.add_child(if is_first {
            let mut tn = Element::new("TN")
                .add_attribute(Attribute::new("RefId", tn_ref_id.to_string()));
            for name in &type_def.type_names {
                tn = tn.add_child(Element::new("T").set_text(name.to_string()));
            }
            tn
        } else {
            Element::new("TNRef").add_attribute(Attribute::new("RefId", tn_ref_id.to_string()))
        });
    }

    match &obj.content {
        ComplexObjectContent::Container(container) => {
            element = element.add_child(serialize_container(ctx, container)?);
        }
        ComplexObjectContent::EnumValue(e) => {
            element = element.add_child(serialize_primitive(ctx, &PsPrimitiveValue::I32(e.value))?);
        }
        ComplexObjectContent::Standard => {}
    }

    if !obj.adapted_properties.is_empty() {
        let mut props = Element::new("Props");
        for prop in obj.adapted_properties.values() {
            props = props.add_child(serialize_value(ctx, &prop.value, Some(prop.name.clone()))?);
        }
        element = element.add_child(props);
    }

    if !obj.extended_properties.is_empty() {
        let mut ms = Element::new("MS");
        for prop in obj.extended_properties.values() {
            ms = ms.add_child(serialize_value(ctx, &prop.value, Some(prop.name.clone()))?);
        }
        element = element.add_child(ms);
    }

    if let Some(to_string) = &obj.to_string {
        element = element.add_child(Element::new("ToString").set_text(escape_string(to_string)));
    }

    Ok(element)
}

fn serialize_container(
    ctx: &mut SerializationContext,
    container: &Container,
) -> Result<Element<'static>> {
    Ok(match container {
        Container::Stack(items) => {
            let mut el = Element::new("STK");
            for item in items {
                el = el.add_child(serialize_value(ctx, item, None)?);
            }
            el
        }
        Container::Queue(items) => {
            let mut el = Element::new("QUE");
            for item in items {
                el = el.add_child(serialize_value(ctx, item, None)?);
            }
            el
        }
        Container::List(items) => {
            let mut el = Element::new("LST");
            for item in items {
                el = el.add_child(serialize_value(ctx, item, None)?);
            }
            el
        }
        Container::Dictionary(entries) => {
            let mut el = Element::new("DCT");
            for (key, value) in entries {
                let entry = Element::new("En")
                    .add_child(serialize_value(ctx, key, Some("Key".to_string()))?)
                    .add_child(serialize_value(ctx, value, Some("Value".to_string()))?);
                el = el.add_child(entry);
            }
            el
        }
    })
}
