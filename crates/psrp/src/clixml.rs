//! Whole-document CLIXML encode/decode, layered on top of
//! [`crate::value`]'s node-level (de)serializer.
//!
//! A message body is always a single root `<Obj>`/primitive element with no
//! XML declaration; the envelope (and, above that, the `#< CLIXML` shell
//! wrapper) is what frames it on the wire.

use psrp_xml::builder::Builder;
use psrp_xml::XmlError;

use crate::value::{
    deserialize_value, serialize_value, DeserializationContext, PsValue, SerializationContext,
};
use crate::Result;

/// `cipher` is the session key installed by key exchange, if any; a value
/// that contains a `SecureString` fails with [`crate::PsrpError::MissingCipher`]
/// when encoded with none available.
pub fn encode(value: &PsValue, cipher: Option<&[u8; 32]>) -> Result<Vec<u8>> {
    let mut ctx = match cipher {
        Some(key) => SerializationContext::with_cipher(*key),
        None => SerializationContext::new(),
    };
    let element = serialize_value(&mut ctx, value, None)?;
    let text = Builder::new(None, element).to_string().map_err(XmlError::from)?;
    Ok(text.into_bytes())
}

pub fn decode(bytes: &[u8], cipher: Option<&[u8; 32]>) -> Result<PsValue> {
    let text = std::str::from_utf8(bytes)?;
    let parsed = psrp_xml::parser::parse(text).map_err(XmlError::from)?;
    let mut ctx = match cipher {
        Some(key) => DeserializationContext::with_cipher(*key),
        None => DeserializationContext::new(),
    };
    deserialize_value(&mut ctx, parsed.root_element())
}
