//! The `#< CLIXML` shell wrapper: the text PowerShell's own
//! `-OutputFormat xml` mode writes to stdout/stderr, not a wire message
//! body. One document, a header line followed by a single `<Objs>` root,
//! holds every record a non-interactive `pwsh` invocation produced across
//! all its streams, each child tagged by an `S` attribute saying which
//! stream it came from (absent means the success/output stream).
//!
//! This sits above [`crate::clixml`], which only knows how to (de)serialize
//! the single root `<Obj>`/primitive a PSRP message body carries; this
//! module wraps a sequence of those in the `<Objs>`/header shape real
//! `pwsh` output uses.

use psrp_xml::builder::{Attribute, Builder, Element};
use psrp_xml::XmlError;

use crate::value::{
    deserialize_value, serialize_value, DeserializationContext, PsValue, SerializationContext,
};
use crate::Result;

const HEADER: &str = "#< CLIXML";
const PS_NAMESPACE: &str = "http://schemas.microsoft.com/powershell/2004/04";

/// Which PowerShell stream a record in a CLIXML shell document belongs to.
/// Carried on the wire as an `S` attribute; its absence means `Output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClixmlStream {
    Output,
    Error,
    Debug,
    Verbose,
    Warning,
    Information,
    Progress,
}

impl ClixmlStream {
    fn tag(self) -> Option<&'static str> {
        match self {
            Self::Output => None,
            Self::Error => Some("Error"),
            Self::Debug => Some("Debug"),
            Self::Verbose => Some("Verbose"),
            Self::Warning => Some("Warning"),
            Self::Information => Some("Information"),
            Self::Progress => Some("Progress"),
        }
    }

    /// Unrecognized or absent tags fall back to `Output`, matching real
    /// `pwsh` output, which never tags the success stream.
    fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("Error") => Self::Error,
            Some("Debug") => Self::Debug,
            Some("Verbose") => Self::Verbose,
            Some("Warning") => Self::Warning,
            Some("Information") => Self::Information,
            Some("Progress") => Self::Progress,
            _ => Self::Output,
        }
    }
}

/// A CLIXML shell document, decoded and sorted by stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClixmlOutput {
    pub output: Vec<PsValue>,
    pub error: Vec<PsValue>,
    pub debug: Vec<PsValue>,
    pub verbose: Vec<PsValue>,
    pub warning: Vec<PsValue>,
    pub information: Vec<PsValue>,
    pub progress: Vec<PsValue>,
}

impl ClixmlOutput {
    fn push(&mut self, stream: ClixmlStream, value: PsValue) {
        match stream {
            ClixmlStream::Output => self.output.push(value),
            ClixmlStream::Error => self.error.push(value),
            ClixmlStream::Debug => self.debug.push(value),
            ClixmlStream::Verbose => self.verbose.push(value),
            ClixmlStream::Warning => self.warning.push(value),
            ClixmlStream::Information => self.information.push(value),
            ClixmlStream::Progress => self.progress.push(value),
        }
    }
}

/// Encodes `records` as a `#< CLIXML`-prefixed `<Objs>` document, the shape
/// real `pwsh -OutputFormat xml` writes to its output streams.
pub fn encode(records: &[(ClixmlStream, PsValue)]) -> Result<Vec<u8>> {
    let mut ctx = SerializationContext::new();
    let mut objs = Element::new("Objs")
        .add_attribute(Attribute::new("Version", "1.1.0.1"))
        .add_attribute(Attribute::new("xmlns", PS_NAMESPACE));

    for (stream, value) in records {
        let element = serialize_value(&mut ctx, value, None)?;
        let element = match stream.tag() {
            Some(tag) => element.add_attribute(Attribute::new("S", tag)),
            None => element,
        };
        objs = objs.add_child(element);
    }

    let mut text = String::from(HEADER);
    text.push('\n');
    text.push_str(&Builder::new(None, objs).to_string().map_err(XmlError::from)?);
    Ok(text.into_bytes())
}

/// Decodes a `#< CLIXML` document into its per-stream records.
///
/// Text with no `#< CLIXML` header, or an empty body after it, decodes to
/// an all-empty [`ClixmlOutput`] rather than an error -- a pipeline that
/// wrote nothing to any stream still has a (trivially empty) shell output.
pub fn decode(bytes: &[u8]) -> Result<ClixmlOutput> {
    let text = std::str::from_utf8(bytes)?;
    let Some(body) = text.strip_prefix(HEADER) else {
        return Ok(ClixmlOutput::default());
    };
    let body = body.trim_start();
    if body.is_empty() {
        return Ok(ClixmlOutput::default());
    }

    let parsed = psrp_xml::parser::parse(body).map_err(XmlError::from)?;
    let root = parsed.root_element();
    let mut ctx = DeserializationContext::new();
    let mut out = ClixmlOutput::default();
    for child in root.children() {
        let stream = ClixmlStream::from_tag(child.attribute("S"));
        let value = deserialize_value(&mut ctx, child)?;
        out.push(stream, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_records_across_every_stream() {
        let records = vec![
            (ClixmlStream::Output, PsValue::from("result")),
            (ClixmlStream::Error, PsValue::from("boom")),
            (ClixmlStream::Debug, PsValue::from("debug line")),
            (ClixmlStream::Verbose, PsValue::from("verbose line")),
            (ClixmlStream::Warning, PsValue::from("careful")),
            (ClixmlStream::Information, PsValue::from("fyi")),
            (ClixmlStream::Progress, PsValue::from("50%")),
        ];

        let bytes = encode(&records).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(HEADER));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.output, vec![PsValue::from("result")]);
        assert_eq!(decoded.error, vec![PsValue::from("boom")]);
        assert_eq!(decoded.debug, vec![PsValue::from("debug line")]);
        assert_eq!(decoded.verbose, vec![PsValue::from("verbose line")]);
        assert_eq!(decoded.warning, vec![PsValue::from("careful")]);
        assert_eq!(decoded.information, vec![PsValue::from("fyi")]);
        assert_eq!(decoded.progress, vec![PsValue::from("50%")]);
    }

    #[test]
    fn untagged_records_land_on_the_output_stream() {
        let records = vec![(ClixmlStream::Output, PsValue::from("plain"))];
        let bytes = encode(&records).unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains(" S=\""));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.output, vec![PsValue::from("plain")]);
        assert!(decoded.error.is_empty());
    }

    #[test]
    fn empty_input_decodes_to_an_empty_output() {
        assert_eq!(decode(b"").unwrap(), ClixmlOutput::default());
        assert_eq!(decode(HEADER.as_bytes()).unwrap(), ClixmlOutput::default());
    }

    #[test]
    fn text_without_the_header_decodes_to_an_empty_output() {
        assert_eq!(decode(b"not clixml at all").unwrap(), ClixmlOutput::default());
    }
}
