//! A minimal, intentionally small XML tree builder.
//!
//! CLIXML never uses namespaces, so this builder only deals with
//! elements, attributes and text content.

mod attribute;

pub use attribute::Attribute;

#[derive(Debug, thiserror::Error)]
pub enum XmlBuilderError {
    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),
}

/// The `<?xml version="1.0" encoding="..."?>` prologue.
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    pub version: &'a str,
    pub encoding: Option<&'a str>,
}

impl<'a> Declaration<'a> {
    pub fn new(version: &'a str, encoding: Option<&'a str>) -> Self {
        Declaration { version, encoding }
    }
}

impl Default for Declaration<'_> {
    fn default() -> Self {
        Declaration {
            version: "1.0",
            encoding: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Content<'a> {
    Text(String),
    Children(Vec<Element<'a>>),
    Empty,
}

/// A builder-style XML element.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    name: &'a str,
    attributes: Vec<Attribute<'a>>,
    content: Content<'a>,
}

impl<'a> Element<'a> {
    pub fn new(name: &'a str) -> Self {
        Element {
            name,
            attributes: Vec::new(),
            content: Content::Empty,
        }
    }

    #[must_use]
    pub fn add_attribute(mut self, attribute: Attribute<'a>) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn add_child(mut self, child: Element<'a>) -> Self {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            Content::Empty => self.content = Content::Children(vec![child]),
            Content::Text(_) => {
                tracing::warn!("overwriting text content of <{}> with a child element", self.name);
                self.content = Content::Children(vec![child]);
            }
        }
        self
    }

    #[must_use]
    pub fn set_text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    fn write<W: std::io::Write>(&self, w: &mut W) -> Result<(), XmlBuilderError> {
        write!(w, "<{}", self.name)?;
        for attribute in &self.attributes {
            attribute.write(w)?;
        }

        match &self.content {
            Content::Empty => write!(w, " />")?,
            Content::Text(text) => {
                write!(w, ">{}</{}>", escape_text(text), self.name)?;
            }
            Content::Children(children) => {
                write!(w, ">")?;
                for child in children {
                    child.write(w)?;
                }
                write!(w, "</{}>", self.name)?;
            }
        }

        Ok(())
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serializes a root [`Element`], optionally preceded by an XML declaration.
pub struct Builder<'a> {
    declaration: Option<Declaration<'a>>,
    root: Element<'a>,
}

impl<'a> Builder<'a> {
    pub fn new(declaration: Option<Declaration<'a>>, root: Element<'a>) -> Self {
        Builder { declaration, root }
    }

    pub fn write<W: std::io::Write>(&self, w: &mut W) -> Result<(), XmlBuilderError> {
        if let Some(declaration) = &self.declaration {
            write!(w, "<?xml version=\"{}\"", declaration.version)?;
            if let Some(encoding) = declaration.encoding {
                write!(w, " encoding=\"{encoding}\"")?;
            }
            write!(w, "?>")?;
        }
        self.root.write(w)
    }

    pub fn to_string(&self) -> Result<String, XmlBuilderError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8(buf).expect("builder only ever writes valid UTF-8"))
    }
}
