//! A thin wrapper over [`roxmltree`] used to walk CLIXML documents.

use roxmltree::NodeType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parse error: {0}")]
    Roxmltree(#[from] roxmltree::Error),
}

/// A parsed XML document, borrowing the source text for its lifetime.
pub struct Parsed<'input> {
    document: roxmltree::Document<'input>,
}

pub fn parse(source: &str) -> Result<Parsed<'_>, Error> {
    Ok(Parsed {
        document: roxmltree::Document::parse(source)?,
    })
}

impl<'input> Parsed<'input> {
    pub fn root_element<'doc>(&'doc self) -> Node<'input, 'doc> {
        Node(self.document.root_element())
    }
}

/// A node in a parsed XML tree. Mirrors `roxmltree::Node`'s two lifetimes:
/// `'input` for borrowed text content, `'doc` for the tree structure itself.
#[derive(Debug, Clone, Copy)]
pub struct Node<'input, 'doc>(roxmltree::Node<'input, 'doc>);

impl<'input, 'doc> Node<'input, 'doc> {
    pub fn is_element(&self) -> bool {
        self.0.is_element()
    }

    pub fn node_type(&self) -> NodeType {
        self.0.node_type()
    }

    pub fn tag_name(&self) -> roxmltree::ExpandedName<'input> {
        self.0.tag_name()
    }

    pub fn attribute(&self, name: &str) -> Option<&'input str> {
        self.0.attribute(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = roxmltree::Attribute<'input, 'doc>> {
        self.0.attributes()
    }

    /// Direct element children, skipping text/comment nodes.
    pub fn children(&self) -> impl Iterator<Item = Node<'input, 'doc>> {
        self.0.children().filter(|n| n.is_element()).map(Node)
    }

    /// Concatenated text of direct text-node children.
    pub fn text(&self) -> Option<&'input str> {
        self.0.text()
    }
}
