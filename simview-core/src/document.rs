//! Mutable SVG element tree owned by the render surface.
//!
//! The host replaces the whole document on every update cycle, so the tree
//! is a plain owned value — no interior mutability, no incremental diffing.
//! Serialization is canonical (sorted attributes, no comments, `xmlns`
//! pinned first on the root) so that two structurally identical documents
//! produce byte-identical input for the rasterizer backend.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

/// The SVG namespace re-declared on every serialized root element.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("malformed svg source: {0}")]
    Malformed(String),
    #[error("root element must be <svg>, found <{0}>")]
    NotSvgRoot(String),
    #[error("missing required attribute `{0}` on root <svg>")]
    MissingAttribute(&'static str),
    #[error("attribute `{name}` is not numeric: `{value}`")]
    NonNumeric { name: String, value: String },
}

// ───────────────────────────────────────────────────────────────────
// SvgElement
// ───────────────────────────────────────────────────────────────────

/// A single element in the SVG tree.
///
/// Tags and attribute names are stored with their local names only —
/// namespace prefixes are resolved away at parse time and the canonical
/// serializer re-declares the SVG namespace on the root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvgElement {
    pub tag: String,
    /// `BTreeMap` gives the stable attribute ordering the canonical
    /// serializer relies on.
    pub attrs: BTreeMap<String, String>,
    /// Concatenated character data directly inside this element.
    pub text: Option<String>,
    pub children: Vec<SvgElement>,
}

impl SvgElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: SvgElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// The `id` attribute, used as the hit-test target identifier.
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Parse a numeric attribute.  Absent attributes are `Ok(None)`;
    /// present but non-numeric values are an error, never silently zero.
    pub fn length(&self, name: &str) -> Result<Option<f64>, ValidationError> {
        match self.attr(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .trim_end_matches("px")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValidationError::NonNumeric {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Parse an element tree from SVG text.
    pub fn parse(source: &str) -> Result<Self, ValidationError> {
        let doc = roxmltree::Document::parse(source)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut element = SvgElement::new(node.tag_name().name());
        for attr in node.attributes() {
            element.attrs.insert(attr.name().to_string(), attr.value().to_string());
        }
        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                element.children.push(Self::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
            // Comments and processing instructions are dropped: canonical
            // form must not depend on them.
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            element.text = Some(trimmed.to_string());
        }
        element
    }

    /// Serialize this subtree in canonical form.
    ///
    /// `declare_namespace` re-declares [`SVG_NAMESPACE`] before the sorted
    /// attributes; it is set only for the document root.
    fn write_canonical(&self, out: &mut String, declare_namespace: bool) {
        let _ = write!(out, "<{}", self.tag);
        if declare_namespace {
            let _ = write!(out, " xmlns=\"{SVG_NAMESPACE}\"");
        }
        for (name, value) in &self.attrs {
            if name == "xmlns" {
                continue; // root namespace is pinned above
            }
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_canonical(out, false);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ───────────────────────────────────────────────────────────────────
// SvgDocument
// ───────────────────────────────────────────────────────────────────

/// A validated SVG document: root tag is `svg` and the root declares
/// numeric `width`/`height`.
///
/// Validation happens at construction, so a value of this type can always
/// be rasterized; the render surface never re-checks.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgDocument {
    root: SvgElement,
}

impl SvgDocument {
    pub fn new(root: SvgElement) -> Result<Self, ValidationError> {
        if root.tag != "svg" {
            return Err(ValidationError::NotSvgRoot(root.tag.clone()));
        }
        root.length("width")?
            .ok_or(ValidationError::MissingAttribute("width"))?;
        root.length("height")?
            .ok_or(ValidationError::MissingAttribute("height"))?;
        // x/y are optional but must be numeric when present.
        root.length("x")?;
        root.length("y")?;
        Ok(Self { root })
    }

    pub fn from_str(source: &str) -> Result<Self, ValidationError> {
        Self::new(SvgElement::parse(source)?)
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    /// Declared size in SVG units.  Infallible: validated at construction.
    pub fn size(&self) -> (f64, f64) {
        let width = self.root.length("width").ok().flatten().unwrap_or(0.0);
        let height = self.root.length("height").ok().flatten().unwrap_or(0.0);
        (width, height)
    }

    /// Declared root position in SVG units (defaults to the origin).
    pub fn position(&self) -> (f64, f64) {
        let x = self.root.length("x").ok().flatten().unwrap_or(0.0);
        let y = self.root.length("y").ok().flatten().unwrap_or(0.0);
        (x, y)
    }

    /// Canonical serialized form fed to the rasterizer backend.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.root.write_canonical(&mut out, true);
        out
    }
}

// ===================================================================
// Tests
// ===================================================================
