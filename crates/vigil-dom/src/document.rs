//! Document - element arena

use crate::{DOMStringMap, DomError, NodeId};

/// An element in the arena
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag_name: String,
    attributes: Vec<(String, String)>,
    style: Vec<(String, String)>,
}

impl Element {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Inline style property value
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// data-* attributes
    pub fn dataset(&self) -> DOMStringMap {
        DOMStringMap::from_attributes(&self.attributes)
    }

    fn set_pair(pairs: &mut Vec<(String, String)>, name: &str, value: &str) {
        match pairs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => pairs.push((name.to_string(), value.to_string())),
        }
    }
}

/// HTML document as a flat element arena
#[derive(Debug, Default)]
pub struct Document {
    url: String,
    elements: Vec<Element>,
}

impl Document {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        let id = NodeId(self.elements.len() as u32);
        self.elements.push(Element::new(tag_name));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        self.elements
            .get_mut(id.0 as usize)
            .ok_or(DomError::NodeNotFound(id))
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.get_mut(id)?;
        Element::set_pair(&mut element.attributes, name, value);
        Ok(())
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let element = self.get_mut(id)?;
        let position = element.attributes.iter().position(|(n, _)| n == name);
        Ok(position.map(|i| element.attributes.remove(i).1))
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let element = self.get_mut(id)?;
        Element::set_pair(&mut element.style, property, value);
        Ok(())
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.get(id)?.style(property)
    }

    pub fn dataset(&self, id: NodeId) -> Option<DOMStringMap> {
        self.get(id).map(Element::dataset)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes() {
        let mut doc = Document::new("https://example.test/");
        let img = doc.create_element("IMG");

        doc.set_attribute(img, "data-src", "/a.jpg").unwrap();
        doc.set_attribute(img, "alt", "weld").unwrap();
        doc.set_attribute(img, "alt", "steel").unwrap();

        let element = doc.get(img).unwrap();
        assert_eq!(element.tag_name, "img");
        assert_eq!(element.attribute("alt"), Some("steel"));
        assert_eq!(element.attributes().len(), 2);

        assert_eq!(doc.remove_attribute(img, "data-src").unwrap(), Some("/a.jpg".to_string()));
        assert_eq!(doc.remove_attribute(img, "data-src").unwrap(), None);
    }

    #[test]
    fn test_style() {
        let mut doc = Document::default();
        let div = doc.create_element("div");

        doc.set_style(div, "opacity", "0").unwrap();
        doc.set_style(div, "opacity", "1").unwrap();
        assert_eq!(doc.style(div, "opacity"), Some("1"));
        assert_eq!(doc.style(div, "transform"), None);
    }

    #[test]
    fn test_missing_node() {
        let mut doc = Document::default();
        let missing = NodeId::from_raw(7);
        assert_eq!(
            doc.set_attribute(missing, "src", "x"),
            Err(DomError::NodeNotFound(missing))
        );
        assert!(doc.dataset(missing).is_none());
    }
}
