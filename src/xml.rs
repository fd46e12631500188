//! XML normalization into the nested-mapping shape the path resolver
//! consumes.
//!
//! Providers answer either JSON or XML; both must resolve through the
//! same collection-description paths. XML documents are therefore
//! converted to `serde_json::Value` with the xmltodict conventions the
//! collection descriptions address: attributes become `"@name"` keys,
//! mixed text content lands under `"#text"`, text-only leaf elements
//! collapse to plain strings, and repeated sibling elements collapse
//! into arrays in document order. Namespace prefixes are preserved in
//! keys (e.g. `georss:polygon`) because the descriptions name them.

use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use crate::error::Result;

/// Parse an XML document and normalize it to a nested mapping.
///
/// The root element becomes a single key of the returned object, so a
/// feed document resolves through paths like `["feed", "entry"]`.
pub fn xml_to_value(xml: &str) -> Result<Value> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let mut top = Map::new();
    top.insert(qualified_name(root), element_to_value(root));
    Ok(Value::Object(top))
}

/// Tag name with its namespace prefix, as written in the document.
fn qualified_name(node: Node<'_, '_>) -> String {
    let name = node.tag_name().name();
    match node.tag_name().namespace() {
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
            _ => name.to_string(),
        },
        None => name.to_string(),
    }
}

fn element_to_value(node: Node<'_, '_>) -> Value {
    let mut obj = Map::new();

    for attr in node.attributes() {
        obj.insert(format!("@{}", attr.name()), Value::String(attr.value().to_string()));
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            append_child(&mut obj, qualified_name(child), element_to_value(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }
    let text = text.trim();

    if obj.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            obj.insert("#text".to_string(), Value::String(text.to_string()));
        }
        Value::Object(obj)
    }
}

/// Insert a child value, collapsing repeated siblings into an array.
fn append_child(obj: &mut Map<String, Value>, key: String, value: Value) {
    match obj.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            obj.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_leaf_collapses_to_string() {
        let value = xml_to_value("<title>S2A_MSIL1C_20200101</title>").unwrap();
        assert_eq!(value, json!({"title": "S2A_MSIL1C_20200101"}));
    }

    #[test]
    fn test_attributes_become_at_keys() {
        let value = xml_to_value(r#"<link rel="icon" href="thumb.png"/>"#).unwrap();
        assert_eq!(
            value,
            json!({"link": {"@rel": "icon", "@href": "thumb.png"}})
        );
    }

    #[test]
    fn test_text_with_attributes_uses_hash_text() {
        let value = xml_to_value(r#"<str name="identifier">S2A</str>"#).unwrap();
        assert_eq!(
            value,
            json!({"str": {"@name": "identifier", "#text": "S2A"}})
        );
    }

    #[test]
    fn test_repeated_siblings_collapse_to_array() {
        let xml = "<feed><entry><id>1</id></entry><entry><id>2</id></entry></feed>";
        let value = xml_to_value(xml).unwrap();
        assert_eq!(
            value,
            json!({"feed": {"entry": [{"id": "1"}, {"id": "2"}]}})
        );
    }

    #[test]
    fn test_single_child_stays_scalar() {
        let xml = "<feed><entry><id>1</id></entry></feed>";
        let value = xml_to_value(xml).unwrap();
        assert_eq!(value, json!({"feed": {"entry": {"id": "1"}}}));
    }

    #[test]
    fn test_namespace_prefix_preserved() {
        let xml = r#"<entry xmlns:georss="http://www.georss.org/georss">
            <georss:polygon>0 0 0 1 1 1 0 0</georss:polygon>
        </entry>"#;
        let value = xml_to_value(xml).unwrap();
        assert_eq!(
            value,
            json!({"entry": {"georss:polygon": "0 0 0 1 1 1 0 0"}})
        );
    }

    #[test]
    fn test_empty_element_is_null() {
        let value = xml_to_value("<entry><summary/></entry>").unwrap();
        assert_eq!(value, json!({"entry": {"summary": null}}));
    }

    #[test]
    fn test_malformed_xml_errors() {
        assert!(xml_to_value("<feed><entry></feed>").is_err());
    }

    #[test]
    fn test_resolves_through_path_resolver() {
        use crate::path::{resolve, AllowedValue, PathSegment};

        let xml = r#"<entry>
            <link rel="alternative" href="meta.xml"/>
            <link rel="icon" href="thumb.png"/>
        </entry>"#;
        let value = xml_to_value(xml).unwrap();
        let entry = value.get("entry").unwrap();
        let path = [
            PathSegment::new("link"),
            PathSegment::constrained(
                "@href",
                [("@rel".to_string(), AllowedValue::One("icon".to_string()))],
            ),
        ];
        assert_eq!(resolve(entry, &path), Some(&json!("thumb.png")));
    }
}
