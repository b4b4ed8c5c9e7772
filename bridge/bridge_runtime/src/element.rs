//! Typed view of the UI library's element tree.
//!
//! Only the properties the layout pass reads are modelled as fields. Every
//! other key is kept in a flattened map so a tree survives a
//! deserialize/serialize cycle without losing data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Component kind used for every node the bridge synthesizes.
pub const CONTAINER_COMPONENT: &str = "beagle:container";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "_beagleComponent_", default, deserialize_with = "null_as_default")]
    pub component: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Element>>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub is_stack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex: Option<Flex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_direction: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<UnitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<UnitValue>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub unit: UnitType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    #[default]
    Real,
    Percent,
    Auto,
}

/// Main axis of a flex container. Only `ROW` (any case) is a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

impl FlexDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(direction) if direction.eq_ignore_ascii_case("row") => FlexDirection::Row,
            _ => FlexDirection::Column,
        }
    }
}

impl Flex {
    /// The flex weight when it expresses an opinion, i.e. when it is positive.
    pub fn factor(&self) -> Option<f64> {
        self.flex.filter(|weight| *weight > 0.0)
    }

    pub fn direction(&self) -> FlexDirection {
        FlexDirection::parse(self.flex_direction.as_deref())
    }
}

impl Element {
    pub fn container(id: impl Into<String>) -> Self {
        Self {
            component: CONTAINER_COMPONENT.to_string(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn children(&self) -> &[Element] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn is_absolute(&self) -> bool {
        self.style
            .as_ref()
            .and_then(|style| style.position_type.as_deref())
            .is_some_and(|position| position.eq_ignore_ascii_case("absolute"))
    }

    pub fn is_stack(&self) -> bool {
        self.style.as_ref().is_some_and(|style| style.is_stack)
    }

    pub fn flex_factor(&self) -> Option<f64> {
        self.style
            .as_ref()
            .and_then(|style| style.flex.as_ref())
            .and_then(Flex::factor)
    }

    pub fn flex_direction(&self) -> FlexDirection {
        self.style
            .as_ref()
            .and_then(|style| style.flex.as_ref())
            .map(Flex::direction)
            .unwrap_or_default()
    }

    pub fn size(&self) -> Option<&Size> {
        self.style.as_ref().and_then(|style| style.size.as_ref())
    }

    pub fn style_mut(&mut self) -> &mut Style {
        self.style.get_or_insert_with(Style::default)
    }

    /// Component kind folded to lowercase, the form policies are keyed by.
    pub fn component_key(&self) -> String {
        self.component.to_ascii_lowercase()
    }
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn absolute_square() -> Value {
        json!({
            "_beagleComponent_": "beagle:container",
            "id": "absoluteSquare",
            "style": {
                "position": { "top": { "value": 100, "type": "REAL" } },
                "size": {
                    "width": { "value": 100, "type": "REAL" },
                    "height": { "value": 100, "type": "PERCENT" }
                },
                "backgroundColor": "red",
                "positionType": "ABSOLUTE"
            }
        })
    }

    #[test]
    fn decodes_layout_fields_and_keeps_the_rest() {
        let element: Element = serde_json::from_value(absolute_square()).expect("decode element");

        assert_eq!(element.component, CONTAINER_COMPONENT);
        assert_eq!(element.id, "absoluteSquare");
        assert!(element.is_absolute());
        assert!(!element.is_stack());

        let style = element.style.as_ref().expect("style");
        assert_eq!(style.other["backgroundColor"], "red");
        assert_eq!(style.other["position"]["top"]["type"], "REAL");

        let size = element.size().expect("size");
        assert_eq!(size.height.map(|h| h.unit), Some(UnitType::Percent));
    }

    #[test]
    fn unknown_properties_survive_encoding() {
        let raw = json!({
            "_beagleComponent_": "beagle:text",
            "id": "text1",
            "text": "TEXT 1",
            "style": { "flex": { "grow": 2, "flexDirection": "ROW" } }
        });
        let element: Element = serde_json::from_value(raw.clone()).expect("decode element");

        assert_eq!(element.properties["text"], "TEXT 1");
        assert_eq!(element.flex_direction(), FlexDirection::Row);
        assert_eq!(serde_json::to_value(&element).expect("encode element"), raw);
    }

    #[test]
    fn position_type_is_case_insensitive() {
        let mut element = Element::container("node");
        element.style_mut().position_type = Some("absolute".to_string());
        assert!(element.is_absolute());

        element.style_mut().position_type = Some("Relative".to_string());
        assert!(!element.is_absolute());
    }

    #[test]
    fn non_positive_weights_are_no_opinion() {
        let mut element = Element::container("node");
        assert_eq!(element.flex_factor(), None);

        element.style_mut().flex = Some(Flex {
            flex: Some(0.0),
            ..Flex::default()
        });
        assert_eq!(element.flex_factor(), None);

        element.style_mut().flex = Some(Flex {
            flex: Some(0.5),
            ..Flex::default()
        });
        assert_eq!(element.flex_factor(), Some(0.5));
    }

    #[test]
    fn flex_direction_defaults_to_column() {
        assert_eq!(FlexDirection::parse(None), FlexDirection::Column);
        assert_eq!(FlexDirection::parse(Some("COLUMN")), FlexDirection::Column);
        assert_eq!(FlexDirection::parse(Some("row")), FlexDirection::Row);
        assert_eq!(FlexDirection::parse(Some("ROW_REVERSE")), FlexDirection::Column);
    }

    #[test]
    fn missing_children_read_as_empty() {
        let element = Element::container("leaf");
        assert!(element.children().is_empty());
        assert_eq!(element.component_key(), "beagle:container");
    }

    #[test]
    fn explicit_nulls_read_as_defaults() {
        let element: Element = serde_json::from_value(json!({
            "_beagleComponent_": null,
            "id": null,
            "style": {
                "isStack": null,
                "size": { "width": { "value": null, "type": null } }
            }
        }))
        .expect("decode element");

        assert!(element.component.is_empty());
        assert!(element.id.is_empty());
        assert!(!element.is_stack());
        let width = element.size().and_then(|size| size.width).expect("width");
        assert_eq!(width, UnitValue { value: 0.0, unit: UnitType::Real });
    }
}
