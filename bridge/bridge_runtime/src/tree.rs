//! Walks and edits over element trees.

use crate::element::{Element, FlexDirection};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// What a visitor may know about the parent of the node it is visiting.
///
/// Taken before the parent's children are walked, so it reflects the parent
/// as it was before its own visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentInfo {
    pub direction: FlexDirection,
    pub is_stack: bool,
}

impl ParentInfo {
    pub fn of(element: &Element) -> Self {
        Self {
            direction: element.flex_direction(),
            is_stack: element.is_stack(),
        }
    }
}

/// Post-order walk: children first, left to right, then the node itself.
///
/// Children a visitor inserts into a node are not walked in the same call.
pub fn for_each_from_bottom_left<F>(node: &mut Element, parent: Option<ParentInfo>, visit: &mut F)
where
    F: FnMut(&mut Element, Option<ParentInfo>),
{
    let info = ParentInfo::of(node);

    if let Some(children) = node.children.as_mut() {
        for child in children.iter_mut() {
            for_each_from_bottom_left(child, Some(info), visit);
        }
    }

    visit(node, parent);
}

/// Pre-order walk. The visitor may replace a node's children before they are
/// walked.
pub fn for_each<F>(node: &mut Element, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Element) -> Result<()>,
{
    visit(node)?;

    if let Some(children) = node.children.as_mut() {
        for child in children.iter_mut() {
            for_each(child, visit)?;
        }
    }

    Ok(())
}

pub fn find_by_id<'a>(node: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    if node.id == id {
        return Some(node);
    }

    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|child| find_by_id(child, id))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeInsertionMode {
    Prepend,
    Append,
    #[default]
    Replace,
}

/// Places `children` under `anchor`. Prepended children go in reverse order,
/// ahead of the existing ones.
pub fn insert_children(anchor: &mut Element, mut children: Vec<Element>, mode: TreeInsertionMode) {
    let existing = anchor.children.take().unwrap_or_default();

    let merged = match mode {
        TreeInsertionMode::Prepend => {
            children.reverse();
            children.extend(existing);
            children
        }
        TreeInsertionMode::Append => {
            let mut merged = existing;
            merged.extend(children);
            merged
        }
        TreeInsertionMode::Replace => children,
    };

    anchor.children = Some(merged);
}

/// Prefix of ids given to elements that arrive without one.
pub const GENERATED_ID_PREFIX: &str = "_beagle_";

/// Normalizes templates and server trees before they reach a view: moves
/// children declared under a component-specific property into `children`,
/// assigns missing ids and erases `null` properties.
#[derive(Debug, Default)]
pub struct TemplatePreProcessor {
    children_properties: HashMap<String, String>,
    next_id: u64,
}

impl TemplatePreProcessor {
    /// `children_properties` maps a lowercase component kind to the property
    /// holding its children.
    pub fn new(children_properties: HashMap<String, String>) -> Self {
        Self {
            children_properties,
            next_id: 0,
        }
    }

    pub fn process(&mut self, tree: &mut Element) -> Result<()> {
        for_each(tree, &mut |component| {
            if let Some(property) = self.children_properties.get(&component.component_key()) {
                format_children_property(component, property)?;
            }
            if component.id.is_empty() {
                component.id = format!("{GENERATED_ID_PREFIX}{}", self.next_id);
                self.next_id += 1;
            }
            erase_null_properties(component);
            Ok(())
        })
    }
}

fn format_children_property(component: &mut Element, property: &str) -> Result<()> {
    if property == "children" || component.children.is_some() {
        return Ok(());
    }

    let Some(raw) = component.properties.remove(property) else {
        return Ok(());
    };

    component.children = match raw {
        Value::Null => None,
        Value::Array(_) => Some(serde_json::from_value(raw)?),
        single => Some(vec![serde_json::from_value(single)?]),
    };
    Ok(())
}

fn erase_null_properties(component: &mut Element) {
    component.properties.retain(|_, value| !value.is_null());
    component.properties.values_mut().for_each(erase_nulls);

    if let Some(style) = component.style.as_mut() {
        style.other.retain(|_, value| !value.is_null());
        style.other.values_mut().for_each(erase_nulls);
    }
}

fn erase_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, entry| !entry.is_null());
            map.values_mut().for_each(erase_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(erase_nulls),
        _ => {}
    }
}
