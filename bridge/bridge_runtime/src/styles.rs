//! Layout post-processing for hosts that only know stacks and flex boxes.
//!
//! The UI library lays nodes out in two layers: absolutely positioned nodes
//! and a flex layout. The host renderer can only express that as flex
//! containers nested inside stack containers, and it cannot expand a flex
//! child whose parent has no flex factor of its own. `manage_styles` rewrites
//! a tree into that shape:
//!
//! * an absolutely positioned root is wrapped in a bare container;
//! * a node with absolute children becomes a stack whose first child is a
//!   synthetic flex container holding the non-absolute children;
//! * a node with a child that wants to expand gets `flex: 1` unless its size
//!   is already bounded along its parent's main axis.
//!
//! The pass is idempotent: running it on its own output changes nothing.

use crate::element::{CONTAINER_COMPONENT, Element, Flex, FlexDirection, Style};
use crate::policy::ExpansionPolicy;
use crate::tree::{ParentInfo, for_each_from_bottom_left};

pub const ROOT_WRAPPER_SUFFIX: &str = "_auto_root_";
pub const FLEX_WRAPPER_SUFFIX: &str = "_auto_flex_";

/// Normalizes `tree` and returns the new root. Callers must rebind to the
/// returned element: the root may have been wrapped.
pub fn manage_styles(tree: Element, policy: &ExpansionPolicy) -> Element {
    let mut root = wrap_absolute_root(tree);

    for_each_from_bottom_left(&mut root, None, &mut |node, parent| {
        group_absolute_children(node);
        fix_flex_factor(node, parent, policy);
    });

    root
}

fn wrap_absolute_root(root: Element) -> Element {
    if !root.is_absolute() || root.is_stack() {
        return root;
    }

    Element {
        component: CONTAINER_COMPONENT.to_string(),
        id: format!("{}{ROOT_WRAPPER_SUFFIX}", root.id),
        children: Some(vec![root]),
        ..Element::default()
    }
}

fn group_absolute_children(node: &mut Element) {
    // stacks were grouped by an earlier pass
    if node.is_stack() {
        return;
    }

    let Some(children) = node.children.take() else {
        return;
    };
    let (stack, flex): (Vec<Element>, Vec<Element>) =
        children.into_iter().partition(Element::is_absolute);

    if stack.is_empty() {
        node.children = Some(flex);
        return;
    }

    let wrapper_id = format!("{}{FLEX_WRAPPER_SUFFIX}", node.id);
    let style = node.style_mut();
    style.is_stack = true;

    if flex.is_empty() {
        // a stack with no size opinion collapses, let it take all the space
        let layout = style.flex.get_or_insert_with(Flex::default);
        if layout.factor().is_none() {
            layout.flex = Some(1.0);
        }
        node.children = Some(stack);
        return;
    }

    // the wrapper sits inside a stack, a flex weight means nothing there
    let wrapper_flex = Flex {
        flex: None,
        ..style.flex.clone().unwrap_or_default()
    };
    let wrapper = Element {
        component: CONTAINER_COMPONENT.to_string(),
        id: wrapper_id,
        style: Some(Style {
            flex: Some(wrapper_flex),
            ..Style::default()
        }),
        children: Some(flex),
        ..Element::default()
    };

    let mut regrouped = Vec::with_capacity(stack.len() + 1);
    regrouped.push(wrapper);
    regrouped.extend(stack);
    node.children = Some(regrouped);
}

fn fix_flex_factor(node: &mut Element, parent: Option<ParentInfo>, policy: &ExpansionPolicy) {
    // the flex layer of a stack never takes a weight
    if parent.is_some_and(|parent| parent.is_stack) && !node.is_absolute() {
        return;
    }

    if is_bounded_in_flex_direction(node, parent) || !has_expanded_child(node, policy) {
        return;
    }

    node.style_mut().flex.get_or_insert_with(Flex::default).flex = Some(1.0);
}

fn has_expanded_child(node: &Element, policy: &ExpansionPolicy) -> bool {
    node.children()
        .iter()
        .any(|child| child.flex_factor().is_some() || policy.always_expands(&child.component))
}

fn is_bounded_in_flex_direction(node: &Element, parent: Option<ParentInfo>) -> bool {
    if node.flex_factor().is_some() {
        return true;
    }

    let Some(size) = node.size() else {
        return false;
    };

    match parent.map(|parent| parent.direction).unwrap_or_default() {
        FlexDirection::Row => size.width.is_some(),
        FlexDirection::Column => size.height.is_some(),
    }
}
