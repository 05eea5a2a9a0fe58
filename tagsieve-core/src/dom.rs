//! Tree editing helpers over the `markup5ever_rcdom` reference tree.
//!
//! The rewriter only ever needs a handful of structural edits: detach a node,
//! splice a node's children into its place, drop attributes by position and
//! swap out text content. Each helper keeps the weak parent links consistent
//! with the parents' child vectors.

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, Node, NodeData};
use std::cell::RefCell;
use std::rc::Rc;

/// Lowercased local name of an element, `None` for other node kinds.
pub(crate) fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_lowercase()),
        _ => None,
    }
}

pub(crate) fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// True when `node` is currently one of `parent`'s children.
pub(crate) fn is_child_of(node: &Handle, parent: &Handle) -> bool {
    parent_of(node).is_some_and(|current| Rc::ptr_eq(&current, parent))
}

pub(crate) fn child_at(parent: &Handle, index: usize) -> Option<Handle> {
    parent.children.borrow().get(index).cloned()
}

pub(crate) fn child_count(parent: &Handle) -> usize {
    parent.children.borrow().len()
}

/// Removes `node` (and its subtree) from its parent.
pub(crate) fn detach(node: &Handle) {
    if let Some(parent) = parent_of(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// Moves every child of `node` into the parent, in order, at the position
/// `node` occupied, then removes `node`.
pub(crate) fn promote_children(node: &Handle) {
    let children: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
    let Some(parent) = parent_of(node) else {
        for child in &children {
            child.parent.set(None);
        }
        return;
    };

    for child in &children {
        child.parent.set(Some(Rc::downgrade(&parent)));
    }

    let mut siblings = parent.children.borrow_mut();
    match siblings.iter().position(|child| Rc::ptr_eq(child, node)) {
        Some(index) => {
            siblings.splice(index..index + 1, children);
        }
        None => siblings.extend(children),
    }
    drop(siblings);
    node.parent.set(None);
}

/// Keeps only the children for which `keep` returns true.
pub(crate) fn retain_children<F>(node: &Handle, mut keep: F)
where
    F: FnMut(&Handle) -> bool,
{
    let children = node.children.take();
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        if keep(&child) {
            kept.push(child);
        } else {
            child.parent.set(None);
        }
    }
    *node.children.borrow_mut() = kept;
}

/// `(name, value)` of the attribute at `index`. Names are lowercased.
pub(crate) fn attribute_at(node: &Handle, index: usize) -> Option<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .get(index)
            .map(|attr| (attr.name.local.to_lowercase(), attr.value.to_string())),
        _ => None,
    }
}

pub(crate) fn remove_attribute_at(node: &Handle, index: usize) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        if index < attrs.len() {
            attrs.remove(index);
        }
    }
}

pub(crate) fn set_attribute_at(node: &Handle, index: usize, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        if let Some(attr) = attrs.borrow_mut().get_mut(index) {
            attr.value = StrTendril::from_slice(value);
        }
    }
}

/// Removes every attribute and returns their names in document order.
pub(crate) fn take_attribute_names(node: &Handle) -> Vec<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .take()
            .into_iter()
            .map(|attr| attr.name.local.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Concatenated text of the direct text children.
pub(crate) fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Replaces all children of `node` with a single text node.
pub(crate) fn replace_text(node: &Handle, text: &str) {
    let replacement = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    replacement.parent.set(Some(Rc::downgrade(node)));
    for old in node.children.replace(vec![replacement]) {
        old.parent.set(None);
    }
}

/// The contents fragment of a `<template>` element.
pub(crate) fn template_contents(node: &Handle) -> Option<Handle> {
    match &node.data {
        NodeData::Element {
            template_contents, ..
        } => template_contents.borrow().clone(),
        _ => None,
    }
}

pub(crate) fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

pub(crate) fn is_comment(node: &Handle) -> bool {
    matches!(node.data, NodeData::Comment { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::driver::ParseOpts;
    use html5ever::tendril::TendrilSink;
    use html5ever::{local_name, namespace_url, ns, parse_fragment, QualName};
    use markup5ever_rcdom::RcDom;

    fn fragment(html: &str) -> (RcDom, Handle) {
        let dom = parse_fragment(
            RcDom::default(),
            ParseOpts::default(),
            QualName::new(None, ns!(html), local_name!("body")),
            vec![],
        )
        .one(html);
        let root = dom.document.children.borrow()[0].clone();
        (dom, root)
    }

    fn attribute_count(node: &Handle) -> usize {
        match &node.data {
            NodeData::Element { attrs, .. } => attrs.borrow().len(),
            _ => 0,
        }
    }

    fn names(parent: &Handle) -> Vec<String> {
        parent
            .children
            .borrow()
            .iter()
            .map(|c| element_name(c).unwrap_or_else(|| "#text".to_string()))
            .collect()
    }

    #[test]
    fn test_promote_children_splices_in_place() {
        let (_dom, root) = fragment("<i></i><span><b></b>x<u></u></span><s></s>");
        let span = child_at(&root, 1).unwrap();
        promote_children(&span);
        assert_eq!(names(&root), vec!["i", "b", "#text", "u", "s"]);
        let b = child_at(&root, 1).unwrap();
        assert!(Rc::ptr_eq(&parent_of(&b).unwrap(), &root));
        assert!(is_child_of(&b, &root));
        assert!(!is_child_of(&b, &span));
        assert!(parent_of(&span).is_none());
    }

    #[test]
    fn test_detach_removes_node() {
        let (_dom, root) = fragment("<i></i><b></b>");
        let i = child_at(&root, 0).unwrap();
        detach(&i);
        assert_eq!(names(&root), vec!["b"]);
        assert!(!is_child_of(&i, &root));
        assert!(is_child_of(&child_at(&root, 0).unwrap(), &root));
    }

    #[test]
    fn test_replaced_text_is_not_a_child_anymore() {
        let (_dom, root) = fragment("<style>p {}</style>");
        let style = child_at(&root, 0).unwrap();
        let old = child_at(&style, 0).unwrap();
        replace_text(&style, "q {}");
        assert!(!is_child_of(&old, &style));
        assert!(is_child_of(&child_at(&style, 0).unwrap(), &style));
    }

    #[test]
    fn test_attribute_editing() {
        let (_dom, root) = fragment(r#"<p ID="a" title="b" lang="c"></p>"#);
        let p = child_at(&root, 0).unwrap();
        assert_eq!(attribute_count(&p), 3);
        assert_eq!(attribute_at(&p, 0), Some(("id".to_string(), "a".to_string())));
        remove_attribute_at(&p, 0);
        set_attribute_at(&p, 0, "z");
        assert_eq!(attribute_at(&p, 0), Some(("title".to_string(), "z".to_string())));
        assert_eq!(take_attribute_names(&p), vec!["title".to_string(), "lang".to_string()]);
        assert_eq!(attribute_count(&p), 0);
    }

    #[test]
    fn test_text_replacement() {
        let (_dom, root) = fragment("<style>p { color: red }</style>");
        let style = child_at(&root, 0).unwrap();
        assert_eq!(text_content(&style), "p { color: red }");
        replace_text(&style, "p {}");
        assert_eq!(text_content(&style), "p {}");
        assert_eq!(child_count(&style), 1);
    }
}
