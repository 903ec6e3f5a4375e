//! Applying and removing one inline or block style over a selection.
//!
//! A [`Style`] describes the target (a tag, CSS declarations, or both). Each
//! call to [`Style::apply`] runs a [`StyleCommit`], which decides on its first
//! structural change whether the pass wraps or unwraps and then sticks to that
//! decision for every remaining fragment of the selection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{
    BLOCK_TAGS, FRAGMENT_ATTR, can_split_block, is_block, is_empty, is_marker, is_normal_node,
};
use crate::css::{computed_css, inline_css, kebab_case, normalize_css_value, set_css};
use crate::dom::{Dom, NodeId};
use crate::mutate::{self, ElementFactory, NodeFactory, ReplaceOptions};
use crate::range::{Boundary, Range, extract_contents};
use crate::selection::SelectionManager;
use crate::walk;

/// Tags that only exist to carry inline styles.
const GENERIC_INLINE_TAGS: &[&str] = &["span", "font"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    pub element: Option<String>,
    pub default_tag: Option<String>,
    pub style: Option<BTreeMap<String, String>>,
}

impl StyleOptions {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            element: Some(tag.into().to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn css(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().with_css(property, value)
    }

    pub fn with_css(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style
            .get_or_insert_with(BTreeMap::new)
            .insert(property.into(), value.into());
        self
    }

    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = Some(tag.into().to_ascii_lowercase());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    options: StyleOptions,
}

impl Style {
    pub fn new(options: StyleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StyleOptions {
        &self.options
    }

    pub fn element_is_block(&self) -> bool {
        self.options
            .element
            .as_deref()
            .is_some_and(|tag| BLOCK_TAGS.contains(&tag))
    }

    pub fn default_tag(&self) -> &str {
        match self.options.default_tag.as_deref() {
            Some(tag) => tag,
            None if self.element_is_block() => "p",
            None => "span",
        }
    }

    pub fn element(&self) -> &str {
        self.options
            .element
            .as_deref()
            .unwrap_or_else(|| self.default_tag())
    }

    pub fn element_is_default(&self) -> bool {
        self.element() == self.default_tag()
    }

    /// CSS declarations with kebab-cased property names.
    pub fn rules(&self) -> Vec<(String, String)> {
        self.options
            .style
            .iter()
            .flatten()
            .map(|(name, value)| (kebab_case(name), value.clone()))
            .collect()
    }

    pub fn has_css(&self) -> bool {
        self.options.style.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Whether `node` already carries this style, either by tag or by its own
    /// inline declarations.
    pub fn is_suitable_element(&self, dom: &Dom, node: NodeId, strict: bool) -> bool {
        let Some(tag) = dom.tag(node) else {
            return false;
        };

        if (!self.element_is_default() || !strict) && tag == self.element() {
            return true;
        }

        self.has_css()
            && self.rules().iter().all(|(property, value)| {
                inline_css(dom, node, property).is_some_and(|own| {
                    normalize_css_value(property, &own)
                        .eq_ignore_ascii_case(&normalize_css_value(property, value))
                })
            })
            && !is_marker(dom, node)
            && !is_empty(dom, node, None)
    }

    /// Applies or removes the style over the current selection of
    /// `selection`, then restores the selection.
    pub fn apply(&self, dom: &mut Dom, selection: &mut dyn SelectionManager) {
        if selection.range().is_none() {
            tracing::debug!(element = self.element(), "no selection to style");
            return;
        }

        let area = selection.area();
        let mut commit = StyleCommit::new(self, area, NodeFactory::for_node(dom, area));

        if selection.is_collapsed() {
            let anchor = commit.factory.element(dom, "font");
            dom.set_attr(anchor, FRAGMENT_ATTR, "true");
            selection.insert_node(dom, anchor);
            selection.set_cursor_in(dom, anchor, true);

            let marker = selection.save(dom);
            commit.apply_to_element(dom, anchor);
            mutate::unwrap(dom, anchor);
            selection.restore(dom, marker);
        } else {
            let marker = selection.save(dom);
            let first = dom.first_child(area);
            mutate::normalize_node(dom, first);
            if let Some(marker) = &marker {
                selection.reselect(dom, marker);
            }
            selection.each_selection(dom, &mut |dom: &mut Dom, fragment: NodeId| {
                commit.apply_to_element(dom, fragment);
            });

            for leftover in walk::query_all(dom, area, |dom, node| dom.has_attr(node, FRAGMENT_ATTR))
            {
                mutate::unwrap(dom, leftover);
            }
            selection.restore(dom, marker);
        }

        tracing::debug!(element = self.element(), mode = ?commit.mode(), "style applied");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Undetermined,
    Wrap,
    Unwrap,
}

/// One pass of a [`Style`] over a selection.
pub struct StyleCommit<'a> {
    style: &'a Style,
    area: NodeId,
    factory: NodeFactory,
    mode: Mode,
}

impl<'a> StyleCommit<'a> {
    pub fn new(style: &'a Style, area: NodeId, factory: NodeFactory) -> Self {
        Self {
            style,
            area,
            factory,
            mode: Mode::Undetermined,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn settle(&mut self, mode: Mode) {
        if self.mode == Mode::Undetermined {
            tracing::trace!(?mode, "commit mode decided");
            self.mode = mode;
        }
    }

    pub fn apply_to_element(&mut self, dom: &mut Dom, fragment: NodeId) {
        let realm = dom.realm(self.area);

        if let Some(parent) = dom.parent(fragment)
            && parent != self.area
            && self.style.is_suitable_element(dom, parent, false)
            && (!is_block(dom, parent, realm) || self.style.element_is_block())
            && !self.has_normal_siblings(dom, fragment)
        {
            tracing::trace!(?fragment, ?parent, "toggling suitable parent");
            self.toggle_styles(dom, parent);
            return;
        }

        let normal_children: Vec<NodeId> = dom
            .children(fragment)
            .iter()
            .copied()
            .filter(|&child| is_normal_node(dom, child))
            .collect();
        if let [child] = normal_children[..]
            && self.style.is_suitable_element(dom, child, false)
        {
            tracing::trace!(?fragment, ?child, "toggling suitable child");
            self.toggle_styles(dom, child);
            return;
        }

        if let Some(wrapper) = dom.parent(fragment).and_then(|parent| {
            walk::up(
                dom,
                parent,
                |dom, node| {
                    self.style.is_suitable_element(dom, node, true)
                        && (!is_block(dom, node, realm) || self.style.element_is_block())
                },
                self.area,
            )
        }) {
            if self.mode == Mode::Wrap {
                return;
            }
            tracing::trace!(?fragment, ?wrapper, "splitting suitable ancestor");
            self.isolate(dom, wrapper, fragment);
            self.toggle_styles(dom, wrapper);
            return;
        }

        let mut matches = Vec::new();
        for child in dom.children(fragment).to_vec() {
            walk::all(
                dom,
                child,
                |dom, node| {
                    let suitable = self.style.is_suitable_element(dom, node, true);
                    if suitable {
                        matches.push(node);
                    }
                    suitable
                },
                false,
            );
        }
        if !matches.is_empty() {
            tracing::trace!(?fragment, count = matches.len(), "clearing nested matches");
            for node in matches {
                self.clear_match(dom, node);
            }
            self.settle(Mode::Unwrap);
            if self.mode != Mode::Wrap {
                return;
            }
        }

        self.settle(Mode::Wrap);
        if self.mode != Mode::Wrap {
            return;
        }
        self.wrap(dom, fragment);
    }

    fn has_normal_siblings(&self, dom: &Dom, node: NodeId) -> bool {
        dom.parent(node).is_some_and(|parent| {
            dom.children(parent)
                .iter()
                .any(|&sibling| sibling != node && is_normal_node(dom, sibling))
        })
    }

    /// Moves whatever `wrapper` holds before and after `fragment` into clones
    /// of `wrapper` placed on either side of it.
    fn isolate(&self, dom: &mut Dom, wrapper: NodeId, fragment: NodeId) {
        let Some(parent) = dom.parent(wrapper) else {
            return;
        };

        let left = match (Boundary::before(dom, wrapper), Boundary::before(dom, fragment)) {
            (Some(start), Some(end)) => {
                let mut range = Range { start, end };
                Some(extract_contents(dom, &mut range))
            }
            _ => None,
        };
        let right = match (Boundary::after(dom, fragment), Boundary::after(dom, wrapper)) {
            (Some(start), Some(end)) => {
                let mut range = Range { start, end };
                Some(extract_contents(dom, &mut range))
            }
            _ => None,
        };

        if let Some(left) = left {
            unwrap_if_blank(dom, left);
            dom.insert_before(parent, left, Some(wrapper));
        }
        if let Some(right) = right {
            unwrap_if_blank(dom, right);
            let next = dom.next_sibling(wrapper);
            dom.insert_before(parent, right, next);
        }
    }

    fn toggle_styles(&mut self, dom: &mut Dom, elm: NodeId) {
        for (property, value) in self.style.rules() {
            let target = normalize_css_value(&property, &value);
            let current = computed_css(dom, elm, &property)
                .map(|current| normalize_css_value(&property, &current));
            let already = current.is_some_and(|current| current.eq_ignore_ascii_case(&target));

            if self.mode == Mode::Unwrap || (self.mode == Mode::Undetermined && already) {
                set_css(dom, elm, &property, None);
                self.settle(Mode::Unwrap);
            } else {
                set_css(dom, elm, &property, Some(&value));
                self.settle(Mode::Wrap);
            }
        }

        if self.mode == Mode::Wrap {
            return;
        }

        let realm = dom.realm(self.area);
        let Some(tag) = dom.tag(elm) else {
            return;
        };
        let redundant = if is_block(dom, elm, realm) {
            tag == self.style.element() && !self.style.has_css()
        } else {
            !dom.has_attr(elm, "style")
                && (tag == self.style.element() || GENERIC_INLINE_TAGS.contains(&tag))
        };
        if redundant {
            mutate::unwrap(dom, elm);
            self.settle(Mode::Unwrap);
        }
    }

    /// Strips the style from an element found inside a fragment, dropping the
    /// element once nothing else justifies it. A target-tag element that still
    /// carries other declarations becomes a plain `span`.
    fn clear_match(&self, dom: &mut Dom, node: NodeId) {
        for (property, _) in self.style.rules() {
            set_css(dom, node, &property, None);
        }
        let Some(tag) = dom.tag(node).map(str::to_string) else {
            return;
        };
        let generic = GENERIC_INLINE_TAGS.contains(&tag.as_str());
        if tag != self.style.element() && !generic {
            return;
        }

        if !dom.has_attr(node, "style") {
            mutate::unwrap(dom, node);
        } else if !generic {
            mutate::replace(
                dom,
                node,
                "span",
                &self.factory,
                ReplaceOptions {
                    with_attributes: true,
                    move_content: true,
                },
            );
        }
    }

    fn wrap(&self, dom: &mut Dom, fragment: NodeId) {
        let element = self.style.element();

        let wrapper = if self.style.element_is_block() {
            let realm = dom.realm(self.area);
            let block = walk::up(
                dom,
                fragment,
                |dom, node| can_split_block(dom, node, realm),
                self.area,
            );
            match block {
                Some(block) => mutate::replace(
                    dom,
                    block,
                    element,
                    &self.factory,
                    ReplaceOptions {
                        with_attributes: true,
                        move_content: true,
                    },
                ),
                None => {
                    let Some(wrapper) = mutate::wrap_inline(dom, fragment, element, &self.factory, None)
                    else {
                        return;
                    };
                    wrapper
                }
            }
        } else {
            mutate::replace(dom, fragment, element, &self.factory, ReplaceOptions::default())
        };
        tracing::trace!(?fragment, ?wrapper, element, "wrapped");

        if self.style.element_is_default() {
            for (property, value) in self.style.rules() {
                set_css(dom, wrapper, &property, Some(&value));
            }
        }
    }
}

/// Unwraps the top-level clone of an extracted remainder when it holds no
/// visible text.
fn unwrap_if_blank(dom: &mut Dom, fragment: NodeId) {
    let Some(first) = dom.first_child(fragment) else {
        return;
    };
    if dom.element(first).is_some() && dom.text_content(first).trim().is_empty() {
        mutate::unwrap(dom, first);
    }
}
