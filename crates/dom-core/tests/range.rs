use std::cmp::Ordering;

use manos_dom_core::{
    Boundary, Dom, NodeId, Range, compare_boundaries, extract_contents, inner_html,
    parse_html_into, text_offset, walk,
};
use pretty_assertions::assert_eq;

fn area_with(html: &str) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let area = dom.create_element(dom.realm(doc), "div");
    dom.append_child(doc, area);
    parse_html_into(&mut dom, area, html);
    (dom, area)
}

fn text_node(dom: &Dom, area: NodeId, text: &str) -> NodeId {
    walk::query_all(dom, area, |dom, node| dom.text(node) == Some(text))[0]
}

#[test]
fn boundaries_compare_in_document_order() {
    let (dom, area) = area_with("<p>ab<b>cd</b>ef</p>");
    let p = dom.children(area)[0];
    let ab = text_node(&dom, area, "ab");
    let cd = text_node(&dom, area, "cd");

    let cmp = |a, b| compare_boundaries(&dom, a, b);
    assert_eq!(cmp(Boundary::new(ab, 1), Boundary::new(ab, 2)), Ordering::Less);
    assert_eq!(cmp(Boundary::new(p, 1), Boundary::new(cd, 0)), Ordering::Less);
    assert_eq!(cmp(Boundary::new(p, 2), Boundary::new(cd, 2)), Ordering::Greater);
    assert_eq!(cmp(Boundary::new(cd, 0), Boundary::new(ab, 2)), Ordering::Greater);
    assert_eq!(cmp(Boundary::new(p, 0), Boundary::new(p, 0)), Ordering::Equal);
}

#[test]
fn range_orders_its_points_and_contains_whole_nodes() {
    let (dom, area) = area_with("<p>ab<b>cd</b>ef</p>");
    let p = dom.children(area)[0];
    let ab = text_node(&dom, area, "ab");
    let ef = text_node(&dom, area, "ef");
    let b = dom.children(p)[1];

    let range = Range::new(&dom, Boundary::new(ef, 1), Boundary::new(ab, 1));
    assert_eq!(range.start, Boundary::new(ab, 1));
    assert!(range.contains_node(&dom, b));
    assert!(!range.contains_node(&dom, ab));
    assert_eq!(range.common_ancestor(&dom), p);

    let whole = Range::select_node_contents(&dom, p);
    assert!(whole.contains_node(&dom, ab));
    assert!(whole.contains_node(&dom, ef));
    assert!(!whole.contains_node(&dom, p));
}

#[test]
fn extract_clones_partially_selected_ancestors() {
    let (mut dom, area) = area_with("<p>ab<b>cd</b>ef</p>");
    let p = dom.children(area)[0];
    let ab = text_node(&dom, area, "ab");
    let cd = text_node(&dom, area, "cd");

    let mut range = Range {
        start: Boundary::new(ab, 1),
        end: Boundary::new(cd, 1),
    };
    let fragment = extract_contents(&mut dom, &mut range);

    assert_eq!(inner_html(&dom, fragment), "b<b>c</b>");
    assert_eq!(inner_html(&dom, area), "<p>a<b>d</b>ef</p>");
    assert!(range.is_collapsed());
    assert_eq!(range.start, Boundary::new(p, 1));
}

#[test]
fn extract_within_one_text_node() {
    let (mut dom, area) = area_with("<p>hello</p>");
    let text = text_node(&dom, area, "hello");

    let mut range = Range {
        start: Boundary::new(text, 1),
        end: Boundary::new(text, 4),
    };
    let fragment = extract_contents(&mut dom, &mut range);

    assert_eq!(inner_html(&dom, fragment), "ell");
    assert_eq!(inner_html(&dom, area), "<p>ho</p>");
    assert_eq!(range, Range::collapsed(Boundary::new(text, 1)));
}

#[test]
fn extract_moves_fully_contained_siblings() {
    let (mut dom, area) = area_with("<p>a</p><p>b</p><p>c</p>");
    let mut range = Range {
        start: Boundary::new(area, 1),
        end: Boundary::new(area, 3),
    };
    let fragment = extract_contents(&mut dom, &mut range);

    assert_eq!(inner_html(&dom, fragment), "<p>b</p><p>c</p>");
    assert_eq!(inner_html(&dom, area), "<p>a</p>");
}

#[test]
fn text_offset_counts_preceding_characters() {
    let (dom, area) = area_with("<p>ab<b>cd</b></p><p>ef</p>");
    let p = dom.children(area)[0];
    let cd = text_node(&dom, area, "cd");
    let ef = text_node(&dom, area, "ef");

    assert_eq!(text_offset(&dom, area, Boundary::new(cd, 1)), 3);
    assert_eq!(text_offset(&dom, area, Boundary::new(p, 1)), 2);
    assert_eq!(text_offset(&dom, area, Boundary::new(ef, 2)), 6);
}
