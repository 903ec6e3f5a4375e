use manos_dom_core::walk::{self, Direction};
use manos_dom_core::{Dom, NodeId, inner_html, is_text, parse_html_into};
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

fn label(dom: &Dom, node: NodeId) -> String {
    dom.tag(node)
        .or_else(|| dom.text(node))
        .unwrap_or_default()
        .to_string()
}

#[test]
fn next_descends_into_nested_inline_elements() {
    let (dom, area) = area_with("<p>a<b><i>x</i></b></p><p>c</p>");
    let a = text_node(&dom, area, "a");
    let x = text_node(&dom, area, "x");
    let c = text_node(&dom, area, "c");

    assert_eq!(walk::next(&dom, a, is_text, area), Some(x));
    assert_eq!(walk::next(&dom, x, is_text, area), Some(c));
    assert_eq!(walk::next(&dom, c, is_text, area), None);
}

#[test]
fn prev_walks_in_reverse_document_order() {
    let (dom, area) = area_with("<p>a<b>b</b></p><p>c</p>");
    let b = text_node(&dom, area, "b");
    let c = text_node(&dom, area, "c");

    assert_eq!(walk::prev(&dom, c, is_text, area), Some(b));
}

#[test]
fn find_without_children_only_visits_siblings_and_ancestors() {
    let (dom, area) = area_with("<p>a<b>b</b>c</p>");
    let a = text_node(&dom, area, "a");
    let c = text_node(&dom, area, "c");

    let found = walk::find(&dom, a, is_text, area, false, Direction::Forward, None);
    assert_eq!(found, Some(c));
}

#[test]
fn search_stops_at_root() {
    let (dom, area) = area_with("<p>a</p><p>b</p>");
    let first = dom.children(area)[0];
    let a = text_node(&dom, area, "a");

    assert_eq!(walk::next(&dom, a, is_text, first), None);
}

#[test]
fn up_and_closest_include_start_but_never_root() {
    let (dom, area) = area_with("<p><b><i>x</i></b></p>");
    let x = text_node(&dom, area, "x");
    let p = dom.children(area)[0];
    let b = dom.children(p)[0];
    let i = dom.children(b)[0];

    assert_eq!(walk::closest(&dom, i, "i", area), Some(i));
    assert_eq!(walk::closest(&dom, x, &["b", "p"], area), Some(b));
    assert_eq!(walk::closest(&dom, x, "P", area), Some(p));
    assert_eq!(walk::closest(&dom, x, "div", area), None);
    assert_eq!(walk::closest(&dom, x, "p", p), None);

    let is_bold = |dom: &Dom, node: NodeId| dom.tag(node) == Some("b");
    assert_eq!(
        walk::closest(&dom, x, walk::Matcher::Predicate(&is_bold), area),
        Some(b)
    );
    assert_eq!(walk::up(&dom, x, |dom, n| dom.tag(n).is_some(), area), Some(i));
}

#[test]
fn all_visits_pre_order_and_honours_reverse() {
    let (dom, area) = area_with("<p>a<b>b</b></p><ul><li>c</li></ul>");
    let mut forward = Vec::new();
    walk::all(
        &dom,
        area,
        |dom, node| {
            forward.push(label(dom, node));
            false
        },
        false,
    );
    assert_eq!(forward, ["div", "p", "a", "b", "b", "ul", "li", "c"]);

    let mut backward = Vec::new();
    walk::all(
        &dom,
        area,
        |dom, node| {
            backward.push(label(dom, node));
            dom.tag(node) == Some("p")
        },
        true,
    );
    assert_eq!(backward, ["div", "ul", "li", "c", "p"]);
}

#[test]
fn each_survives_removal_of_the_visited_node() {
    let (mut dom, area) = area_with("<div><b>1</b><i>2</i><u>3</u></div>");
    let holder = dom.children(area)[0];

    let mut visited = Vec::new();
    let completed = walk::each(&mut dom, holder, |dom, node| {
        visited.push(label(dom, node));
        if dom.tag(node).is_some() {
            dom.remove(node);
        }
        true
    });

    assert!(completed);
    assert_eq!(visited, ["b", "1", "i", "2", "u", "3"]);
    assert_eq!(inner_html(&dom, holder), "");
}

#[test]
fn each_aborts_when_callback_returns_false() {
    let (mut dom, area) = area_with("<b>1</b><i>2</i><u>3</u>");

    let mut visited = Vec::new();
    let completed = walk::each(&mut dom, area, |dom, node| {
        visited.push(label(dom, node));
        dom.tag(node) != Some("i")
    });

    assert!(!completed);
    assert_eq!(visited, ["b", "1", "i"]);
}
