use manos_dom_core::{
    Boundary, Dom, Mode, NodeFactory, NodeId, Range, Selection, SelectionManager, Style,
    StyleCommit, StyleOptions, inner_html, parse_html_into, parse_marked, to_marked, walk,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn editable(marked: &str) -> (Dom, NodeId, Selection) {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let area = dom.create_element(dom.realm(doc), "div");
    dom.append_child(doc, area);
    let selection = parse_marked(&mut dom, area, marked);
    (dom, area, selection)
}

fn bold() -> Style {
    Style::new(StyleOptions::element("strong"))
}

fn apply(style: &Style, marked: &str) -> (String, String) {
    let (mut dom, area, mut selection) = editable(marked);
    style.apply(&mut dom, &mut selection);
    (inner_html(&dom, area), to_marked(&dom, &selection))
}

#[test]
fn bold_wraps_the_selected_text() {
    let (html, marked) = apply(&bold(), "<p>Tex[t to te]xt</p>");
    assert_eq!(html, "<p>Tex<strong>t to te</strong>xt</p>");
    assert_eq!(marked, "<p>Tex[<strong>t to te</strong>]xt</p>");
}

#[test]
fn applying_twice_gives_back_the_original() {
    let style = bold();
    let (mut dom, area, mut selection) = editable("<p>Tex[t to te]xt</p>");

    style.apply(&mut dom, &mut selection);
    style.apply(&mut dom, &mut selection);

    assert_eq!(inner_html(&dom, area), "<p>Text to text</p>");
    assert_eq!(to_marked(&dom, &selection), "<p>Tex[t to te]xt</p>");
}

#[test]
fn bold_still_applies_after_a_toggle_left_split_text() {
    let style = bold();
    let (mut dom, area, mut selection) = editable("<p>a[b]cd</p>");
    style.apply(&mut dom, &mut selection);
    style.apply(&mut dom, &mut selection);
    assert_eq!(to_marked(&dom, &selection), "<p>a[b]cd</p>");

    let cd = walk::query_all(&dom, area, |dom, node| dom.text(node) == Some("cd"))[0];
    selection.set_range(Some(Range {
        start: Boundary::new(cd, 0),
        end: Boundary::new(cd, 1),
    }));
    style.apply(&mut dom, &mut selection);

    assert_eq!(inner_html(&dom, area), "<p>ab<strong>c</strong>d</p>");
    assert_eq!(to_marked(&dom, &selection), "<p>ab[<strong>c</strong>]d</p>");
}

#[test]
fn adjacent_text_nodes_before_the_selection_are_merged_first() {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let realm = dom.realm(doc);
    let area = dom.create_element(realm, "div");
    let p = dom.create_element(realm, "p");
    dom.append_child(doc, area);
    dom.append_child(area, p);
    let mut cd = p;
    for text in ["a", "b", "cd"] {
        cd = dom.create_text(realm, text);
        dom.append_child(p, cd);
    }
    let mut selection = Selection::with_range(
        area,
        Range {
            start: Boundary::new(cd, 0),
            end: Boundary::new(cd, 1),
        },
    );

    bold().apply(&mut dom, &mut selection);
    assert_eq!(inner_html(&dom, area), "<p>ab<strong>c</strong>d</p>");
}

#[test]
fn inline_style_never_splits_a_matching_block() {
    let style = Style::new(StyleOptions::css("color", "red"));
    let (mut dom, area, mut selection) = editable("<p style=\"color: red\">a[b]c</p>");

    style.apply(&mut dom, &mut selection);
    assert_eq!(dom.children(area).len(), 1);
    assert_eq!(
        inner_html(&dom, area),
        "<p style=\"color: red\">a<span style=\"color: red;\">b</span>c</p>"
    );
}

#[test]
fn suitable_ancestor_is_split_around_the_fragment() {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let area = dom.create_element(dom.realm(doc), "div");
    dom.append_child(doc, area);
    parse_html_into(&mut dom, area, "<p><strong>zxc<font>sel</font>dfdsf</strong></p>");
    let font = walk::query_all(&dom, area, |dom, node| dom.tag(node) == Some("font"))[0];
    let p = dom.children(area)[0];

    let style = bold();
    let mut commit = StyleCommit::new(&style, area, NodeFactory::for_node(&dom, area));
    commit.apply_to_element(&mut dom, font);

    assert_eq!(
        inner_html(&dom, p),
        "<strong>zxc</strong><font>sel</font><strong>dfdsf</strong>"
    );
    assert_eq!(commit.mode(), Mode::Unwrap);
}

#[test]
fn first_fragment_decides_for_the_rest() {
    let style = bold();
    let (mut dom, area, mut selection) = editable("<p>[<strong>a</strong></p><p>b</p><p>c]</p>");

    style.apply(&mut dom, &mut selection);
    assert_eq!(inner_html(&dom, area), "<p>a</p><p>b</p><p>c</p>");
    assert_eq!(to_marked(&dom, &selection), "<p>[a</p><p>b</p><p>c]</p>");

    style.apply(&mut dom, &mut selection);
    assert_eq!(
        inner_html(&dom, area),
        "<p><strong>a</strong></p><p><strong>b</strong></p><p><strong>c</strong></p>"
    );
}

#[test]
fn color_uses_a_styled_span_and_toggles_off() {
    let style = Style::new(StyleOptions::css("color", "red"));
    let (mut dom, area, mut selection) = editable("<p>a[bc]d</p>");

    style.apply(&mut dom, &mut selection);
    assert_eq!(
        inner_html(&dom, area),
        "<p>a<span style=\"color: red;\">bc</span>d</p>"
    );

    style.apply(&mut dom, &mut selection);
    assert_eq!(inner_html(&dom, area), "<p>abcd</p>");
    assert_eq!(to_marked(&dom, &selection), "<p>a[bc]d</p>");
}

#[test]
fn collapsed_selection_gets_an_empty_wrapper() {
    let (html, marked) = apply(&bold(), "<p>ab|cd</p>");
    assert_eq!(html, "<p>ab<strong></strong>cd</p>");
    assert_eq!(marked, "<p>ab<strong>|</strong>cd</p>");
}

#[test]
fn collapsed_selection_inside_the_style_splits_it() {
    let (html, marked) = apply(&bold(), "<p><strong>ab|cd</strong></p>");
    assert_eq!(html, "<p><strong>ab</strong><strong>cd</strong></p>");
    assert_eq!(marked, "<p><strong>ab</strong>|<strong>cd</strong></p>");
}

#[test]
fn block_style_replaces_and_then_removes_the_block() {
    let heading = Style::new(StyleOptions::element("h1"));

    let (html, marked) = apply(&heading, "<p>a[b]c</p>");
    assert_eq!(html, "<h1>abc</h1>");
    assert_eq!(marked, "<h1>a[b]c</h1>");

    let (html, marked) = apply(&heading, "<h1>[abc]</h1>");
    assert_eq!(html, "abc");
    assert_eq!(marked, "[abc]");
}

#[test]
fn nothing_happens_without_a_range() {
    let (mut dom, area, _) = editable("<p>abc</p>");
    let mut selection = Selection::new(area);
    bold().apply(&mut dom, &mut selection);
    assert_eq!(inner_html(&dom, area), "<p>abc</p>");
}

#[rstest]
#[case::target_tag_loose(StyleOptions::element("strong"), "<strong>x</strong>", false, true)]
#[case::target_tag_strict(StyleOptions::element("strong"), "<strong>x</strong>", true, true)]
#[case::default_tag_loose(StyleOptions::css("color", "red"), "<span>x</span>", false, true)]
#[case::default_tag_strict(StyleOptions::css("color", "red"), "<span>x</span>", true, false)]
#[case::other_tag(StyleOptions::element("strong"), "<em>x</em>", false, false)]
#[case::equivalent_color(
    StyleOptions::css("color", "rgb(255, 0, 0)"),
    "<span style=\"color: #FF0000\">x</span>",
    true,
    true
)]
#[case::empty_styled_span(StyleOptions::css("color", "red"), "<span style=\"color: red\"></span>", true, false)]
#[case::different_color(StyleOptions::css("color", "red"), "<em style=\"color: blue\">x</em>", true, false)]
fn suitable_elements(
    #[case] options: StyleOptions,
    #[case] html: &str,
    #[case] strict: bool,
    #[case] expected: bool,
) {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let area = dom.create_element(dom.realm(doc), "div");
    dom.append_child(doc, area);
    let node = parse_html_into(&mut dom, area, html)[0];

    let style = Style::new(options);
    assert_eq!(style.is_suitable_element(&dom, node, strict), expected);
}
