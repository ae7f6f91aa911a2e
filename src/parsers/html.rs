use scraper::ElementRef;
use scraper::node::Node;

/// Elements whose text never renders
const NON_RENDERED: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Rendered text of an element: text nodes concatenated, whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an element would be shown to the user.
///
/// Static markup has no layout, so this only honours what the markup itself
/// says: `hidden`, `aria-hidden="true"`, inline `display:none` or
/// `visibility:hidden` on the element or any ancestor, and non-rendered
/// containers such as `script`.
pub fn is_visible(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|el| !hides_content(el))
}

/// Visible, non-blank text nodes under `scope`, whitespace collapsed
pub fn visible_text_nodes(scope: ElementRef<'_>) -> Vec<String> {
    scope
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if !is_visible(parent) {
                return None;
            }
            let text = collapse_whitespace(text);
            if text.is_empty() { None } else { Some(text) }
        })
        .collect()
}

fn hides_content(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if NON_RENDERED.contains(&el.name()) {
        return true;
    }
    if el.attr("hidden").is_some() {
        return true;
    }
    if el
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    if let Some(style) = el.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_document("<div id='x'>\n  6E <b>2134</b>\n </div>");
        assert_eq!(element_text(first(&doc, "#x")), "6E 2134");
    }

    #[test]
    fn test_hidden_ancestors_hide_children() {
        let doc = Html::parse_document(
            r#"<div style="display: none"><p id="a">x</p></div>
               <div hidden><p id="b">x</p></div>
               <div aria-hidden="true"><p id="c">x</p></div>
               <div><p id="d">x</p></div>"#,
        );
        assert!(!is_visible(first(&doc, "#a")));
        assert!(!is_visible(first(&doc, "#b")));
        assert!(!is_visible(first(&doc, "#c")));
        assert!(is_visible(first(&doc, "#d")));
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Html::parse_document(
            "<html><head><title>t</title></head><body><script>var error = 1;</script><p>Hello</p></body></html>",
        );
        let texts = visible_text_nodes(doc.root_element());
        assert_eq!(texts, vec!["Hello".to_string()]);
    }
}
