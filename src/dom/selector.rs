//! Reproducible selectors and short summaries.
//!
//! A selector is the path used to re-locate an element once its handle has
//! gone stale (hot reload replaced the node). The shape is:
//!
//! - `#id` when the element has a usable id
//! - otherwise `tag` or `tag:nth-of-type(n)` segments joined by ` > `,
//!   anchored at the nearest ancestor with a usable id, or at the root
//!
//! ```ignore
//! build_selector(&dom, el); // "#app > ul > li:nth-of-type(2)"
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use super::{ElementInfo, PageDom};
use crate::identifiers::ElementHandle;

// ============================================================================
// Constants
// ============================================================================

/// CSS identifiers usable without escaping.
static CSS_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("identifier pattern is valid")
});

/// Upper bound on path depth.
const MAX_DEPTH: usize = 32;

// ============================================================================
// Functions
// ============================================================================

/// Whether `value` can be used as `#value` or `.value` verbatim.
#[must_use]
pub fn is_css_identifier(value: &str) -> bool {
    CSS_IDENT.is_match(value)
}

/// Builds a selector that re-locates `element`.
///
/// Returns `None` for an element the page cannot describe.
pub fn build_selector<D: PageDom + ?Sized>(dom: &D, element: ElementHandle) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = element;

    for _ in 0..MAX_DEPTH {
        let info = dom.describe(current)?;

        if let Some(id) = usable_id(&info) {
            segments.push(format!("#{id}"));
            break;
        }

        let segment = match dom.nth_of_type(current) {
            Some((index, count)) if count > 1 => format!("{}:nth-of-type({index})", info.tag),
            _ => info.tag.clone(),
        };
        segments.push(segment);

        match dom.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    segments.reverse();
    Some(segments.join(" > "))
}

/// Short label: component name, else `tag#id.firstClass`.
#[must_use]
pub fn build_summary(info: &ElementInfo) -> String {
    if let Some(component) = &info.component {
        return component.name.clone();
    }

    let mut summary = info.tag.clone();
    if let Some(id) = &info.id {
        summary.push('#');
        summary.push_str(id);
    }
    if let Some(class) = info.classes.first() {
        summary.push('.');
        summary.push_str(class);
    }
    summary
}

fn usable_id(info: &ElementInfo) -> Option<&str> {
    info.id.as_deref().filter(|id| is_css_identifier(id))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::protocol::ComponentInfo;

    #[test]
    fn test_css_identifier() {
        assert!(is_css_identifier("app"));
        assert!(is_css_identifier("-x_1"));
        assert!(!is_css_identifier("1abc"));
        assert!(!is_css_identifier("a b"));
        assert!(!is_css_identifier(""));
    }

    #[test]
    fn test_selector_prefers_id() {
        let dom = MemoryDom::new();
        let body = dom.insert(None, ElementInfo::new("body"));
        let button = dom.insert(Some(body), ElementInfo::new("button").with_id("save"));

        assert_eq!(build_selector(&dom, button).as_deref(), Some("#save"));
    }

    #[test]
    fn test_selector_path_with_nth_of_type() {
        let dom = MemoryDom::new();
        let body = dom.insert(None, ElementInfo::new("body"));
        let app = dom.insert(Some(body), ElementInfo::new("div").with_id("app"));
        let list = dom.insert(Some(app), ElementInfo::new("ul"));
        dom.insert(Some(list), ElementInfo::new("li"));
        let second = dom.insert(Some(list), ElementInfo::new("li"));

        assert_eq!(
            build_selector(&dom, second).as_deref(),
            Some("#app > ul > li:nth-of-type(2)")
        );
    }

    #[test]
    fn test_selector_ignores_unusable_id() {
        let dom = MemoryDom::new();
        let body = dom.insert(None, ElementInfo::new("body"));
        let span = dom.insert(Some(body), ElementInfo::new("span").with_id("1 bad"));

        assert_eq!(build_selector(&dom, span).as_deref(), Some("body > span"));
    }

    #[test]
    fn test_summary() {
        let plain = ElementInfo::new("div").with_id("card").with_class("p-4").with_class("m-2");
        assert_eq!(build_summary(&plain), "div#card.p-4");
        assert_eq!(build_summary(&ElementInfo::new("span")), "span");

        let component = plain.with_component(ComponentInfo::named("PricingCard"));
        assert_eq!(build_summary(&component), "PricingCard");
    }
}
