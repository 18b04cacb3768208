use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub(crate) static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").unwrap());

static CSRF_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="_csrf"]"#).unwrap());

pub(crate) trait ElementRefExt<'a> {
    /// Trimmed text fragments of the subtree joined by `delimiter`, empty fragments dropped.
    fn to_string(&self, delimiter: &str) -> String;

    /// Rows of this table, looking through `thead`/`tbody`/`tfoot` but not into nested tables.
    fn table_rows(&self) -> Vec<ElementRef<'a>>;

    /// Direct `td` children of a row.
    fn cells(&self) -> Vec<ElementRef<'a>>;

    fn is(&self, tag: &str) -> bool;
}

impl<'a> ElementRefExt<'a> for ElementRef<'a> {
    fn to_string(&self, delimiter: &str) -> String {
        self.text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    fn table_rows(&self) -> Vec<ElementRef<'a>> {
        self.child_elements()
            .flat_map(|child| {
                if child.is("tr") {
                    vec![child]
                } else if child.is("thead") || child.is("tbody") || child.is("tfoot") {
                    child.child_elements().filter(|e| e.is("tr")).collect()
                } else {
                    Vec::new()
                }
            })
            .collect()
    }

    fn cells(&self) -> Vec<ElementRef<'a>> {
        self.child_elements().filter(|e| e.is("td")).collect()
    }

    fn is(&self, tag: &str) -> bool {
        self.value().name().eq_ignore_ascii_case(tag)
    }
}

pub(crate) fn text_of(element: Option<ElementRef<'_>>) -> String {
    element.map(|e| e.to_string("")).unwrap_or_default()
}

/// Value of the first `input[name=...]` matched by `selector`, when non-empty.
pub(crate) fn input_value(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|e| e.attr("value"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn csrf_token(document: &Html) -> Option<String> {
    input_value(document, &CSRF_SELECTOR)
}
