//! Small HTML helpers shared by the portal drivers.
//!
//! Everything here works on a parsed `scraper::Html` and returns owned data,
//! so no document is held across an `.await`.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScraperError;

pub(crate) fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::PageStructure {
        url: String::new(),
        reason: format!("invalid selector {css:?}: {e:?}"),
    })
}

/// Concatenated, trimmed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Resolve `href` against the page URL.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// The last path segment of a URL or path, without query or fragment.
pub(crate) fn last_path_segment(href: &str) -> &str {
    let without_query = href.split(['?', '#']).next().unwrap_or(href);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}

/// A form as it would be submitted by a browser without user edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HtmlForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl HtmlForm {
    /// Replace the value of `name`, or append it when absent.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == name) {
            field.1 = value.to_owned();
        } else {
            self.fields.push((name.to_owned(), value.to_owned()));
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read the first form matching `form_css` with its default field values.
///
/// Submit buttons and unchecked checkboxes/radios are left out, as a browser
/// would. The action is resolved against `base`; a missing action posts
/// back to `base`.
pub(crate) fn parse_form(
    document: &Html,
    form_css: &str,
    base: &Url,
) -> Result<HtmlForm, ScraperError> {
    let form_selector = selector(form_css)?;
    let input_selector = selector("input[name]")?;

    let form = document
        .select(&form_selector)
        .next()
        .ok_or_else(|| ScraperError::PageStructure {
            url: base.to_string(),
            reason: format!("no form matching {form_css:?}"),
        })?;

    let action = form
        .value()
        .attr("action")
        .filter(|a| !a.trim().is_empty())
        .and_then(|a| resolve_href(base, a))
        .unwrap_or_else(|| base.to_string());

    let mut fields = Vec::new();
    for input in form.select(&input_selector) {
        let attrs = input.value();
        let Some(name) = attrs.attr("name") else {
            continue;
        };
        let kind = attrs.attr("type").unwrap_or("text").to_ascii_lowercase();
        let skip = match kind.as_str() {
            "submit" | "button" | "image" | "reset" | "file" => true,
            "checkbox" | "radio" => attrs.attr("checked").is_none(),
            _ => false,
        };
        if skip {
            continue;
        }
        fields.push((name.to_owned(), attrs.attr("value").unwrap_or("").to_owned()));
    }

    Ok(HtmlForm { action, fields })
}
