//! Element locators
//!
//! Steps address elements by CSS selector, form label, visible text, or
//! role + accessible name. A locator is resolved to a concrete element
//! immediately before every interaction: element references are never
//! reused across actions that may re-render the page.

use serde::Deserialize;

/// How a step addresses an element on the page.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector, e.g. `#email` or `button.submit`
    Css(String),
    /// Form control associated with a `<label>` containing this text
    Label(String),
    /// Element whose text content contains this string
    Text(String),
    /// Role and accessible name, e.g. `role: [button, Entrar]`
    Role(String, String),
}

/// A locator lowered to a concrete page query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Locator {
    /// Lower the locator to a CSS or XPath query.
    pub fn to_query(&self) -> Query {
        match self {
            Locator::Css(selector) => Query::Css(selector.clone()),
            Locator::Label(text) => {
                let t = xpath_literal(text);
                // The label either wraps the control or points at it via @for.
                Query::XPath(format!(
                    "//label[contains(normalize-space(.), {t})]//input \
                     | //label[contains(normalize-space(.), {t})]//textarea \
                     | //label[contains(normalize-space(.), {t})]//select \
                     | //*[@id = //label[contains(normalize-space(.), {t})]/@for]"
                ))
            }
            Locator::Text(content) => {
                let t = xpath_literal(content);
                Query::XPath(format!(
                    "//*[contains(normalize-space(text()), {t})]"
                ))
            }
            Locator::Role(role, name) => Query::XPath(role_xpath(role, name)),
        }
    }

    /// JS expression evaluating to the first matching element, or null.
    ///
    /// Used for visibility probes and forced interactions, where we run
    /// inside the page rather than through an element handle.
    pub fn js_resolver(&self) -> String {
        match self.to_query() {
            Query::Css(selector) => {
                format!("document.querySelector({})", js_literal(&selector))
            }
            Query::XPath(expr) => format!(
                "document.evaluate({}, document, null, \
                 XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_literal(&expr)
            ),
        }
    }

    /// Human-readable description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Locator::Css(s) => format!("css '{s}'"),
            Locator::Label(t) => format!("label '{t}'"),
            Locator::Text(t) => format!("text '{t}'"),
            Locator::Role(role, name) => format!("{role} '{name}'"),
        }
    }
}

/// Map a role + accessible name to an XPath over the common implicit-role
/// elements, with an explicit `@role` fallback.
fn role_xpath(role: &str, name: &str) -> String {
    let n = xpath_literal(name);
    let explicit = format!(
        "//*[@role = {r} and contains(normalize-space(.), {n})]",
        r = xpath_literal(role)
    );
    match role {
        "button" => format!(
            "//button[contains(normalize-space(.), {n})] \
             | //input[(@type = \"submit\" or @type = \"button\") and contains(@value, {n})] \
             | {explicit}"
        ),
        "link" => format!("//a[contains(normalize-space(.), {n})] | {explicit}"),
        "heading" => format!(
            "//*[self::h1 or self::h2 or self::h3 or self::h4 or self::h5 or self::h6]\
             [contains(normalize-space(.), {n})] | {explicit}"
        ),
        "checkbox" => format!(
            "//input[@type = \"checkbox\" and (@aria-label = {n} or @name = {n})] \
             | {explicit}"
        ),
        "textbox" => format!(
            "//input[@aria-label = {n} or @placeholder = {n} or @name = {n}] \
             | //textarea[@aria-label = {n} or @placeholder = {n} or @name = {n}] \
             | {explicit}"
        ),
        _ => explicit,
    }
}

/// Quote a string as an XPath 1.0 literal. XPath has no escape sequences,
/// so strings containing both quote kinds need concat().
fn xpath_literal(s: &str) -> String {
    if !s.contains('"') {
        format!("\"{s}\"")
    } else if !s.contains('\'') {
        format!("'{s}'")
    } else {
        let parts: Vec<String> = s
            .split('"')
            .map(|p| format!("\"{p}\""))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Quote a string as a JS literal via JSON encoding.
fn js_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
