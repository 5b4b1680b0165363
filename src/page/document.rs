use std::fmt;

use thiserror::Error;

pub const BALANCE_ID: &str = "balance";
pub const HISTORY_ID: &str = "history";
pub const SEND_FORM_ID: &str = "sendForm";
pub const RECIPIENT_INPUT: &str = "recipient";
pub const AMOUNT_INPUT: &str = "amount";

/// Where the send form posts to when rendered as HTML.
pub const SEND_FORM_ACTION: &str = "/send";

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("no element with id '{0}'")]
    MissingElement(String),
    #[error("element '{id}' cannot hold {wanted}")]
    WrongKind {
        id: String,
        wanted: &'static str
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// The display surface state is rendered into, addressed by element id.
pub trait Document {
    fn set_text(&mut self, id: &str, text: &str) -> DocumentResult<()>;
    fn clear_children(&mut self, id: &str) -> DocumentResult<()>;
    fn append_list_item(&mut self, id: &str, text: &str) -> DocumentResult<()>;
    /// Shows a blocking message to the user.
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub id: String,
    pub label: String,
    pub kind: &'static str
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Heading(String),
    Text { label: String, text: String },
    List { label: String, items: Vec<String> },
    Form { action: String, inputs: Vec<Input> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub content: Content
}

impl Element {
    fn new(id: &str, content: Content) -> Element {
        Element { id: id.to_owned(), content }
    }
}

/// In-memory page built from one of the fixed templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    title: String,
    elements: Vec<Element>,
    alerts: Vec<String>
}

impl Page {
    /// Balance, send form and transfer history.
    pub fn account() -> Page {
        Page {
            title: "Account".to_owned(),
            elements: vec![
                Element::new("title", Content::Heading("Account".to_owned())),
                Element::new(BALANCE_ID, Content::Text { label: "Balance: $".to_owned(), text: String::new() }),
                Element::new(SEND_FORM_ID, Content::Form {
                    action: SEND_FORM_ACTION.to_owned(),
                    inputs: vec![
                        Input { id: RECIPIENT_INPUT.to_owned(), label: "Recipient".to_owned(), kind: "text" },
                        Input { id: AMOUNT_INPUT.to_owned(), label: "Amount".to_owned(), kind: "number" },
                    ]
                }),
                Element::new(HISTORY_ID, Content::List { label: "Transaction History".to_owned(), items: Vec::new() }),
            ],
            alerts: Vec::new()
        }
    }

    /// Read-only transfer history.
    pub fn history() -> Page {
        Page {
            title: "Transaction History".to_owned(),
            elements: vec![
                Element::new("title", Content::Heading("Transaction History".to_owned())),
                Element::new(HISTORY_ID, Content::List { label: "Transactions".to_owned(), items: Vec::new() }),
            ],
            alerts: Vec::new()
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.element(id).map(|el| &el.content) {
            Some(Content::Text { text, .. }) => Some(text.as_str()),
            _ => None
        }
    }

    pub fn list_items(&self, id: &str) -> Option<&[String]> {
        match self.element(id).map(|el| &el.content) {
            Some(Content::List { items, .. }) => Some(items.as_slice()),
            _ => None
        }
    }

    fn content_mut(&mut self, id: &str) -> DocumentResult<&mut Content> {
        self.elements.iter_mut()
            .find(|el| el.id == id)
            .map(|el| &mut el.content)
            .ok_or_else(|| DocumentError::MissingElement(id.to_owned()))
    }

    fn items_mut(&mut self, id: &str) -> DocumentResult<&mut Vec<String>> {
        match self.content_mut(id)? {
            Content::List { items, .. } => Ok(items),
            _ => Err(DocumentError::WrongKind { id: id.to_owned(), wanted: "list items" })
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));
        html.push_str("<link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n");
        for alert in &self.alerts {
            html.push_str(&format!("<p class=\"alert\" role=\"alert\">{}</p>\n", escape_html(alert)));
        }
        for element in &self.elements {
            let id = escape_html(&element.id);
            match &element.content {
                Content::Heading(text) => {
                    html.push_str(&format!("<h1 id=\"{}\">{}</h1>\n", id, escape_html(text)));
                },
                Content::Text { label, text } => {
                    html.push_str(&format!("<p>{}<span id=\"{}\">{}</span></p>\n", escape_html(label), id, escape_html(text)));
                },
                Content::List { label, items } => {
                    html.push_str(&format!("<h2>{}</h2>\n<ul id=\"{}\">\n", escape_html(label), id));
                    for item in items {
                        html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
                    }
                    html.push_str("</ul>\n");
                },
                Content::Form { action, inputs } => {
                    html.push_str(&format!("<form id=\"{}\" method=\"post\" action=\"{}\">\n", id, escape_html(action)));
                    for input in inputs {
                        let step = if input.kind == "number" { " step=\"0.01\"" } else { "" };
                        html.push_str(&format!(
                            "<label for=\"{0}\">{1}</label> <input id=\"{0}\" name=\"{0}\" type=\"{2}\"{3} required>\n",
                            escape_html(&input.id), escape_html(&input.label), input.kind, step));
                    }
                    html.push_str("<button type=\"submit\">Send</button>\n</form>\n");
                }
            }
        }
        html.push_str("</body>\n</html>\n");
        return html;
    }
}

impl Document for Page {
    fn set_text(&mut self, id: &str, value: &str) -> DocumentResult<()> {
        match self.content_mut(id)? {
            Content::Text { text, .. } => {
                *text = value.to_owned();
                Ok(())
            },
            _ => Err(DocumentError::WrongKind { id: id.to_owned(), wanted: "text" })
        }
    }

    fn clear_children(&mut self, id: &str) -> DocumentResult<()> {
        self.items_mut(id)?.clear();
        return Ok(());
    }

    fn append_list_item(&mut self, id: &str, text: &str) -> DocumentResult<()> {
        self.items_mut(id)?.push(text.to_owned());
        return Ok(());
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }
}

/// Plain-text rendering; forms are left out.
impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for alert in &self.alerts {
            writeln!(f, "! {}", alert)?;
        }
        for element in &self.elements {
            match &element.content {
                Content::Heading(text) => writeln!(f, "== {} ==", text)?,
                Content::Text { label, text } => writeln!(f, "{}{}", label, text)?,
                Content::List { label, items } => {
                    writeln!(f, "{}:", label)?;
                    for item in items {
                        writeln!(f, "  - {}", item)?;
                    }
                },
                Content::Form { .. } => ()
            }
        }
        return Ok(());
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c)
        }
    }
    return escaped;
}


#[cfg(test)]
mod tests {
    use crate::page::document::{Document, DocumentError, Page, escape_html, BALANCE_ID, HISTORY_ID};

    #[test]
    fn account_page_has_all_targets() {
        let page = Page::account();
        assert_eq!(page.text(BALANCE_ID), Some(""));
        assert_eq!(page.list_items(HISTORY_ID), Some(&[][..]));
        assert!(page.element("sendForm").is_some());
    }

    #[test]
    fn history_page_has_no_balance() {
        let mut page = Page::history();
        assert_eq!(page.text(BALANCE_ID), None);
        assert_eq!(page.set_text(BALANCE_ID, "1.00"), Err(DocumentError::MissingElement("balance".to_owned())));
    }

    #[test]
    fn list_operations() {
        let mut page = Page::history();
        page.append_list_item(HISTORY_ID, "one").unwrap();
        page.append_list_item(HISTORY_ID, "two").unwrap();
        assert_eq!(page.list_items(HISTORY_ID).unwrap(), ["one", "two"]);

        page.clear_children(HISTORY_ID).unwrap();
        assert!(page.list_items(HISTORY_ID).unwrap().is_empty());
    }

    #[test]
    fn wrong_element_kind() {
        let mut page = Page::account();
        let res = page.append_list_item(BALANCE_ID, "x");
        assert!(matches!(res, Err(DocumentError::WrongKind { .. })));
    }

    #[test]
    fn text_output() {
        let mut page = Page::account();
        page.set_text(BALANCE_ID, "42.50").unwrap();
        page.append_list_item(HISTORY_ID, "d: Sent $5 to Bob").unwrap();
        page.alert("careful");

        assert_eq!(page.to_string(),
            "! careful\n== Account ==\nBalance: $42.50\nTransaction History:\n  - d: Sent $5 to Bob\n");
    }

    #[test]
    fn html_escapes_user_text() {
        let mut page = Page::history();
        page.append_list_item(HISTORY_ID, "d: Sent $5 to <b>Bob & co</b>").unwrap();
        let html = page.to_html();
        assert!(html.contains("<li>d: Sent $5 to &lt;b&gt;Bob &amp; co&lt;/b&gt;</li>"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn html_contains_send_form() {
        let html = Page::account().to_html();
        assert!(html.contains("<form id=\"sendForm\" method=\"post\" action=\"/send\">"));
        assert!(html.contains("name=\"recipient\""));
        assert!(html.contains("name=\"amount\""));
    }

    #[test]
    fn escape_quotes() {
        assert_eq!(escape_html("\"a\" 'b'"), "&quot;a&quot; &#39;b&#39;");
    }
}
