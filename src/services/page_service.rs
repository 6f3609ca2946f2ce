use std::time::Duration;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use reqwest::Client;

use crate::errors::WatchError;

/// One compound selector in a `>` chain.
struct Step {
    tag: &'static str,
    class: Option<&'static str>,
    /// 1-based position among the parent's element children.
    nth_child: Option<usize>,
}

/// `body > div.top > div > div:nth-child(3) > h3`
static HEADING_PATH: [Step; 5] = [
    Step { tag: "body", class: None, nth_child: None },
    Step { tag: "div", class: Some("top"), nth_child: None },
    Step { tag: "div", class: None, nth_child: None },
    Step { tag: "div", class: None, nth_child: Some(3) },
    Step { tag: "h3", class: None, nth_child: None },
];

/// The page whose status heading is polled.
pub struct StatusPage {
    client: Client,
    url: String,
}

impl StatusPage {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WatchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the page and return the status heading text.
    ///
    /// Non-2xx responses are errors, same as transport failures.
    pub async fn fetch_heading(&self) -> Result<String, WatchError> {
        tracing::info!("Visiting {}", self.url);

        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        extract_heading(&body).ok_or_else(|| WatchError::HeadingNotFound {
            url: self.url.clone(),
        })
    }
}

/// Text of the first element matching the status heading path, untrimmed.
pub fn extract_heading(html: &str) -> Option<String> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);

    let (first, rest) = HEADING_PATH.split_first()?;

    let mut candidates = Vec::new();
    collect_descendants(&dom.document, first, &mut candidates);

    for step in rest {
        candidates = candidates
            .iter()
            .flat_map(|parent| matching_children(parent, step))
            .collect();
    }

    candidates.first().map(|heading| {
        let mut text = String::new();
        text_content(heading, &mut text);
        text
    })
}

fn collect_descendants(handle: &Handle, step: &Step, out: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if step.nth_child.is_none() && matches_element(child, step) {
            out.push(child.clone());
        }
        collect_descendants(child, step, out);
    }
}

fn matching_children(parent: &Handle, step: &Step) -> Vec<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .enumerate()
        .filter(|(i, child)| {
            step.nth_child.map_or(true, |n| n == i + 1) && matches_element(child, step)
        })
        .map(|(_, child)| child.clone())
        .collect()
}

fn matches_element(handle: &Handle, step: &Step) -> bool {
    let NodeData::Element { name, attrs, .. } = &handle.data else {
        return false;
    };

    if name.local.as_ref() != step.tag {
        return false;
    }

    match step.class {
        None => true,
        Some(class) => attrs.borrow().iter().any(|attr| {
            attr.name.local.as_ref() == "class"
                && attr.value.split_whitespace().any(|c| c == class)
        }),
    }
}

fn text_content(handle: &Handle, out: &mut String) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => text_content(child, out),
            _ => {}
        }
    }
}
