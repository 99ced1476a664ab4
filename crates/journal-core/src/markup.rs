//! Minimal markup parser for assistant replies.
//!
//! Replies are small HTML-ish fragments (`<h3>`, `<br />`, `<p>`, `<b>`,
//! `<ul>`, ...). They are parsed into a lenient node tree and then flattened
//! into a list of [`Block`]s that renderers consume without knowing any HTML.
//! Malformed input never fails: stray `<` is text, unknown tags are
//! transparent, unclosed tags close at the end of the fragment.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// Renderable unit of a reply. Text may contain `\n` where the source had
/// an explicit line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Heading { level: u8, text: String },
    Emphasis { style: Emphasis, text: String },
    List { kind: ListKind, items: Vec<String> },
    Text(String),
    Break,
}

/// Parse a reply fragment into blocks.
pub fn parse(fragment: &str) -> Vec<Block> {
    let nodes = build_tree(fragment);
    let mut blocks = Vec::new();
    for node in &nodes {
        flatten(node, &mut blocks);
    }
    group_dash_lists(blocks)
}

/// Plain text of a fragment with all markup removed.
pub fn to_plain_text(fragment: &str) -> String {
    let mut out = String::new();
    for node in &build_tree(fragment) {
        append_text(node, &mut out);
    }
    out.trim_matches('\n').to_string()
}

// ─── Tree building ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element { name: String, children: Vec<Node> },
    Text(String),
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

struct OpenElement {
    name: String,
    children: Vec<Node>,
}

fn build_tree(input: &str) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut rest = input;

    fn push(node: Node, root: &mut Vec<Node>, stack: &mut [OpenElement]) {
        match stack.last_mut() {
            Some(open) => open.children.push(node),
            None => root.push(node),
        }
    }

    fn close_top(root: &mut Vec<Node>, stack: &mut Vec<OpenElement>) {
        if let Some(open) = stack.pop() {
            let node = Node::Element {
                name: open.name,
                children: open.children,
            };
            push(node, root, stack);
        }
    }

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push(Node::Text(decode_entities(rest)), &mut root, &mut stack);
            break;
        };
        if lt > 0 {
            push(Node::Text(decode_entities(&rest[..lt])), &mut root, &mut stack);
            rest = &rest[lt..];
            continue;
        }

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
            continue;
        }

        let Some(tag) = parse_tag(rest) else {
            push(Node::Text("<".to_string()), &mut root, &mut stack);
            rest = &rest[1..];
            continue;
        };
        rest = &rest[tag.consumed..];

        if tag.closing {
            if let Some(pos) = stack.iter().rposition(|open| open.name == tag.name) {
                while stack.len() > pos {
                    close_top(&mut root, &mut stack);
                }
            }
            continue;
        }

        if tag.name == "li" {
            // An open <li> closes at the next sibling <li>.
            if let Some(pos) = stack.iter().rposition(|open| open.name == "li") {
                let nested = stack[pos + 1..]
                    .iter()
                    .any(|open| open.name == "ul" || open.name == "ol");
                if !nested {
                    while stack.len() > pos {
                        close_top(&mut root, &mut stack);
                    }
                }
            }
        }

        if tag.self_closing || VOID_TAGS.contains(&tag.name.as_str()) {
            push(
                Node::Element {
                    name: tag.name,
                    children: Vec::new(),
                },
                &mut root,
                &mut stack,
            );
        } else {
            stack.push(OpenElement {
                name: tag.name,
                children: Vec::new(),
            });
        }
    }

    while !stack.is_empty() {
        close_top(&mut root, &mut stack);
    }
    root
}

struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    consumed: usize,
}

/// Parse a tag at the start of `input` (which begins with `<`).
fn parse_tag(input: &str) -> Option<Tag> {
    let body_start = 1;
    let closing = input[body_start..].starts_with('/');
    let name_start = if closing { body_start + 1 } else { body_start };

    let first = input[name_start..].chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let end = input.find('>')?;
    if end < name_start {
        return None;
    }

    let inner = &input[name_start..end];
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let self_closing = inner.trim_end().ends_with('/');

    Some(Tag {
        name,
        closing,
        self_closing,
        consumed: end + 1,
    })
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &candidate[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ─── Flattening ──────────────────────────────────────────────

/// Elements whose content starts and ends on its own line.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
];

fn text_content(node: &Node) -> String {
    let mut out = String::new();
    append_text(node, &mut out);
    out
}

fn append_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(t),
        Node::Element { name, .. } if name == "br" => out.push('\n'),
        Node::Element { name, children } => {
            let block = BLOCK_TAGS.contains(&name.as_str());
            if block {
                line_break(out);
            }
            for child in children {
                append_text(child, out);
            }
            if block {
                line_break(out);
            }
        }
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn is_list(node: &Node) -> bool {
    matches!(node, Node::Element { name, .. } if name == "ul" || name == "ol")
}

/// Collapse whitespace within each line, keep explicit line breaks.
fn normalize(text: &str) -> String {
    text.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn is_block_container(node: &Node) -> bool {
    match node {
        Node::Element { children, .. } => children.iter().any(|child| {
            matches!(child, Node::Element { name, .. } if matches!(
                name.as_str(),
                "p" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "div" | "section"
            ))
        }),
        Node::Text(_) => false,
    }
}

fn flatten(node: &Node, out: &mut Vec<Block>) {
    let (name, children) = match node {
        Node::Text(text) => {
            let text = normalize(text);
            if !text.is_empty() {
                out.push(Block::Text(text));
            }
            return;
        }
        Node::Element { name, children } => (name.as_str(), children),
    };

    let content = || normalize(&text_content(node));
    match name {
        "br" => out.push(Block::Break),
        "p" => push_nonempty(out, content(), Block::Paragraph),
        "b" | "strong" => push_nonempty(out, content(), |text| Block::Emphasis {
            style: Emphasis::Bold,
            text,
        }),
        "i" | "em" => push_nonempty(out, content(), |text| Block::Emphasis {
            style: Emphasis::Italic,
            text,
        }),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(3);
            push_nonempty(out, content(), |text| Block::Heading { level, text });
        }
        "ul" | "ol" => {
            let kind = if name == "ol" { ListKind::Ordered } else { ListKind::Unordered };
            let mut items = Vec::new();
            collect_items(children, &mut items);
            if !items.is_empty() {
                out.push(Block::List { kind, items });
            }
        }
        _ if is_block_container(node) => {
            for child in children {
                flatten(child, out);
            }
        }
        _ => push_nonempty(out, content(), Block::Text),
    }
}

fn push_nonempty(out: &mut Vec<Block>, text: String, make: impl FnOnce(String) -> Block) {
    if !text.is_empty() {
        out.push(make(text));
    }
}

fn collect_items(children: &[Node], items: &mut Vec<String>) {
    for child in children {
        if let Node::Element { name, children } = child {
            if name == "li" {
                // Nested list items follow their parent as items of their own.
                let mut own = String::new();
                for grandchild in children.iter().filter(|c| !is_list(c)) {
                    append_text(grandchild, &mut own);
                }
                let text = normalize(&own);
                if !text.is_empty() {
                    items.push(text);
                }
                for nested in children.iter().filter(|c| is_list(c)) {
                    if let Node::Element { children, .. } = nested {
                        collect_items(children, items);
                    }
                }
            } else {
                collect_items(children, items);
            }
        }
    }
}

/// Text lines starting with a dash or bullet become an unordered list.
/// Single breaks between such lines belong to the list.
fn group_dash_lists(blocks: Vec<Block>) -> Vec<Block> {
    fn dash_item(block: &Block) -> Option<String> {
        let Block::Text(text) = block else { return None };
        let trimmed = text.trim_start();
        ["- ", "• ", "* "]
            .iter()
            .find_map(|marker| trimmed.strip_prefix(marker))
            .map(|item| item.trim().to_string())
    }

    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut pending_break = false;
    for block in blocks {
        if let Some(item) = dash_item(&block) {
            if let Some(Block::List { kind: ListKind::Unordered, items }) = out.last_mut() {
                items.push(item);
                pending_break = false;
                continue;
            }
            if pending_break {
                out.push(Block::Break);
                pending_break = false;
            }
            out.push(Block::List {
                kind: ListKind::Unordered,
                items: vec![item],
            });
            continue;
        }

        let after_list = matches!(out.last(), Some(Block::List { .. }));
        if block == Block::Break && after_list && !pending_break {
            pending_break = true;
            continue;
        }
        if pending_break {
            out.push(Block::Break);
            pending_break = false;
        }
        out.push(block);
    }
    if pending_break {
        out.push(Block::Break);
    }
    out
}
