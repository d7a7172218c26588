//! Fenced code block extraction and restoration.
//!
//! Fenced blocks are pulled out of the document before any other rendering
//! stage runs and replaced by numbered tokens. The finished `<pre>` markup is
//! put back once every other stage is done, so nothing inside a fence is ever
//! rewritten.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::html::{escape_html, open_tag};

/// Prefix of the token left in place of a stashed block.
pub const TOKEN_PREFIX: &str = "{{CODE_BLOCK_";

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("Invalid fence regex"));

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{CODE_BLOCK_(\d+)\}\}").expect("Invalid token regex"));

/// Rendered code blocks, indexed by their token number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeStash {
    blocks: Vec<String>,
}

impl CodeStash {
    /// Create an empty stash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every fenced region in `source` with a token.
    ///
    /// The fenced text is trimmed, escaped and wrapped in
    /// `<pre><code>…</code></pre>`, the `pre` carrying `pre_class`.
    pub fn extract(&mut self, source: &str, pre_class: &str) -> String {
        FENCE_RE
            .replace_all(source, |caps: &Captures| {
                let code = caps.get(1).map_or("", |m| m.as_str()).trim();
                self.blocks.push(format!(
                    "{}<code>{}</code></pre>",
                    open_tag("pre", pre_class),
                    escape_html(code)
                ));
                token(self.blocks.len() - 1)
            })
            .into_owned()
    }

    /// Put stashed blocks back in place of their tokens.
    ///
    /// Tokens whose index is unknown are removed.
    pub fn restore(&self, rendered: &str) -> String {
        TOKEN_RE
            .replace_all(rendered, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.blocks.get(index))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }

    /// Number of stashed blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block has been stashed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Token emitted for the block at `index`.
pub fn token(index: usize) -> String {
    format!("{}{}}}}}", TOKEN_PREFIX, index)
}
