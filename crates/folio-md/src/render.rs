//! Markdown to HTML rendering.
//!
//! Rendering is a fixed, ordered list of text-to-text stages. Fenced code is
//! stashed before the first stage and restored after the last one.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::codeblock::{CodeStash, TOKEN_PREFIX};
use crate::html::{escape_html, open_tag, wrap};

/// CSS classes attached to each kind of rendered element.
///
/// An empty class renders the element without a `class` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub h1: String,
    pub h2: String,
    pub h3: String,
    pub link: String,
    pub strong: String,
    pub em: String,
    pub code: String,
    pub pre: String,
    pub blockquote: String,
    pub ul: String,
    pub ul_item: String,
    pub ol: String,
    pub ol_item: String,
    pub paragraph: String,
}

impl Theme {
    /// A theme without any classes.
    pub fn plain() -> Self {
        Self {
            h1: String::new(),
            h2: String::new(),
            h3: String::new(),
            link: String::new(),
            strong: String::new(),
            em: String::new(),
            code: String::new(),
            pre: String::new(),
            blockquote: String::new(),
            ul: String::new(),
            ul_item: String::new(),
            ol: String::new(),
            ol_item: String::new(),
            paragraph: String::new(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            h1: "text-3xl font-bold text-slate-900 dark:text-white".to_string(),
            h2: "text-2xl font-semibold text-slate-900 dark:text-white".to_string(),
            h3: "text-xl font-semibold text-slate-800 dark:text-slate-100".to_string(),
            link: "text-sky-600 underline decoration-sky-500/40 underline-offset-2 transition-colors hover:text-sky-700 dark:text-sky-400 dark:hover:text-sky-300".to_string(),
            strong: "text-slate-900 dark:text-white".to_string(),
            em: "text-slate-700 dark:text-slate-200".to_string(),
            code: "rounded bg-slate-200 px-1 py-0.5 text-sm text-slate-800 dark:bg-slate-800 dark:text-slate-100".to_string(),
            pre: "overflow-x-auto rounded-xl bg-slate-900/90 p-4 text-sm text-slate-100".to_string(),
            blockquote: "border-l-2 border-slate-300 pl-4 text-slate-700 italic dark:border-slate-600 dark:text-slate-200".to_string(),
            ul: "my-4 space-y-2".to_string(),
            ul_item: "ml-6 list-disc text-slate-700 dark:text-slate-300".to_string(),
            ol: "my-4 space-y-2".to_string(),
            ol_item: "ml-6 list-decimal text-slate-700 dark:text-slate-300".to_string(),
            paragraph: "text-pretty text-slate-700 dark:text-slate-300".to_string(),
        }
    }
}

/// A single rendering stage.
type Stage = fn(&str, &Theme) -> String;

/// Stages in the order they run. Later stages never see fenced code.
const STAGES: &[(&str, Stage)] = &[
    ("headings", headings),
    ("links", links),
    ("bold", bold),
    ("italic", italic),
    ("inline_code", inline_code),
    ("blockquotes", blockquotes),
    ("unordered_lists", unordered_lists),
    ("ordered_lists", ordered_lists),
    ("blocks", blocks),
];

/// Tags that already open a block and must not be wrapped in a paragraph.
const BLOCK_PREFIXES: &[&str] = &["<h", "<ul", "<ol", "<pre", "<blockquote", TOKEN_PREFIX];

/// Markdown renderer.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    theme: Theme,
}

impl Renderer {
    /// Create a renderer using `theme` for element classes.
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Render normalized markdown to an HTML fragment.
    ///
    /// Never fails: syntax that does not match a rule is kept as text.
    pub fn render(&self, markdown: &str) -> String {
        let mut stash = CodeStash::new();
        let mut text = stash.extract(markdown, &self.theme.pre);

        for (name, stage) in STAGES {
            text = stage(&text, &self.theme);
            tracing::trace!("Stage {} produced {} bytes", name, text.len());
        }

        stash.restore(&text)
    }
}

/// Render markdown with the default theme.
pub fn render_markdown(markdown: &str) -> String {
    Renderer::default().render(markdown)
}

fn headings(text: &str, theme: &Theme) -> String {
    static H3: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^###[ \t]+(.+)$").expect("Invalid h3 regex"));
    static H2: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.+)$").expect("Invalid h2 regex"));
    static H1: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("Invalid h1 regex"));

    let levels: [(&Regex, &str, &str); 3] = [
        (&H3, "h3", &theme.h3),
        (&H2, "h2", &theme.h2),
        (&H1, "h1", &theme.h1),
    ];

    levels
        .into_iter()
        .fold(text.to_string(), |acc, (re, tag, class)| {
            re.replace_all(&acc, |caps: &Captures| wrap(tag, class, caps[1].trim()))
                .into_owned()
        })
}

fn links(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Invalid link regex"));

    RE.replace_all(text, |caps: &Captures| {
        let label = caps[1].trim();
        let href = caps[2].trim();
        if href.is_empty() {
            return caps[0].to_string();
        }

        let open = open_tag("a", &theme.link);
        format!(
            r#"{} href="{}" target="_blank" rel="noreferrer noopener">{}</a>"#,
            open.trim_end_matches('>'),
            escape_html(href),
            label
        )
    })
    .into_owned()
}

fn bold(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("Invalid bold regex"));

    RE.replace_all(text, |caps: &Captures| wrap("strong", &theme.strong, &caps[1]))
        .into_owned()
}

/// Single-asterisk emphasis. Both delimiters must stand alone, i.e. not be
/// next to another `*`, and the emphasized text stays on one line.
fn italic(text: &str, theme: &Theme) -> String {
    let bytes = text.as_bytes();
    let lone_star = |i: usize| {
        bytes[i] == b'*' && (i == 0 || bytes[i - 1] != b'*') && bytes.get(i + 1) != Some(&b'*')
    };

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if lone_star(i) {
            let close = (i + 1..bytes.len())
                .take_while(|&k| bytes[k] != b'\n')
                .find(|&k| k > i + 1 && lone_star(k));

            if let Some(close) = close {
                out.push_str(&text[copied..i]);
                out.push_str(&wrap("em", &theme.em, &text[i + 1..close]));
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

fn inline_code(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("Invalid inline code regex"));

    RE.replace_all(text, |caps: &Captures| wrap("code", &theme.code, &caps[1]))
        .into_owned()
}

fn blockquotes(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^>[ \t]+(.+)$").expect("Invalid blockquote regex"));

    RE.replace_all(text, |caps: &Captures| {
        wrap("blockquote", &theme.blockquote, &caps[1])
    })
    .into_owned()
}

fn unordered_lists(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^(?:-[ \t]+.+\n?)+").expect("Invalid list regex"));

    RE.replace_all(text, |caps: &Captures| {
        list(&caps[0], "ul", &theme.ul, &theme.ul_item, strip_bullet)
    })
    .into_owned()
}

fn ordered_lists(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^(?:\d+\.[ \t]+.+\n?)+").expect("Invalid ordered list regex")
    });

    RE.replace_all(text, |caps: &Captures| {
        list(&caps[0], "ol", &theme.ol, &theme.ol_item, strip_number)
    })
    .into_owned()
}

/// Build one list container from a run of marker lines.
///
/// A trailing newline in the run is kept so that whatever follows the list
/// stays on its own line.
fn list(run: &str, tag: &str, class: &str, item_class: &str, strip: fn(&str) -> &str) -> String {
    let items: String = run
        .trim()
        .split('\n')
        .map(|line| wrap("li", item_class, strip(line).trim()))
        .collect();

    let mut out = wrap(tag, class, &items);
    if run.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix('-').unwrap_or(line)
}

fn strip_number(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.strip_prefix('.').unwrap_or(rest)
}

fn blocks(text: &str, theme: &Theme) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid block regex"));

    RE.split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            if BLOCK_PREFIXES.iter().any(|prefix| block.starts_with(prefix)) {
                block.to_string()
            } else {
                wrap("p", &theme.paragraph, &block.replace('\n', "<br>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
