//! Stylesheet generation and minification.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }

    /// The stylesheet as written to `assets/main.css`.
    pub fn stylesheet(minify: bool) -> String {
        let css = Self::generate_css();
        if !minify {
            return css;
        }
        Self::minify_css(&css).unwrap_or_else(|e| {
            tracing::warn!("Keeping unminified CSS: {}", e);
            css
        })
    }
}

const DEFAULT_CSS: &str = r#"/* folio blog theme */

:root {
  --background: #ffffff;
  --foreground: #0f172a;
  --muted: #64748b;
  --border: #e2e8f0;
  --accent: #0284c7;
  --code-bg: #0f172a;
  --code-fg: #f1f5f9;
  --content-max-width: 720px;
}

@media (prefers-color-scheme: dark) {
  :root {
    --background: #020617;
    --foreground: #e2e8f0;
    --muted: #94a3b8;
    --border: #1e293b;
    --accent: #38bdf8;
  }
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.7;
}

.site-header {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 2rem 1rem 1rem;
  border-bottom: 1px solid var(--border);
}

.site-title {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--foreground);
  text-decoration: none;
}

.main {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 2rem 1rem;
}

/* Post list */
.post-list {
  list-style: none;
  padding: 0;
  margin: 0;
}

.post-item {
  margin-bottom: 2rem;
}

.post-link {
  font-size: 1.25rem;
  font-weight: 600;
  color: var(--foreground);
  text-decoration: none;
}

.post-link:hover {
  color: var(--accent);
}

.post-date {
  display: block;
  font-size: 0.875rem;
  color: var(--muted);
}

.post-excerpt {
  margin: 0.5rem 0 0;
}

.empty {
  color: var(--muted);
}

/* Post body */
.content h1,
.content h2,
.content h3 {
  line-height: 1.3;
  margin: 2rem 0 1rem;
}

.content p {
  margin: 0 0 1rem;
}

.content a {
  color: var(--accent);
}

.content pre {
  background: var(--code-bg);
  color: var(--code-fg);
  padding: 1rem;
  border-radius: 0.75rem;
  overflow-x: auto;
  font-size: 0.875rem;
}

.content code {
  font-family: ui-monospace, SFMono-Regular, monospace;
}

.content blockquote {
  margin: 1rem 0;
  padding-left: 1rem;
  border-left: 2px solid var(--border);
  color: var(--muted);
  font-style: italic;
}

.content ul,
.content ol {
  margin: 1rem 0;
  padding-left: 1.5rem;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_css() {
        let css = AssetPipeline::generate_css();
        assert!(css.contains(":root"));
        assert!(css.contains(".post-list"));
        assert!(css.contains(".content pre"));
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.button {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
    }

    #[test]
    fn stylesheet_respects_minify_flag() {
        let plain = AssetPipeline::stylesheet(false);
        let minified = AssetPipeline::stylesheet(true);

        assert_eq!(plain, AssetPipeline::generate_css());
        assert!(minified.len() < plain.len());
    }
}
