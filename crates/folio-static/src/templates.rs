//! Template engine for rendering blog pages.

use minijinja::{context, Environment};
use serde::Serialize;

use folio_md::Post;

/// A post as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    /// Display title
    pub title: String,
    /// Post URL
    pub url: String,
    /// Publication date (YYYY-MM-DD)
    pub date: String,
    /// Preview text
    pub excerpt: String,
}

/// A post as shown on its own page.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub date: String,
    /// ISO-8601 publication instant
    pub published_at: String,
    /// Rendered body, embedded without escaping
    pub html: String,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Site title
    pub site_title: String,
    /// Base URL
    pub base_url: String,
    /// Posts listed on the page
    pub posts: Vec<PostSummary>,
    /// The post shown on the page, if any
    pub post: Option<PostView>,
    /// Live reload client script, only set by the dev server
    pub live_reload: Option<String>,
}

impl Context {
    /// Context for the post listing.
    pub fn index(site_title: &str, base_url: &str, posts: &[Post]) -> Self {
        Self {
            title: site_title.to_string(),
            site_title: site_title.to_string(),
            base_url: base_url.to_string(),
            posts: posts
                .iter()
                .map(|post| PostSummary {
                    title: post.title.clone(),
                    url: post_url(base_url, &post.slug),
                    date: post.date_label(),
                    excerpt: post.excerpt.clone(),
                })
                .collect(),
            post: None,
            live_reload: None,
        }
    }

    /// Context for a single post page.
    pub fn post(site_title: &str, base_url: &str, post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            site_title: site_title.to_string(),
            base_url: base_url.to_string(),
            posts: vec![],
            post: Some(PostView {
                title: post.title.clone(),
                date: post.date_label(),
                published_at: folio_md::date::to_iso(&post.published_at),
                html: post.html.clone(),
            }),
            live_reload: None,
        }
    }

    /// Context for the page shown when a post does not exist.
    pub fn not_found(site_title: &str, base_url: &str) -> Self {
        Self {
            title: "Not found".to_string(),
            site_title: site_title.to_string(),
            base_url: base_url.to_string(),
            posts: vec![],
            post: None,
            live_reload: None,
        }
    }

    /// Include the live reload client script.
    pub fn with_live_reload(mut self, script_url: impl Into<String>) -> Self {
        self.live_reload = Some(script_url.into());
        self
    }
}

/// URL of a post page below `base_url`.
pub fn post_url(base_url: &str, slug: &str) -> String {
    format!("{}posts/{}/", base_url, slug)
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with default templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template("base.html", BASE_TEMPLATE)
            .expect("Failed to add base template");
        env.add_template("index.html", INDEX_TEMPLATE)
            .expect("Failed to add index template");
        env.add_template("post.html", POST_TEMPLATE)
            .expect("Failed to add post template");
        env.add_template("404.html", NOT_FOUND_TEMPLATE)
            .expect("Failed to add not found template");

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &context.title,
            site_title => &context.site_title,
            base_url => &context.base_url,
            posts => &context.posts,
            post => &context.post,
            live_reload => &context.live_reload,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if title != site_title %}{{ title }} - {% endif %}{{ site_title }}</title>
  <link rel="stylesheet" href="{{ base_url }}assets/main.css">
</head>
<body>
  <header class="site-header">
    <a href="{{ base_url }}" class="site-title">{{ site_title }}</a>
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
  {% if live_reload %}<script src="{{ live_reload }}"></script>{% endif %}
</body>
</html>"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
{% if posts %}
<ul class="post-list">
{% for post in posts %}
  <li class="post-item">
    <a href="{{ post.url }}" class="post-link">{{ post.title }}</a>
    <time class="post-date">{{ post.date }}</time>
    <p class="post-excerpt">{{ post.excerpt }}</p>
  </li>
{% endfor %}
</ul>
{% else %}
<p class="empty">No posts yet.</p>
{% endif %}
{% endblock %}"##;

const POST_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="post">
  <time class="post-date" datetime="{{ post.published_at }}">{{ post.date }}</time>
  <div class="content">
    {{ post.html | safe }}
  </div>
</article>
{% endblock %}"##;

const NOT_FOUND_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<h1>Not found</h1>
<p><a href="{{ base_url }}">Back to all posts</a></p>
{% endblock %}"##;

#[cfg(test)]
mod tests {
    use super::*;
    use folio_md::{FixedClock, PostBuilder, Theme};
    use chrono::{TimeZone, Utc};

    fn post(path: &str, raw: &str) -> Post {
        PostBuilder::new()
            .with_clock(FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()))
            .with_theme(Theme::plain())
            .build(path, raw)
    }

    #[test]
    fn renders_post_list() {
        let engine = TemplateEngine::new();
        let posts = vec![
            post("2024-06-01-second.md", "# Second\n\nNewer <post>"),
            post("2023-01-01-first.md", "# First\n\nOlder post"),
        ];

        let html = engine
            .render_page("index.html", &Context::index("My Blog", "/", &posts))
            .unwrap();

        assert!(html.contains("<title>My Blog</title>"));
        assert!(html.contains("2024-06-01-second"));
        assert!(html.contains("2023-01-01"));
        assert!(html.contains("Newer &lt;post&gt;"));
        assert!(html.find("Second").unwrap() < html.find("First").unwrap());
    }

    #[test]
    fn renders_empty_list() {
        let engine = TemplateEngine::new();
        let html = engine
            .render_page("index.html", &Context::index("Blog", "/", &[]))
            .unwrap();

        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn embeds_post_html_unescaped() {
        let engine = TemplateEngine::new();
        let post = post("2024-03-15-hello.md", "# Hello\n\nSome **bold** text");

        let html = engine
            .render_page("post.html", &Context::post("Blog", "/", &post))
            .unwrap();

        assert!(html.contains("<title>Hello - Blog</title>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains(r#"datetime="2024-03-15T00:00:00.000Z""#));
    }

    #[test]
    fn includes_live_reload_script_when_set() {
        let engine = TemplateEngine::new();
        let context = Context::not_found("Blog", "/").with_live_reload("/__livereload.js");

        let html = engine.render_page("404.html", &context).unwrap();

        assert!(html.contains("__livereload.js"));
        assert!(html.contains("Not found"));
    }

    #[test]
    fn builds_post_urls() {
        assert_eq!(post_url("/", "hello"), "/posts/hello/");
        assert_eq!(post_url("/blog/", "hello"), "/blog/posts/hello/");
    }
}
