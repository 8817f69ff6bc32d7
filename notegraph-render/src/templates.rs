//! Askama template definitions.

use askama::Template;
use notegraph_core::Link;

/// An entry of the navigation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub url: String,
    pub label: String,
}

impl From<&Link> for NavEntry {
    fn from(link: &Link) -> Self {
        Self {
            url: link.target().to_string(),
            label: link.label().to_string(),
        }
    }
}

/// A backlink entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkEntry {
    pub url: String,
    pub title: String,
}

impl From<&Link> for BacklinkEntry {
    fn from(link: &Link) -> Self {
        Self {
            url: link.target().to_string(),
            title: link.label().to_string(),
        }
    }
}

/// A dated entry of the post list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEntry {
    pub url: String,
    pub title: String,
    pub date: Option<String>,
}

impl From<&Link> for PostEntry {
    fn from(link: &Link) -> Self {
        Self {
            url: link.target().to_string(),
            title: link.label().to_string(),
            date: link.prefix().map(str::to_string),
        }
    }
}

/// Note page template
#[derive(Template)]
#[template(path = "note.html")]
pub struct NoteTemplate {
    // Page metadata
    pub title: String,
    pub date: String,

    // Content (rendered HTML)
    pub content: String,

    // Site metadata
    pub site_title: String,
    pub site_description: Option<String>,
    pub disqus_shortname: Option<String>,

    // Navigation
    pub nav: Vec<NavEntry>,

    // Path to the copied static assets
    pub static_path: String,

    // Backlinks
    pub backlinks: Vec<BacklinkEntry>,

    // Disqus thread identifier from front matter
    pub disqus: Option<String>,
}

/// Post list page template
#[derive(Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    pub title: String,

    // Site metadata
    pub site_title: String,
    pub site_description: Option<String>,
    pub disqus_shortname: Option<String>,

    // Navigation
    pub nav: Vec<NavEntry>,

    pub static_path: String,

    pub posts: Vec<PostEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav() -> Vec<NavEntry> {
        vec![
            NavEntry::from(&Link::new("/about.html", "About")),
            NavEntry::from(&Link::new("/All%20Posts.html", "All Posts")),
        ]
    }

    #[test]
    fn test_note_page() {
        let page = NoteTemplate {
            title: "Intro & Overview".into(),
            date: "2024-03-01".into(),
            content: "<p>Hello <em>world</em></p>".into(),
            site_title: "Notes".into(),
            site_description: None,
            disqus_shortname: None,
            nav: nav(),
            static_path: "/static".into(),
            backlinks: vec![BacklinkEntry::from(&Link::new("/index.html", "Home"))],
            disqus: None,
        };
        let html = page.render().unwrap();

        assert!(html.contains("<title>Intro &"));
        assert!(!html.contains("Intro & Overview"));
        assert!(html.contains("<p>Hello <em>world</em></p>"));
        assert!(html.contains(r#"<a href="/index.html">Home</a>"#));
        assert!(html.contains(r#"<a href="/All%20Posts.html">All Posts</a>"#));
        assert!(html.contains(r#"src="/static/script.js""#));
        assert!(!html.contains("disqus_thread"));
    }

    #[test]
    fn test_note_page_without_backlinks() {
        let page = NoteTemplate {
            title: "Lonely".into(),
            date: "2024-03-01".into(),
            content: String::new(),
            site_title: "Notes".into(),
            site_description: Some("A garden".into()),
            disqus_shortname: Some("garden".into()),
            nav: vec![],
            static_path: "/static".into(),
            backlinks: vec![],
            disqus: Some("lonely-note".into()),
        };
        let html = page.render().unwrap();

        assert!(!html.contains("class=\"backlinks\""));
        assert!(html.contains(r#"<meta name="description" content="A garden">"#));
        assert!(html.contains(r#"data-disqus="lonely-note""#));
        assert!(html.contains(r#"<body data-disqus-shortname="garden">"#));
    }

    #[test]
    fn test_post_list() {
        let posts = vec![
            PostEntry::from(&Link::new("/posts/b.html", "Second").with_prefix("2024-04-01")),
            PostEntry::from(&Link::new("/posts/a.html", "First")),
        ];
        let page = ListTemplate {
            title: "All Posts".into(),
            site_title: "Notes".into(),
            site_description: None,
            disqus_shortname: None,
            nav: nav(),
            static_path: "/static".into(),
            posts,
        };
        let html = page.render().unwrap();

        let list_start = html.find("<ul class=\"posts\">").unwrap();
        let list = &html[list_start..];
        insta::assert_snapshot!(&list[..list.find("</ul>").unwrap() + 5], @r#"
        <ul class="posts">
          <li><span class="post-date">2024-04-01</span> <a href="/posts/b.html">Second</a></li>
          <li><a href="/posts/a.html">First</a></li>
        </ul>
        "#);
    }
}
