use askama::Template;

use crate::auth::SIGN_IN_MOUNT_ID;
use crate::models::{Assignment, Session, DEFAULT_DATE_FORMAT};

use super::{render_template, Markup};

/// Display settings that do not depend on session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// strftime format for due dates
    pub date_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

struct ProfileView<'a> {
    name: &'a str,
    avatar: Option<&'a str>,
}

struct AssignmentView<'a> {
    course: &'a str,
    title: &'a str,
    due: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    profile: Option<ProfileView<'a>>,
    mount_id: &'a str,
    items: Vec<AssignmentView<'a>>,
}

#[derive(Template)]
#[template(path = "document.html")]
struct DocumentTemplate<'a> {
    root: &'a Markup,
}

/// Render the dashboard for the given state.
///
/// Signed out, the header holds only the empty sign-in mount point; signed in,
/// it holds the avatar, name and sign-out button. Every user-supplied string is
/// HTML-escaped by the template.
pub fn render(session: Option<&Session>, assignments: &[Assignment], options: &RenderOptions) -> Markup {
    let profile = session.map(|s| ProfileView {
        name: &s.display_name,
        avatar: safe_url(&s.avatar_url),
    });

    let items = assignments
        .iter()
        .map(|a| AssignmentView {
            course: &a.course,
            title: &a.title,
            due: a.due_display(&options.date_format),
        })
        .collect();

    render_template(&DashboardTemplate {
        profile,
        mount_id: SIGN_IN_MOUNT_ID,
        items,
    })
}

/// Wrap page content in a standalone HTML document.
pub fn render_document(root: &Markup) -> Markup {
    render_template(&DocumentTemplate { root })
}

/// Accept relative URLs and http(s) URLs; anything with another scheme is dropped.
fn safe_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(pos) if url[pos..].starts_with(':') => {
            let scheme = &url[..pos];
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
                Some(url)
            } else {
                None
            }
        }
        _ => Some(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;

    fn session(name: &str, picture: &str) -> Session {
        Session::from_profile(Profile {
            name: name.to_string(),
            picture: picture.to_string(),
            extra: Default::default(),
        })
    }

    fn assignment(course: &str, title: &str, due: &str) -> Assignment {
        Assignment {
            course: course.to_string(),
            title: title.to_string(),
            due: due.to_string(),
        }
    }

    fn mount_point() -> String {
        format!(r#"<div id="{}"></div>"#, SIGN_IN_MOUNT_ID)
    }

    #[test]
    fn test_signed_out_shows_mount_point_only() {
        let html = render(None, &[], &RenderOptions::default()).into_string();

        assert!(html.contains(&mount_point()));
        assert!(!html.contains(r#"class="profile""#));
        assert!(!html.contains("Sign out"));
        assert!(html.contains(r#"<section class="assignment-list">"#));
        assert_eq!(html.matches(r#"class="assignment-item""#).count(), 0);
    }

    #[test]
    fn test_signed_in_header_and_items() {
        let ada = session("Ada", "u.png");
        let items = vec![
            assignment("CS50", "PSet 1", "2024-01-10"),
            assignment("MATH 21", "Problem Set 3", "2024-02-01T17:00:00Z"),
        ];

        let html = render(Some(&ada), &items, &RenderOptions::default()).into_string();

        assert!(html.contains(r#"class="profile""#));
        assert!(html.contains(r#"<img src="u.png" alt="Ada" />"#));
        assert!(html.contains("<span>Ada</span>"));
        assert!(html.contains(r#"data-action="sign-out""#));
        assert!(!html.contains(&mount_point()));

        assert_eq!(html.matches(r#"class="assignment-item""#).count(), 2);
        assert!(html.contains("<h3>CS50</h3>"));
        assert!(html.contains("<p>PSet 1</p>"));
        assert!(html.contains("Jan 10, 2024"));
        assert!(html.contains("<h3>MATH 21</h3>"));
        assert!(html.contains("Feb 01, 2024"));
    }

    #[test]
    fn test_untrusted_strings_are_escaped() {
        let mallory = session("<script>alert(1)</script>", "u.png");
        let items = vec![assignment(
            "<img src=x onerror=alert(2)>",
            "\"><script>alert(3)</script>",
            "2024-01-10",
        )];

        let html = render(Some(&mallory), &items, &RenderOptions::default()).into_string();

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;script&gt;alert(1)"));
        assert!(html.contains("&lt;img src=x onerror=alert(2)&gt;"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;alert(3)"));
    }

    #[test]
    fn test_unparseable_due_is_escaped_verbatim() {
        let items = vec![assignment("CS50", "PSet 1", "<b>friday</b>")];
        let html = render(None, &items, &RenderOptions::default()).into_string();
        assert!(html.contains("&lt;b&gt;friday"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let ada = session("Ada", "https://example.com/a.png");
        let items = vec![assignment("CS50", "PSet 1", "2024-01-10")];
        let options = RenderOptions::default();

        assert_eq!(render(Some(&ada), &items, &options), render(Some(&ada), &items, &options));
        assert_eq!(render(None, &items, &options), render(None, &items, &options));
    }

    #[test]
    fn test_custom_date_format() {
        let items = vec![assignment("CS50", "PSet 1", "2024-01-10")];
        let options = RenderOptions {
            date_format: "%d.%m.%Y".to_string(),
        };
        let html = render(None, &items, &options).into_string();
        assert!(html.contains("10.01.2024"));
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("u.png"), Some("u.png"));
        assert_eq!(safe_url("/avatars/u.png"), Some("/avatars/u.png"));
        assert_eq!(safe_url("https://lh3.googleusercontent.com/a/x"), Some("https://lh3.googleusercontent.com/a/x"));
        assert_eq!(safe_url("HTTP://example.com/a.png"), Some("HTTP://example.com/a.png"));
        assert_eq!(safe_url("javascript:alert(1)"), None);
        assert_eq!(safe_url("data:text/html,<b>x</b>"), None);
        assert_eq!(safe_url("   "), None);
    }

    #[test]
    fn test_dangerous_avatar_is_not_emitted() {
        let eve = session("Eve", "javascript:alert(1)");
        let html = render(Some(&eve), &[], &RenderOptions::default()).into_string();
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("<img"));
        assert!(html.contains("<span>Eve</span>"));
    }

    #[test]
    fn test_document_wraps_root() {
        let doc = render_document(&Markup::trusted("<p>hi</p>")).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"<div id="root"><p>hi</p></div>"#));
    }
}
