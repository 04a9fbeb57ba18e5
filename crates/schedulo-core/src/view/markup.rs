use std::fmt;

use askama::Template;
use tracing::error;

/// HTML produced by an auto-escaping template, or by a trusted source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Wrap HTML that is already safe to embed. Never pass untrusted input here.
    pub fn trusted(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Place `control` inside the empty element `<div id="container_id"></div>`.
    /// Markup without such an element is returned unchanged.
    pub fn mount(self, container_id: &str, control: &Markup) -> Self {
        let empty = format!(r#"<div id="{}"></div>"#, container_id);
        match self.0.find(&empty) {
            Some(pos) => {
                let filled = format!(r#"<div id="{}">{}</div>"#, container_id, control.as_str());
                let mut html = String::with_capacity(self.0.len() + control.0.len());
                html.push_str(&self.0[..pos]);
                html.push_str(&filled);
                html.push_str(&self.0[pos + empty.len()..]);
                Self(html)
            }
            None => self,
        }
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a template, logging and yielding empty markup if a value fails to format.
pub(crate) fn render_template<T: Template>(template: &T) -> Markup {
    match template.render() {
        Ok(html) => Markup(html),
        Err(e) => {
            error!(error = %e, "Template rendering failed");
            Markup::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_fills_empty_container() {
        let page = Markup::trusted(r#"<header><div id="login"></div></header>"#);
        let control = Markup::trusted("<button>Sign in</button>");

        let mounted = page.mount("login", &control);
        assert_eq!(
            mounted.as_str(),
            r#"<header><div id="login"><button>Sign in</button></div></header>"#
        );
    }

    #[test]
    fn test_mount_without_container_is_noop() {
        let page = Markup::trusted("<header></header>");
        let mounted = page.clone().mount("login", &Markup::trusted("<b>x</b>"));
        assert_eq!(mounted, page);
    }
}
