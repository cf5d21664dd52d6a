/// View rendering
///
/// Handlers hand a view name and a JSON context to a `Renderer`. The bundled
/// `HtmlRenderer` turns the context into a plain, fully escaped HTML page so
/// the service works without a template directory.
use crate::error::Result;
use serde_json::Value;
use std::fmt::Write;

pub trait Renderer: Send + Sync {
    fn render(&self, view: &str, context: &Value) -> Result<String>;
}

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    site_name: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new("Flask Blog")
    }
}

impl HtmlRenderer {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
        }
    }

    fn write_value(out: &mut String, value: &Value) {
        match value {
            Value::Null => {}
            Value::Bool(b) => out.push_str(if *b { "yes" } else { "no" }),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::String(s) => out.push_str(&escape_html(s)),
            Value::Array(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    Self::write_value(out, item);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
            Value::Object(map) => {
                out.push_str("<dl>");
                for (key, item) in map {
                    let _ = write!(out, "<dt>{}</dt><dd>", escape_html(key));
                    Self::write_value(out, item);
                    out.push_str("</dd>");
                }
                out.push_str("</dl>");
            }
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, view: &str, context: &Value) -> Result<String> {
        let title = match context.get("title").and_then(Value::as_str) {
            Some(title) => format!("{} - {}", self.site_name, title),
            None => self.site_name.clone(),
        };

        let mut out = String::new();
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n",
            escape_html(&title)
        );

        if let Some(messages) = context.get("messages").and_then(Value::as_array) {
            for flash in messages {
                let category = flash.get("category").and_then(Value::as_str).unwrap_or("info");
                let message = flash.get("message").and_then(Value::as_str).unwrap_or_default();
                let _ = writeln!(
                    out,
                    "<div class=\"alert alert-{}\">{}</div>",
                    escape_html(category),
                    escape_html(message)
                );
            }
        }

        let _ = write!(out, "<main data-view=\"{}\">", escape_html(view));
        if let Value::Object(map) = context {
            out.push_str("<dl>");
            for (key, item) in map.iter().filter(|(k, _)| k.as_str() != "messages") {
                let _ = write!(out, "<dt>{}</dt><dd>", escape_html(key));
                Self::write_value(&mut out, item);
                out.push_str("</dd>");
            }
            out.push_str("</dl>");
        } else {
            Self::write_value(&mut out, context);
        }
        out.push_str("</main>\n</body></html>\n");

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_shows_title_messages_and_values() {
        let html = HtmlRenderer::default()
            .render(
                "home.html",
                &json!({
                    "title": "Home",
                    "messages": [{"category": "success", "message": "Post has been created"}],
                    "posts": [{"title": "<script>alert(1)</script>"}]
                }),
            )
            .unwrap();

        assert!(html.contains("<title>Flask Blog - Home</title>"));
        assert!(html.contains("<div class=\"alert alert-success\">Post has been created</div>"));
        assert!(html.contains("data-view=\"home.html\""));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
