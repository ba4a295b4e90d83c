const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const RESULT_TEMPLATE: &str = include_str!("../templates/result.html");

/// The only message a user ever sees when an upload fails.
pub const PROCESSING_FAILURE_MESSAGE: &str = "File cannot be processed.";

pub fn render_index() -> String {
    INDEX_TEMPLATE.to_string()
}

pub fn render_prediction(class_index: usize, label: Option<&str>) -> String {
    let content = match label {
        Some(label) => format!(
            "<p class=\"prediction\">Prediction: {} ({})</p>",
            class_index,
            escape_html(label)
        ),
        None => format!("<p class=\"prediction\">Prediction: {}</p>", class_index),
    };
    render_result(&content)
}

pub fn render_failure() -> String {
    render_result(&format!(
        "<p class=\"error\">{}</p>",
        PROCESSING_FAILURE_MESSAGE
    ))
}

fn render_result(content: &str) -> String {
    RESULT_TEMPLATE.replace("{{ content }}", content)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
