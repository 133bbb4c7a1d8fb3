use crate::error::app_error::AppError;
use rocket::response::content::RawHtml;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Turns a template name and a view context into an HTML document.
pub trait PageRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError>;
}

/// Renders a minimal document that hands the context to the client scripts
/// as embedded JSON.
pub struct ShellRenderer {
    pub asset_prefix: String,
}

impl Default for ShellRenderer {
    fn default() -> Self {
        Self {
            asset_prefix: "/static".to_string(),
        }
    }
}

fn embed_json(context: &Value) -> Result<String, AppError> {
    let json = serde_json::to_string(context).map_err(|e| AppError::render(format!("failed to serialise page context: {e}")))?;
    // Keeps `</script>` and `<!--` inside string values from ending the block.
    Ok(json.replace('<', "\\u003c"))
}

impl PageRenderer for ShellRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError> {
        if template.is_empty() || !template.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::render(format!("invalid template name {template:?}")));
        }

        Ok(format!(
            r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Storefront</title>
<link rel="stylesheet" href="{prefix}/css/site.css">
</head>
<body data-page="{template}">
<main id="app"></main>
<script type="application/json" id="page-data">{data}</script>
<script src="{prefix}/js/main.js" defer></script>
</body>
</html>
"#,
            prefix = self.asset_prefix,
            template = template,
            data = embed_json(context)?,
        ))
    }
}

/// Managed handle used by page routes.
#[derive(Clone)]
pub struct Pages {
    renderer: Arc<dyn PageRenderer>,
}

impl Pages {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<RawHtml<String>, AppError> {
        let context = serde_json::to_value(context).map_err(|e| AppError::render(format!("failed to build context for {template}: {e}")))?;
        self.renderer.render(template, &context).map(RawHtml)
    }
}
