use super::open_app;
use crate::output::print_json;
use nexus_core::types::Theme;
use std::path::Path;

/// Show the theme, or set it when `value` is given.
pub fn run(root: &Path, value: Option<Theme>, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    if let Some(theme) = value {
        app.set_theme(theme);
    }
    if json {
        print_json(&serde_json::json!({ "theme": app.theme() }))?;
    } else {
        println!("{}", app.theme());
    }
    Ok(())
}
