//! Markdown rendering for property hovers.

use tomlit_schema::PropertyInfo;

/// Render a property card: name and type on the first line, then the
/// description and any default or enum values the schema declares.
pub fn render_property(info: &PropertyInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("**{}**", info.name));
    if let Some(type_name) = &info.type_name {
        out.push_str(&format!(" `{type_name}`"));
    }
    if info.required {
        out.push_str(" *(required)*");
    }
    if info.deprecated {
        out.push_str(" *(deprecated)*");
    }
    if let Some(description) = &info.description {
        out.push_str("\n\n");
        out.push_str(description);
    }
    if let Some(default) = &info.default_text {
        out.push_str(&format!("\n\nDefault: `{default}`"));
    }
    if !info.enum_values.is_empty() {
        out.push_str("\n\nAllowed values:");
        for value in &info.enum_values {
            out.push_str(&format!("\n- `{value}`"));
        }
    }
    out
}
