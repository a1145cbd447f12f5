use crate::action::TemplateConfig;
use syncboard_core::{SyncboardError, SyncboardResult};

/// Placeholder always bound to the caller's input.
pub const INPUT_PLACEHOLDER: &str = "input";

/// Renders a template skill by substituting `{{name}}` placeholders.
///
/// `{{input}}` is the caller's text; other names come from the configured
/// variables. An unknown placeholder is an error. An opening `{{` with no
/// closing `}}` is literal.
pub fn render(config: &TemplateConfig, input: &str) -> SyncboardResult<String> {
    let template = config.template.as_str();
    let mut out = String::with_capacity(template.len() + input.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..open]);

        let name = rest[open + 2..open + 2 + close].trim();
        if name == INPUT_PLACEHOLDER {
            out.push_str(input);
        } else if let Some(value) = config.variables.get(name) {
            out.push_str(value);
        } else {
            return Err(SyncboardError::Execution(format!(
                "Unknown template placeholder '{{{{{name}}}}}'"
            )));
        }
        rest = &rest[open + 2 + close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
