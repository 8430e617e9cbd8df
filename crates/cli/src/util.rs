use anyhow::{Result, bail};

/// Parse a boolean the way GitHub Actions inputs are parsed.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        _ => bail!("Invalid boolean for {name}: '{value}' (expected true or false)"),
    }
}

/// First non-empty value among the environment variables `names`.
pub fn first_var(env: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names.iter().filter_map(|name| env(name)).find(|value| !value.is_empty())
}

/// Escape a message for a workflow command such as `::error::`.
pub fn escape_workflow_command(message: &str) -> String {
    message.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}
