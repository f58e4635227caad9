/// Placeholder replaced by the command's shell snippet
pub const CMD_PLACEHOLDER: &str = "{{cmd}}";
/// Placeholder replaced by the command's name
pub const NAME_PLACEHOLDER: &str = "{{name}}";

/// Build the final argv for a command.
///
/// Tokens of the entrypoint template that are exactly `{{cmd}}` or `{{name}}`
/// are substituted; anything else, including tokens that merely contain a
/// placeholder, is copied unchanged. Trailing arguments are appended with any
/// literal `--` removed.
///
/// With the default `bash -c {{cmd}} {{name}}` template the name lands in
/// `$0`, so trailing arguments start at `$1` inside the snippet.
#[must_use]
pub fn build_argv(entrypoint: &[String], cmd: &str, name: &str, trailing: &[String]) -> Vec<String> {
    entrypoint
        .iter()
        .map(|token| match token.as_str() {
            CMD_PLACEHOLDER => cmd.to_string(),
            NAME_PLACEHOLDER => name.to_string(),
            _ => token.clone(),
        })
        .chain(trailing.iter().filter(|arg| *arg != "--").cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_default_template() {
        let argv = build_argv(
            &strings(&["bash", "-c", "{{cmd}}", "{{name}}"]),
            "echo hi",
            "greet",
            &strings(&["world"]),
        );
        assert_eq!(argv, strings(&["bash", "-c", "echo hi", "greet", "world"]));
    }

    #[test]
    fn test_double_dash_is_dropped() {
        let argv = build_argv(
            &strings(&["bash", "-c", "{{cmd}}", "{{name}}"]),
            "echo \"$@\"",
            "run",
            &strings(&["--", "-x", "--", "y"]),
        );
        assert_eq!(argv, strings(&["bash", "-c", "echo \"$@\"", "run", "-x", "y"]));
    }

    #[test]
    fn test_no_partial_substitution() {
        let argv = build_argv(
            &strings(&["sh", "-c", "run {{cmd}}", "{{name}}-x"]),
            "echo hi",
            "greet",
            &[],
        );
        assert_eq!(argv, strings(&["sh", "-c", "run {{cmd}}", "{{name}}-x"]));
    }

    #[test]
    fn test_custom_template_without_name() {
        let argv = build_argv(
            &strings(&["zsh", "-c", "{{cmd}}"]),
            "ls",
            "list",
            &strings(&["a"]),
        );
        assert_eq!(argv, strings(&["zsh", "-c", "ls", "a"]));
    }
}
