//! Shell resolution and the backslash-escaped, single-char-separated
//! tokenizer used to split `SHELL_ARGS`.

const ESCAPE: char = '\\';

/// Splits `s` on `sep`, treating `sep` preceded by `ESCAPE` as a literal
/// character rather than a delimiter. A trailing unconsumed escape is
/// appended as a literal backslash to the last token (or becomes its own
/// token if nothing was collected yet).
pub fn escaped_split(s: &str, sep: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut buffer = String::new();
    let mut escaped = false;

    for c in s.chars() {
        match (escaped, c) {
            (true, c) if c == sep => {
                buffer.push(c);
                escaped = false;
            }
            (true, c) => {
                buffer.push(ESCAPE);
                buffer.push(c);
                escaped = false;
            }
            (false, c) if c == ESCAPE => escaped = true,
            (false, c) if c == sep => {
                result.push(std::mem::take(&mut buffer));
            }
            (false, c) => buffer.push(c),
        }
    }

    if !buffer.is_empty() {
        result.push(buffer);
    }
    if escaped {
        match result.last_mut() {
            Some(last) => last.push(ESCAPE),
            None => result.push(ESCAPE.to_string()),
        }
    }
    result
}

/// Resolves the shell and its invocation args from `SHELL`/`SHELL_ARGS`
/// environment variables, falling back to `/bin/sh -c`.
pub fn resolve_shell(env: &std::collections::HashMap<String, String>) -> (String, Vec<String>) {
    let shell = env
        .get("SHELL")
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "/bin/sh".to_string());
    let shell_args = env
        .get("SHELL_ARGS")
        .filter(|s| !s.is_empty())
        .map(|s| escaped_split(s, ':'))
        .unwrap_or_else(|| vec!["-c".to_string()]);
    (shell, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_unescaped_separator() {
        assert_eq!(escaped_split("a:b:c", ':'), vec!["a", "b", "c"]);
    }

    #[test]
    fn an_escaped_separator_is_kept_literal() {
        assert_eq!(escaped_split("a\\:b:c", ':'), vec!["a:b", "c"]);
    }

    #[test]
    fn an_escape_before_a_non_separator_is_kept_literal() {
        assert_eq!(escaped_split("a\\nb", ':'), vec!["a\\nb"]);
    }

    #[test]
    fn a_trailing_escape_is_appended_literally() {
        assert_eq!(escaped_split("a:b\\", ':'), vec!["a", "b\\"]);
    }

    #[test]
    fn defaults_are_used_when_env_is_absent() {
        let env = std::collections::HashMap::new();
        assert_eq!(resolve_shell(&env), ("/bin/sh".to_string(), vec!["-c".to_string()]));
    }

    #[test]
    fn shell_args_are_split_on_colon() {
        let mut env = std::collections::HashMap::new();
        env.insert("SHELL_ARGS".to_string(), "-e:-c".to_string());
        assert_eq!(resolve_shell(&env).1, vec!["-e".to_string(), "-c".to_string()]);
    }
}
