//! Parser for input scripts: one directive per line, compiled to input steps.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`].

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};

use crate::step::{DOWN, ENTER, InputStep, SPACE, UP};

/// Parse an input script from a string slice and return the resulting steps.
///
/// Lines that are empty or start with `#` are ignored. Inline comments (` # …`)
/// are stripped while preserving `#` characters inside quoted strings.
///
/// # Errors
///
/// Returns an error if any line contains an unknown directive, a malformed
/// argument, or an unclosed quoted string.
///
/// # Example
///
/// ```
/// use clirig::parse_str;
///
/// let steps = parse_str("send \"my-project\"\nkey Enter\n").unwrap();
/// assert_eq!(steps.len(), 2);
/// ```
pub fn parse_str(content: &str) -> Result<Vec<InputStep>> {
    let mut steps = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = strip_inline_comment(line);
        let step = parse_line(line)
            .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
        steps.push(step);
    }
    Ok(steps)
}

/// Parse an input script from a file and return the resulting steps.
///
/// Reads the entire file into memory and delegates to [`parse_str`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or if the script is malformed.
///
/// # Example
///
/// ```no_run
/// use clirig::parse_file;
///
/// let steps = parse_file("answers.steps").unwrap();
/// ```
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<InputStep>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input script file: {}", path.display()))?;
    parse_str(&content)
}

type ParseFn = fn(&str) -> Result<InputStep>;

static REGISTRY: &[(&str, ParseFn)] = &[("send", parse_send), ("key", parse_key)];

static KEYS: &[(&str, &str)] = &[
    ("Enter", ENTER),
    ("Space", SPACE),
    ("Up", UP),
    ("Down", DOWN),
];

/// Dispatch a single non-empty, non-comment line to the matching directive's
/// parser. `after` is handled here because it wraps another directive.
fn parse_line(line: &str) -> Result<InputStep> {
    let (name, args) = line.split_once(' ').unwrap_or((line, ""));
    if name == "after" {
        return parse_after(args);
    }
    REGISTRY
        .iter()
        .find(|(directive, _)| *directive == name)
        .map(|(_, parse)| parse(args))
        .unwrap_or_else(|| Err(anyhow!("Unknown directive: {}", line)))
}

/// `after <duration> <directive>`: the wrapped step fires after an explicit
/// delay, which also becomes the ambient default for later steps.
fn parse_after(args: &str) -> Result<InputStep> {
    let (delay_str, rest) = args
        .trim()
        .split_once(' ')
        .ok_or_else(|| anyhow!("after needs a duration and a directive"))?;
    let delay = parse_duration(delay_str)?;
    let rest = rest.trim();
    let (inner, _) = rest.split_once(' ').unwrap_or((rest, ""));
    if inner == "after" {
        return Err(anyhow!("after cannot wrap another after"));
    }
    Ok(parse_line(rest)?.with_delay(delay))
}

/// `send "text"`: write the quoted text verbatim.
fn parse_send(args: &str) -> Result<InputStep> {
    Ok(InputStep::text(parse_quoted_string(args)?))
}

/// `key <name>`: write the named key's byte sequence.
fn parse_key(args: &str) -> Result<InputStep> {
    let name = args.trim();
    KEYS.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, bytes)| InputStep::text(*bytes))
        .ok_or_else(|| {
            let known: Vec<&str> = KEYS.iter().map(|(key, _)| *key).collect();
            anyhow!("Unknown key: {} (known keys: {})", name, known.join(", "))
        })
}

/// Strip inline comments from a line, preserving `#` inside quoted strings.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if ch == '#' && !in_quotes {
            return line[..i].trim();
        }
    }
    line
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        Ok(Duration::from_secs_f64(secs))
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}

/// Parse a double-quoted string, processing `\n`, `\t`, `\"`, and `\\`.
pub(crate) fn parse_quoted_string(s: &str) -> Result<String> {
    let s = s.trim();
    if !s.starts_with('"') {
        return Err(anyhow!("Expected string to start with '\"'"));
    }
    if !s.ends_with('"') || s.len() < 2 {
        return Err(anyhow!("Expected string to end with '\"'"));
    }
    Ok(s[1..s.len() - 1]
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_secs_f64(1.5)
        );
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse_quoted_string("\"hello\"").unwrap(), "hello");
        assert_eq!(
            parse_quoted_string("\"hello world\"").unwrap(),
            "hello world"
        );
        assert_eq!(
            parse_quoted_string("\"hello\\nworld\"").unwrap(),
            "hello\nworld"
        );
    }

    #[test]
    fn test_parse_str() {
        let steps = parse_str("send \"alpha\"\nkey Enter\nsend \"beta\"\n").unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].text, "alpha");
        assert_eq!(steps[1].text, "\r");
        assert_eq!(steps[2].text, "beta");
    }

    #[test]
    fn test_parse_all_keys() {
        let steps = parse_str("key Enter\nkey Space\nkey Up\nkey Down\n").unwrap();
        let texts: Vec<&str> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["\r", " ", "\x1b[A", "\x1b[B"]);
    }

    #[test]
    fn test_parse_after_attaches_explicit_delay() {
        let steps = parse_str("after 500ms send \"slow\"\n").unwrap();
        assert_eq!(steps[0].text, "slow");
        assert_eq!(steps[0].delay_before, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_parse_after_key() {
        let steps = parse_str("after 2s key Enter\n").unwrap();
        assert_eq!(steps[0].text, "\r");
        assert_eq!(steps[0].delay_before, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_nested_after_is_rejected() {
        assert!(parse_str("after 1s after 2s send \"x\"").is_err());
    }

    #[test]
    fn test_parse_comments_only() {
        assert_eq!(parse_str("# c1\n# c2\n").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_empty_lines() {
        let steps = parse_str("\n\nsend \"a\"\n\nkey Enter\n\n").unwrap();
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_parse_invalid_directive() {
        let err = parse_str("unknown_directive \"test\"")
            .err()
            .unwrap()
            .to_string();
        assert!(
            err.contains("Unknown directive") || err.contains("unknown_directive"),
            "got: {err}"
        );
    }

    #[test]
    fn test_parse_unknown_key() {
        let err = parse_str("key Banana").err().unwrap();
        assert!(format!("{err:#}").contains("Unknown key"));
    }

    #[test]
    fn test_parse_invalid_duration() {
        assert!(parse_str("after 5minutes send \"x\"").is_err());
    }

    #[test]
    fn test_parse_unclosed_quote() {
        assert!(parse_str("send \"unclosed").is_err());
    }

    #[test]
    fn test_strip_inline_comments() {
        assert_eq!(strip_inline_comment("key Enter # comment"), "key Enter");
        assert_eq!(
            strip_inline_comment("send \"test\" # inline"),
            "send \"test\""
        );
        assert_eq!(
            strip_inline_comment("send \"#hashtag\""),
            "send \"#hashtag\""
        );
        assert_eq!(
            strip_inline_comment("send \"test#1\" # comment"),
            "send \"test#1\""
        );
    }

    #[test]
    fn test_parse_with_inline_comments() {
        let steps = parse_str("send \"hi\" # greet\nafter 1s key Enter # submit\n").unwrap();
        assert_eq!(steps.len(), 2);
    }
}
