//! Runtime `{}` substitution for log messages
//!
//! Supports auto-numbered `{}`, indexed `{0}` and keyword `{name}` fields, with
//! `{{` and `}}` as literal braces. Format specs (`{:>8}`) are not supported.

use super::log_context::{FieldValue, LogContext};

/// Substitute `args` and `kwargs` into `template`
///
/// With neither args nor kwargs the template is returned untouched, so
/// messages containing braces can be logged verbatim. A malformed template
/// never fails the call; the diagnostic is appended to the raw message instead.
pub fn substitute(template: &str, args: &[FieldValue], kwargs: &LogContext) -> String {
    if args.is_empty() && kwargs.is_empty() {
        return template.to_string();
    }
    match render(template, args, kwargs) {
        Ok(message) => message,
        Err(why) => format!("{} [formatting error: {}]", template, why),
    }
}

#[derive(PartialEq)]
enum Numbering {
    Unset,
    Auto,
    Manual,
}

fn render(template: &str, args: &[FieldValue], kwargs: &LogContext) -> Result<String, String> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();
    let mut numbering = Numbering::Unset;
    let mut next_auto = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err("single '}' encountered in format string".to_string()),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err("unexpected '{' in field name".to_string()),
                        Some(ch) => field.push(ch),
                        None => return Err("expected '}' before end of string".to_string()),
                    }
                }
                if field.contains(':') || field.contains('!') {
                    return Err(format!("unsupported format spec in '{{{}}}'", field));
                }

                let field = field.trim();
                if field.is_empty() {
                    if numbering == Numbering::Manual {
                        return Err(
                            "cannot switch from manual field numbering to automatic".to_string()
                        );
                    }
                    numbering = Numbering::Auto;
                    let value = args.get(next_auto).ok_or_else(|| {
                        format!("positional argument index {} out of range", next_auto)
                    })?;
                    next_auto += 1;
                    out.push_str(&value.to_string());
                } else if let Ok(index) = field.parse::<usize>() {
                    if numbering == Numbering::Auto {
                        return Err(
                            "cannot switch from automatic field numbering to manual".to_string()
                        );
                    }
                    numbering = Numbering::Manual;
                    let value = args.get(index).ok_or_else(|| {
                        format!("positional argument index {} out of range", index)
                    })?;
                    out.push_str(&value.to_string());
                } else {
                    let value = kwargs
                        .get(field)
                        .ok_or_else(|| format!("missing keyword argument '{}'", field))?;
                    out.push_str(&value.to_string());
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[i64]) -> Vec<FieldValue> {
        values.iter().map(|&v| FieldValue::Int(v)).collect()
    }

    #[test]
    fn test_untouched_without_arguments() {
        let message = substitute("literal {braces} stay", &[], &LogContext::new());
        assert_eq!(message, "literal {braces} stay");
    }

    #[test]
    fn test_positional() {
        let message = substitute("{} + {} = {}", &args(&[1, 2, 3]), &LogContext::new());
        assert_eq!(message, "1 + 2 = 3");

        let message = substitute("{1} before {0}", &args(&[1, 2]), &LogContext::new());
        assert_eq!(message, "2 before 1");
    }

    #[test]
    fn test_keywords_and_escapes() {
        let kwargs = LogContext::new().with_field("user", "ann");
        let message = substitute("{{user}} is {user}", &[], &kwargs);
        assert_eq!(message, "{user} is ann");
    }

    #[test]
    fn test_errors_degrade_to_suffix() {
        let message = substitute("value {}", &[], &LogContext::new().with_field("k", 1));
        assert_eq!(
            message,
            "value {} [formatting error: positional argument index 0 out of range]"
        );

        let message = substitute("hi {who}", &args(&[1]), &LogContext::new());
        assert!(message.ends_with("[formatting error: missing keyword argument 'who']"));

        let message = substitute("open {", &args(&[1]), &LogContext::new());
        assert!(message.starts_with("open { [formatting error:"));

        let message = substitute("close }", &args(&[1]), &LogContext::new());
        assert!(message.contains("single '}'"));
    }

    #[test]
    fn test_mixed_numbering_rejected() {
        let message = substitute("{} {0}", &args(&[1]), &LogContext::new());
        assert!(message.contains("formatting error"));
    }

    #[test]
    fn test_format_spec_rejected() {
        let message = substitute("{:>5}", &args(&[1]), &LogContext::new());
        assert!(message.contains("unsupported format spec"));
    }

    #[test]
    fn test_unicode_passthrough() {
        let message = substitute("héllo {} ✓", &args(&[7]), &LogContext::new());
        assert_eq!(message, "héllo 7 ✓");
    }
}
