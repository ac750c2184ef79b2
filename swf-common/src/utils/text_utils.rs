use heck::ToSnakeCase;
use regex::{Captures, Regex};

use crate::prelude::*;

pub struct TextUtils;

impl TextUtils {
    /// Lower-cases the first character only: `ActivityTaskCompleted` -> `activityTaskCompleted`.
    pub fn decapitalize(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// `ScheduleFailed` -> `schedule_failed`, `TimedOut` -> `timed_out`.
    pub fn camel_to_underscore(s: &str) -> String {
        s.to_snake_case()
    }

    /// Cuts `s` to at most `max_chars` characters, never splitting a character.
    pub fn truncate(s: &str, max_chars: usize) -> &str {
        match s.char_indices().nth(max_chars) {
            Some((pos, _)) => &s[..pos],
            None => s,
        }
    }

    /// Substitutes `{name}` placeholders with values looked up in `values`. `{{` and `}}` are
    /// literal braces, and anything after `:` or `!` inside a placeholder is ignored. A
    /// placeholder naming a missing key fails with `MissingContextVariable`.
    pub fn format_template(
        template: &str,
        values: &HashMap<InlineStr, Object>,
    ) -> SwfResult<String> {
        lazy_static! {
            static ref PLACEHOLDER_REGEX: Regex =
                Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("regex compile error");
        }

        if !template.contains('{') && !template.contains('}') {
            return Ok(template.to_string());
        }

        let mut failure = None;
        let formatted = PLACEHOLDER_REGEX.replace_all(template, |caps: &Captures| {
            let whole = &caps[0];
            if whole == "{{" {
                return "{".to_string();
            }
            if whole == "}}" {
                return "}".to_string();
            }

            let field = caps.get(1).map(|x| x.as_str()).unwrap_or("");
            let name = field
                .split(|c| c == ':' || c == '!')
                .next()
                .unwrap_or("")
                .trim();
            if name.is_empty() {
                failure.get_or_insert_with(|| {
                    ErrorCode::IllegalArgument(format!(
                        "positional placeholder not supported in template '{}'",
                        template
                    ))
                });
                return String::new();
            }
            match values.get(name) {
                Some(v) => v.to_string().to_string(),
                None => {
                    failure.get_or_insert_with(|| {
                        ErrorCode::MissingContextVariable(format!(
                            "variable '{}' is missing in context",
                            name
                        ))
                    });
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(formatted.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::TextUtils;
    use crate::prelude::*;

    #[test]
    fn decapitalize() {
        assert_eq!(
            TextUtils::decapitalize("ActivityTaskCompleted"),
            "activityTaskCompleted"
        );
        assert_eq!(TextUtils::decapitalize(""), "");
    }

    #[test]
    fn camel_to_underscore() {
        assert_eq!(TextUtils::camel_to_underscore("Completed"), "completed");
        assert_eq!(
            TextUtils::camel_to_underscore("ScheduleFailed"),
            "schedule_failed"
        );
        assert_eq!(
            TextUtils::camel_to_underscore("RequestCancelFailed"),
            "request_cancel_failed"
        );
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(TextUtils::truncate("abcdef", 3), "abc");
        assert_eq!(TextUtils::truncate("ab", 3), "ab");
        assert_eq!(TextUtils::truncate("ééé", 2), "éé");
    }

    #[test]
    fn format_template() {
        let values = HashMap::from([
            (InlineStr::from("env"), Object::from("prod")),
            (InlineStr::from("shard"), Object::from(3)),
        ]);
        assert_eq!(
            TextUtils::format_template("queue-{env}-{shard}", &values).expect("format"),
            "queue-prod-3"
        );
        assert_eq!(
            TextUtils::format_template("{{literal}}", &values).expect("format"),
            "{literal}"
        );
        assert_eq!(
            TextUtils::format_template("plain", &values).expect("format"),
            "plain"
        );

        let err = TextUtils::format_template("queue-{region}", &values).expect_err("missing");
        assert_matches!(err.code(), c if c == ErrorCode::missing_context_variable_code());
    }
}
