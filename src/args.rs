use std::borrow::Cow;

use indexmap::IndexMap;

use crate::config::GenerationConfig;

/// Optional arguments appended after `generate -i -g -o`.
///
/// The subprocess receives the entries as discrete argv items; `render`
/// produces the equivalent shell-quoted command line for logs and
/// `--dry-run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorArgs {
    args: Vec<String>,
}

impl GeneratorArgs {
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut builder = Self::default();
        builder.push_flag("--git-user-id", config.git_user.as_deref());
        builder.push_flag("--git-repo-id", config.git_repo.as_deref());
        builder.push_flag("--git-host", config.git_host.as_deref());
        let template_dir = config
            .template_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        builder.push_flag("-t", template_dir.as_deref());

        let params = params_argument(&config.additional_params);
        builder.push_flag("-p", Some(params.as_str()));
        builder
    }

    fn push_flag(&mut self, flag: &str, value: Option<&str>) {
        if let Some(value) = value
            && !value.is_empty()
        {
            self.args.push(flag.to_string());
            self.args.push(value.to_string());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn render(&self) -> String {
        render_command_line(&self.args)
    }
}

/// `name=value` pairs joined by commas, in configuration order.
pub fn params_argument(params: &IndexMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={}", escape_param_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// openapi-generator unescapes `-p` values once on non-Windows hosts, so
/// backslashes (PHP namespaces, Windows-style paths) are doubled first.
pub fn escape_param_value(value: &str) -> Cow<'_, str> {
    if cfg!(windows) || !value.contains('\\') {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.replace('\\', "\\\\"))
    }
}

pub fn render_command_line<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes `value` for the host shell. Values made only of characters the
/// shell never interprets are returned unchanged.
pub fn shell_quote(value: &str) -> Cow<'_, str> {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return Cow::Borrowed(value);
    }
    if cfg!(windows) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\\\"")))
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', "'\\''")))
    }
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '-' | '.' | '/' | '=' | ',' | ':' | '@' | '%' | '+'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(shell_quote("typescript-axios"), "typescript-axios");
        if !cfg!(windows) {
            assert_eq!(shell_quote(""), "''");
            assert_eq!(shell_quote("it's here"), "'it'\\''s here'");
            assert_eq!(shell_quote("a b"), "'a b'");
        }
    }

    #[test]
    fn doubles_backslashes_outside_windows() {
        let escaped = escape_param_value("Acme\\Client");
        if cfg!(windows) {
            assert_eq!(escaped, "Acme\\Client");
        } else {
            assert_eq!(escaped, "Acme\\\\Client");
        }
    }
}
