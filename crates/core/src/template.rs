//! Placeholder substitution for engage message content.
//!
//! Campaign authors write content such as
//! `"Hi {{ customer.name }}, I'm {{user.fullName}}"`. Keys are matched
//! case-insensitively and may be padded with whitespace inside the braces.
//! Supported keys:
//!
//! | Placeholder          | Source                     |
//! |----------------------|----------------------------|
//! | `customer.name`      | visitor display name       |
//! | `customer.email`     | visitor email              |
//! | `user.fullName`      | sending staff member name  |
//! | `user.position`      | sending staff member title |
//! | `user.email`         | sending staff member email |
//!
//! Missing values render as the empty string. Any other `{{...}}` text is
//! left untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Regex matching the supported placeholders.
pub const PLACEHOLDER_PATTERN: &str =
    r"(?i)\{\{\s*(customer\.name|customer\.email|user\.fullname|user\.position|user\.email)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Values available to a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    pub customer_name: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub user_full_name: Option<&'a str>,
    pub user_position: Option<&'a str>,
    pub user_email: Option<&'a str>,
}

impl TemplateContext<'_> {
    fn lookup(&self, key: &str) -> &str {
        let value = match key.to_ascii_lowercase().as_str() {
            "customer.name" => self.customer_name,
            "customer.email" => self.customer_email,
            "user.fullname" => self.user_full_name,
            "user.position" => self.user_position,
            "user.email" => self.user_email,
            _ => None,
        };
        value.unwrap_or("")
    }
}

/// Substitute every supported placeholder in `content`.
pub fn render(content: &str, ctx: &TemplateContext<'_>) -> String {
    PLACEHOLDER_RE
        .replace_all(content, |caps: &Captures<'_>| ctx.lookup(&caps[1]).to_string())
        .into_owned()
}
