//! The sign-in form.
//!
//! Input names are randomized per render, so a sign-in post must echo the
//! names scraped from the same page that supplied its once-token.

use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
use serde::Serialize;

const FORM: &str = "//form[@action='/signin']";

/// Field names of one rendered sign-in form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SigninFields {
    /// Name of the username input
    pub username: String,
    /// Name of the password input
    pub password: String,
    /// Name of the captcha input
    pub captcha: String,
}

/// `/signin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SigninPage {
    fields: SigninFields,
    once: Option<String>,
    captcha_style: Option<String>,
}

impl SigninPage {
    /// The randomized input names.
    #[must_use]
    pub fn fields(&self) -> &SigninFields {
        &self.fields
    }

    /// The form's once-token.
    #[must_use]
    pub fn once(&self) -> Option<&str> {
        self.once.as_deref()
    }

    /// Path of the captcha image, taken from the captcha box's inline style.
    #[must_use]
    pub fn captcha_path(&self) -> Option<&str> {
        let style = self.captcha_style.as_deref()?;
        let start = style.find("url(")? + "url(".len();
        let rest = &style[start..];
        let end = rest.find(')')?;
        Some(rest[..end].trim_matches(|c| c == '\'' || c == '"'))
    }
}

impl Bindable for SigninPage {
    const TYPE_NAME: &'static str = "SigninPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(
                FieldSpec::attr(
                    "username_field",
                    format!("{FORM}//input[@type='text' and not(contains(@placeholder,'验证码'))]"),
                    "name",
                ),
                |p, v| p.fields.username = v,
            )
            .scalar(
                FieldSpec::attr("password_field", format!("{FORM}//input[@type='password']"), "name"),
                |p, v| p.fields.password = v,
            )
            .scalar(
                FieldSpec::attr(
                    "captcha_field",
                    format!("{FORM}//input[@type='text' and contains(@placeholder,'验证码')]"),
                    "name",
                ),
                |p, v| p.fields.captcha = v,
            )
            .scalar(
                FieldSpec::attr("once", format!("{FORM}//input[@name='once']"), "value").tolerant(),
                |p, v| p.once = Some(v),
            )
            .scalar(
                FieldSpec::attr("captcha_style", "//div[contains(@style,'/_captcha')]", "style")
                    .tolerant(),
                |p, v| p.captcha_style = Some(v),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captcha_path() {
        let page = SigninPage {
            captcha_style: Some(
                "background-image: url('/_captcha?once=k9Xh2LmQ7pRt4WvZ'); width: 320px;"
                    .to_string(),
            ),
            ..SigninPage::default()
        };
        assert_eq!(page.captcha_path(), Some("/_captcha?once=k9Xh2LmQ7pRt4WvZ"));
        assert_eq!(SigninPage::default().captcha_path(), None);
    }
}
