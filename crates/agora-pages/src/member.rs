//! Member profile pages.

use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// `/member/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberPage {
    /// Username as displayed
    pub name: String,
    /// First avatar on the page (the profile's own, not a reply's)
    pub avatar: String,
    /// The "member number, joined at" line
    pub member_line: Option<String>,
}

impl MemberPage {
    /// Registration number from the member line.
    #[must_use]
    pub fn member_number(&self) -> Option<u64> {
        static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = NUMBER_REGEX.get_or_init(|| Regex::new(r"第\s*(\d+)\s*号").expect("valid member number regex"));
        re.captures(self.member_line.as_deref()?)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }
}

impl Bindable for MemberPage {
    const TYPE_NAME: &'static str = "MemberPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::text("name", "//h1"), |m, v| m.name = v)
            .scalar(FieldSpec::attr("avatar", "//img[@class='avatar']", "src"), |m, v| {
                m.avatar = v;
            })
            .scalar(
                FieldSpec::text("member_line", "//span[@class='gray' and contains(.,'号会员')]")
                    .tolerant(),
                |m, v| m.member_line = Some(v),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_number() {
        let page = MemberPage {
            member_line: Some("V2EX 第 12345 号会员，加入于 2012-01-01 00:00:00 +08:00".to_string()),
            ..MemberPage::default()
        };
        assert_eq!(page.member_number(), Some(12345));
        assert_eq!(MemberPage::default().member_number(), None);
    }
}
