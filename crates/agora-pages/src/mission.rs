//! The daily check-in page.

use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const REDEEM_PATH: &str = "/mission/daily/redeem";

/// `/mission/daily`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyMissionPage {
    redeem_onclick: Option<String>,
    streak_line: Option<String>,
}

impl DailyMissionPage {
    /// Once-token embedded in the redeem button's `onclick` URL.
    #[must_use]
    pub fn once(&self) -> Option<&str> {
        static ONCE_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = ONCE_REGEX.get_or_init(|| Regex::new(r"[?&]once=([A-Za-z0-9]+)").expect("valid once regex"));
        Some(re.captures(self.redeem_onclick.as_deref()?)?.get(1)?.as_str())
    }

    /// True when today's reward was already claimed (no redeem button).
    #[must_use]
    pub fn already_redeemed(&self) -> bool {
        self.redeem_onclick.is_none()
    }

    /// Consecutive check-in days, when shown.
    #[must_use]
    pub fn streak_days(&self) -> Option<u32> {
        let line = self.streak_line.as_deref()?;
        line.split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())?
            .parse()
            .ok()
    }
}

impl Bindable for DailyMissionPage {
    const TYPE_NAME: &'static str = "DailyMissionPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(
                FieldSpec::attr(
                    "redeem_onclick",
                    format!("//input[@type='button' and contains(@onclick,'{REDEEM_PATH}')]"),
                    "onclick",
                )
                .tolerant(),
                |p, v| p.redeem_onclick = Some(v),
            )
            .scalar(
                FieldSpec::text("streak_line", "//div[@class='cell' and contains(.,'已连续登录')]")
                    .tolerant(),
                |p, v| p.streak_line = Some(v),
            )
    }
}
