//! Coarse device classification from the user agent

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens checked first; tablet agents often also say "mobile"
const TABLET_TOKENS: &[&str] = &[
    "ipad",
    "tablet",
    "kindle",
    "silk/",
    "playbook",
    "nexus 7",
    "nexus 9",
    "nexus 10",
];

const MOBILE_TOKENS: &[&str] = &[
    "mobile",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "windows phone",
    "opera mini",
    "iemobile",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    /// Case-insensitive token match, tablet before mobile, else desktop
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();

        if TABLET_TOKENS.iter().any(|t| ua.contains(t)) {
            DeviceType::Tablet
        } else if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
