//! Static transcoding profile table.
//!
//! A profile pairs encoder arguments with an optional output resolution
//! for a target device family.

use serde::Serialize;

/// A named set of encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Profile name as requested by callers
    pub name: &'static str,
    /// Name of the encoder argument preset
    pub preset: &'static str,
    /// Encoder arguments, whitespace separated
    pub args: &'static str,
    /// Output resolution as `WxH`
    pub resolution: Option<&'static str>,
}

impl Profile {
    /// Encoder arguments including the resolution switch.
    pub fn encoder_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.args.split_whitespace().map(String::from).collect();
        if let Some(res) = self.resolution {
            args.push("-s".to_string());
            args.push(res.to_string());
        }
        args
    }
}

const BASELINE_ARGS: &str = "-movflags faststart -profile:v baseline -level 3.0";
const APPLE_41_ARGS: &str = "-profile:v high -level 4.1";
const APPLE_42_ARGS: &str = "-profile:v high -level 4.2";

/// All supported profiles.
pub const PROFILES: &[Profile] = &[
    Profile {
        name: "baseline",
        preset: "baseline",
        args: BASELINE_ARGS,
        resolution: None,
    },
    Profile {
        name: "iPhone4s",
        preset: "apple-41",
        args: APPLE_41_ARGS,
        resolution: Some("960x640"),
    },
    Profile {
        name: "iPhone5s",
        preset: "apple-42",
        args: APPLE_42_ARGS,
        resolution: Some("1136x640"),
    },
    Profile {
        name: "iPhonePlus6s",
        preset: "apple-42",
        args: APPLE_42_ARGS,
        resolution: Some("1920x1080"),
    },
    Profile {
        name: "iPadMini4",
        preset: "apple-42",
        args: APPLE_42_ARGS,
        resolution: Some("2048x1536"),
    },
];

/// Look up a profile by exact name.
pub fn find_profile(name: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.name == name)
}
