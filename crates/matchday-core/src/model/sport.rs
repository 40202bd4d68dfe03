use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Sport discriminator. Each sport owns one slice of the match store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sport {
    Cricket,
    #[serde(alias = "soccer")]
    #[strum(to_string = "football", serialize = "soccer")]
    Football,
}
