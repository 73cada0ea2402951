//! Preprocessor options.

/// Feature switches for [`DeepClasses`](crate::DeepClasses).
///
/// Both features are off by default. With the `serde` feature the options
/// (de)serialize with camelCase keys, e.g. `{"rtl": true, "globalPrefix": false}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", default, deny_unknown_fields)
)]
pub struct PreprocessOptions {
    /// Support right-to-left layouts through `rtl:` and `ltr:` prefixed classes.
    pub rtl: bool,
    /// Make `gl:` prefixed classes global.
    pub global_prefix: bool,
}

impl PreprocessOptions {
    /// Returns true if any whole-document token scan is needed.
    pub fn scans_tokens(&self) -> bool {
        self.rtl || self.global_prefix
    }
}
