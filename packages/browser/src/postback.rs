//! ASP.NET WebForms postback decoding.
//!
//! WebForms controls navigate by calling `__doPostBack(target, argument)`
//! (or `WebForm_DoPostBackWithOptions` for controls with validation), which
//! copies the pair into the hidden `__EVENTTARGET`/`__EVENTARGUMENT`
//! fields and submits the page form. The HTTP session reproduces that by
//! decoding the call out of `href`, `onclick` and `onchange` scripts.

use std::sync::LazyLock;

use regex::Regex;

/// Hidden field carrying the postback target.
pub const EVENT_TARGET: &str = "__EVENTTARGET";

/// Hidden field carrying the postback argument.
pub const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

// `onchange` handlers escape their quotes inside `setTimeout('...')`.
static DO_POST_BACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__doPostBack\(\s*\\?'([^'\\]*)\\?'\s*,\s*\\?'([^'\\]*)\\?'\s*\)")
        .unwrap_or_else(|_| unreachable!())
});

static POST_BACK_OPTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"WebForm_PostBackOptions\(\s*"([^"]*)"\s*,\s*"([^"]*)""#)
        .unwrap_or_else(|_| unreachable!())
});

/// A decoded postback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBack {
    /// Value for `__EVENTTARGET`.
    pub target: String,
    /// Value for `__EVENTARGUMENT`.
    pub argument: String,
}

impl PostBack {
    /// Decodes the first postback call in `script`, if there is one.
    #[must_use]
    pub fn parse(script: &str) -> Option<Self> {
        DO_POST_BACK
            .captures(script)
            .or_else(|| POST_BACK_OPTIONS.captures(script))
            .map(|caps| Self {
                target: caps[1].to_owned(),
                argument: caps[2].to_owned(),
            })
    }
}
