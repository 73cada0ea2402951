//! Final renaming of class prefixes so later tooling sees plain classes.

use crate::synthesize::{Direction, GLOBAL_PREFIX};
use crate::PreprocessOptions;

/// Replaces `ltr:` and `rtl:` (with `rtl` on) and then `gl:` (with
/// `global_prefix` on) across the whole text.
///
/// Every replacement has the same length as what it replaces, so offsets
/// into the text stay valid.
pub fn rename_prefixes(code: String, options: &PreprocessOptions) -> String {
    let mut code = code;
    if options.rtl {
        for direction in [Direction::Ltr, Direction::Rtl] {
            code = code.replace(direction.prefix(), direction.renamed_prefix());
        }
    }
    if options.global_prefix {
        code = code.replace(GLOBAL_PREFIX, "gl_");
    }
    code
}
