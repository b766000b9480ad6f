//! Small helpers shared across modules.

use std::ffi::OsStr;
use std::path::Path;

/// True when `name` carries exactly the given extension (final dot segment,
/// no leading dot in `ext`).
pub(crate) fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name).extension() == Some(OsStr::new(ext))
}
