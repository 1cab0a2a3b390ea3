use std::ffi::OsString;
use std::path::{Path, PathBuf};

const CONVERTED: &str = "converted";

/// Returns `out` when given, otherwise `source` with `.converted` inserted before its
/// extension. Names without an extension get `.converted` appended.
pub fn resolve_out_file(source: &Path, out: Option<&Path>) -> PathBuf {
    if let Some(out) = out.filter(|out| !out.as_os_str().is_empty()) {
        return out.to_path_buf();
    }

    let mut name = match source.file_stem() {
        Some(stem) => stem.to_os_string(),
        None => OsString::new(),
    };
    name.push(".");
    name.push(CONVERTED);

    if let Some(extension) = source.extension() {
        name.push(".");
        name.push(extension);
    }

    source.with_file_name(name)
}
