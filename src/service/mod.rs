pub mod articles;
pub mod groups;

use std::{fs, path::Path};

use anyhow::Context;
use serde::Serialize;

/// Write pretty JSON next to `path`, then move it into place. A failed write leaves the
/// previous file untouched.
pub(crate) fn write_json_atomically<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to move {:?} to {:?}", tmp, path))?;
    Ok(())
}
