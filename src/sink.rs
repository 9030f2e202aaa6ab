use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A fresh output path in `dir`. The name carries the timestamp, sub-second
/// nanoseconds, the process id and a per-process counter, so concurrent or
/// same-second submissions never share a file.
pub fn unique_output_path(dir: &Path) -> PathBuf {
    let now = chrono::Local::now();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "agreement_{}_{:09}_{}_{}.pdf",
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_nanos(),
        std::process::id(),
        seq,
    ))
}

/// Write the finished document. The bytes go to a sibling temporary file
/// that is renamed into place, so a failed write never leaves a partial PDF
/// at `path`.
pub fn write_document(bytes: &[u8], path: &Path) -> Result<(), Error> {
    let sink_err = |source: std::io::Error| Error::Sink {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(sink_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    if let Err(e) = std::fs::write(&tmp, bytes) {
        std::fs::remove_file(&tmp).ok();
        return Err(sink_err(e));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        std::fs::remove_file(&tmp).ok();
        return Err(sink_err(e));
    }
    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
