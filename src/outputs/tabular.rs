//! CSV export of a run's collected items.
//!
//! Every run writes one file named after its collection timestamp. Only the
//! six shared columns are exported; source-specific passthrough fields stay
//! in the stores.
//!
//! | Column | Field |
//! |--------|-------|
//! | `execution_timestamp` | [`CollectedItem::collected_at`] |
//! | `pubDate` | [`CollectedItem::published`] |
//! | `organization` | [`CollectedItem::organization`] |
//! | `title` | [`CollectedItem::title`] |
//! | `link` | [`CollectedItem::link`] |
//! | `summary` | [`CollectedItem::summary`] |

use crate::error::{Error, Result};
use crate::models::CollectedItem;
use crate::utils::file_safe;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const HEADER: [&str; 6] = [
    "execution_timestamp",
    "pubDate",
    "organization",
    "title",
    "link",
    "summary",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Path of the CSV snapshot for a run collected at `timestamp`.
pub fn export_path(output_dir: &Path, timestamp: &str) -> PathBuf {
    output_dir.join(format!("collected_{}.csv", file_safe(timestamp)))
}

/// Write `items` to `path` as CSV.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to export. With `bom` set, the file starts with a UTF-8 byte order mark
/// so spreadsheet tools detect the encoding.
#[instrument(level = "info", skip_all, fields(count = items.len(), path = %path.display()))]
pub fn export(items: &[CollectedItem], path: &Path, bom: bool) -> Result<Option<PathBuf>> {
    if items.is_empty() {
        info!("No new items; skipping export");
        return Ok(None);
    }

    let fail = |reason: String| Error::ExportWrite {
        path: path.to_path_buf(),
        reason,
    };

    let mut file = File::create(path).map_err(|e| fail(e.to_string()))?;
    if bom {
        file.write_all(UTF8_BOM).map_err(|e| fail(e.to_string()))?;
    }

    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(HEADER).map_err(|e| fail(e.to_string()))?;
    for item in items {
        wtr.write_record([
            item.collected_at.as_str(),
            item.published.as_str(),
            item.organization.as_str(),
            item.title.as_str(),
            item.link.as_str(),
            item.summary.as_str(),
        ])
        .map_err(|e| fail(e.to_string()))?;
    }
    wtr.flush().map_err(|e| fail(e.to_string()))?;

    info!("Wrote CSV export");
    Ok(Some(path.to_path_buf()))
}
