//! Per-chunk size reporting.

use tracing::info;

use bindle_config::ResolvedOptions;

use crate::driver::BuildChunks;

/// Log one line per emitted file, grouped by format.
pub fn report_chunks(options: &ResolvedOptions, chunks: &BuildChunks) {
    if options.report.is_none() {
        return;
    }
    let prefix = options
        .name
        .as_deref()
        .map(|name| format!("[{name}] "))
        .unwrap_or_default();
    for (format, files) in chunks {
        for file in files {
            info!(
                "{prefix}{format} {} {}",
                file.filename,
                format_size(file.size())
            );
        }
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.2} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_format_by_magnitude() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }
}
