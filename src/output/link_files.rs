//! Link list files
//!
//! Writes the two URL sets of a [`CrawlReport`] as plain text, one URL per
//! line, named after the seed's domain.

use crate::crawler::CrawlReport;
use crate::url::CanonicalUrl;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths of the files written by [`write_link_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFiles {
    pub internal: PathBuf,
    pub external: PathBuf,
}

/// File-name stem for a seed authority
///
/// `:` is not portable in file names, so `host:port` becomes `host_port`.
pub fn file_stem(authority: &str) -> String {
    authority.replace(':', "_")
}

/// Writes `<domain>_internal_links.txt` and `<domain>_external_links.txt`
/// into `directory`, creating it if needed
///
/// Existing files are overwritten.
pub fn write_link_files(report: &CrawlReport, directory: &Path) -> std::io::Result<LinkFiles> {
    fs::create_dir_all(directory)?;

    let stem = file_stem(&report.seed_authority);
    let files = LinkFiles {
        internal: directory.join(format!("{}_internal_links.txt", stem)),
        external: directory.join(format!("{}_external_links.txt", stem)),
    };

    write_urls(&files.internal, &report.internal)?;
    write_urls(&files.external, &report.external)?;

    tracing::info!(
        "Wrote {} internal and {} external links to {}",
        report.internal.len(),
        report.external.len(),
        directory.display()
    );

    Ok(files)
}

fn write_urls(path: &Path, urls: &BTreeSet<CanonicalUrl>) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()
}
