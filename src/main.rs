//! Main entry point for the imgzip CLI application.
//!
//! Loads the page, exports its images and saves the archive either into a
//! directory or to stdout.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;

use imgzip::{
    ArchiveBlob, ArchiveReader, Cli, DirectorySink, Document, ExportReport, ImageZipExporter,
    SchemeFetcher, StdoutSink, logging,
};

/// Application entry point.
///
/// Individual images that cannot be fetched do not make the run fail; only
/// an unreadable page or an archive that cannot be written does.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet = if cli.pipe { 2 } else { cli.quiet };
    logging::init_logging(quiet)?;

    let fetcher = Arc::new(SchemeFetcher::new(&cli.fetch_options())?);
    let document = Document::load(&cli.page, fetcher.http()).await?;
    let exporter = ImageZipExporter::new(fetcher.clone(), cli.export_options());

    // Pipe mode: the archive is the only thing written to stdout
    if cli.pipe {
        exporter.export_and_save(&document, &StdoutSink).await?;
        return Ok(());
    }

    let sink = DirectorySink::new(&cli.output_dir);
    let report = exporter.export_and_save(&document, &sink).await?;

    if !cli.is_quiet() {
        for image in &report.archived {
            println!("  adding: {} ({})", image.entry_name, format_size(image.size as u64));
        }
    }

    if cli.verbose {
        list_archive(&report.archive, &mut std::io::stdout().lock())?;
    }

    if !cli.is_very_quiet() {
        print_summary(&report, &sink.path_for(&cli.archive_name).display().to_string());
        eprintln!(
            "Total bytes transferred: {}",
            format_size(fetcher.http().transferred_bytes())
        );
    }

    Ok(())
}

fn print_summary(report: &ExportReport, path: &str) {
    if report.failed.is_empty() {
        eprintln!(
            "\nSaved {} of {} images to {}",
            report.archived.len(),
            report.total(),
            path
        );
    } else {
        eprintln!(
            "\nSaved {} of {} images to {} ({} failed)",
            report.archived.len(),
            report.total(),
            path,
            report.failed.len()
        );
    }
}

/// List the entries of the saved archive in a table with size,
/// compression ratio and timestamp.
fn list_archive(archive: &ArchiveBlob, out: &mut impl Write) -> Result<()> {
    let entries = ArchiveReader::new(archive.as_bytes()).list_files()?;

    writeln!(
        out,
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    )?;
    writeln!(out, "{}", "-".repeat(70))?;

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        writeln!(
            out,
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        )?;

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    writeln!(out, "{}", "-".repeat(70))?;
    writeln!(
        out,
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    )?;

    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// `512 bytes`, `1.50 KB`, `3.25 MB` and so on, in powers of 1024.
fn format_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if size < 1024 {
        return format!("{} bytes", size);
    }

    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgzip::ArchiveBuilder;

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 << 40), "3072.00 GB");
    }

    #[test]
    fn ratio_is_space_saved() {
        assert_eq!(ratio(25, 100), "  75%");
        assert_eq!(ratio(0, 0), "  0%");
        assert_eq!(ratio(120, 100), "  0%");
    }

    #[test]
    fn listing_counts_files_but_not_folders() {
        let mut builder = ArchiveBuilder::new();
        builder.add_directory("images").unwrap();
        builder.add_file("images/image1.jpg", vec![0; 100]).unwrap();
        builder.add_file("images/image3.jpg", b"abc".to_vec()).unwrap();
        let blob = builder.generate().unwrap();

        let mut out = Vec::new();
        list_archive(&blob, &mut out).unwrap();
        let listing = String::from_utf8(out).unwrap();
        let lines: Vec<_> = listing.lines().collect();

        assert_eq!(lines.len(), 7);
        assert!(lines[0].trim_end().ends_with("Name"));
        assert!(lines[2].ends_with("images/"));
        assert!(lines[3].ends_with("images/image1.jpg"));
        assert_eq!(lines[4].split_whitespace().take(3).collect::<Vec<_>>(), ["3", "3", "0%"]);
        assert!(lines[6].starts_with("       103"));
        assert!(lines[6].ends_with("2 files"));
    }
}
