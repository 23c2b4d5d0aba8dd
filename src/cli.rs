use clap::Parser;
use std::time::Duration;

use crate::export::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_FOLDER, DEFAULT_MAX_IMAGE_SIZE, EntryNaming, ExportOptions,
};
use crate::fetch::FetchOptions;
use crate::zip::{CompressionMethod, DEFAULT_LEVEL};

#[derive(Parser, Debug)]
#[command(name = "imgzip")]
#[command(version)]
#[command(about = "Collect every image of an HTML page into a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  imgzip https://example.com/gallery     save images.zip in the current directory\n  \
  imgzip page.html -d out -n page.zip    save out/page.zip from a local page\n  \
  imgzip -p https://example.com | unzip -l /dev/stdin")]
pub struct Cli {
    /// HTML file path or HTTP URL
    #[arg(value_name = "PAGE")]
    pub page: String,

    /// Save the archive into exdir
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub output_dir: String,

    /// Archive file name
    #[arg(short = 'n', long = "name", value_name = "FILE", default_value = DEFAULT_ARCHIVE_NAME)]
    pub archive_name: String,

    /// Folder holding the images inside the archive
    #[arg(short = 'f', long = "folder", value_name = "NAME", default_value = DEFAULT_FOLDER)]
    pub folder: String,

    /// Write the archive to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Name entries after the response content type instead of always .jpg
    #[arg(long)]
    pub infer_extension: bool,

    /// Store entries without compression
    #[arg(long)]
    pub store: bool,

    /// Leave out images larger than this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_size: u64,

    /// Per-request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// List the saved archive verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1 || self.pipe
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            folder: self.folder.clone(),
            archive_name: self.archive_name.clone(),
            naming: if self.infer_extension {
                EntryNaming::ContentType
            } else {
                EntryNaming::Fixed
            },
            compression: if self.store {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflate
            },
            level: DEFAULT_LEVEL,
            max_image_size: self.max_size,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.timeout.map(Duration::from_secs),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let cli = Cli::parse_from(["imgzip", "page.html"]);
        let options = cli.export_options();
        assert_eq!(options.folder, "images");
        assert_eq!(options.archive_name, "images.zip");
        assert_eq!(options.naming, EntryNaming::Fixed);
        assert_eq!(options.compression, CompressionMethod::Deflate);
        assert_eq!(options.max_image_size, u64::from(u32::MAX));
        assert_eq!(cli.output_dir, ".");
        assert!(cli.fetch_options().timeout.is_none());
        assert!(!cli.is_quiet());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "imgzip",
            "https://example.com",
            "-d",
            "out",
            "-n",
            "gallery.zip",
            "--infer-extension",
            "--store",
            "--timeout",
            "10",
            "--max-size",
            "1048576",
            "-qq",
        ]);
        let options = cli.export_options();
        assert_eq!(options.archive_name, "gallery.zip");
        assert_eq!(options.naming, EntryNaming::ContentType);
        assert_eq!(options.compression, CompressionMethod::Stored);
        assert_eq!(options.max_image_size, 1_048_576);
        assert_eq!(cli.fetch_options().timeout, Some(Duration::from_secs(10)));
        assert!(cli.is_very_quiet());
    }

    #[test]
    fn pipe_mode_is_quiet() {
        let cli = Cli::parse_from(["imgzip", "-p", "page.html"]);
        assert!(cli.is_quiet());
        assert!(cli.is_very_quiet());
    }
}
