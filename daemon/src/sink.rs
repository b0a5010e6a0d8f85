use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use common::{capture_file_name, JobDetails, JobSource, LogEntry};
use image::{ImageFormat, RgbaImage};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Source of full-screen images.
pub trait ScreenGrabber: Send {
    /// Grab the primary display. `Ok(None)` when there is no display to grab.
    fn grab_primary(&self) -> Result<Option<RgbaImage>>;
}

pub struct XcapGrabber;

impl ScreenGrabber for XcapGrabber {
    fn grab_primary(&self) -> Result<Option<RgbaImage>> {
        let monitors = match xcap::Monitor::all() {
            Ok(monitors) => monitors,
            Err(e) => {
                log::debug!("No display available for capture: {}", e);
                return Ok(None);
            }
        };
        let Some(primary) = monitors.into_iter().find(|m| m.is_primary()) else {
            log::debug!("No primary monitor found");
            return Ok(None);
        };
        let image = primary
            .capture_image()
            .context("Failed to capture primary monitor")?;
        Ok(Some(image))
    }
}

/// Writes the print log and the capture artifacts into one directory.
pub struct Sink {
    dir: PathBuf,
    grabber: Option<Box<dyn ScreenGrabber>>,
}

impl Sink {
    pub fn new(dir: PathBuf, grabber: Option<Box<dyn ScreenGrabber>>) -> Self {
        Self { dir, grabber }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(common::LOG_FILE_NAME)
    }

    /// Append one line for the job to the print log.
    pub fn log_job(&self, details: &JobDetails, timestamp: NaiveDateTime, source: JobSource) -> Result<()> {
        self.ensure_dir()?;
        let line = LogEntry::new(details, timestamp, source).to_line();

        let path = self.log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open print log: {:?}", path))?;
        // Whole line in a single write.
        file.write_all(format!("{}\n", line).as_bytes())
            .with_context(|| format!("Failed to append to print log: {:?}", path))?;

        log::info!(target: "print_log", "{}", line);
        Ok(())
    }

    /// Save the primary display as a PNG named after `timestamp`.
    ///
    /// Returns `Ok(None)` when capture is disabled or no display exists.
    pub fn capture_screen(&self, timestamp: NaiveDateTime) -> Result<Option<PathBuf>> {
        let Some(grabber) = &self.grabber else {
            return Ok(None);
        };
        let Some(image) = grabber.grab_primary()? else {
            return Ok(None);
        };

        self.ensure_dir()?;
        let path = self.save_new(&image, &capture_file_name(timestamp))?;
        log::info!("Screen captured: {}", path.display());
        Ok(Some(path))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.dir))
    }

    /// Write `image` under `name`, or `stem_2.png`, `stem_3.png`, ... if taken.
    fn save_new(&self, image: &RgbaImage, name: &str) -> Result<PathBuf> {
        let stem = name.trim_end_matches(".png");
        let mut attempt = 1u32;
        loop {
            let path = if attempt == 1 {
                self.dir.join(name)
            } else {
                self.dir.join(format!("{}_{}.png", stem, attempt))
            };

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    let mut writer = BufWriter::new(file);
                    image
                        .write_to(&mut writer, ImageFormat::Png)
                        .with_context(|| format!("Failed to encode capture: {:?}", path))?;
                    writer
                        .flush()
                        .with_context(|| format!("Failed to write capture: {:?}", path))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create capture file: {:?}", path));
                }
            }
        }
    }
}
