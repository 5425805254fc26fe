//! # exif-edit
//!
//! Read and edit photo metadata (tags, IPTC keywords, orientation and
//! timestamps) by driving the [exiftool](https://exiftool.org) command-line
//! program. exiftool must be installed and on `PATH`, or configured by path.
//!
//! ## Quick Start
//!
//! An [`ExifEditor`] is bound to one photo. Every call runs exiftool
//! synchronously and returns once the file has been read or rewritten:
//!
//! ```rust,no_run
//! use exif_edit::ExifEditor;
//! use exif_edit::exif::Apply;
//!
//! fn main() -> exif_edit::Result<()> {
//!     let editor = ExifEditor::new("photo.jpg");
//!
//!     // Keywords are IPTC list values
//!     editor.add_keywords(&["beach", "sunset"])?;
//!     editor.remove_keyword("sunset")?;
//!     println!("Keywords: {:?}", editor.get_keywords()?);
//!
//!     // Orientation is the EXIF 1..=8 code
//!     let turned = editor.rotate_clockwise(1, Apply::Write)?;
//!     println!("Orientation is now {turned}");
//!
//!     // Dates use the fixed "YYYY:MM:DD HH:MM:SS" format
//!     editor.set_original_date_time(Some("2021:06:01".into()))?;
//!     println!("Taken: {:?}", editor.get_original_date_time()?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Usage
//!
//! The [`pipeline`] module applies one [`Operation`](pipeline::Operation) to
//! many files, with settings from a [`Config`](config::Config):
//!
//! ```rust,no_run
//! use exif_edit::config::Config;
//! use exif_edit::pipeline::{apply, collect_images, Operation};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let images = collect_images(&[PathBuf::from("./photos")]);
//!
//!     for path in &images {
//!         let result = apply(path, &Operation::Rotate(90), &config);
//!         match result.error {
//!             Some(err) => eprintln!("Error processing {}: {err}", path.display()),
//!             None => println!("Rotated: {}", path.display()),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration types and loading/saving
//! - [`datetime`] - The exiftool date/time format
//! - [`error`] - Error type shared by the library
//! - [`exif`] - exiftool runner and the per-photo editor
//! - [`orientation`] - EXIF orientation codes, rotation and mirroring
//! - [`pipeline`] - Batch operations and image collection

pub mod config;
pub mod datetime;
pub mod error;
pub mod exif;
pub mod orientation;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use exif::{ExifEditor, ExifTool};
pub use orientation::Orientation;
