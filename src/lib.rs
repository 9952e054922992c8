//! Structured access to a local archive of the USGS Spectral Library
//! Version 7 (DS 1035).
//!
//! The crate builds a typed index over the archive's HTML table of contents
//! and per-sampling datatables, persists it as a compressed blob so runtime
//! consumers never re-parse markup, and loads spectra with optional band
//! resampling to arbitrary wavelength/FWHM grids.
//!
//! ```no_run
//! use splib07::domain::{DeletedPolicy, ResampleTarget, Sampling};
//! use splib07::library::Splib07;
//!
//! let library = Splib07::open("data/usgs_splib07")?;
//! let spectrum = library.load(
//!     "Seawater_Coast_Chl_SW1",
//!     &ResampleTarget::Sampling(Sampling::Measured),
//!     DeletedPolicy::Nan,
//! )?;
//! assert_eq!(spectrum.values.len(), spectrum.wavelengths.len());
//! # Ok::<(), splib07::error::Splib07Error>(())
//! ```

pub mod archive;
pub mod cache;
pub mod datatable;
pub mod domain;
pub mod error;
pub mod index;
pub mod library;
pub mod resample;

pub use domain::{Chapter, DeletedPolicy, ResampleTarget, Sampling, Spectrum};
pub use error::Splib07Error;
pub use index::Splib07Index;
pub use library::Splib07;
