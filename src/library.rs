use camino::{Utf8Path, Utf8PathBuf};
use regex::RegexBuilder;
use tracing::debug;

use crate::archive::SplibArchive;
use crate::domain::{
    Chapter, DeletedPolicy, ResampleTarget, Sampling, Spectrum, is_deleted_channel,
};
use crate::error::Splib07Error;
use crate::index::Splib07Index;
use crate::resample::{BandResampler, build_fwhm};

/// Subdirectories every valid archive root must contain.
const EXPECTED_ROOT_ENTRIES: [&str; 2] = ["ASCIIdata", "indexes"];

/// Interface to a local archive of the USGS Spectral Library Version 7.
///
/// Owns the archive view and a read-only index; all lookups go through the
/// index, file reads happen only on [`Splib07::load`].
#[derive(Debug)]
pub struct Splib07 {
    archive: SplibArchive,
    index: Splib07Index,
}

impl Splib07 {
    /// Open an archive root (directory or zip) and build a fresh index by
    /// parsing its markup. Use [`Splib07::with_index`] to skip parsing.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self, Splib07Error> {
        let archive = SplibArchive::open(root)?;
        validate_root(&archive)?;
        let index = Splib07Index::generate(&archive)?;
        Ok(Self { archive, index })
    }

    /// Open an archive root with a pre-built index (typically from
    /// [`crate::cache::load_cached`]).
    pub fn with_index(
        root: impl AsRef<Utf8Path>,
        index: Splib07Index,
    ) -> Result<Self, Splib07Error> {
        let archive = SplibArchive::open(root)?;
        validate_root(&archive)?;
        Ok(Self { archive, index })
    }

    pub fn index(&self) -> &Splib07Index {
        &self.index
    }

    /// Identifiers of all available spectra, optionally restricted to the
    /// given chapters. Sourced from the measured baseline sampling, the
    /// canonical completeness reference.
    pub fn list_spectra(&self, chapters: Option<&[Chapter]>) -> Vec<String> {
        let Some(measured) = self.index.sampling(Sampling::Measured) else {
            return Vec::new();
        };
        let union = match chapters {
            Some(chapters) => measured.only_chapters(chapters),
            None => measured.all_chapters(),
        };
        union.keys().map(|name| name.to_string()).collect()
    }

    /// Spectra whose identifier matches the pattern, case-insensitively.
    pub fn search_spectra(
        &self,
        pattern: &str,
        chapters: Option<&[Chapter]>,
    ) -> Result<Vec<String>, Splib07Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| Splib07Error::InvalidPattern(err.to_string()))?;

        Ok(self
            .list_spectra(chapters)
            .into_iter()
            .filter(|name| regex.is_match(name))
            .collect())
    }

    /// Samplings present in the opened archive's index.
    pub fn list_samplings(&self) -> Vec<Sampling> {
        self.index.samplings()
    }

    /// Load a spectrum.
    ///
    /// A [`ResampleTarget::Sampling`] loads that sampling's native data
    /// directly. Explicit target bands load the oversampled baseline as the
    /// resampling source, apply the deleted-channel policy, then resample.
    pub fn load(
        &self,
        spectrum: &str,
        target: &ResampleTarget,
        deleted: DeletedPolicy,
    ) -> Result<Spectrum, Splib07Error> {
        let source = match target {
            ResampleTarget::Sampling(sampling) => *sampling,
            ResampleTarget::Centers(_) | ResampleTarget::Bands { .. } => Sampling::Oversampled,
        };
        debug!(spectrum, sampling = %source, "loading spectrum");

        let loaded = self.load_native(spectrum, source, deleted)?;

        match target {
            ResampleTarget::Sampling(_) => Ok(loaded),
            ResampleTarget::Centers(centers) => {
                let fwhm = build_fwhm(centers);
                Ok(resample_to(&loaded, centers.clone(), fwhm))
            }
            ResampleTarget::Bands { centers, fwhm } => {
                Ok(resample_to(&loaded, centers.clone(), fwhm.clone()))
            }
        }
    }

    /// Load one sampling's native arrays and apply the deleted policy.
    fn load_native(
        &self,
        spectrum: &str,
        sampling: Sampling,
        deleted: DeletedPolicy,
    ) -> Result<Spectrum, Splib07Error> {
        let sampling_index = self
            .index
            .sampling(sampling)
            .ok_or_else(|| Splib07Error::UnknownResamplingTarget(sampling.label().to_string()))?;

        let entry = sampling_index
            .get(spectrum)
            .ok_or_else(|| Splib07Error::UnknownSpectrum(spectrum.to_string()))?;

        let data_path = entry
            .spectrum_asciidata
            .as_ref()
            .ok_or_else(|| Splib07Error::MissingData {
                spectrum: spectrum.to_string(),
                sampling: sampling.label().to_string(),
            })?;

        let values = self.read_asciidata(data_path)?;
        let wavelengths = self.read_asciidata(&entry.wavelengths_asciidata)?;
        let fwhm = self.read_asciidata(&entry.bandpass_asciidata)?;

        // The three files are read independently; band alignment depends on
        // equal lengths.
        if wavelengths.len() != values.len() || fwhm.len() != values.len() {
            return Err(Splib07Error::AsciiData {
                path: data_path.clone(),
                detail: format!(
                    "band count mismatch: {} values, {} wavelengths, {} fwhm",
                    values.len(),
                    wavelengths.len(),
                    fwhm.len()
                ),
            });
        }

        Ok(apply_deleted_policy(
            Spectrum {
                values,
                wavelengths,
                fwhm,
            },
            deleted,
        ))
    }

    /// Parse a whitespace-delimited ASCIIdata file: one header line to skip,
    /// then one floating-point value per line.
    fn read_asciidata(&self, path: &Utf8PathBuf) -> Result<Vec<f64>, Splib07Error> {
        let text = self.archive.read_to_string(path)?;
        text.lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse::<f64>().map_err(|err| Splib07Error::AsciiData {
                    path: path.clone(),
                    detail: format!("'{line}': {err}"),
                })
            })
            .collect()
    }
}

/// The deleted-channel mask comes from the value array; `drop` removes the
/// flagged indices from all three arrays in lock-step so band alignment is
/// preserved.
fn apply_deleted_policy(spectrum: Spectrum, policy: DeletedPolicy) -> Spectrum {
    match policy {
        DeletedPolicy::Sigil => spectrum,
        DeletedPolicy::Nan => {
            let values = spectrum
                .values
                .into_iter()
                .map(|value| {
                    if is_deleted_channel(value) {
                        f64::NAN
                    } else {
                        value
                    }
                })
                .collect();
            Spectrum { values, ..spectrum }
        }
        DeletedPolicy::Drop => {
            let mask: Vec<bool> = spectrum.values.iter().copied().map(is_deleted_channel).collect();
            Spectrum {
                values: retain_unmasked(spectrum.values, &mask),
                wavelengths: retain_unmasked(spectrum.wavelengths, &mask),
                fwhm: retain_unmasked(spectrum.fwhm, &mask),
            }
        }
    }
}

fn retain_unmasked(array: Vec<f64>, mask: &[bool]) -> Vec<f64> {
    array
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !mask.get(*index).copied().unwrap_or(false))
        .map(|(_, value)| value)
        .collect()
}

fn resample_to(source: &Spectrum, centers: Vec<f64>, fwhm: Vec<f64>) -> Spectrum {
    let resampler = BandResampler::new(&source.wavelengths, &source.fwhm, &centers, &fwhm);
    Spectrum {
        values: resampler.resample(&source.values),
        wavelengths: centers,
        fwhm,
    }
}

fn validate_root(archive: &SplibArchive) -> Result<(), Splib07Error> {
    let contents = archive.root_entries()?;
    let missing: Vec<String> = EXPECTED_ROOT_ENTRIES
        .iter()
        .filter(|expected| !contents.iter().any(|entry| entry == *expected))
        .map(|expected| expected.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(Splib07Error::InvalidArchiveRoot {
            root: archive.location().to_owned(),
            missing,
            contents,
        });
    }
    Ok(())
}
