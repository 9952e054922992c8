use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::archive::SplibArchive;
use crate::datatable;
use crate::domain::{Chapter, Sampling, SpectrumIdentifier};
use crate::error::Splib07Error;

/// All spectra of one chapter, keyed by identifier.
pub type ChapterIndex = BTreeMap<SpectrumIdentifier, SpectrumEntry>;

/// One row of a sampling's datatable: the relative archive paths holding the
/// spectrum's data and plots.
///
/// Some entries lack spectra, error bounds or range plots in some samplings
/// (e.g. Landsat8 Ilmenite HS231.3B NIC4bcu); those fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumEntry {
    pub name: SpectrumIdentifier,
    pub description: Utf8PathBuf,
    pub spectrum_asciidata: Option<Utf8PathBuf>,
    pub error_asciidata: Option<Utf8PathBuf>,
    pub wavelengths_asciidata: Utf8PathBuf,
    pub bandpass_asciidata: Utf8PathBuf,
    pub range_plot: Option<Utf8PathBuf>,
    pub wavelength_plot: Utf8PathBuf,
    pub bandpass_plot: Utf8PathBuf,
    pub extra_range_plots: Vec<Option<Utf8PathBuf>>,
}

impl SpectrumEntry {
    /// All path fields that are present, for archive completeness checks.
    pub fn paths(&self) -> Vec<&Utf8Path> {
        let mut paths: Vec<&Utf8Path> = vec![
            &self.description,
            &self.wavelengths_asciidata,
            &self.bandpass_asciidata,
            &self.wavelength_plot,
            &self.bandpass_plot,
        ];
        paths.extend(self.spectrum_asciidata.as_deref());
        paths.extend(self.error_asciidata.as_deref());
        paths.extend(self.range_plot.as_deref());
        paths.extend(self.extra_range_plots.iter().flatten().map(Utf8PathBuf::as_path));
        paths
    }
}

/// Per-chapter sub-indices of one sampling, in chapter ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingIndex {
    chapters: [ChapterIndex; 7],
}

impl SamplingIndex {
    pub(crate) fn insert(&mut self, chapter: Chapter, entry: SpectrumEntry) {
        self.chapters[chapter.index()].insert(entry.name.clone(), entry);
    }

    /// Sub-index of a single chapter.
    pub fn chapter(&self, chapter: Chapter) -> &ChapterIndex {
        &self.chapters[chapter.index()]
    }

    /// Union of the requested chapter sub-indices. Identifiers are assumed
    /// disjoint across chapters within a sampling.
    pub fn only_chapters<'a>(
        &'a self,
        chapters: &[Chapter],
    ) -> BTreeMap<&'a str, &'a SpectrumEntry> {
        let mut union = BTreeMap::new();
        for chapter in chapters {
            for (name, entry) in self.chapter(*chapter) {
                union.insert(name.as_str(), entry);
            }
        }
        union
    }

    /// Union of all 7 chapter sub-indices.
    pub fn all_chapters(&self) -> BTreeMap<&str, &SpectrumEntry> {
        self.only_chapters(&Chapter::ALL)
    }

    /// Look up an entry by identifier across all chapters.
    pub fn get(&self, name: &str) -> Option<&SpectrumEntry> {
        self.chapters.iter().find_map(|chapter| chapter.get(name))
    }

    /// Entry counts per chapter, in ordinal order.
    pub fn chapter_counts(&self) -> [usize; 7] {
        let mut counts = [0; 7];
        for (slot, chapter) in self.chapters.iter().enumerate() {
            counts[slot] = chapter.len();
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.chapters.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index of all spectra contained in an splib07 archive, per sampling.
///
/// Built once by parsing the archive's markup (or loaded once from the
/// serialized cache) and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Splib07Index {
    samplings: BTreeMap<Sampling, SamplingIndex>,
}

impl Splib07Index {
    pub fn new(samplings: BTreeMap<Sampling, SamplingIndex>) -> Self {
        Self { samplings }
    }

    /// Build the index by parsing the archive's table of contents and every
    /// datatable it references.
    ///
    /// The result covers exactly the samplings the TOC lists, which may be
    /// fewer than all known [`Sampling`] values for an incomplete archive.
    pub fn generate(root: &SplibArchive) -> Result<Self, Splib07Error> {
        let toc_path = Utf8Path::new("indexes").join("table_of_contents.html");
        let toc_text = root.read_to_string(&toc_path)?;
        let datatables = datatable::read_toc(&toc_text)?;

        let mut samplings = BTreeMap::new();
        for (sampling, relative) in datatables {
            let datatable_path = Utf8Path::new("indexes").join(&relative);
            let text = root.read_to_string(&datatable_path)?;
            let index = datatable::read_datatable(&text, datatable_path.as_str())?;
            debug!(
                sampling = %sampling,
                entries = index.len(),
                "parsed datatable"
            );
            samplings.insert(sampling, index);
        }

        let index = Self { samplings };
        info!(
            samplings = index.samplings.len(),
            spectra = index
                .sampling(Sampling::Measured)
                .map(SamplingIndex::len)
                .unwrap_or(0),
            location = %root.location(),
            "generated archive index"
        );
        Ok(index)
    }

    /// Sub-index for one sampling, if the archive carried it.
    pub fn sampling(&self, sampling: Sampling) -> Option<&SamplingIndex> {
        self.samplings.get(&sampling)
    }

    /// Samplings present in this index, in declaration order of the map key.
    pub fn samplings(&self) -> Vec<Sampling> {
        self.samplings.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samplings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplings.is_empty()
    }
}
