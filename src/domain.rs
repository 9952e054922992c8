use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Splib07Error;

/// Unique identifier of a spectrum, shared by all samplings that carry it.
pub type SpectrumIdentifier = String;

/// Sampling/resampling variants shipped with the splib07 archive.
///
/// Each variant maps 1:1 to the path-segment label the archive uses both
/// for its datatable file stem and its data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sampling {
    #[serde(rename = "splib07a")]
    Measured,
    #[serde(rename = "splib07b")]
    Oversampled,
    #[serde(rename = "splib07b_cvASD")]
    Asd,
    #[serde(rename = "splib07b_cvAVIRISc1995")]
    Aviris1995,
    #[serde(rename = "splib07b_cvAVIRISc1996")]
    Aviris1996,
    #[serde(rename = "splib07b_cvAVIRISc1997")]
    Aviris1997,
    #[serde(rename = "splib07b_cvAVIRISc1998")]
    Aviris1998,
    #[serde(rename = "splib07b_cvAVIRISc1999")]
    Aviris1999,
    #[serde(rename = "splib07b_cvAVIRISc2000")]
    Aviris2000,
    #[serde(rename = "splib07b_cvAVIRISc2001")]
    Aviris2001,
    #[serde(rename = "splib07b_cvAVIRISc2005")]
    Aviris2005,
    #[serde(rename = "splib07b_cvAVIRISc2006")]
    Aviris2006,
    #[serde(rename = "splib07b_cvAVIRISc2009")]
    Aviris2009,
    #[serde(rename = "splib07b_cvAVIRISc2010")]
    Aviris2010,
    #[serde(rename = "splib07b_cvAVIRISc2011")]
    Aviris2011,
    #[serde(rename = "splib07b_cvAVIRISc2012")]
    Aviris2012,
    #[serde(rename = "splib07b_cvAVIRISc2013")]
    Aviris2013,
    #[serde(rename = "splib07b_cvAVIRISc2014")]
    Aviris2014,
    #[serde(rename = "splib07b_cvCRISM-global")]
    CrismGlobal,
    #[serde(rename = "splib07b_cvCRISMjMTR3")]
    CrismTarget,
    #[serde(rename = "splib07b_cvHYMAP2007")]
    Hymap2007,
    #[serde(rename = "splib07b_cvHYMAP2014")]
    Hymap2014,
    #[serde(rename = "splib07b_cvHYPERION")]
    Hyperion,
    #[serde(rename = "splib07b_cvM3-target")]
    M3Target,
    #[serde(rename = "splib07b_cvVIMS")]
    Vims,
    #[serde(rename = "splib07b_rsASTER")]
    Aster,
    #[serde(rename = "splib07b_rsLandsat8")]
    Landsat8,
    #[serde(rename = "splib07b_rsSentinel2")]
    Sentinel2,
    #[serde(rename = "splib07b_rsWorldView3")]
    WorldView3,
}

impl Sampling {
    pub const ALL: [Sampling; 29] = [
        Sampling::Measured,
        Sampling::Oversampled,
        Sampling::Asd,
        Sampling::Aviris1995,
        Sampling::Aviris1996,
        Sampling::Aviris1997,
        Sampling::Aviris1998,
        Sampling::Aviris1999,
        Sampling::Aviris2000,
        Sampling::Aviris2001,
        Sampling::Aviris2005,
        Sampling::Aviris2006,
        Sampling::Aviris2009,
        Sampling::Aviris2010,
        Sampling::Aviris2011,
        Sampling::Aviris2012,
        Sampling::Aviris2013,
        Sampling::Aviris2014,
        Sampling::CrismGlobal,
        Sampling::CrismTarget,
        Sampling::Hymap2007,
        Sampling::Hymap2014,
        Sampling::Hyperion,
        Sampling::M3Target,
        Sampling::Vims,
        Sampling::Aster,
        Sampling::Landsat8,
        Sampling::Sentinel2,
        Sampling::WorldView3,
    ];

    /// Archive path-segment label for this sampling.
    pub fn label(self) -> &'static str {
        match self {
            Sampling::Measured => "splib07a",
            Sampling::Oversampled => "splib07b",
            Sampling::Asd => "splib07b_cvASD",
            Sampling::Aviris1995 => "splib07b_cvAVIRISc1995",
            Sampling::Aviris1996 => "splib07b_cvAVIRISc1996",
            Sampling::Aviris1997 => "splib07b_cvAVIRISc1997",
            Sampling::Aviris1998 => "splib07b_cvAVIRISc1998",
            Sampling::Aviris1999 => "splib07b_cvAVIRISc1999",
            Sampling::Aviris2000 => "splib07b_cvAVIRISc2000",
            Sampling::Aviris2001 => "splib07b_cvAVIRISc2001",
            Sampling::Aviris2005 => "splib07b_cvAVIRISc2005",
            Sampling::Aviris2006 => "splib07b_cvAVIRISc2006",
            Sampling::Aviris2009 => "splib07b_cvAVIRISc2009",
            Sampling::Aviris2010 => "splib07b_cvAVIRISc2010",
            Sampling::Aviris2011 => "splib07b_cvAVIRISc2011",
            Sampling::Aviris2012 => "splib07b_cvAVIRISc2012",
            Sampling::Aviris2013 => "splib07b_cvAVIRISc2013",
            Sampling::Aviris2014 => "splib07b_cvAVIRISc2014",
            Sampling::CrismGlobal => "splib07b_cvCRISM-global",
            Sampling::CrismTarget => "splib07b_cvCRISMjMTR3",
            Sampling::Hymap2007 => "splib07b_cvHYMAP2007",
            Sampling::Hymap2014 => "splib07b_cvHYMAP2014",
            Sampling::Hyperion => "splib07b_cvHYPERION",
            Sampling::M3Target => "splib07b_cvM3-target",
            Sampling::Vims => "splib07b_cvVIMS",
            Sampling::Aster => "splib07b_rsASTER",
            Sampling::Landsat8 => "splib07b_rsLandsat8",
            Sampling::Sentinel2 => "splib07b_rsSentinel2",
            Sampling::WorldView3 => "splib07b_rsWorldView3",
        }
    }

    /// Resolve an archive label against the closed variant set.
    pub fn from_label(label: &str) -> Result<Self, Splib07Error> {
        Sampling::ALL
            .into_iter()
            .find(|sampling| sampling.label() == label)
            .ok_or_else(|| Splib07Error::UnknownSampling(label.to_string()))
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Sampling {
    type Err = Splib07Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Sampling::from_label(value.trim())
    }
}

/// Thematic chapters partitioning every sampling's datatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Chapter {
    Minerals,
    SoilsAndMixtures,
    Coatings,
    Liquids,
    Organics,
    Artificial,
    Vegetation,
}

impl Chapter {
    pub const ALL: [Chapter; 7] = [
        Chapter::Minerals,
        Chapter::SoilsAndMixtures,
        Chapter::Coatings,
        Chapter::Liquids,
        Chapter::Organics,
        Chapter::Artificial,
        Chapter::Vegetation,
    ];

    /// 1-based chapter ordinal as printed in the archive datatables.
    pub fn ordinal(self) -> usize {
        self.index() + 1
    }

    /// 0-based slot of this chapter within a sampling index.
    pub fn index(self) -> usize {
        match self {
            Chapter::Minerals => 0,
            Chapter::SoilsAndMixtures => 1,
            Chapter::Coatings => 2,
            Chapter::Liquids => 3,
            Chapter::Organics => 4,
            Chapter::Artificial => 5,
            Chapter::Vegetation => 6,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Chapter::Minerals => "Minerals",
            Chapter::SoilsAndMixtures => "Soils and Mixtures",
            Chapter::Coatings => "Coatings",
            Chapter::Liquids => "Liquids",
            Chapter::Organics => "Organics",
            Chapter::Artificial => "Artificial",
            Chapter::Vegetation => "Vegetation",
        }
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// How to handle bands flagged with the USGS deleted-channel marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedPolicy {
    /// Leave the reserved marker values untouched.
    Sigil,
    /// Replace marker values with NaN.
    Nan,
    /// Remove flagged bands from values, wavelengths and FWHM in lock-step.
    Drop,
}

/// What `Splib07::load` should produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleTarget {
    /// Load the named sampling's native data; no resampling is performed.
    Sampling(Sampling),
    /// Resample the oversampled baseline to these band centers; FWHM is
    /// estimated from the center spacing.
    Centers(Vec<f64>),
    /// Resample the oversampled baseline to an explicit band model.
    Bands { centers: Vec<f64>, fwhm: Vec<f64> },
}

/// A loaded spectrum: three equal-length arrays aligned by band index.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub values: Vec<f64>,
    pub wavelengths: Vec<f64>,
    pub fwhm: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Deleted-channel marker tolerance band around the nominal -1.23e34 sigil.
/// DS1035 p.19.
pub const DELETED_CHANNEL_RANGE: (f64, f64) = (-1.23001e34, -1.22999e34);

/// True for values flagged as deleted channels.
pub fn is_deleted_channel(value: f64) -> bool {
    let (start, end) = DELETED_CHANNEL_RANGE;
    start <= value && value <= end
}

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(" +").expect("static pattern"));

/// Derive a spectrum identifier from a datatable row title: every run of
/// one-or-more spaces becomes a single underscore.
pub fn spectrum_identifier(title: &str) -> SpectrumIdentifier {
    SPACES.replace_all(title, "_").into_owned()
}
