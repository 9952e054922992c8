//! Persistence for the archive index: an LZMA-compressed serialized object
//! graph, written offline by `splib07-index` and loaded at runtime so
//! consuming code never re-parses the archive markup.
//!
//! No integrity or version check is performed beyond what deserialization
//! itself enforces; a blob built from a different archive revision than the
//! one opened at runtime will produce wrong or failing lookups.

use std::fs;

use camino::Utf8Path;
use once_cell::sync::OnceCell;
use tracing::debug;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::error::Splib07Error;
use crate::index::Splib07Index;

const COMPRESSION_LEVEL: u32 = 6;

static CACHED_INDEX: OnceCell<Splib07Index> = OnceCell::new();

/// Serialize the index to a compressed blob. Offline/build-time operation,
/// not part of the lookup hot path. Writes via a temporary file so a failed
/// run never leaves a truncated blob behind; the temporary file itself is
/// removed when any step fails.
pub fn save(index: &Splib07Index, destination: &Utf8Path) -> Result<(), Splib07Error> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| Splib07Error::Cache(format!("create {parent}: {err}")))?;
    }

    let tmp_path = Utf8Path::new(destination.as_str()).with_extension("tmp");
    let file = fs::File::create(tmp_path.as_std_path())
        .map_err(|err| Splib07Error::Cache(format!("create {tmp_path}: {err}")))?;

    let written = write_compressed(index, file).and_then(|_| {
        fs::rename(tmp_path.as_std_path(), destination.as_std_path())
            .map_err(|err| Splib07Error::Cache(format!("rename to {destination}: {err}")))
    });
    if let Err(err) = written {
        let _ = fs::remove_file(tmp_path.as_std_path());
        return Err(err);
    }

    debug!(destination = %destination, "saved index cache");
    Ok(())
}

fn write_compressed(index: &Splib07Index, file: fs::File) -> Result<(), Splib07Error> {
    let mut encoder = XzEncoder::new(file, COMPRESSION_LEVEL);
    serde_json::to_writer(&mut encoder, index)
        .map_err(|err| Splib07Error::Cache(format!("serialize index: {err}")))?;
    encoder
        .finish()
        .map_err(|err| Splib07Error::Cache(format!("compress index: {err}")))?;
    Ok(())
}

/// Deserialize an index blob written by [`save`].
pub fn load(source: &Utf8Path) -> Result<Splib07Index, Splib07Error> {
    let file = fs::File::open(source.as_std_path())
        .map_err(|err| Splib07Error::Cache(format!("open {source}: {err}")))?;
    let decoder = XzDecoder::new(file);
    serde_json::from_reader(decoder)
        .map_err(|err| Splib07Error::Cache(format!("deserialize {source}: {err}")))
}

/// Load the cache blob at most once per process and hand out the same
/// read-only instance thereafter. The path only matters on the first
/// successful call; later calls return the memoized index regardless.
pub fn load_cached(source: &Utf8Path) -> Result<&'static Splib07Index, Splib07Error> {
    CACHED_INDEX.get_or_try_init(|| load(source))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::{Chapter, Sampling};
    use crate::index::{SamplingIndex, SpectrumEntry};

    fn sample_index() -> Splib07Index {
        let mut sampling = SamplingIndex::default();
        sampling.insert(
            Chapter::Liquids,
            SpectrumEntry {
                name: "Seawater_Coast_Chl_SW1".to_string(),
                description: Utf8PathBuf::from("html/seawater.html"),
                spectrum_asciidata: Some(Utf8PathBuf::from("ASCIIdata/splib07a/seawater.txt")),
                error_asciidata: None,
                wavelengths_asciidata: Utf8PathBuf::from("ASCIIdata/splib07a/wavelengths.txt"),
                bandpass_asciidata: Utf8PathBuf::from("ASCIIdata/splib07a/bandpass.txt"),
                range_plot: None,
                wavelength_plot: Utf8PathBuf::from("plots/w.gif"),
                bandpass_plot: Utf8PathBuf::from("plots/b.gif"),
                extra_range_plots: vec![Some(Utf8PathBuf::from("plots/x.gif"))],
            },
        );
        let mut samplings = BTreeMap::new();
        samplings.insert(Sampling::Measured, sampling);
        Splib07Index::new(samplings)
    }

    #[test]
    fn save_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let blob = Utf8PathBuf::from_path_buf(temp.path().join("index.json.xz")).unwrap();

        let index = sample_index();
        save(&index, &blob).unwrap();
        let loaded = load(&blob).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let temp = tempfile::tempdir().unwrap();
        let destination = Utf8PathBuf::from_path_buf(temp.path().join("blob")).unwrap();
        // An existing directory at the destination makes the final rename
        // fail after the blob has been written.
        std::fs::create_dir(destination.as_std_path()).unwrap();

        let err = save(&sample_index(), &destination).unwrap_err();
        assert!(matches!(err, Splib07Error::Cache(_)));
        assert!(!destination.with_extension("tmp").as_std_path().exists());
    }

    #[test]
    fn load_missing_blob_is_a_cache_error() {
        let err = load(Utf8Path::new("/nonexistent/index.json.xz")).unwrap_err();
        assert!(matches!(err, Splib07Error::Cache(_)));
    }

    #[test]
    fn load_cached_returns_one_instance() {
        let temp = tempfile::tempdir().unwrap();
        let blob = Utf8PathBuf::from_path_buf(temp.path().join("index.json.xz")).unwrap();
        save(&sample_index(), &blob).unwrap();

        let first = load_cached(&blob).unwrap();
        let second = load_cached(&blob).unwrap();
        assert!(std::ptr::eq(first, second));
        // Path is ignored after the first successful call.
        let third = load_cached(Utf8Path::new("/nonexistent/other.xz")).unwrap();
        assert!(std::ptr::eq(first, third));
    }
}
