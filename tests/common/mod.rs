//! Synthetic splib07 archive fixture shared by the integration tests.
//!
//! The fixture mirrors the upstream layout: `indexes/table_of_contents.html`
//! referencing one datatable per sampling, each datatable holding a banner
//! table plus seven chapter tables, and ASCIIdata/plot files for every
//! linked path. It is written both as a directory tree and as a zip with
//! the upstream's single `usgs_splib07/` wrapping directory.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const MEASURED: &str = "splib07a";
pub const OVERSAMPLED: &str = "splib07b";
pub const ASTER: &str = "splib07b_rsASTER";
pub const SAMPLINGS: [&str; 3] = [MEASURED, OVERSAMPLED, ASTER];

pub const ACTINOLITE: &str = "Actinolite_HS22.3B";
pub const SEAWATER: &str = "Seawater_Coast_Chl_SW1";

/// Smooth reference reflectance used for the resampling fixtures.
pub fn ramp(wavelength: f64) -> f64 {
    0.2 + 0.5 * wavelength
}

pub fn measured_grid() -> Vec<f64> {
    vec![0.40, 0.45, 0.50, 0.55, 0.60, 0.65]
}

/// Measured Actinolite values; bands 2 and 4 carry the deleted-channel
/// sigil.
pub fn actinolite_measured_values() -> Vec<f64> {
    vec![0.11, 0.22, -1.23e34, 0.44, -1.23e34, 0.66]
}

pub fn oversampled_grid() -> Vec<f64> {
    (0..120).map(|i| 0.40 + 0.005 * i as f64).collect()
}

pub fn aster_grid() -> Vec<f64> {
    (0..8).map(|i| 0.45 + 0.05 * i as f64).collect()
}

pub struct Fixture {
    _temp: TempDir,
    pub dir_root: Utf8PathBuf,
    pub zip_path: Utf8PathBuf,
}

pub fn build() -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let dir_root = Utf8PathBuf::from_path_buf(temp.path().join("usgs_splib07")).unwrap();
    write_archive(&dir_root);

    let zip_path = Utf8PathBuf::from_path_buf(temp.path().join("usgs_splib07.zip")).unwrap();
    zip_archive(&dir_root, &zip_path);

    Fixture {
        _temp: temp,
        dir_root,
        zip_path,
    }
}

struct Row {
    title: &'static str,
    id: &'static str,
    chapter: usize,
    with_spectrum: bool,
    with_error: bool,
    with_range_plot: bool,
    with_extra_plot: bool,
}

fn rows_for(sampling: &str) -> Vec<Row> {
    vec![
        Row {
            // Double space in the title: the identifier derivation collapses
            // it to the single underscore of ACTINOLITE.
            title: "Actinolite  HS22.3B",
            id: ACTINOLITE,
            chapter: 0,
            // The ASTER resampling lacks measured data for this entry.
            with_spectrum: sampling != ASTER,
            with_error: true,
            with_range_plot: true,
            with_extra_plot: true,
        },
        Row {
            title: "Seawater Coast Chl SW1",
            id: SEAWATER,
            chapter: 3,
            with_spectrum: true,
            with_error: false,
            with_range_plot: false,
            with_extra_plot: false,
        },
    ]
}

fn sampling_values(sampling: &str, id: &str) -> (Vec<f64>, Vec<f64>) {
    match sampling {
        MEASURED => {
            let grid = measured_grid();
            let values = if id == ACTINOLITE {
                actinolite_measured_values()
            } else {
                grid.iter().map(|w| ramp(*w)).collect()
            };
            (grid, values)
        }
        OVERSAMPLED => {
            let grid = oversampled_grid();
            let values = grid.iter().map(|w| ramp(*w)).collect();
            (grid, values)
        }
        ASTER => {
            let grid = aster_grid();
            let values = grid.iter().map(|w| ramp(*w)).collect();
            (grid, values)
        }
        other => panic!("unknown fixture sampling {other}"),
    }
}

fn sampling_fwhm(sampling: &str) -> Vec<f64> {
    match sampling {
        MEASURED => vec![0.05; 6],
        OVERSAMPLED => vec![0.005; 120],
        ASTER => vec![0.05; 8],
        other => panic!("unknown fixture sampling {other}"),
    }
}

fn write_archive(root: &Utf8Path) {
    let indexes = root.join("indexes");
    fs::create_dir_all(indexes.as_std_path()).unwrap();

    let mut toc = String::from("<html><body><ul>\n");
    for sampling in SAMPLINGS {
        toc.push_str(&format!(
            "<li><a href=\"datatable_{sampling}.html\">{sampling}</a></li>\n"
        ));
    }
    toc.push_str("</ul></body></html>\n");
    fs::write(
        indexes.join("table_of_contents.html").as_std_path(),
        &toc,
    )
    .unwrap();

    for sampling in SAMPLINGS {
        fs::write(
            indexes.join(format!("datatable_{sampling}.html")).as_std_path(),
            datatable_document(sampling),
        )
        .unwrap();

        for row in rows_for(sampling) {
            let (grid, values) = sampling_values(sampling, row.id);
            let fwhm = sampling_fwhm(sampling);

            if row.with_spectrum {
                write_ascii(
                    &root.join(spectrum_path(sampling, row.id)),
                    &format!("{sampling}: {} reflectance", row.id),
                    &values,
                );
            }
            write_ascii(
                &root.join(wavelengths_path(sampling, row.id)),
                &format!("{sampling}: {} wavelengths", row.id),
                &grid,
            );
            write_ascii(
                &root.join(bandpass_path(sampling, row.id)),
                &format!("{sampling}: {} bandpass", row.id),
                &fwhm,
            );
            if row.with_error {
                write_ascii(
                    &root.join(error_path(sampling, row.id)),
                    &format!("{sampling}: {} errors", row.id),
                    &vec![0.01; values.len()],
                );
            }

            write_stub(&root.join(description_path(row.id)));
            write_stub(&root.join(plot_path(sampling, row.id, "wavelength")));
            write_stub(&root.join(plot_path(sampling, row.id, "bandpass")));
            if row.with_range_plot {
                write_stub(&root.join(plot_path(sampling, row.id, "range")));
            }
            if row.with_extra_plot {
                write_stub(&root.join(plot_path(sampling, row.id, "extra")));
            }
        }
    }
}

fn datatable_document(sampling: &str) -> String {
    let mut document = String::from(
        "<html><body>\n<table><tr><td>USGS Spectral Library Version 7</td></tr></table>\n",
    );

    for chapter in 0..7 {
        document.push_str("<table>\n");
        document.push_str("<tr><td>Chapter banner</td></tr>\n");
        for _ in 0..3 {
            document.push_str("<tr><td>Title</td><td>Description</td></tr>\n");
        }
        for row in rows_for(sampling) {
            if row.chapter == chapter {
                document.push_str(&datatable_row(sampling, &row));
            }
        }
        document.push_str("</table>\n");
    }

    document.push_str("</body></html>\n");
    document
}

fn datatable_row(sampling: &str, row: &Row) -> String {
    let linked = |path: String, present: bool| {
        if present {
            format!("<td><a href=\"../{path}\">link</a></td>")
        } else {
            "<td>&nbsp;</td>".to_string()
        }
    };

    format!(
        "<tr><td>{title}</td>{description}{spectrum}{error}{wavelengths}{bandpass}{range}{extra}{wplot}{bplot}</tr>\n",
        title = row.title,
        description = linked(description_path(row.id), true),
        spectrum = linked(spectrum_path(sampling, row.id), row.with_spectrum),
        error = linked(error_path(sampling, row.id), row.with_error),
        wavelengths = linked(wavelengths_path(sampling, row.id), true),
        bandpass = linked(bandpass_path(sampling, row.id), true),
        range = linked(plot_path(sampling, row.id, "range"), row.with_range_plot),
        extra = linked(plot_path(sampling, row.id, "extra"), row.with_extra_plot),
        wplot = linked(plot_path(sampling, row.id, "wavelength"), true),
        bplot = linked(plot_path(sampling, row.id, "bandpass"), true),
    )
}

fn spectrum_path(sampling: &str, id: &str) -> String {
    format!("ASCIIdata/{sampling}/{id}_spectrum.txt")
}

fn error_path(sampling: &str, id: &str) -> String {
    format!("ASCIIdata/{sampling}/{id}_error.txt")
}

fn wavelengths_path(sampling: &str, id: &str) -> String {
    format!("ASCIIdata/{sampling}/{id}_wavelengths.txt")
}

fn bandpass_path(sampling: &str, id: &str) -> String {
    format!("ASCIIdata/{sampling}/{id}_bandpass.txt")
}

fn description_path(id: &str) -> String {
    format!("html/{id}_description.html")
}

fn plot_path(sampling: &str, id: &str, kind: &str) -> String {
    format!("plots/{sampling}/{id}_{kind}.gif")
}

fn write_ascii(path: &Utf8Path, header: &str, values: &[f64]) {
    let mut content = format!("{header}\n");
    for value in values {
        content.push_str(&format!("{value}\n"));
    }
    write_file(path, content.as_bytes());
}

fn write_stub(path: &Utf8Path) {
    write_file(path, b"stub");
}

fn write_file(path: &Utf8Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path()).unwrap();
    }
    fs::write(path.as_std_path(), content).unwrap();
}

fn zip_archive(root: &Utf8Path, destination: &Utf8Path) {
    let file = fs::File::create(destination.as_std_path()).unwrap();
    let mut writer = zip::ZipWriter::new(file);

    let mut stack = vec![root.to_owned()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(dir.as_std_path()).unwrap() {
            let entry = entry.unwrap();
            let path = Utf8PathBuf::from_path_buf(entry.path()).unwrap();
            if path.as_std_path().is_dir() {
                stack.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                writer
                    .start_file(
                        format!("usgs_splib07/{relative}"),
                        SimpleFileOptions::default(),
                    )
                    .unwrap();
                writer.write_all(&fs::read(path.as_std_path()).unwrap()).unwrap();
            }
        }
    }
    writer.finish().unwrap();
}
