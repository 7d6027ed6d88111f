//! Shared fixtures for the loader behaviour tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

const TOWNLAND_HEADER: &str = "OSM_ID,NAME_TAG,NAME_GA,NAME_EN,ALT_NAME,ALT_NAME_G,OSM_USER,\
OSM_TIMEST,ATTRIBUTIO,LOGAINM_RE,CO_NAME,CO_OSM_ID,CO_LOGAINM,CP_NAME,CP_OSM_ID,CP_LOGAINM,\
ED_NAME,ED_OSM_ID,ED_LOGAINM,BAR_NAME,BAR_OSM_ID,BAR_LOGAIN,T_IE_URL,AREA,LATITUDE,LONGITUDE,\
EPOCH_TSTM";

/// Convert a temporary directory path into a UTF-8 path.
pub fn utf8_dir(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap_or_else(|path| {
        panic!("temporary directory {path:?} is not UTF-8");
    })
}

/// Write a townland CSV whose rows all belong to `county_osm_id`.
pub fn write_townland_csv(dir: &Utf8Path, townland_ids: &[i64], county_osm_id: i64) -> Utf8PathBuf {
    let mut contents = String::from(TOWNLAND_HEADER);
    for osm_id in townland_ids {
        contents.push_str(&format!(
            "\n{osm_id},Townland {osm_id},,,,,mapper,2021-06-01T00:00:00Z,,,County,\
{county_osm_id},,Parish,30,,Division,40,,Barony,20,,,1.5,52.0,-8.0,"
        ));
    }
    contents.push('\n');
    write(dir, "townlands.csv", &contents)
}

/// Write `contents` to `name` inside `dir`.
pub fn write(dir: &Utf8Path, name: &str, contents: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap_or_else(|err| {
        panic!("failed to write fixture {path}: {err}");
    });
    path
}
