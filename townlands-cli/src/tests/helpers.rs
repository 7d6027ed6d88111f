//! Test helpers for staging CLI inputs and standing in for the database.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::Cell;
use std::fs;
use tempfile::TempDir;
use townlands_core::test_support::MemoryStore;
use townlands_data::postgis::PostgisError;

pub(super) const TEST_DSN: &str = "postgresql://loader@localhost/townlands";

const TOWNLAND_HEADER: &str = "OSM_ID,NAME_TAG,NAME_GA,NAME_EN,ALT_NAME,ALT_NAME_G,OSM_USER,\
OSM_TIMEST,ATTRIBUTIO,LOGAINM_RE,CO_NAME,CO_OSM_ID,CO_LOGAINM,CP_NAME,CP_OSM_ID,CP_LOGAINM,\
ED_NAME,ED_OSM_ID,ED_LOGAINM,BAR_NAME,BAR_OSM_ID,BAR_LOGAIN,T_IE_URL,AREA,LATITUDE,LONGITUDE,\
EPOCH_TSTM";

/// Temporary directory holding the files a command reads.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write a two-row townland export sharing county 5.
    pub(super) fn townland_csv(&self) -> Utf8PathBuf {
        let mut contents = String::from(TOWNLAND_HEADER);
        for osm_id in [100, 200] {
            contents.push_str(&format!(
                "\n{osm_id},Townland {osm_id},,,,,mapper,2021-06-01,,,Cork,5,,Parish,30,,\
Division,40,,Barony,20,,,1.5,52.0,-8.0,"
            ));
        }
        contents.push('\n');
        let path = self.path("townlands.csv");
        write_utf8(&path, contents.as_bytes());
        path
    }

    pub(super) fn touch_csv(&self) -> Utf8PathBuf {
        let path = self.path("touch.csv");
        write_utf8(
            &path,
            b"t1_osm_id,t2_osm_id,direction,length_m\n100,200,45.0,120.5\n100,999,10.0,5.0\n",
        );
        path
    }

    /// Create a folder with one feature collection for relation 100.
    pub(super) fn geometry_folder(&self) -> Utf8PathBuf {
        let folder = self.path("geometry");
        fs::create_dir(&folder).expect("create geometry folder");
        write_utf8(
            &folder.join("cork.geojson"),
            br#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"relation/100",
"properties":{},"geometry":{"type":"Polygon","coordinates":[[[-8.0,52.0],[-7.9,52.0],
[-7.9,52.1],[-8.0,52.0]]]}}]}"#,
        );
        folder
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).expect("write test input");
}

/// Connector handing out in-memory stores and counting connection attempts.
#[derive(Debug)]
pub(super) struct MemoryConnector {
    townlands: Vec<i64>,
    connections: Cell<usize>,
}

impl MemoryConnector {
    pub(super) fn new() -> Self {
        Self::with_townlands(Vec::new())
    }

    /// Every store handed out already holds townlands with these ids.
    pub(super) fn with_townlands(townlands: Vec<i64>) -> Self {
        Self {
            townlands,
            connections: Cell::new(0),
        }
    }

    pub(super) fn connections(&self) -> usize {
        self.connections.get()
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self, _dsn: &str) -> Result<Box<dyn GazetteerStore>, CliError> {
        self.connections.set(self.connections.get() + 1);
        Ok(Box::new(MemoryStore::with_townlands(
            self.townlands.iter().copied(),
        )))
    }
}

/// Connector that always fails as an unreachable server would.
pub(super) struct RefusingConnector;

impl StoreConnector for RefusingConnector {
    fn connect(&self, _dsn: &str) -> Result<Box<dyn GazetteerStore>, CliError> {
        Err(CliError::Connect(PostgisError::Runtime {
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        }))
    }
}

/// Parse `args` (without the binary name) and run them against `connector`,
/// returning the outcome and everything written to stdout.
pub(super) fn run_args(
    args: &[&str],
    connector: &dyn StoreConnector,
) -> (Result<(), CliError>, String) {
    let invocation = std::iter::once("townlands").chain(args.iter().copied());
    let mut output = Vec::new();
    let outcome = Cli::try_parse_from(invocation)
        .map_err(CliError::ArgumentParsing)
        .and_then(|cli| run_with(cli, connector, &mut output));
    let stdout = String::from_utf8(output).expect("utf-8 output");
    (outcome, stdout)
}
