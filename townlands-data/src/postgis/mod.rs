//! PostGIS implementation of [`GazetteerStore`].
//!
//! The store owns one connection and a private current-thread Tokio runtime,
//! exposing the blocking API the loaders expect. A transaction is opened
//! lazily by the first write after a commit. Dropping the store with an open
//! transaction closes the connection and the server rolls the work back.
#![forbid(unsafe_code)]

use std::io;

use log::debug;
use sqlx::types::Json;
use sqlx::{Connection, PgConnection};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use townlands_core::{
    CANONICAL_SRID, CompassBucket, DivisionRecord, GazetteerStore, GeometryRecord, HierarchyLevel,
    StoreError, TouchEdge, TownlandIndex, TownlandRecord,
};

/// DDL creating the gazetteer tables; safe to apply repeatedly.
pub const BUNDLED_SCHEMA: &str = include_str!("schema.sql");

/// Errors raised while opening a [`PostgisStore`].
#[derive(Debug, Error)]
pub enum PostgisError {
    /// The async runtime backing the connection could not be built.
    #[error("failed to start the database runtime")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The server refused or could not be reached.
    #[error("failed to connect to PostgreSQL")]
    Connect {
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}

const GEOMETRY_SAVEPOINT: &str = "townland_geometry";

const UPSERT_TOWNLAND: &str = "
    INSERT INTO townlands (
        osm_id, name_tag, name_ga, name_en, alt_name, alt_name_g,
        t_ie_url, area, latitude, longitude, osm_user, osm_timestamp,
        attribution, logainm_ref, epoch_tstm,
        county_id, barony_id, civil_parish_id, electoral_division_id
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
        $11, $12, $13, $14, $15, $16, $17, $18, $19
    )
    ON CONFLICT (osm_id) DO UPDATE SET
        name_tag = EXCLUDED.name_tag,
        name_ga = EXCLUDED.name_ga,
        name_en = EXCLUDED.name_en,
        alt_name = EXCLUDED.alt_name,
        alt_name_g = EXCLUDED.alt_name_g,
        t_ie_url = EXCLUDED.t_ie_url,
        area = EXCLUDED.area,
        latitude = EXCLUDED.latitude,
        longitude = EXCLUDED.longitude,
        osm_user = EXCLUDED.osm_user,
        osm_timestamp = EXCLUDED.osm_timestamp,
        attribution = EXCLUDED.attribution,
        logainm_ref = EXCLUDED.logainm_ref,
        epoch_tstm = EXCLUDED.epoch_tstm,
        county_id = EXCLUDED.county_id,
        barony_id = EXCLUDED.barony_id,
        civil_parish_id = EXCLUDED.civil_parish_id,
        electoral_division_id = EXCLUDED.electoral_division_id
    RETURNING id";

const UPSERT_TOUCH: &str = "
    INSERT INTO townland_touches (src_id, dst_id, direction_deg, dir_bucket8, shared_length_m)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (src_id, dst_id) DO UPDATE SET
        direction_deg = EXCLUDED.direction_deg,
        dir_bucket8 = EXCLUDED.dir_bucket8,
        shared_length_m = EXCLUDED.shared_length_m";

const UPSERT_GEOMETRY: &str = "
    INSERT INTO townland_geoms (townland_id, geom_2157, raw_geojson)
    VALUES (
        $1,
        ST_Multi(ST_CollectionExtract(ST_MakeValid(
            ST_Transform(ST_SetSRID(ST_Force2D(ST_GeomFromGeoJSON($2)), $3), $4)
        ), 3)),
        $5
    )
    ON CONFLICT (townland_id) DO UPDATE SET
        geom_2157 = EXCLUDED.geom_2157,
        raw_geojson = EXCLUDED.raw_geojson";

const fn upsert_division_sql(level: HierarchyLevel) -> &'static str {
    match level {
        HierarchyLevel::County => {
            "INSERT INTO counties (osm_id, name, logainm) VALUES ($1, $2, $3)
             ON CONFLICT (osm_id) DO UPDATE SET name = EXCLUDED.name, logainm = EXCLUDED.logainm
             RETURNING id"
        }
        HierarchyLevel::Barony => {
            "INSERT INTO baronies (osm_id, name, logainm, county_id) VALUES ($1, $2, $3, $4)
             ON CONFLICT (osm_id) DO UPDATE SET name = EXCLUDED.name, logainm = EXCLUDED.logainm,
                 county_id = EXCLUDED.county_id
             RETURNING id"
        }
        HierarchyLevel::CivilParish => {
            "INSERT INTO civil_parishes (osm_id, name, logainm) VALUES ($1, $2, $3)
             ON CONFLICT (osm_id) DO UPDATE SET name = EXCLUDED.name, logainm = EXCLUDED.logainm
             RETURNING id"
        }
        HierarchyLevel::ElectoralDivision => {
            "INSERT INTO electoral_divisions (osm_id, name, logainm) VALUES ($1, $2, $3)
             ON CONFLICT (osm_id) DO UPDATE SET name = EXCLUDED.name, logainm = EXCLUDED.logainm
             RETURNING id"
        }
    }
}

/// Whether a database error means the geometry itself could not be
/// processed: data exceptions (SQLSTATE class 22) and internal errors, which
/// is how PostGIS reports most malformed input.
fn is_geometry_rejection(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code.starts_with("22") || code == "XX000")
}

/// A [`GazetteerStore`] backed by one PostgreSQL connection with PostGIS.
pub struct PostgisStore {
    runtime: Runtime,
    connection: PgConnection,
    in_transaction: bool,
}

impl std::fmt::Debug for PostgisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgisStore")
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl PostgisStore {
    /// Connect to the database named by `dsn`.
    ///
    /// # Errors
    ///
    /// Returns [`PostgisError::Runtime`] when the runtime cannot be built and
    /// [`PostgisError::Connect`] when the connection fails.
    pub fn connect(dsn: &str) -> Result<Self, PostgisError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| PostgisError::Runtime { source })?;
        let connection = runtime
            .block_on(PgConnection::connect(dsn))
            .map_err(|source| PostgisError::Connect { source })?;
        Ok(Self {
            runtime,
            connection,
            in_transaction: false,
        })
    }

    fn execute(&mut self, operation: &'static str, sql: &str) -> Result<(), StoreError> {
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.connection))
            .map(|_| ())
            .map_err(|err| StoreError::backend(operation, err))
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            self.execute("begin transaction", "BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn insert_geometry(&mut self, record: &GeometryRecord<'_>) -> Result<(), sqlx::Error> {
        let geometry = record.geometry.to_string();
        self.runtime
            .block_on(
                sqlx::query(UPSERT_GEOMETRY)
                    .bind(record.townland_id)
                    .bind(geometry)
                    .bind(record.source_srid)
                    .bind(CANONICAL_SRID)
                    .bind(Json(record.feature))
                    .execute(&mut self.connection),
            )
            .map(|_| ())
    }
}

impl GazetteerStore for PostgisStore {
    fn apply_schema(&mut self, ddl: &str) -> Result<(), StoreError> {
        self.commit()?;
        self.runtime
            .block_on(sqlx::raw_sql(ddl).execute(&mut self.connection))
            .map(|_| ())
            .map_err(|err| StoreError::backend("apply schema", err))
    }

    fn upsert_division(
        &mut self,
        level: HierarchyLevel,
        record: &DivisionRecord,
    ) -> Result<i64, StoreError> {
        self.begin()?;
        let mut query = sqlx::query_scalar::<_, i64>(upsert_division_sql(level))
            .bind(record.osm_id)
            .bind(record.name.as_deref())
            .bind(record.logainm.as_deref());
        if level.has_county() {
            query = query.bind(record.county_id);
        }
        self.runtime
            .block_on(query.fetch_one(&mut self.connection))
            .map_err(|err| StoreError::backend("upsert division", err))
    }

    fn upsert_townland(&mut self, record: &TownlandRecord) -> Result<i64, StoreError> {
        self.begin()?;
        let names = &record.names;
        let hierarchy = record.hierarchy;
        let query = sqlx::query_scalar::<_, i64>(UPSERT_TOWNLAND)
            .bind(record.osm_id)
            .bind(names.name_tag.as_deref())
            .bind(names.name_ga.as_deref())
            .bind(names.name_en.as_deref())
            .bind(names.alt_name.as_deref())
            .bind(names.alt_name_g.as_deref())
            .bind(record.t_ie_url.as_deref())
            .bind(record.area)
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(record.osm_user.as_deref())
            .bind(record.osm_timestamp)
            .bind(record.attribution.as_deref())
            .bind(record.logainm_ref.as_deref())
            .bind(record.epoch_tstm)
            .bind(hierarchy.county_id)
            .bind(hierarchy.barony_id)
            .bind(hierarchy.civil_parish_id)
            .bind(hierarchy.electoral_division_id);
        self.runtime
            .block_on(query.fetch_one(&mut self.connection))
            .map_err(|err| StoreError::backend("upsert townland", err))
    }

    fn townland_index(&mut self) -> Result<TownlandIndex, StoreError> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query_as::<_, (i64, i64)>("SELECT osm_id, id FROM townlands")
                    .fetch_all(&mut self.connection),
            )
            .map_err(|err| StoreError::backend("read townland index", err))?;
        debug!("indexed {} townlands", rows.len());
        Ok(rows.into_iter().collect())
    }

    fn upsert_touch(&mut self, edge: &TouchEdge) -> Result<(), StoreError> {
        self.begin()?;
        let query = sqlx::query(UPSERT_TOUCH)
            .bind(edge.src_id())
            .bind(edge.dst_id())
            .bind(edge.direction_deg())
            .bind(edge.bucket().map(CompassBucket::as_str))
            .bind(edge.shared_length_m());
        self.runtime
            .block_on(query.execute(&mut self.connection))
            .map(|_| ())
            .map_err(|err| StoreError::backend("upsert touch", err))
    }

    fn set_townland_wikidata(
        &mut self,
        townland_id: i64,
        wikidata: &str,
    ) -> Result<(), StoreError> {
        self.begin()?;
        let query = sqlx::query("UPDATE townlands SET wikidata = $1 WHERE id = $2")
            .bind(wikidata)
            .bind(townland_id);
        self.runtime
            .block_on(query.execute(&mut self.connection))
            .map(|_| ())
            .map_err(|err| StoreError::backend("set wikidata", err))
    }

    fn upsert_geometry(&mut self, record: &GeometryRecord<'_>) -> Result<(), StoreError> {
        self.begin()?;
        self.execute("open geometry savepoint", &format!("SAVEPOINT {GEOMETRY_SAVEPOINT}"))?;
        match self.insert_geometry(record) {
            Ok(()) => self.execute(
                "release geometry savepoint",
                &format!("RELEASE SAVEPOINT {GEOMETRY_SAVEPOINT}"),
            ),
            Err(err) if is_geometry_rejection(&err) => {
                self.execute(
                    "roll back geometry savepoint",
                    &format!("ROLLBACK TO SAVEPOINT {GEOMETRY_SAVEPOINT}"),
                )?;
                self.execute(
                    "release geometry savepoint",
                    &format!("RELEASE SAVEPOINT {GEOMETRY_SAVEPOINT}"),
                )?;
                let reason = err
                    .as_database_error()
                    .map_or_else(|| err.to_string(), |db| db.message().to_owned());
                Err(StoreError::GeometryRejected { reason })
            }
            Err(err) => Err(StoreError::backend("upsert geometry", err)),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            self.execute("commit transaction", "COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }
}
