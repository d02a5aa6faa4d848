//! PostGIS-backed network-geometry store.
//!
//! Deployments name the link table differently, so the store is described
//! as an ordered list of [`LinkTableSchema`]s. Each schema becomes one
//! [`PostgisLinkTable`] lookup sharing the same connection pool.

use std::time::Duration;

use r2d2_postgres::PostgresConnectionManager;
use r2d2_postgres::postgres::{Config as PgConfig, NoTls};

use crate::error::{AnalysisError, LookupError};
use crate::polyline::RouteLine;
use crate::traits::LinkGeometryLookup;
use crate::types::{Coordinate, NetworkLink};

pub type PgPool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

/// Table and column names for one link-table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTableSchema {
    pub table: String,
    pub id_column: String,
    pub geometry_column: String,
}

impl LinkTableSchema {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        geometry_column: impl Into<String>,
    ) -> Result<Self, AnalysisError> {
        let schema = Self {
            table: table.into(),
            id_column: id_column.into(),
            geometry_column: geometry_column.into(),
        };
        for ident in [&schema.table, &schema.id_column, &schema.geometry_column] {
            if !is_sql_identifier(ident) {
                return Err(AnalysisError::invalid_input(format!(
                    "'{}' is not a valid table or column name",
                    ident
                )));
            }
        }
        Ok(schema)
    }

    /// Layouts tried when nothing else is configured, highest priority first.
    pub fn defaults() -> Vec<Self> {
        [
            ("moct_link", "link_id"),
            ("moct_link_table", "linkid"),
            ("links", "link_id"),
        ]
        .into_iter()
        .map(|(table, id_column)| Self {
            table: table.to_string(),
            id_column: id_column.to_string(),
            geometry_column: "geom".to_string(),
        })
        .collect()
    }

    /// Parses `table:id_column[:geometry_column]` entries separated by commas.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, AnalysisError> {
        let mut schemas = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let schema = match parts.as_slice() {
                [table, id_column] => Self::new(*table, *id_column, "geom")?,
                [table, id_column, geometry_column] => {
                    Self::new(*table, *id_column, *geometry_column)?
                }
                _ => {
                    return Err(AnalysisError::invalid_input(format!(
                        "link table entry '{}' must be table:id_column[:geometry_column]",
                        entry
                    )));
                }
            };
            schemas.push(schema);
        }
        if schemas.is_empty() {
            return Err(AnalysisError::invalid_input("no link tables configured"));
        }
        Ok(schemas)
    }

    /// Parameters: `$1` route WKT, `$2` link id, `$3` buffer in meters.
    pub fn lookup_sql(&self) -> String {
        let geom = &self.geometry_column;
        format!(
            "SELECT ST_X(ST_StartPoint({geom})), ST_Y(ST_StartPoint({geom})), \
             ST_X(ST_EndPoint({geom})), ST_Y(ST_EndPoint({geom})), \
             ST_Length({geom}::geography), \
             ST_Distance({geom}::geography, ST_GeomFromText($1::text, 4326)::geography) \
             FROM {table} \
             WHERE {id}::text = $2::text \
             AND ST_DWithin({geom}::geography, ST_GeomFromText($1::text, 4326)::geography, $3::float8) \
             LIMIT 1",
            geom = geom,
            table = self.table,
            id = self.id_column,
        )
    }
}

fn is_sql_identifier(ident: &str) -> bool {
    !ident.is_empty()
        && !ident.starts_with(|c: char| c.is_ascii_digit())
        && ident
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub connect_timeout_secs: u64,
    pub pool_size: u32,
    pub schemas: Vec<LinkTableSchema>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "host=127.0.0.1 user=postgres dbname=postgres port=5432".to_string(),
            connect_timeout_secs: 10,
            pool_size: 8,
            schemas: LinkTableSchema::defaults(),
        }
    }
}

/// Pooled connection to the network-geometry database.
#[derive(Clone)]
pub struct PostgisNetwork {
    pool: PgPool,
    store_key: String,
    schemas: Vec<LinkTableSchema>,
}

impl PostgisNetwork {
    /// Builds the pool lazily; no connection is opened until the first lookup.
    pub fn new(config: &StoreConfig) -> Result<Self, AnalysisError> {
        let mut pg_config: PgConfig = config
            .database_url
            .parse()
            .map_err(|err| AnalysisError::invalid_input(format!("bad DATABASE_URL: {}", err)))?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        pg_config.connect_timeout(timeout);

        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = r2d2::Pool::builder()
            .max_size(config.pool_size.max(1))
            .min_idle(Some(0))
            .connection_timeout(timeout)
            .build_unchecked(manager);

        Ok(Self {
            pool,
            store_key: config.database_url.clone(),
            schemas: config.schemas.clone(),
        })
    }

    /// One lookup per configured schema, in priority order.
    pub fn lookups(&self) -> Vec<PostgisLinkTable> {
        self.schemas
            .iter()
            .map(|schema| {
                PostgisLinkTable::new(self.pool.clone(), self.store_key.clone(), schema.clone())
            })
            .collect()
    }
}

/// Link lookup against a single table layout.
#[derive(Clone)]
pub struct PostgisLinkTable {
    pool: PgPool,
    /// Connection string of the shared pool; never logged.
    store_key: String,
    name: String,
    sql: String,
}

impl PostgisLinkTable {
    pub fn new(pool: PgPool, store_key: impl Into<String>, schema: LinkTableSchema) -> Self {
        Self {
            pool,
            store_key: store_key.into(),
            name: format!("{}.{}", schema.table, schema.id_column),
            sql: schema.lookup_sql(),
        }
    }
}

impl LinkGeometryLookup for PostgisLinkTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_link_geometry(
        &self,
        link_id: &str,
        route: &RouteLine,
        buffer_meters: f64,
    ) -> Result<Option<NetworkLink>, LookupError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;

        let wkt = route.wkt();
        let rows = conn
            .query(self.sql.as_str(), &[&wkt, &link_id, &buffer_meters])
            .map_err(|err| {
                if err.is_closed() {
                    LookupError::Unavailable(err.to_string())
                } else {
                    LookupError::Query(err.to_string())
                }
            })?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let column = |idx: usize| -> Result<f64, LookupError> {
            row.try_get::<_, Option<f64>>(idx)
                .map_err(|err| LookupError::Query(err.to_string()))?
                .ok_or_else(|| LookupError::Query(format!("column {} is null for link {}", idx, link_id)))
        };

        let start = Coordinate::new(column(0)?, column(1)?)
            .map_err(|err| LookupError::Query(err.to_string()))?;
        let end = Coordinate::new(column(2)?, column(3)?)
            .map_err(|err| LookupError::Query(err.to_string()))?;

        Ok(Some(NetworkLink {
            start,
            end,
            length_meters: column(4)?,
            distance_to_route_meters: column(5)?,
        }))
    }

    fn store_key(&self) -> &str {
        &self.store_key
    }

    fn check_connection(&self) -> Result<(), LookupError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;
        conn.simple_query("SELECT 1")
            .map(|_| ())
            .map_err(|err| LookupError::Unavailable(err.to_string()))
    }
}
