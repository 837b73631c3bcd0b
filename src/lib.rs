//! # DuckDB Banner Table Extension
//!
//! A DuckDB extension for querying WinCross-style banner table exports directly in SQL.
//! A banner export stacks many survey cross-tabulations in one sheet; this extension
//! finds every table block, reads its segments, base counts, percentages, frequencies
//! and significance letters, and returns them as ordinary result sets that DuckDB can
//! filter, join or `COPY` to CSV, Parquet or Excel.
//!
//! ## Features
//!
//! - **Multi-format support**: Excel workbooks (`.xlsx`, `.xlsm`, `.xls`) and delimited
//!   text exports (`.csv`, `.tsv`), from local paths or any URL DuckDB can read
//! - **Configurable layout**: block offsets and columns come from a TOML file or named
//!   parameters instead of being hard-coded
//! - **Corruption reporting**: a block cut short by a malformed row says so instead of
//!   silently ending
//! - **Plain cross-tabs**: sheets with stacked header rows load with flattened column names
//!
//! ## Table Functions
//!
//! - `banner_tables`: one row per banner table with title, segments and how the block ended
//! - `read_banner`: one banner table in wide form (`Metric, <segments...>, Sig`)
//! - `read_banners`: all banner tables in long form
//! - `read_crosstab`: a plain cross-tab sheet with flattened headers
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod banner;
mod crosstab;
mod error;
mod extension;
mod helpers;
mod spreadsheet;

use crate::extension::banner_tables::BannerTablesTableFunction;
use crate::extension::read_banner::ReadBannerTableFunction;
use crate::extension::read_banners::ReadBannersTableFunction;
use crate::extension::read_crosstab::ReadCrossTabTableFunction;
use anyhow::{Context, Result};
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;

/// Extension entry point for DuckDB.
///
/// Initializes logging from `RUST_LOG` (default `warn`) and registers the
/// `banner_tables`, `read_banner`, `read_banners` and `read_crosstab` table functions.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    // The host may load the extension more than once per process
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();

    connection
        .register_table_function::<BannerTablesTableFunction>("banner_tables")
        .context("Failed to register banner_tables table function")?;
    connection
        .register_table_function::<ReadBannerTableFunction>("read_banner")
        .context("Failed to register read_banner table function")?;
    connection
        .register_table_function::<ReadBannersTableFunction>("read_banners")
        .context("Failed to register read_banners table function")?;
    connection
        .register_table_function::<ReadCrossTabTableFunction>("read_crosstab")
        .context("Failed to register read_crosstab table function")?;
    log::info!("registered banner table functions");
    Ok(())
}
