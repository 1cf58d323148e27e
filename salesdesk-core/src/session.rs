//! Session-scoped context holding the merged tables for one analyst session.
//!
//! All source tables are loaded once when the session opens, joined and
//! segmented, then held in memory until the session is dropped. Queries read
//! these snapshots; nothing here is mutated after construction and nothing
//! persists across sessions.

use crate::config::AppConfig;
use crate::data::loader::TableLoader;
use crate::data::normalize::normalize_dates;
use crate::data::schema::{columns, SalesSchema, SchemaError, ETF_DISPLAY_COLUMNS, UIT_DISPLAY_COLUMNS};
use crate::data::source::{DataError, HttpSource};
use crate::pipeline::{build_unified_uit, filter_by_ticker_set, PipelineError, ProductFamilies};
use crate::query::{lookup, rank, Filter, LookupQuery, QueryError, RankQuery};
use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use thiserror::Error;

/// Detail grids cap out at the top 100 rows by AUM.
pub const CLIENT_GRID_CAP: usize = 100;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load source table: {0}")]
    Load(#[from] DataError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Which wholesaler channel a ranking runs over.
///
/// The channel picks both the table (product family or unified UIT) and the
/// external-wholesaler column that leads the group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WholesalerChannel {
    /// Buffer products, ranked by "SP Outsider".
    Structured,
    /// Target-income products, ranked by "ETF Outsider".
    Etf,
    /// Unified UIT table, ranked by "COM Outsider".
    Uit,
}

impl WholesalerChannel {
    pub fn column(self) -> &'static str {
        match self {
            WholesalerChannel::Structured => columns::SP_OUTSIDER,
            WholesalerChannel::Etf => columns::ETF_OUTSIDER,
            WholesalerChannel::Uit => columns::COM_OUTSIDER,
        }
    }
}

/// Parameters of one wholesaler-ranking interaction.
#[derive(Debug, Clone)]
pub struct RankingRequest {
    pub channel: WholesalerChannel,
    /// Reporting period, month-key form ("MM-YYYY").
    pub date: String,
    /// Restrict to one internal wholesaler.
    pub vest_wholesaler: Option<String>,
    /// Spread tickers into result columns.
    pub split_by_ticker: bool,
}

/// The per-session context object. Created at session start, discarded at
/// session end; queries borrow it immutably.
pub struct Session {
    pub created_at: NaiveDateTime,
    pub etf_master: DataFrame,
    pub uit_unified: DataFrame,
    pub buffer_etf: DataFrame,
    pub target_income_etf: DataFrame,
    families: ProductFamilies,
}

impl Session {
    /// Load the four configured sources through the cache and build the
    /// session tables.
    pub fn open(config: &AppConfig, loader: &TableLoader) -> Result<Self, SessionError> {
        let etf_master = loader.load(&HttpSource::new(config.sources.etf_master_url.as_str()))?;
        let uit_master = loader.load(&HttpSource::new(config.sources.uit_master_url.as_str()))?;
        let ft_roster = loader.load(&HttpSource::new(config.sources.ft_wholesaler_url.as_str()))?;
        let vest_roster =
            loader.load(&HttpSource::new(config.sources.vest_wholesaler_url.as_str()))?;
        Self::from_tables(
            etf_master,
            uit_master,
            ft_roster,
            vest_roster,
            config.families.clone(),
        )
    }

    /// Build a session from already-loaded tables.
    pub fn from_tables(
        etf_master: DataFrame,
        uit_master: DataFrame,
        ft_roster: DataFrame,
        vest_roster: DataFrame,
        families: ProductFamilies,
    ) -> Result<Self, SessionError> {
        SalesSchema::validate(
            &etf_master,
            &[columns::DATE, columns::TICKER, columns::AUM],
        )?;
        SalesSchema::validate(&uit_master, &[columns::DATE, columns::ZIP, columns::AUM])?;

        let etf_master = normalize_dates(etf_master, columns::DATE)?;
        let uit_master = normalize_dates(uit_master, columns::DATE)?;

        let uit_unified = build_unified_uit(&uit_master, &ft_roster, &vest_roster)?;
        let buffer_etf = filter_by_ticker_set(&etf_master, &families.buffer_etf_tickers)?;
        let target_income_etf =
            filter_by_ticker_set(&etf_master, &families.target_income_etf_tickers)?;

        log::info!(
            "session tables built: etf={} uit={} buffer={} target_income={}",
            etf_master.height(),
            uit_unified.height(),
            buffer_etf.height(),
            target_income_etf.height()
        );

        Ok(Self {
            created_at: chrono::Local::now().naive_local(),
            etf_master,
            uit_unified,
            buffer_etf,
            target_income_etf,
            families,
        })
    }

    /// Rank wholesalers by summed AUM for one channel and reporting period.
    ///
    /// Without an internal-wholesaler restriction the ETF and UIT channels
    /// group by both the external and the internal wholesaler; with one, the
    /// internal name is fixed and only the external column remains in the
    /// key.
    pub fn wholesaler_ranking(&self, request: &RankingRequest) -> Result<DataFrame, QueryError> {
        let (table, group): (&DataFrame, Vec<&str>) = match request.channel {
            WholesalerChannel::Structured => (&self.buffer_etf, vec![columns::SP_OUTSIDER]),
            WholesalerChannel::Etf => {
                let group = if request.vest_wholesaler.is_some() {
                    vec![columns::ETF_OUTSIDER]
                } else {
                    vec![columns::ETF_OUTSIDER, columns::WHOLESALER]
                };
                (&self.target_income_etf, group)
            }
            WholesalerChannel::Uit => {
                let group = if request.vest_wholesaler.is_some() {
                    vec![columns::COM_OUTSIDER]
                } else {
                    vec![columns::COM_OUTSIDER, columns::WHOLESALER]
                };
                (&self.uit_unified, group)
            }
        };

        let mut query =
            RankQuery::new(&group).filter(Filter::eq(columns::DATE, request.date.clone()));
        if let Some(wholesaler) = &request.vest_wholesaler {
            query = query.filter(Filter::eq(columns::WHOLESALER, wholesaler.clone()));
        }
        if request.split_by_ticker {
            query = query.pivot_on(columns::TICKER);
        }
        rank(table, &query)
    }

    /// Top clients holding one ticker in one period.
    pub fn clients_by_ticker(&self, date: &str, ticker: &str) -> Result<DataFrame, QueryError> {
        let query = LookupQuery::new(columns::AUM)
            .filter(Filter::eq(columns::DATE, date))
            .filter(Filter::eq(columns::TICKER, ticker))
            .display(&ETF_DISPLAY_COLUMNS)
            .top_n(CLIENT_GRID_CAP);
        lookup(&self.etf_master, &query)
    }

    /// Clients holding one ticker, restricted to one external wholesaler.
    ///
    /// The ticker's family decides both the table and which channel column
    /// the wholesaler name is matched against.
    pub fn clients_by_ticker_and_wholesaler(
        &self,
        date: &str,
        ticker: &str,
        wholesaler: &str,
    ) -> Result<DataFrame, QueryError> {
        let (table, channel_column) = if self.families.is_buffer(ticker) {
            (&self.buffer_etf, columns::SP_OUTSIDER)
        } else {
            (&self.target_income_etf, columns::ETF_OUTSIDER)
        };
        let query = LookupQuery::new(columns::AUM)
            .filter(Filter::eq(columns::DATE, date))
            .filter(Filter::eq(columns::TICKER, ticker))
            .filter(Filter::eq(channel_column, wholesaler))
            .display(&ETF_DISPLAY_COLUMNS);
        lookup(table, &query)
    }

    /// Every UIT client row for one period, wholesalers attached.
    pub fn uit_clients(&self, date: &str) -> Result<DataFrame, QueryError> {
        let query = LookupQuery::new(columns::AUM)
            .filter(Filter::eq(columns::DATE, date))
            .display(&UIT_DISPLAY_COLUMNS);
        lookup(&self.uit_unified, &query)
    }
}
