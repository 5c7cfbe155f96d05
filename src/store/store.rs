use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::{const_mutex, Mutex};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use tokio::task::spawn_blocking;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use crate::flow::{FlowRecord, FlowSummary};
use crate::query::{select, FilterAttributes};
use super::{schema, Config, Event, Notify, RateCalc};

/// System of record for flow records and their summaries.
///
/// Every error returned from a `Store` method is a persistence fault:
/// the database is a disposable local cache, so callers are expected to
/// give up, clear it and start over rather than recover.
pub struct Store {
    pub(super) conn: Mutex<Connection>,
    rates:  Mutex<RateCalc>,
    notify: Notify,
    config: Config,
    real:   PathBuf,
}

/// Canonical paths of every store open in this process.
static OPEN: Mutex<Vec<PathBuf>> = const_mutex(Vec::new());

impl Store {
    pub fn open(config: Config) -> Result<Self> {
        if config.interval.is_zero() {
            bail!("rate interval must be non-zero");
        }

        if config.window.is_zero() {
            bail!("rate window must be non-zero");
        }

        if let Some(dir) = config.path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("creating {}", dir.display())
            })?;
        }

        let conn = Connection::open(&config.path).with_context(|| {
            format!("opening {}", config.path.display())
        })?;
        schema::init(&conn)?;

        let window = chrono::Duration::from_std(config.window)?;
        let real   = fs::canonicalize(&config.path)?;

        OPEN.lock().push(real.clone());

        info!("opened flow store {}", config.path.display());

        Ok(Self {
            conn:   Mutex::new(conn),
            rates:  Mutex::new(RateCalc::new(window)),
            notify: Notify::new(),
            config: config,
            real:   real,
        })
    }

    /// Aggregates `record` into its summary and stores both as a single
    /// transaction. Returns the updated summary and whether it was
    /// created by this call.
    pub fn add_flow(&self, mut record: FlowRecord) -> Result<(FlowSummary, bool)> {
        let key = record.key();
        let now = Utc::now();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let (mut sum, new) = match sum_by_key(&tx, &key)? {
            Some(sum) => (sum, false),
            None      => (FlowSummary::new(&record, now), true),
        };

        sum.add(&record);

        let doc = serde_json::to_string(&sum)?;
        if new {
            tx.execute("INSERT INTO summaries (key, doc) VALUES (?1, ?2)", params![key, doc])?;
            sum.id = tx.last_insert_rowid();
        } else {
            tx.execute("UPDATE summaries SET doc = ?2 WHERE id = ?1", params![sum.id, doc])?;
        }

        record.sum_id = sum.id;
        let doc = serde_json::to_string(&record)?;
        tx.execute("INSERT INTO flows (sum_id, doc) VALUES (?1, ?2)", params![sum.id, doc])?;

        tx.commit()?;
        drop(conn);

        self.notify.send(Event::FlowAdded);
        if new {
            debug!("new flow summary {} ({})", sum.key, sum.id);
            self.notify.send(Event::SummaryAdded);
        }
        self.notify.send(Event::SumsUpdated);

        Ok((sum, new))
    }

    pub fn get_flow_sum(&self, id: i64) -> Result<Option<FlowSummary>> {
        let conn = self.conn.lock();
        let sql  = "SELECT id, doc FROM summaries WHERE id = ?1";
        let row  = conn.query_row(sql, [id], id_doc).optional()?;
        row.map(|(id, doc)| summary(id, &doc)).transpose()
    }

    /// Summaries ordered by key, restricted to those matching `filter`.
    pub fn get_flow_sums(&self, filter: &FilterAttributes) -> Result<Vec<FlowSummary>> {
        let conn = self.conn.lock();
        let sums = load(&conn, "SELECT id, doc FROM summaries ORDER BY key", [], summary)?;
        drop(conn);

        Ok(match filter.is_empty() {
            true  => sums,
            false => select(sums, filter),
        })
    }

    pub fn get_flow_detail(&self, id: i64) -> Result<Option<FlowRecord>> {
        let conn = self.conn.lock();
        let sql  = "SELECT id, doc FROM flows WHERE id = ?1";
        let row  = conn.query_row(sql, [id], id_doc).optional()?;
        row.map(|(id, doc)| record(id, &doc)).transpose()
    }

    /// Records that contributed to summary `sum_id`, in arrival order.
    pub fn get_flows_by_sum_id(&self, sum_id: i64, filter: &FilterAttributes) -> Result<Vec<FlowRecord>> {
        let conn  = self.conn.lock();
        let sql   = "SELECT id, doc FROM flows WHERE sum_id = ?1 ORDER BY id";
        let flows = load(&conn, sql, [sum_id], record)?;
        drop(conn);

        Ok(select(flows, filter))
    }

    /// Number of stored summaries and flow records.
    pub fn len(&self) -> Result<(usize, usize)> {
        let conn  = self.conn.lock();
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        let sums  = count("SELECT COUNT(*) FROM summaries")?;
        let flows = count("SELECT COUNT(*) FROM flows")?;
        Ok((sums as usize, flows as usize))
    }

    pub fn calc_rates(&self) -> Result<()> {
        self.calc_rates_at(Utc::now())
    }

    /// Recomputes every summary's rates as of `now`.
    pub fn calc_rates_at(&self, now: DateTime<Utc>) -> Result<()> {
        let mut conn  = self.conn.lock();
        let mut rates = self.rates.lock();
        let tx = conn.transaction()?;

        let sums = load(&tx, "SELECT id, doc FROM summaries", [], summary)?;
        let ids  = sums.iter().map(|s| s.id).collect::<HashSet<_>>();

        for mut sum in sums {
            let rate = rates.rate(&sum, now);
            if rate != sum.rate {
                sum.rate = rate;
                let doc  = serde_json::to_string(&sum)?;
                tx.execute("UPDATE summaries SET doc = ?2 WHERE id = ?1", params![sum.id, doc])?;
            }
        }

        rates.retain(&ids);
        tx.commit()?;

        drop(rates);
        drop(conn);

        self.notify.send(Event::RatesUpdated);

        Ok(())
    }

    /// Rate ticker; runs until `cancel` fires or a pass fails.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick()       => {
                    let store = self.clone();
                    spawn_blocking(move || store.calc_rates()).await??;
                }
            }
        }

        debug!("rate ticker finished");

        Ok(())
    }

    pub fn notify(&self) -> &Notify {
        &self.notify
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn close(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        debug!("closed flow store {}", self.config.path.display());
        Ok(())
    }

    /// Deletes the store at `path`. Fails while a `Store` in this process
    /// has it open; a missing store is not an error.
    pub fn clear(path: &Path) -> Result<()> {
        let open = OPEN.lock();

        if let Ok(real) = fs::canonicalize(path) {
            if open.contains(&real) {
                bail!("{} is open", path.display());
            }
        }

        let mut wal = path.as_os_str().to_owned();
        wal.push("-wal");
        let mut shm = path.as_os_str().to_owned();
        shm.push("-shm");

        for path in &[path.to_path_buf(), PathBuf::from(wal), PathBuf::from(shm)] {
            match fs::remove_file(path) {
                Ok(())                                    => debug!("removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => (),
                Err(e)                                    => return Err(e).with_context(|| {
                    format!("removing {}", path.display())
                }),
            }
        }

        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let mut open = OPEN.lock();
        if let Some(n) = open.iter().position(|p| *p == self.real) {
            open.swap_remove(n);
        }
    }
}

fn sum_by_key(tx: &Transaction, key: &str) -> Result<Option<FlowSummary>> {
    let sql = "SELECT id, doc FROM summaries WHERE key = ?1";
    let row = tx.query_row(sql, [key], id_doc).optional()?;
    row.map(|(id, doc)| summary(id, &doc)).transpose()
}

fn id_doc(row: &rusqlite::Row) -> rusqlite::Result<(i64, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn load<T, P>(conn: &Connection, sql: &str, params: P, decode: fn(i64, &str) -> Result<T>) -> Result<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, id_doc)?;
    let docs = rows.map(|r| {
        let (id, doc) = r?;
        decode(id, &doc)
    }).collect::<Result<Vec<_>>>();
    docs
}

fn summary(id: i64, doc: &str) -> Result<FlowSummary> {
    let mut sum: FlowSummary = parse(doc).with_context(|| format!("corrupt summary {}", id))?;
    sum.id = id;
    Ok(sum)
}

fn record(id: i64, doc: &str) -> Result<FlowRecord> {
    let mut rec: FlowRecord = parse(doc).with_context(|| format!("corrupt flow {}", id))?;
    rec.id = id;
    Ok(rec)
}

fn parse<T: DeserializeOwned>(doc: &str) -> Result<T> {
    Ok(serde_json::from_str(doc)?)
}
