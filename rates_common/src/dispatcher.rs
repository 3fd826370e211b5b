//! Request dispatch.
//!
//! `Dispatcher` maps every `Request` to one table operation and turns the
//! outcome into a `Report`. It is the boundary that keeps rate faults out of the
//! caller: a missing rate or a rejected update becomes a report, never an error.
//!
//! `Dispatcher::spawn` moves a dispatcher onto a worker thread fed by a
//! `crossbeam_channel` queue. Requests are handled one at a time in the order
//! they were sent, and one report comes back per request.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};

use crate::command::Request;
use crate::error::RateError;
use crate::result::Result;
use crate::shared::SharedRateTable;

/// Digits after the decimal point in conversion output.
pub const DISPLAY_PRECISION: usize = 8;

/// Outcome of a single request, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Successful conversion of `amount` `from` into `value` `to`.
    Conversion {
        /// Input amount.
        amount: f64,
        /// Source symbol.
        from: String,
        /// Target symbol.
        to: String,
        /// Converted amount.
        value: f64,
    },
    /// Conversion could not be resolved.
    ConversionFailed {
        /// Source symbol.
        from: String,
        /// Target symbol.
        to: String,
        /// Human-readable cause.
        reason: String,
    },
    /// USD price of `symbol` was changed and the table rebuilt.
    Updated {
        /// Updated symbol.
        symbol: String,
        /// New USD price.
        usd_price: f64,
    },
    /// Request was not applied.
    Rejected {
        /// Human-readable cause.
        reason: String,
    },
    /// Snapshot of every cross-rate, sorted by pair key.
    Rates(Vec<(String, f64)>),
}

impl Report {
    /// Builds a rejection report from an error.
    pub fn rejected(err: &RateError) -> Self {
        Report::Rejected {
            reason: err.to_string(),
        }
    }

    /// `true` for reports that describe a request that did not succeed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Report::ConversionFailed { .. } | Report::Rejected { .. }
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Conversion {
                amount,
                from,
                to,
                value,
            } => write!(
                f,
                "{amount} {from} is worth {value:.prec$} {to}",
                prec = DISPLAY_PRECISION
            ),
            Report::ConversionFailed { from, to, reason } => {
                write!(f, "Conversion {from} -> {to} failed: {reason}")
            }
            Report::Updated { symbol, usd_price } => {
                write!(f, "{symbol} price updated to {usd_price} USD")
            }
            Report::Rejected { reason } => write!(f, "Request rejected: {reason}"),
            Report::Rates(rates) => {
                if rates.is_empty() {
                    return write!(f, "(no rates)");
                }
                for (i, (pair, rate)) in rates.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{pair} = {rate:.prec$}", prec = DISPLAY_PRECISION)?;
                }
                Ok(())
            }
        }
    }
}

/// Routes requests to a shared rate table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: SharedRateTable,
}

impl Dispatcher {
    /// Creates a dispatcher over `table`.
    pub fn new(table: SharedRateTable) -> Self {
        Dispatcher { table }
    }

    /// Handles one request synchronously.
    pub fn handle(&self, request: Request) -> Report {
        debug!("Handling {:?}", request);
        match request {
            Request::ShowConversion { from, to } => self.handle_convert(1.0, from, to),
            Request::Convert { amount, from, to } => self.handle_convert(amount, from, to),
            Request::UpdatePrice { symbol, usd_price } => self.handle_update(symbol, usd_price),
            Request::ListRates => self.handle_list(),
        }
    }

    fn handle_convert(&self, amount: f64, from: String, to: String) -> Report {
        match self.table.convert(amount, &from, &to) {
            Ok(value) => Report::Conversion {
                amount,
                from,
                to,
                value,
            },
            Err(e) => {
                warn!("Conversion {} -> {} failed: {}", from, to, e);
                Report::ConversionFailed {
                    from,
                    to,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn handle_update(&self, symbol: String, usd_price: f64) -> Report {
        match self.table.update(&symbol, usd_price) {
            Ok(()) => {
                info!("Rates updated successfully");
                Report::Updated { symbol, usd_price }
            }
            Err(e) => Report::rejected(&e),
        }
    }

    fn handle_list(&self) -> Report {
        match self.table.snapshot() {
            Ok(snapshot) => {
                let mut rates: Vec<(String, f64)> = snapshot
                    .rates()
                    .iter()
                    .map(|(pair, rate)| (pair.clone(), *rate))
                    .collect();
                rates.sort_by(|a, b| a.0.cmp(&b.0));
                Report::Rates(rates)
            }
            Err(e) => Report::rejected(&e),
        }
    }

    /// Starts a worker thread that handles queued requests in order.
    pub fn spawn(self) -> DispatcherHandle {
        let (request_tx, request_rx) = unbounded::<(u64, Request)>();
        let (report_tx, report_rx) = unbounded::<(u64, Report)>();

        let worker = thread::spawn(move || {
            info!("Dispatcher started (Thread ID: {:?})", thread::current().id());
            for (id, request) in request_rx.iter() {
                let report = self.handle(request);
                if report_tx.send((id, report)).is_err() {
                    warn!("Report receiver dropped, stopping dispatcher");
                    break;
                }
            }
            info!("Dispatcher stopping...");
        });

        DispatcherHandle {
            request_tx,
            report_rx,
            worker,
            next_id: Cell::new(0),
            backlog: RefCell::new(VecDeque::new()),
        }
    }
}

/// Client side of a running dispatcher worker.
///
/// Every queued request gets a ticket. Reports travel back tagged with it, so
/// `request` returns the report of its own request even when earlier
/// `submit`ted reports are still unread. Those stay queued for `next_report`.
pub struct DispatcherHandle {
    request_tx: Sender<(u64, Request)>,
    report_rx: Receiver<(u64, Report)>,
    worker: JoinHandle<()>,
    next_id: Cell<u64>,
    backlog: RefCell<VecDeque<(u64, Report)>>,
}

impl DispatcherHandle {
    /// Queues a request without waiting for its report and returns its ticket.
    pub fn submit(&self, request: Request) -> Result<u64> {
        let id = self.next_id.get();
        self.request_tx
            .send((id, request))
            .map_err(|e| RateError::ChannelSend(e.to_string()))?;
        self.next_id.set(id + 1);
        Ok(id)
    }

    fn recv_tagged(&self) -> Result<(u64, Report)> {
        self.report_rx
            .recv()
            .map_err(|e| RateError::ChannelRecv(e.to_string()))
    }

    /// Waits for the oldest report not yet handed out.
    pub fn next_report(&self) -> Result<Report> {
        if let Some((_, report)) = self.backlog.borrow_mut().pop_front() {
            return Ok(report);
        }
        self.recv_tagged().map(|(_, report)| report)
    }

    /// Queues a request and waits for the report of that request.
    pub fn request(&self, request: Request) -> Result<Report> {
        let ticket = self.submit(request)?;
        loop {
            let (id, report) = self.recv_tagged()?;
            if id == ticket {
                return Ok(report);
            }
            self.backlog.borrow_mut().push_back((id, report));
        }
    }

    /// Closes the queue, drains the remaining reports and joins the worker.
    pub fn shutdown(self) -> Result<Vec<Report>> {
        let DispatcherHandle {
            request_tx,
            report_rx,
            worker,
            backlog,
            ..
        } = self;
        drop(request_tx);
        let mut pending: Vec<Report> =
            backlog.into_inner().into_iter().map(|(_, r)| r).collect();
        pending.extend(report_rx.iter().map(|(_, r)| r));
        join_worker(worker)?;
        Ok(pending)
    }
}

fn join_worker(worker: JoinHandle<()>) -> Result<()> {
    worker
        .join()
        .map_err(|_| RateError::Worker("dispatcher worker panicked".to_string()))
}
