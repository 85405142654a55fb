//! Background tickers.
//!
//! A ticker never touches tasks or the store. It only sends a message to whichever
//! loop owns them, which keeps all store access on one thread.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Sender};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediately,
    AfterInterval,
}

/// Cancellable periodic sender. Dropping it stops the thread.
pub struct Ticker {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<T, F>(
        name: &str,
        interval: Duration,
        first: FirstTick,
        tx: Sender<T>,
        mut make: F,
    ) -> io::Result<Self>
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread_name = format!("tick-{}", name);

        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            if first == FirstTick::Immediately && tx.send(make()).is_err() {
                return;
            }
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    default(interval) => {
                        if tx.send(make()).is_err() {
                            // Receiver gone, nobody left to tick for.
                            break;
                        }
                    }
                }
            }
        })?;

        debug!(ticker = name, ?interval, ?first, "ticker started");
        Ok(Self {
            name: name.to_string(),
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops future ticks and waits for the thread to exit.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // Errors only if the thread already exited.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(ticker = %self.name, "ticker thread panicked");
            } else {
                debug!(ticker = %self.name, "ticker stopped");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The two application timers: list refresh and reminder check.
pub struct Timers {
    pub refresh: Ticker,
    pub reminder: Ticker,
}

impl Timers {
    /// Refresh first fires after one interval; the reminder check fires right away.
    pub fn start<T, F, G>(
        tx: Sender<T>,
        refresh_every: Duration,
        remind_every: Duration,
        on_refresh: F,
        on_remind: G,
    ) -> io::Result<Self>
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
        G: FnMut() -> T + Send + 'static,
    {
        let refresh = Ticker::spawn("refresh", refresh_every, FirstTick::AfterInterval, tx.clone(), on_refresh)?;
        let reminder = Ticker::spawn("reminder", remind_every, FirstTick::Immediately, tx, on_remind)?;
        Ok(Self { refresh, reminder })
    }

    pub fn shutdown(mut self) {
        self.refresh.cancel();
        self.reminder.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[derive(Debug, PartialEq)]
    enum Tick {
        Refresh,
        Remind,
    }

    #[test]
    fn test_immediate_ticker_fires_before_interval() {
        let (tx, rx) = unbounded();
        let mut ticker =
            Ticker::spawn("test", Duration::from_secs(3600), FirstTick::Immediately, tx, || 1u32).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 1);
        ticker.cancel();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delayed_ticker_waits_for_interval() {
        let (tx, rx) = unbounded();
        let ticker =
            Ticker::spawn("delayed", Duration::from_millis(50), FirstTick::AfterInterval, tx, || ()).unwrap();

        assert!(rx.try_recv().is_err());
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        drop(ticker);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let (tx, rx) = unbounded();
        let mut ticker =
            Ticker::spawn("cancel", Duration::from_millis(10), FirstTick::AfterInterval, tx, || ()).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.cancel();

        while rx.try_recv().is_ok() {}
        // The sender moved into the thread is gone once it has been joined.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_timers_send_reminder_first() {
        let (tx, rx) = unbounded();
        let timers = Timers::start(
            tx,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            || Tick::Refresh,
            || Tick::Remind,
        )
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), Tick::Remind);
        assert!(rx.try_recv().is_err());
        timers.shutdown();
    }
}
