//! Background pusher and puller loops.
//!
//! Both loops run until the shared shutdown flag is observed at the top of an
//! iteration, so each may finish one more round after `stop` has begun.
use std::{sync::Arc, thread, time::Duration};

use log::{debug, trace, warn};

use crate::protocol::{Connector, ProtocolTransport, Request, TransportError};

use super::Shared;

/// Doubling delay between failed attempts, reset after a success.
#[derive(Debug)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub(crate) fn wait(&mut self) {
        thread::sleep(self.current);
        self.advance();
    }

    fn advance(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.max);
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial;
    }

    pub(crate) fn current(&self) -> Duration {
        self.current
    }
}

/// Send every outgoing request to the broker, one connection per request.
///
/// Once shutdown is observed the requests still queued (the shutdown sentinel
/// among them) get a single delivery attempt each before the thread exits.
pub(crate) fn pusher<C: Connector>(shared: Arc<Shared<C>>) {
    debug!("{} pusher started", shared.name);
    let mut backoff = shared.backoff();

    while !shared.is_shutdown() {
        if let Some(req) = shared.outgoing.pop_timeout(shared.config.idle_wait) {
            deliver(&shared, &req, &mut backoff, true);
        }
    }

    while let Some(req) = shared.outgoing.try_pop() {
        deliver(&shared, &req, &mut backoff, false);
    }
    debug!("{} pusher stopped", shared.name);
}

fn deliver<C: Connector>(
    shared: &Shared<C>,
    req: &Request,
    backoff: &mut Backoff,
    retry: bool,
) {
    loop {
        let stream = match shared.connector.connect() {
            Ok(stream) => stream,
            Err(e) => {
                if !retry || shared.is_shutdown() {
                    warn!("dropping {} {}: {e}", req.method(), req.uri());
                    return;
                }
                warn!("connect failed, retrying in {:?}: {e}", backoff.current());
                backoff.wait();
                continue;
            }
        };
        backoff.reset();

        let mut transport = ProtocolTransport::new(stream, shared.config.framing);
        match transport.write_request(req) {
            Ok(()) => trace!("{} sent {} {}", shared.name, req.method(), req.uri()),
            Err(e) => warn!("lost {} {}: {e}", req.method(), req.uri()),
        }
        return;
    }
}

/// Poll the broker for this client's queue and hand every delivered body to
/// the incoming queue. Successful polls follow each other without delay.
pub(crate) fn puller<C: Connector>(shared: Arc<Shared<C>>) {
    debug!("{} puller started", shared.name);
    let poll = Request::poll(&shared.name);
    let mut backoff = shared.backoff();

    while !shared.is_shutdown() {
        match pull(&shared, &poll) {
            Ok(body) => {
                backoff.reset();
                trace!("{} received {} bytes", shared.name, body.len());
                shared.incoming.push(Request::delivery(&shared.name, body));
            }
            Err(TransportError::Status(status)) => {
                trace!("{} poll answered '{status}'", shared.name);
                backoff.wait();
            }
            Err(e) => {
                debug!("{} poll failed: {e}", shared.name);
                backoff.wait();
            }
        }
    }
    debug!("{} puller stopped", shared.name);
}

fn pull<C: Connector>(shared: &Shared<C>, poll: &Request) -> Result<String, TransportError> {
    let stream = shared.connector.connect()?;
    let mut transport = ProtocolTransport::new(stream, shared.config.framing);
    transport.write_request(poll)?;
    Ok(transport.read_response()?.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_max() {
        let mut backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(5));

        let mut seen = vec![backoff.current()];
        for _ in 0..4 {
            backoff.wait();
            seen.push(backoff.current());
        }

        let expected = [1, 2, 4, 5, 5].map(Duration::from_millis);
        assert_eq!(seen, expected);

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_millis(1));
    }

    #[test]
    fn backoff_saturates_on_huge_delays() {
        let mut backoff = Backoff::new(Duration::MAX / 2 + Duration::from_secs(1), Duration::MAX);

        backoff.advance();
        assert_eq!(backoff.current(), Duration::MAX);
        backoff.advance();
        assert_eq!(backoff.current(), Duration::MAX);
    }
}
