use catalog::Location;
use geocode::GeocodeError;
use tracing::{debug, warn};

/// An issued query. Only the ticket with the highest `seq` may mutate the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Accepted; the caller upserts the location.
    Resolved(Location),
    NoMatch,
    /// A newer query was issued while this one was in flight.
    Stale { seq: u64, latest: u64 },
    Failed(GeocodeError),
}

/// Sequence-numbers free-text queries so that only the most recent one can
/// land.
#[derive(Debug, Default)]
pub struct SearchResolver {
    issued: u64,
}

impl SearchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the most recently issued query, `0` if none.
    pub fn latest(&self) -> u64 {
        self.issued
    }

    /// Issues a ticket for `text`, or `None` when it trims to empty.
    pub fn begin(&mut self, text: &str) -> Option<SearchTicket> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        self.issued += 1;
        debug!(seq = self.issued, query, "search issued");
        Some(SearchTicket {
            seq: self.issued,
            query: query.to_string(),
        })
    }

    /// Classifies a geocoder response for `ticket`.
    pub fn settle(
        &self,
        ticket: &SearchTicket,
        response: Result<Option<Location>, GeocodeError>,
    ) -> SearchOutcome {
        if ticket.seq != self.issued {
            debug!(seq = ticket.seq, latest = self.issued, query = %ticket.query, "stale search response discarded");
            return SearchOutcome::Stale {
                seq: ticket.seq,
                latest: self.issued,
            };
        }
        match response {
            Ok(Some(location)) => SearchOutcome::Resolved(location),
            Ok(None) => {
                debug!(query = %ticket.query, "search returned no features");
                SearchOutcome::NoMatch
            }
            Err(e) => {
                warn!(query = %ticket.query, error = %e, "search failed");
                SearchOutcome::Failed(e)
            }
        }
    }
}
