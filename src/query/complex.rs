//! Binary query combinators.

use crate::index::{DocumentId, ReverseIndex, TermPosition};
use crate::query::{Match, Query};

/// How a [`ComplexQuery`] combines the matches of its two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Both children must match inside the same document.
    And,
    /// At least one child must match.
    Or,
    /// Exactly one child must match.
    Xor,
    /// Both children must match within the given position distance.
    Near(u64),
}

impl Policy {
    fn accepts(&self, lx: &Match, rx: &Match) -> bool {
        match *self {
            Policy::And => lx.success && rx.success,
            Policy::Or => lx.success || rx.success,
            Policy::Xor => lx.success != rx.success,
            Policy::Near(distance) => {
                // The gap is checked in both directions; whichever child
                // comes first in the document, the saturated difference on
                // the other side collapses to zero.
                let forward_gap = rx.start_position.saturating_sub(lx.end_position);
                let backward_gap = lx.start_position.saturating_sub(rx.end_position);
                lx.success && rx.success && forward_gap <= distance && backward_gap <= distance
            }
        }
    }
}

/// A query combining two subqueries under a [`Policy`].
///
/// The two children advance in merge-join fashion: whichever cursor sits on
/// the smaller `(doc_id, position)` coordinates moves first, so the combined
/// cursor sweeps both posting streams in a single ascending pass.
pub struct ComplexQuery {
    lx: Box<dyn Query>,
    rx: Box<dyn Query>,
    ordered: bool,
    policy: Policy,
}

impl ComplexQuery {
    /// Combine `lx` and `rx` under `policy`.
    ///
    /// With `ordered` set, a double-sided match only succeeds when the left
    /// child's match starts at or before the right child's.
    pub fn new(lx: Box<dyn Query>, rx: Box<dyn Query>, policy: Policy, ordered: bool) -> Self {
        ComplexQuery {
            lx,
            rx,
            ordered,
            policy,
        }
    }
}

impl Query for ComplexQuery {
    fn init(&mut self, index: &dyn ReverseIndex) {
        self.lx.init(index);
        self.rx.init(index);
    }

    fn run(&self) -> Match {
        let mut lx_match = self.lx.run();
        let mut rx_match = self.rx.run();

        if !self.policy.accepts(&lx_match, &rx_match) {
            return Match::failure();
        }

        if lx_match.success && rx_match.success {
            if lx_match.doc_id != rx_match.doc_id {
                return Match::failure();
            }

            let mut success = true;
            if lx_match.start_position > rx_match.start_position {
                std::mem::swap(&mut lx_match, &mut rx_match);
                success = !self.ordered;
            }

            let mut involved_tokens = lx_match.involved_tokens;
            involved_tokens.extend(rx_match.involved_tokens);

            return Match {
                success,
                doc_id: lx_match.doc_id,
                start_position: lx_match.start_position,
                end_position: rx_match.end_position,
                involved_tokens,
            };
        }

        if lx_match.success {
            return lx_match;
        }
        if rx_match.success {
            return rx_match;
        }

        Match::failure()
    }

    fn advance(&mut self) {
        let (lx_doc, lx_position) = self.lx.coordinates();
        let (rx_doc, rx_position) = self.rx.coordinates();

        let go_left = lx_doc < rx_doc || (lx_doc == rx_doc && lx_position < rx_position);

        if go_left && !self.lx.ended() {
            self.lx.advance();
        }
        if !go_left || self.lx.ended() {
            self.rx.advance();
        }
        // The right side just ran dry while the left still has postings.
        if !go_left && !self.lx.ended() && self.rx.ended() {
            self.lx.advance();
        }
    }

    fn ended(&self) -> bool {
        self.lx.ended() && self.rx.ended()
    }

    fn close(&mut self) {
        self.lx.close();
        self.rx.close();
    }

    fn coordinates(&self) -> (DocumentId, TermPosition) {
        let (lx_doc, lx_position) = self.lx.coordinates();
        let (rx_doc, rx_position) = self.rx.coordinates();

        if lx_doc < rx_doc || (lx_doc == rx_doc && lx_position < rx_position) {
            (lx_doc, lx_position)
        } else {
            (rx_doc, rx_position)
        }
    }
}

impl std::fmt::Debug for ComplexQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexQuery")
            .field("policy", &self.policy)
            .field("ordered", &self.ordered)
            .finish()
    }
}
