use flare_core::CandidateInit;

/// FIFO for connectivity candidates that arrive before a remote description
/// exists. The gate opens exactly once per negotiation; [`open`] drains the
/// pending entries in arrival order and afterwards [`is_open`] tells the
/// caller to apply candidates directly. A new peer-connection instance gets
/// a fresh buffer, never a reused one.
///
/// [`open`]: CandidateBuffer::open
/// [`is_open`]: CandidateBuffer::is_open
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: Vec<CandidateInit>,
    open: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn push(&mut self, candidate: CandidateInit) {
        self.pending.push(candidate);
    }

    /// Opens the gate and returns everything buffered so far, in arrival
    /// order. Subsequent calls return nothing.
    pub fn open(&mut self) -> Vec<CandidateInit> {
        self.open = true;
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
