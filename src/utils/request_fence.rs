use dashmap::DashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FenceRefusal {
    /// A newer ticket was already issued.
    Stale { latest: u64 },
    /// The sequence of the key reached `u64::MAX`.
    Exhausted,
}

/// Monotonic ticket per query key; only the holder of the latest ticket may publish.
#[derive(Default)]
pub struct RequestFence {
    latest: DashMap<String, u64>,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket for `key`.
    ///
    /// A caller-supplied sequence is adopted when it is newer than every ticket issued so
    /// far, an older one is refused with the current latest.
    pub fn issue(&self, key: &str, requested: Option<u64>) -> Result<u64, FenceRefusal> {
        let mut latest = self.latest.entry(key.to_string()).or_insert(0);
        let seq = match requested {
            Some(seq) if seq <= *latest => return Err(FenceRefusal::Stale { latest: *latest }),
            Some(seq) => seq,
            None => latest.checked_add(1).ok_or(FenceRefusal::Exhausted)?,
        };
        *latest = seq;
        Ok(seq)
    }

    pub fn latest(&self, key: &str) -> u64 {
        self.latest.get(key).map(|it| *it).unwrap_or(0)
    }

    pub fn is_latest(&self, key: &str, seq: u64) -> bool {
        self.latest(key) == seq
    }
}
