/// Milestones are reported in multiples of this many percent.
pub const PROGRESS_STEP: u8 = 5;

/// Tracks a streamed download and decides when a progress line is due.
///
/// This is a pure function of the cumulative byte count and the declared content length, so it
/// can be driven without any I/O.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    total: Option<u64>,
    downloaded: u64,
    last_reported: u8,
}

impl DownloadProgress {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|total| *total > 0),
            downloaded: 0,
            last_reported: 0,
        }
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Records `chunk_len` more bytes. Returns the new milestone percentage when it moved at
    /// least one step past the last reported one; milestones never exceed 100.
    pub fn advance(&mut self, chunk_len: u64) -> Option<u8> {
        self.downloaded = self.downloaded.saturating_add(chunk_len);
        let total = self.total?;

        let percent = (u128::from(self.downloaded.min(total)) * 100 / u128::from(total)) as u8;
        let milestone = percent - percent % PROGRESS_STEP;

        if milestone >= self.last_reported + PROGRESS_STEP {
            self.last_reported = milestone;
            Some(milestone)
        } else {
            None
        }
    }
}
