/// The four choke/interest flags of one connection.
///
/// Both sides start out choking and not interested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChokingState {
    pub am_choking: bool,
    pub am_interested: bool,
    pub peer_choking: bool,
    pub peer_interested: bool,
}

impl Default for ChokingState {
    fn default() -> Self {
        Self {
            am_choking: true,
            am_interested: false,
            peer_choking: true,
            peer_interested: false,
        }
    }
}

impl ChokingState {
    /// Whether block requests will be served: we are interested and the
    /// peer has unchoked us.
    pub fn can_request(&self) -> bool {
        self.am_interested && !self.peer_choking
    }
}
