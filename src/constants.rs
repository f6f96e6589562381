// Account Seeds
pub mod seeds {
    pub const REGISTRY: &[u8] = b"registry";
    pub const STREAM: &[u8] = b"stream";
}

// Events
pub mod events {
    /// First chunk of every `sol_log_data` record written by this program.
    pub const EVENT_TAG: &[u8] = b"vesting:event";
}
