//! Record ids and share codes
//!
//! Both are blake3 digests of the wall clock, a process-wide counter and
//! a purpose tag, so two calls never repeat even within one clock tick.

use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Length of a public share code
pub const SHARE_CODE_LEN: usize = 8;

fn digest(tag: &str) -> blake3::Hash {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = blake3::Hasher::new();
    hasher.update(tag.as_bytes());
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&count.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hasher.finalize()
}

/// 128-bit id rendered as a dashed hex string
pub fn new_id() -> String {
    let hex = digest("tierlist-id").to_hex();
    let hex = hex.as_str();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

pub fn new_share_code() -> String {
    digest("share-code").to_hex().as_str()[..SHARE_CODE_LEN].to_string()
}
