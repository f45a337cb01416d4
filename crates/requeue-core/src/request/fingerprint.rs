//! Request fingerprints for duplicate filtering.

use sha2::{Digest, Sha256};

use super::Request;

impl Request {
    /// SHA-256 over method, URL and body, as lowercase hex.
    ///
    /// Two requests with the same fingerprint are duplicates as far as a
    /// downstream filter is concerned, regardless of priority or meta.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.to_ascii_uppercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.url.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.body);
        hex::encode(hasher.finalize())
    }
}
