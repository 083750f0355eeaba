//! Content fingerprinting for cache-busted output names.
//!
//! Uses `blake3` for fast cryptographic content hashing. The short hex
//! form is what gets substituted into `[hash]` output-name templates
//! (e.g. `style.a1b2c3d4.css`).

/// Hex characters kept in the short fingerprint.
const SHORT_LEN: usize = 8;

/// Compute the short content fingerprint of `data`.
///
/// Identical input always yields the identical fingerprint, so output
/// names stay stable across rebuilds until the content changes.
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    blake3::hash(data.as_ref()).to_hex().as_str()[..SHORT_LEN].to_string()
}
