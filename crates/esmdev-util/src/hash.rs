/// Content fingerprint of a source file: the hex-encoded BLAKE3 digest of its bytes.
#[must_use]
pub fn fingerprint(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
