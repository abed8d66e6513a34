use md5::{Digest, Md5};

/// Content hash of a plaintext message, sent next to its ciphertext.
///
/// MD5 over the UTF-8 bytes, upper-case hex. The server uses it to spot
/// duplicate uploads; the client never verifies it.
pub fn integrity_hash(message: &str) -> String {
    hex::encode_upper(Md5::digest(message.as_bytes()))
}
