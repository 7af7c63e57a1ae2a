use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};

// ###################################
// ->   Base64 utils
// ###################################
pub fn b64_encode(v: impl AsRef<[u8]>) -> String {
    STANDARD.encode(v)
}

// ###################################
// ->   Hashing utils
// ###################################
/// Lowercase hexadecimal MD5 digest.
pub fn md5_hex(v: impl AsRef<[u8]>) -> String {
    let mut hasher = Md5::new();
    hasher.update(v.as_ref());
    format!("{:x}", hasher.finalize())
}
