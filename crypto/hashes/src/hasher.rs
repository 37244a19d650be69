use sha2::{Digest, Sha256};
use std::io::Write;

pub trait Hashable {
    fn hash_into(&self, state: &mut Sha256);
}

/// Compute SHA256(SHA256(data))
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// Compute SHA256(data)
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// HashWriter wraps a Sha256 hasher to implement Write trait
#[derive(Clone)]
pub struct HashWriter(Sha256);

impl HashWriter {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into()
    }

    /// Finalizes as SHA256(SHA256(written bytes))
    pub fn finalize_double(self) -> [u8; 32] {
        Sha256::digest(self.0.finalize()).into()
    }

    pub fn hash_object<T: Hashable>(&mut self, obj: &T) {
        obj.hash_into(&mut self.0);
    }
}

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_sha256() {
        let hash = double_sha256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_hash_writer() {
        let mut writer = HashWriter::new();
        writer.write_all(b"hello").unwrap();
        assert_eq!(
            hex::encode(writer.finalize()),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_finalize_double_matches_double_sha256() {
        let mut writer = HashWriter::new();
        writer.update(b"he");
        writer.update(b"llo");
        assert_eq!(writer.finalize_double(), double_sha256(b"hello"));
    }
}
