//! Key material wrappers
//!
//! Both types zero their bytes on drop and never print them.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Digest of a passphrase (Ku), not yet bound to an engine
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for MasterKey {}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Key localized to one authoritative engine (Kul)
///
/// The length always equals the size required by the protocol it was
/// derived for. Privacy keys for DES and 3DES carry the pre-IV in their
/// last 8 bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey {
    bytes: Vec<u8>,
}

impl LocalizedKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the key bytes
    ///
    /// Do not keep copies of the returned slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for LocalizedKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for LocalizedKey {}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizedKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_bytes() {
        let key = LocalizedKey::new(vec![0xAB; 16]);
        let rendered = format!("{:?}", key);
        assert_eq!(rendered, "LocalizedKey { len: 16, .. }");
        assert!(!rendered.contains("171"));

        let master = MasterKey::new(vec![0xCD; 20]);
        assert_eq!(format!("{:?}", master), "MasterKey { len: 20, .. }");
    }

    #[test]
    fn test_equality() {
        let a = LocalizedKey::new(vec![1, 2, 3]);
        assert_eq!(a, LocalizedKey::new(vec![1, 2, 3]));
        assert_ne!(a, LocalizedKey::new(vec![1, 2, 4]));
        assert_ne!(a, LocalizedKey::new(vec![1, 2]));
    }

    #[test]
    fn test_zeroize() {
        let mut key = LocalizedKey::new(vec![9; 8]);
        key.zeroize();
        assert!(key.is_empty());
    }
}
