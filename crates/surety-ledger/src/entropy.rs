use sha2::{Digest, Sha256};

/// Source of per-operation ledger entropy, the stand-in for block hashes.
pub trait EntropySource: Send {
    fn next_seed(&mut self) -> [u8; 32];
}

/// SHA-256 hash chain. Each call advances the chain by one link, so the
/// sequence is reproducible from the initial seed but not guessable without it.
#[derive(Debug, Clone)]
pub struct HashChainEntropy {
    state: [u8; 32],
}

impl HashChainEntropy {
    pub fn from_seed(seed: impl AsRef<[u8]>) -> Self {
        Self {
            state: Sha256::digest(seed.as_ref()).into(),
        }
    }
}

impl EntropySource for HashChainEntropy {
    fn next_seed(&mut self) -> [u8; 32] {
        self.state = Sha256::digest(self.state).into();
        self.state
    }
}

/// Maps `seed || account || nonce` to a value in `0..range`.
pub fn draw_index(seed: &[u8; 32], account: &[u8], nonce: u64, range: u8) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(account);
    hasher.update(nonce.to_be_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % u64::from(range.max(1))) as u8
}
