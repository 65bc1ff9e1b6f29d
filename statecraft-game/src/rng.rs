//! Deterministic RNG plumbing.
//!
//! One user-visible seed fans out into per-domain streams so a change in how
//! one subsystem draws (say, analyzer jitter) cannot shift every other
//! subsystem's sequence.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by engine domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    decision: RefCell<CountingRng<SmallRng>>,
    selection: RefCell<CountingRng<SmallRng>>,
    heuristic: RefCell<CountingRng<SmallRng>>,
    identity: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let decision = CountingRng::new(derive_stream_seed(seed, b"decision"));
        let selection = CountingRng::new(derive_stream_seed(seed, b"selection"));
        let heuristic = CountingRng::new(derive_stream_seed(seed, b"heuristic"));
        let identity = CountingRng::new(derive_stream_seed(seed, b"identity"));
        Self {
            decision: RefCell::new(decision),
            selection: RefCell::new(selection),
            heuristic: RefCell::new(heuristic),
            identity: RefCell::new(identity),
        }
    }

    /// Construct the bundle from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random())
    }

    /// Stream for the emergency and source rolls.
    #[must_use]
    pub fn decision(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.decision.borrow_mut()
    }

    /// Stream for uniform picks over candidate pools.
    #[must_use]
    pub fn selection(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.selection.borrow_mut()
    }

    /// Stream for fallback deltas, padding jitter, and scoring bumps.
    #[must_use]
    pub fn heuristic(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.heuristic.borrow_mut()
    }

    /// Stream for generated-id suffixes.
    #[must_use]
    pub fn identity(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.identity.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
