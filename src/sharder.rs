//! Deterministic assignment of users to rollout buckets.
use sha1::{Digest, Sha1};

/// Number of buckets used by percentage rollouts.
pub const TOTAL_BUCKETS: u32 = 100;

pub trait Sharder {
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u32) -> u32;
}

/// The default (and only) sharder.
///
/// Takes the first 4 bytes of the SHA-1 digest as a big-endian integer. The result is taken
/// modulo `total_shards` as is, so assignments stay identical across replicas and versions.
pub struct Sha1Sharder;

impl Sharder for Sha1Sharder {
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u32) -> u32 {
        let hash = Sha1::digest(input);
        let value = u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]);
        value % total_shards
    }
}

/// Input hashed for a (user, flag) pair. User first, flag second, no separator.
pub fn bucket_key(user_id: &str, flag_name: &str) -> String {
    format!("{user_id}{flag_name}")
}

/// Map `input` to a stable bucket in `0..TOTAL_BUCKETS`.
pub fn bucket(input: &str) -> u32 {
    Sha1Sharder.get_shard(input, TOTAL_BUCKETS)
}
