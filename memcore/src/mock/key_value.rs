use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;

pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
}

/// Random lowercase keys and values with lengths in `min_size..max_size`
pub fn generate_random(capacity: usize, min_size: usize, max_size: usize) -> Vec<KeyValue> {
    let mut rng = rand::rng();
    (0..capacity)
        .map(|_idx| {
            let key_size = rng.random_range(min_size..max_size);
            let value_size = rng.random_range(min_size..max_size);
            KeyValue {
                key: create_random_value(&mut rng, key_size),
                value: create_random_value(&mut rng, value_size),
            }
        })
        .collect()
}

fn create_random_value<R: Rng>(rng: &mut R, capacity: usize) -> Bytes {
    let mut value = BytesMut::with_capacity(capacity);
    for _ in 0..capacity {
        value.put_u8(rng.random_range(b'a'..=b'z'));
    }
    value.freeze()
}
