use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const STATE_PREFIX: &str = "state_";
const STATE_LEN: usize = 9;

const MOCK_CODE_PREFIX: &str = "mock_";
const MOCK_CODE_LEN: usize = 15;

/// Fallback `state` value used when the caller leaves it blank.
///
/// Not a security token: the thread RNG is fine for a mocked flow.
pub fn generate_state() -> String {
    prefixed(&mut rand::rng(), STATE_PREFIX, STATE_LEN)
}

pub fn generate_mock_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    prefixed(rng, MOCK_CODE_PREFIX, MOCK_CODE_LEN)
}

fn prefixed<R: Rng + ?Sized>(rng: &mut R, prefix: &str, len: usize) -> String {
    let mut value = String::with_capacity(prefix.len() + len);
    value.push_str(prefix);
    value.extend((0..len).map(|_| BASE36[rng.random_range(0..BASE36.len())] as char));
    value
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::{generate_mock_code, generate_state};

    fn is_base36(value: &str) -> bool {
        value
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    }

    #[test]
    fn state_has_prefix_and_base36_tail() {
        let state = generate_state();
        let tail = state.strip_prefix("state_").unwrap();
        assert_eq!(tail.len(), 9);
        assert!(is_base36(tail));
    }

    #[test]
    fn mock_code_is_reproducible_with_seeded_rng() {
        let first = generate_mock_code(&mut StdRng::seed_from_u64(7));
        let second = generate_mock_code(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);

        let tail = first.strip_prefix("mock_").unwrap();
        assert_eq!(tail.len(), 15);
        assert!(is_base36(tail));
    }
}
