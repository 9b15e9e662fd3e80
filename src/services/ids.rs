use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of client-generated record ids.
pub const ID_LENGTH: usize = 8;

/// Generates a random alphanumeric identifier of `len` characters.
///
/// Ids are not checked against existing rows; the host arbitrates uniqueness.
#[must_use]
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
