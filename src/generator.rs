//! Random password generation.
//!
//! Every character is an independent uniform draw from the OS CSPRNG over
//! the character universe built from [`PasswordOptions`].

use rand::{TryRngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

pub const MIN_LENGTH: usize = 8;
pub const DEFAULT_LENGTH: usize = 20;

/// Resampling stops after this many attempts that miss an enabled class.
pub const MAX_ATTEMPTS: usize = 1000;

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SPECIAL: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?~/";

/// Characters that are easy to confuse when read back.
pub const AMBIGUOUS: &str = "il1Lo0O";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Special,
}

impl CharClass {
    /// Universe order.
    pub const ALL: [CharClass; 4] = [
        CharClass::Lowercase,
        CharClass::Uppercase,
        CharClass::Digit,
        CharClass::Special,
    ];

    pub const fn charset(self) -> &'static str {
        match self {
            CharClass::Lowercase => LOWERCASE,
            CharClass::Uppercase => UPPERCASE,
            CharClass::Digit => DIGITS,
            CharClass::Special => SPECIAL,
        }
    }

    /// The class's characters, minus the ambiguous ones if requested.
    pub fn chars(self, exclude_ambiguous: bool) -> Vec<u8> {
        self.charset()
            .bytes()
            .filter(|b| !exclude_ambiguous || !AMBIGUOUS.as_bytes().contains(b))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    pub length: usize,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digits: bool,
    pub special: bool,
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            lowercase: true,
            uppercase: true,
            digits: true,
            special: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    pub fn is_enabled(&self, class: CharClass) -> bool {
        match class {
            CharClass::Lowercase => self.lowercase,
            CharClass::Uppercase => self.uppercase,
            CharClass::Digit => self.digits,
            CharClass::Special => self.special,
        }
    }

    pub fn enabled_classes(&self) -> impl Iterator<Item = CharClass> + '_ {
        CharClass::ALL
            .into_iter()
            .filter(move |c| self.is_enabled(*c))
    }
}

/// Every character a password built from `options` may contain, in class
/// order lowercase, uppercase, digits, special.
pub fn universe(options: &PasswordOptions) -> Vec<u8> {
    options
        .enabled_classes()
        .flat_map(|c| c.chars(options.exclude_ambiguous))
        .collect()
}

pub fn universe_size(options: &PasswordOptions) -> usize {
    universe(options).len()
}

/// Generates a password of `options.length` characters containing at least
/// one character of each enabled class.
pub fn generate(options: &PasswordOptions) -> Result<Zeroizing<String>> {
    generate_with(options, &mut OsRng)
}

/// Uniform index in `0..len`. Draws in the top partial bucket of the `u32`
/// range are rejected so every index is equally likely.
fn random_index<R: TryRngCore>(rng: &mut R, len: usize) -> Result<usize> {
    let n = u32::try_from(len)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| VaultError::Validation(format!("cannot pick from {len} characters")))?;
    let zone = u32::MAX - (u32::MAX % n);
    loop {
        let draw = rng
            .try_next_u32()
            .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
        if draw < zone {
            return Ok((draw % n) as usize);
        }
    }
}

fn generate_with<R: TryRngCore>(
    options: &PasswordOptions,
    rng: &mut R,
) -> Result<Zeroizing<String>> {
    if options.length < MIN_LENGTH {
        return Err(VaultError::Validation(format!(
            "password length must be at least {MIN_LENGTH}, got {}",
            options.length
        )));
    }

    let pool = universe(options);
    if pool.is_empty() {
        return Err(VaultError::Validation(
            "at least one character class must be enabled".into(),
        ));
    }

    let required: Vec<Vec<u8>> = options
        .enabled_classes()
        .map(|c| c.chars(options.exclude_ambiguous))
        .collect();

    let mut password = Zeroizing::new(String::with_capacity(options.length));

    for attempt in 1..=MAX_ATTEMPTS {
        password.clear();
        for _ in 0..options.length {
            let idx = random_index(rng, pool.len())?;
            password.push(char::from(pool[idx]));
        }

        if covers_all(password.as_bytes(), &required) {
            if attempt > 1 {
                log::debug!("Password accepted after {} attempts", attempt);
            }
            return Ok(password);
        }
    }

    Err(VaultError::Validation(format!(
        "could not satisfy every enabled character class in {MAX_ATTEMPTS} attempts"
    )))
}

fn covers_all(password: &[u8], required: &[Vec<u8>]) -> bool {
    required
        .iter()
        .all(|class| password.iter().any(|b| class.contains(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(class: CharClass) -> PasswordOptions {
        PasswordOptions {
            length: 16,
            lowercase: class == CharClass::Lowercase,
            uppercase: class == CharClass::Uppercase,
            digits: class == CharClass::Digit,
            special: class == CharClass::Special,
            exclude_ambiguous: false,
        }
    }

    #[test]
    fn test_class_sizes() {
        assert_eq!(LOWERCASE.len(), 26);
        assert_eq!(UPPERCASE.len(), 26);
        assert_eq!(DIGITS.len(), 10);
        assert_eq!(SPECIAL.len(), 28);
    }

    #[test]
    fn test_full_universe_is_90() {
        assert_eq!(universe_size(&PasswordOptions::default()), 90);
    }

    #[test]
    fn test_universe_order() {
        let u = universe(&PasswordOptions::default());
        assert_eq!(u[0], b'a');
        assert_eq!(u[26], b'A');
        assert_eq!(u[52], b'0');
        assert_eq!(u[62], b'!');
    }

    #[test]
    fn test_ambiguous_exclusion() {
        let opts = PasswordOptions {
            exclude_ambiguous: true,
            ..PasswordOptions::default()
        };
        let u = universe(&opts);
        for c in AMBIGUOUS.bytes() {
            assert!(!u.contains(&c), "{} should be excluded", c as char);
        }
        // 23 lowercase + 24 uppercase + 8 digits + 28 special
        assert_eq!(u.len(), 83);
    }

    #[test]
    fn test_rejects_short_length() {
        let opts = PasswordOptions {
            length: 7,
            ..PasswordOptions::default()
        };
        assert!(matches!(generate(&opts), Err(VaultError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_universe() {
        let opts = PasswordOptions {
            lowercase: false,
            uppercase: false,
            digits: false,
            special: false,
            ..PasswordOptions::default()
        };
        assert!(matches!(generate(&opts), Err(VaultError::Validation(_))));
    }

    #[test]
    fn test_generate_default() {
        let password = generate(&PasswordOptions::default()).unwrap();
        assert_eq!(password.len(), DEFAULT_LENGTH);
        let bytes = password.as_bytes();
        for class in CharClass::ALL {
            let set = class.chars(false);
            assert!(bytes.iter().any(|b| set.contains(b)), "missing {:?}", class);
        }
    }

    #[test]
    fn test_single_class_passwords() {
        for class in CharClass::ALL {
            let password = generate(&only(class)).unwrap();
            let set = class.chars(false);
            assert!(password.bytes().all(|b| set.contains(&b)));
        }
    }

    #[test]
    fn test_minimum_length_with_all_classes() {
        let opts = PasswordOptions {
            length: MIN_LENGTH,
            ..PasswordOptions::default()
        };
        assert_eq!(generate(&opts).unwrap().len(), MIN_LENGTH);
    }

    #[test]
    fn test_passwords_differ() {
        let a = generate(&PasswordOptions::default()).unwrap();
        let b = generate(&PasswordOptions::default()).unwrap();
        assert_ne!(*a, *b);
    }

    /// Replays fixed draws, then reports a failed entropy source.
    struct ScriptedRng(Vec<u32>);

    impl TryRngCore for ScriptedRng {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> std::result::Result<u32, Self::Error> {
            if self.0.is_empty() {
                Err(std::io::Error::other("entropy source unavailable"))
            } else {
                Ok(self.0.remove(0))
            }
        }

        fn try_next_u64(&mut self) -> std::result::Result<u64, Self::Error> {
            self.try_next_u32().map(u64::from)
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> std::result::Result<(), Self::Error> {
            Err(std::io::Error::other("entropy source unavailable"))
        }
    }

    #[test]
    fn test_random_index_rejects_partial_bucket() {
        // u32::MAX % 90 == 75, so draws from u32::MAX - 75 upward are redrawn
        let mut rng = ScriptedRng(vec![u32::MAX, u32::MAX - 75, u32::MAX - 76, 7]);
        assert_eq!(random_index(&mut rng, 90).unwrap(), 89);
        assert_eq!(random_index(&mut rng, 90).unwrap(), 7);
    }

    #[test]
    fn test_random_index_stays_in_bounds() {
        for len in [1, 2, 7, 83, 90] {
            for _ in 0..200 {
                assert!(random_index(&mut OsRng, len).unwrap() < len);
            }
        }
        assert!(matches!(
            random_index(&mut OsRng, 0),
            Err(VaultError::Validation(_))
        ));
    }

    #[test]
    fn test_rng_failure_is_crypto_error() {
        let result = generate_with(&PasswordOptions::default(), &mut ScriptedRng(vec![1, 2, 3]));
        match result {
            Err(VaultError::Crypto(msg)) => assert!(msg.contains("entropy source unavailable")),
            other => panic!("expected a crypto error, got {:?}", other.map(|_| ())),
        }
    }
}
