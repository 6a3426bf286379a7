//! Reversible sector codes for sharing warp map seeds.
//! Code format: WM-<WORD><NN>, e.g., WM-NEBULA42, WM-QUASAR07
use twox_hash::XxHash64;

const CODE_PREFIX: &str = "WM";
const HASH_DOMAIN: &[u8] = b"WARPMAP-SECTOR";
const HASH_SALT: u64 = 0x5EC7_0A5E;

// Word list for sector codes
pub const WORD_LIST: [&str; 64] = [
    "NEBULA", "QUASAR", "PULSAR", "COMET", "ORBIT", "HALO", "VOID", "DRIFT", "ION", "PLASMA",
    "NOVA", "DWARF", "GIANT", "CORONA", "FLARE", "AURORA", "ZENITH", "NADIR", "APOGEE", "PERIGEE",
    "ECLIPSE", "TRANSIT", "LAGRANGE", "BEACON", "RELAY", "DOCK", "HANGAR", "CARGO", "HULL",
    "SHIELD", "REACTOR", "THRUST", "VECTOR", "WARP", "JUMP", "SECTOR", "GATE", "BUOY", "PROBE",
    "SCOUT", "CORSAIR", "RAIDER", "FRIGATE", "CUTTER", "TENDER", "OUTPOST", "COLONY", "FORGE",
    "ASTEROID", "METEOR", "CRATER", "RIFT", "STATIC", "SIGNAL", "ECHO", "PARSEC", "PHOTON", "QUARK",
    "GRAVITY", "TIDE", "EMBER", "FROST", "SOLAR", "LUNAR",
];

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & 0x01FF) | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

/// Expand a word index and two-digit suffix into a full 64-bit seed.
///
/// The low 16 bits carry the packed code so it can be recovered from the seed.
fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let mut buf = Vec::with_capacity(HASH_DOMAIN.len() + 2);
    buf.extend_from_slice(HASH_DOMAIN);
    buf.extend_from_slice(&packed.to_le_bytes());
    let hash = XxHash64::oneshot(HASH_SALT, &buf);
    (hash & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render the sector code that `seed` was composed from.
#[must_use]
pub fn encode_sector_code(seed: u64) -> String {
    let (wi, nn) = unpack((seed & 0xFFFF) as u16);
    let word = WORD_LIST.get(wi as usize).copied().unwrap_or(WORD_LIST[0]);
    format!("{CODE_PREFIX}-{word}{:02}", nn % 100)
}

/// The sector code that reproduces `seed`, or `None` when `seed` was not
/// composed from a code.
#[must_use]
pub fn sector_code_for_seed(seed: u64) -> Option<String> {
    let code = encode_sector_code(seed);
    (decode_sector_code(&code) == Some(seed)).then_some(code)
}

/// Parse a sector code into its seed. Case and stray punctuation in the word
/// are ignored.
#[must_use]
pub fn decode_sector_code(code: &str) -> Option<u64> {
    let (prefix, rest) = code.trim().split_once('-')?;
    if !prefix.eq_ignore_ascii_case(CODE_PREFIX) || rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    if !nn_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| *w == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

/// Pick a code from arbitrary entropy, e.g. a clock reading.
#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    encode_sector_code(compose_seed(wi, nn))
}
