use anyhow::{Result, bail};
use std::collections::HashMap;
use warpmap_core::seed::WORD_LIST;
use warpmap_core::{decode_sector_code, sector_code_for_seed};

/// Seed metadata resolved from CLI input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub const fn from_sector_code(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// Sector code that reproduces this seed, if there is one.
    #[must_use]
    pub fn sector_code(&self) -> Option<String> {
        self.code
            .clone()
            .or_else(|| sector_code_for_seed(self.seed))
    }

    /// Sector code when the seed has one, otherwise the numeric seed.
    #[must_use]
    pub fn display_code(&self) -> String {
        self.sector_code()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, sector codes, and the keyword `all`, which
/// expands to every sector-code seed.
///
/// # Errors
///
/// Returns an error for tokens that are neither numbers nor sector codes.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Some(seed) = decode_sector_code(token) {
            pending.push(SeedInfo::from_sector_code(seed, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(all_sector_code_seeds());
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    for info in pending {
        if let Some(&existing) = index.get(&info.seed) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

fn all_sector_code_seeds() -> Vec<SeedInfo> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100);
    for word in WORD_LIST {
        for nn in 0..100 {
            let code = format!("WM-{word}{nn:02}");
            if let Some(seed) = decode_sector_code(&code) {
                seeds.push(SeedInfo::from_sector_code(seed, code));
            }
        }
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_numbers_and_codes() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "wm-nebula42"])).unwrap();
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0], SeedInfo::from_numeric(42));
        assert_eq!(seeds[1].seed, 7);
        assert_eq!(seeds[2].code.as_deref(), Some("WM-NEBULA42"));
        assert_eq!(seeds[2].display_code(), "WM-NEBULA42");
    }

    #[test]
    fn numeric_seeds_only_show_codes_that_reproduce_them() {
        let plain = SeedInfo::from_numeric(4242);
        assert_eq!(plain.sector_code(), None);
        assert_eq!(plain.display_code(), "4242");

        let seed = decode_sector_code("WM-ORBIT33").unwrap();
        let composed = SeedInfo::from_numeric(seed);
        assert_eq!(composed.sector_code().as_deref(), Some("WM-ORBIT33"));
        assert_eq!(decode_sector_code(&composed.display_code()), Some(seed));
    }

    #[test]
    fn dedupes_preferring_coded_entries() {
        let seed = decode_sector_code("WM-COMET05").unwrap();
        let seeds =
            resolve_seed_inputs(&tokens(&[&seed.to_string(), "WM-COMET05", "WM-COMET05"])).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].code.as_deref(), Some("WM-COMET05"));
    }

    #[test]
    fn empty_input_falls_back_to_default_seed() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(1337)]);
    }

    #[test]
    fn all_keyword_expands_every_code() {
        let seeds = resolve_seed_inputs(&tokens(&["all"])).unwrap();
        assert_eq!(seeds.len(), WORD_LIST.len() * 100);
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["not-a-seed"])).is_err());
    }
}
