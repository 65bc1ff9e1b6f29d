//! Reversible share-code scheme with 64-word list.
//! Code format: ST-<WORD><NN>, e.g., ST-SUMMIT42

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "SUMMIT", "CAUCUS", "MANDATE", "BALLOT", "TREATY", "TARIFF", "BUDGET", "SENATE", "CABINET",
    "DECREE", "VETO", "QUORUM", "MOTION", "PODIUM", "GAVEL", "ENVOY", "CONSUL", "BORDER",
    "CENSUS", "CHARTER", "ACCORD", "PARDON", "LOBBY", "WHIP", "RECESS", "SESSION", "PLEDGE",
    "RALLY", "POLLS", "PRIMARY", "RUNOFF", "RECALL", "AGENDA", "PREMIER", "TRIBUNE", "SPEAKER",
    "DEPUTY", "MAYOR", "COMMONS", "CRISIS", "REFORM", "SUBSIDY", "EMBARGO", "SURPLUS", "DEFICIT",
    "DIPLMAT", "COALITN", "PARLMNT", "REFEREN", "GOVERN", "POLICY", "STATUTE", "AMENDMT",
    "CLOTURE", "HEARING", "INQUIRY", "DOSSIER", "REGIME", "CAPITAL", "FRONTIR", "CONSENS",
    "MAJORTY", "MINORTY", "ANNEX",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated FNV input
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"STCRT-");
    buf[6] = b'S';
    buf[7] = (packed & 0xFF) as u8;
    buf[8] = (packed >> 8) as u8;
    buf[9] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

#[must_use]
pub fn encode_friendly(seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, mut nn) = unpack(packed);
    let word = WORD_LIST.get(wi as usize).copied().unwrap_or("SUMMIT");
    if nn > 99 {
        nn %= 100;
    }
    format!("ST-{word}{nn:02}")
}

/// Decode a share code back into its seed. The prefix before the dash is
/// decorative and ignored.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<u64> {
    let s = code.trim();
    let (_, rest) = s.split_once('-')?;
    if rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    let seed = compose_seed(wi, nn);
    encode_friendly(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrips_code() {
        let seed = 0xDEAD_BEEF_CAFE_BABE;
        let code = encode_friendly(seed);
        let new_seed = decode_to_seed(&code).unwrap();
        assert_eq!(encode_friendly(new_seed), code);
    }

    #[test]
    fn st_summit_42_stable() {
        let seed = decode_to_seed("ST-SUMMIT42").unwrap();
        assert_eq!(encode_friendly(seed), "ST-SUMMIT42");
    }

    #[test]
    fn entropy_codes_always_decode() {
        for entropy in [0_u64, 1, 99, 0xFFFF, 0xDEAD_BEEF, u64::MAX] {
            let code = generate_code_from_entropy(entropy);
            assert!(decode_to_seed(&code).is_some(), "{code} failed to decode");
        }
    }

    #[test]
    fn word_list_is_unique_after_sanitize() {
        let mut words: Vec<String> = WORD_LIST.iter().map(|w| sanitize_word(w)).collect();
        words.sort_unstable();
        words.dedup();
        assert_eq!(words.len(), WORD_LIST.len());
    }
}
