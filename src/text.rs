//! Korean particle selection for user-facing messages.
//!
//! Picks the right josa (을/를, 이/가, 은/는) for a word based on whether
//! its final syllable carries a final consonant (batchim).

/// Particle families the bot's messages use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Particle {
    /// 을/를 (object marker).
    Object,
    /// 이/가 (subject marker).
    Subject,
    /// 은/는 (topic marker).
    Topic,
}

const HANGUL_SYLLABLE_BASE: u32 = 0xAC00; // 가
const HANGUL_SYLLABLE_LAST: u32 = 0xD7A3; // 힣
const JONGSEONG_CLASSES: u32 = 28;

/// Whether a single character ends in a final consonant.
///
/// Non-Hangul characters follow the bot's long-standing convention:
/// Latin consonants and digits read as closed syllables, Latin vowels
/// as open ones.
fn ends_closed(ch: char) -> bool {
    let code = ch as u32;
    if (HANGUL_SYLLABLE_BASE..=HANGUL_SYLLABLE_LAST).contains(&code) {
        return (code - HANGUL_SYLLABLE_BASE) % JONGSEONG_CLASSES != 0;
    }
    // Compatibility jamo: consonants count as closed, vowels as open.
    if ('ㄱ'..='ㅎ').contains(&ch) {
        return true;
    }
    if ('ㅏ'..='ㅣ').contains(&ch) {
        return false;
    }
    if ch.is_ascii_alphabetic() {
        return !matches!(ch.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u');
    }
    true
}

/// The particle for `word`, or an empty string for an empty word.
pub fn particle(word: &str, kind: Particle) -> &'static str {
    let Some(last) = word.chars().last() else {
        return "";
    };
    let closed = ends_closed(last);
    match kind {
        Particle::Object => {
            if closed {
                "을"
            } else {
                "를"
            }
        }
        Particle::Subject => {
            if closed {
                "이"
            } else {
                "가"
            }
        }
        Particle::Topic => {
            if closed {
                "은"
            } else {
                "는"
            }
        }
    }
}
