//! The fixed experiment vocabulary.

/// The seven target words every participant judges, in presentation order.
/// Word-level statistics iterate this list, never the stored rows, so a
/// malformed submission cannot invent a word.
pub const VOCABULARY: [&str; 7] = [
    "안녕하세요",
    "고마워요",
    "미안합니다",
    "좋아요",
    "싫어요",
    "도와주세요",
    "배고파요",
];
