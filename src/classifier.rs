//! Lexical launch-signal classifier.
//!
//! A single case-insensitive regex built from families of phrasings that
//! suggest a product or service is going live, expanding or being announced.
//! One hit anywhere in an article's title or description qualifies it.
//!
//! The set is deliberately broad: the secondary family matches generic
//! announcement vocabulary ("partnership", "milestone", ...) and lets through
//! plenty of ordinary tech news. Precision is left to the humans reading the
//! digest.

use once_cell::sync::Lazy;
use regex::Regex;

/// Phrasing families joined into the launch pattern, in match priority order.
pub const SIGNAL_FAMILIES: &[(&str, &[&str])] = &[
    (
        "launch_verbs",
        &[
            r"launch(?:es|ed|ing)?",
            r"ship(?:s|ped|ping)?",
            r"release(?:s|d)?",
            r"releasing",
            r"roll(?:s|ed)?\s*out",
            r"debut(?:s|ed|ing)?",
            r"unveil(?:s|ed|ing)?",
            r"introduce(?:s|d)?",
            r"introducing",
        ],
    ),
    (
        "go_live",
        &[
            r"go(?:es)?\s*live",
            r"we'?re\s+live",
            r"now\s*live",
            r"now\s+available",
        ],
    ),
    (
        "early_access",
        &[
            r"public\s+beta",
            r"private\s+beta",
            r"early\s+access",
            r"soft\s+launch",
            r"MVP\s+live",
            r"v(?:\d+\.)?\d+\s*release",
        ],
    ),
    (
        "stealth_exit",
        &[
            r"out\s+of\s+stealth",
            r"emerges?\s+from\s+stealth",
            r"exits?\s+stealth\s*mode",
            r"breaks?\s+cover",
        ],
    ),
    (
        "signups",
        &[
            r"waitlist\s+open",
            r"sign[-\s]*ups?\s+open",
            r"open\s*for\s*signups?",
        ],
    ),
    (
        "funding",
        &[
            r"secures?\s+pre[-\s]*seed",
            r"raises?\s+angel\s+round",
            r"funded\s+to\s+launch",
        ],
    ),
    (
        "accelerator",
        &[
            r"joins?\s+.*\baccelerator",
            r"graduates?\s+from\s+accelerator",
            r"demo\s*day\s*debut",
        ],
    ),
    (
        "expansion",
        &[
            r"enters?\s+new\s+market",
            r"expands?\s+to",
            r"opens?\s+operations\s+in",
            r"adds?\s+new\s+platform",
            r"launches?\s+in",
        ],
    ),
    (
        "announcement",
        &[
            r"new\s+product",
            r"new\s+service",
            r"new\s+platform",
            r"new\s+app",
            r"new\s+feature",
            r"announce(?:s|d)?",
            r"announcing",
            r"reveal(?:s|ed|ing)?",
            r"present(?:s|ed|ing)?",
            r"showcase(?:s|d)?",
            r"showcasing",
            r"expansion",
            r"milestone",
            r"breakthrough",
            r"innovation",
            r"partnership",
            r"collaboration",
            r"integration",
            r"upgrade(?:s|d)?",
            r"upgrading",
            r"enhancements?",
            r"improvements?",
            r"beta\s+test",
            r"pilot\s+program",
            r"pre[-\s]*launch",
            r"coming\s+soon",
            r"available\s+now",
        ],
    ),
];

static LAUNCH_SIGNALS: Lazy<Regex> = Lazy::new(|| {
    let alternatives = SIGNAL_FAMILIES
        .iter()
        .flat_map(|(_, patterns)| patterns.iter().copied())
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("launch signal pattern compiles")
});

/// True when `text` contains any launch signal.
pub fn is_launch_signal(text: &str) -> bool {
    LAUNCH_SIGNALS.is_match(text)
}

/// The first launch signal found in `text`, for logging.
pub fn matched_signal(text: &str) -> Option<&str> {
    LAUNCH_SIGNALS.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_sentence_matches() {
        assert!(is_launch_signal("Acme launches its new app in Lagos"));
        assert_eq!(
            matched_signal("Acme launches its new app in Lagos"),
            Some("launches")
        );
    }

    #[test]
    fn test_hiring_sentence_does_not_match() {
        assert!(!is_launch_signal("Acme hires new CFO"));
        assert_eq!(matched_signal("Acme hires new CFO"), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_launch_signal("PAYSTACK UNVEILS CHECKOUT"));
        assert!(is_launch_signal("Now Available in Kenya"));
    }

    #[test]
    fn test_family_samples() {
        let samples = [
            "Startup rolls out a lending product",
            "Flutterwave's tool goes live today",
            "The wallet enters public beta",
            "Healthtech emerges from stealth with $2m",
            "Sign-ups open for the pilot",
            "Founders secure pre-seed to build",
            "Chipper joins the Techstars accelerator",
            "Moniepoint expands to Kenya",
            "A strategic partnership with MTN",
            "Version v2.1 release notes",
            "The product is coming soon",
        ];
        for sample in samples {
            assert!(is_launch_signal(sample), "expected a match for {sample:?}");
        }
    }

    #[test]
    fn test_word_boundaries() {
        // "relaunched" has no boundary before "launch"
        assert!(!is_launch_signal("relaunched"));
        // "presently" has no boundary after "present"
        assert!(!is_launch_signal("presently"));
        assert!(!is_launch_signal("shipyard workers strike"));
    }

    #[test]
    fn test_plain_news_does_not_match() {
        assert!(!is_launch_signal("Central bank holds interest rates steady"));
        assert!(!is_launch_signal("Court rules on telecom tax dispute"));
        assert!(!is_launch_signal(""));
    }

    #[test]
    fn test_every_family_is_non_empty() {
        for (name, patterns) in SIGNAL_FAMILIES {
            assert!(!patterns.is_empty(), "family {name} has no patterns");
        }
    }
}
