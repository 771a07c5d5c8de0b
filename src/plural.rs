// SPDX-License-Identifier: PMPL-1.0-or-later

//! Locale plural rules.
//!
//! Static table from language subtag to the gettext/CLDR plural family.
//! `lv_LV`, `lv-LV`, `lv_LV.UTF-8` and `lv` all resolve to the same rule.
//! Languages missing from the table fall back to the one/other family.
//!
//! Reference: <https://docs.translatehouse.org/projects/localization-guide/en/latest/l10n/pluralforms.html>

/// Plural family, one per distinct gettext `Plural-Forms` expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralFamily {
    Invariant,
    OneOther,
    ZeroOne,
    Latvian,
    Lithuanian,
    EastSlavic,
    CzechSlovak,
    Polish,
    Romanian,
    Slovenian,
    Irish,
    Welsh,
    Arabic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluralRule {
    pub family: PluralFamily,
    pub nplurals: usize,
    pub expression: &'static str,
}

impl PluralRule {
    /// Plural category index for `n`, always below `nplurals`.
    pub fn index(&self, n: u64) -> usize {
        let n10 = n % 10;
        let n100 = n % 100;
        match self.family {
            PluralFamily::Invariant => 0,
            PluralFamily::OneOther => usize::from(n != 1),
            PluralFamily::ZeroOne => usize::from(n > 1),
            PluralFamily::Latvian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            PluralFamily::Lithuanian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && !(10..20).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            PluralFamily::EastSlavic => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if (2..=4).contains(&n10) && !(10..20).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            PluralFamily::CzechSlovak => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            PluralFamily::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&n10) && !(10..20).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            PluralFamily::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (1..20).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            PluralFamily::Slovenian => match n100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            PluralFamily::Irish => match n {
                1 => 0,
                2 => 1,
                3..=6 => 2,
                7..=10 => 3,
                _ => 4,
            },
            PluralFamily::Welsh => match n {
                1 => 0,
                2 => 1,
                8 | 11 => 3,
                _ => 2,
            },
            PluralFamily::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ if (3..=10).contains(&n100) => 3,
                _ if n100 >= 11 => 4,
                _ => 5,
            },
        }
    }

    /// Value of the `Plural-Forms` catalog header
    pub fn header(&self) -> String {
        format!("nplurals={}; plural={};", self.nplurals, self.expression)
    }
}

const fn rule(family: PluralFamily, nplurals: usize, expression: &'static str) -> PluralRule {
    PluralRule {
        family,
        nplurals,
        expression,
    }
}

const INVARIANT: PluralRule = rule(PluralFamily::Invariant, 1, "0");
const ONE_OTHER: PluralRule = rule(PluralFamily::OneOther, 2, "(n != 1)");
const ZERO_ONE: PluralRule = rule(PluralFamily::ZeroOne, 2, "(n > 1)");
const LATVIAN: PluralRule = rule(
    PluralFamily::Latvian,
    3,
    "(n%10==1 && n%100!=11 ? 0 : n != 0 ? 1 : 2)",
);
const LITHUANIAN: PluralRule = rule(
    PluralFamily::Lithuanian,
    3,
    "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2)",
);
const EAST_SLAVIC: PluralRule = rule(
    PluralFamily::EastSlavic,
    3,
    "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)",
);
const CZECH_SLOVAK: PluralRule = rule(
    PluralFamily::CzechSlovak,
    3,
    "((n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2)",
);
const POLISH: PluralRule = rule(
    PluralFamily::Polish,
    3,
    "(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)",
);
const ROMANIAN: PluralRule = rule(
    PluralFamily::Romanian,
    3,
    "(n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2)",
);
const SLOVENIAN: PluralRule = rule(
    PluralFamily::Slovenian,
    4,
    "(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3)",
);
const IRISH: PluralRule = rule(
    PluralFamily::Irish,
    5,
    "(n==1 ? 0 : n==2 ? 1 : (n>2 && n<7) ? 2 : (n>6 && n<11) ? 3 : 4)",
);
const WELSH: PluralRule = rule(
    PluralFamily::Welsh,
    4,
    "((n==1) ? 0 : (n==2) ? 1 : (n != 8 && n != 11) ? 2 : 3)",
);
const ARABIC: PluralRule = rule(
    PluralFamily::Arabic,
    6,
    "(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5)",
);

/// Language subtag of a locale identifier, lowercased.
pub fn language_subtag(locale: &str) -> String {
    locale
        .split(['_', '-', '.', '@'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn lookup(language: &str, locale: &str) -> Option<PluralRule> {
    let rule = match language {
        "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "lo" | "my" | "km" | "jv" | "ka"
        | "bo" | "dz" | "su" | "ig" | "yo" => INVARIANT,
        "en" | "de" | "nl" | "sv" | "da" | "no" | "nb" | "nn" | "fi" | "et" | "it" | "es"
        | "ca" | "gl" | "eu" | "el" | "hu" | "bg" | "he" | "eo" | "af" | "sq" | "az" | "tr"
        | "fo" | "fy" | "is" | "kk" | "ky" | "lb" | "mn" | "ne" | "hi" | "bn" | "ur"
        | "ta" | "te" | "ml" | "mr" | "gu" | "kn" | "pa" | "sw" | "so" | "uz" | "tk" | "ps"
        | "fa" | "mk" => ONE_OTHER,
        "fr" | "oc" | "br" | "ln" | "mg" | "ti" | "wa" | "hy" | "am" | "fil" | "tl" => ZERO_ONE,
        "pt" => {
            // Brazilian Portuguese treats zero as singular
            if locale.to_ascii_lowercase().contains("br") {
                ZERO_ONE
            } else {
                ONE_OTHER
            }
        }
        "lv" => LATVIAN,
        "lt" => LITHUANIAN,
        "ru" | "uk" | "be" | "sr" | "hr" | "bs" => EAST_SLAVIC,
        "cs" | "sk" => CZECH_SLOVAK,
        "pl" => POLISH,
        "ro" | "mo" => ROMANIAN,
        "sl" => SLOVENIAN,
        "ga" => IRISH,
        "cy" => WELSH,
        "ar" => ARABIC,
        _ => return None,
    };
    Some(rule)
}

/// Plural rule for a locale; unknown languages use one/other.
pub fn plural_rule(locale: &str) -> PluralRule {
    lookup(&language_subtag(locale), locale).unwrap_or(ONE_OTHER)
}

/// Largest `nplurals` in the table; exchange documents may not index past it.
pub const MAX_PLURAL_FORMS: usize = 6;

/// Number of plural categories a locale requires (always at least 1)
pub fn plural_count(locale: &str) -> usize {
    plural_rule(locale).nplurals
}

/// Whether the locale has an explicit entry rather than the fallback
pub fn has_explicit_rule(locale: &str) -> bool {
    lookup(&language_subtag(locale), locale).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_counts_by_family() {
        assert_eq!(plural_count("ja_JP"), 1);
        assert_eq!(plural_count("en_US"), 2);
        assert_eq!(plural_count("de_DE"), 2);
        assert_eq!(plural_count("lv_LV"), 3);
        assert_eq!(plural_count("ru_RU"), 3);
        assert_eq!(plural_count("sl_SI"), 4);
        assert_eq!(plural_count("ar"), 6);
    }

    #[test]
    fn locale_spellings_resolve_alike() {
        assert_eq!(plural_rule("lv_LV"), plural_rule("lv-LV"));
        assert_eq!(plural_rule("lv_LV.UTF-8"), plural_rule("lv"));
        assert_eq!(plural_rule("LV_lv").family, PluralFamily::Latvian);
    }

    #[test]
    fn unknown_language_falls_back_to_one_other() {
        assert_eq!(plural_count("xx_YY"), 2);
        assert!(!has_explicit_rule("xx_YY"));
        assert!(has_explicit_rule("lv_LV"));
    }

    #[test]
    fn latvian_index() {
        let lv = plural_rule("lv_LV");
        assert_eq!(lv.index(1), 0);
        assert_eq!(lv.index(21), 0);
        assert_eq!(lv.index(11), 1);
        assert_eq!(lv.index(5), 1);
        assert_eq!(lv.index(0), 2);
    }

    #[test]
    fn east_slavic_index() {
        let ru = plural_rule("ru_RU");
        assert_eq!(ru.index(1), 0);
        assert_eq!(ru.index(3), 1);
        assert_eq!(ru.index(12), 2);
        assert_eq!(ru.index(25), 2);
    }

    #[test]
    fn brazilian_portuguese_uses_zero_one() {
        assert_eq!(plural_rule("pt_BR").index(0), 0);
        assert_eq!(plural_rule("pt_PT").index(0), 1);
    }

    #[test]
    fn header_renders_plural_forms() {
        assert_eq!(
            plural_rule("en_US").header(),
            "nplurals=2; plural=(n != 1);"
        );
    }
}
