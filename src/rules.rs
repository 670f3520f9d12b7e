//! Game rules: ko handling, scoring tax, suicide, button, pass handling and komi.
//!
//! Rules are accepted in three forms:
//! - a preset name such as `"chinese"` or `"trompTaylor"` (case, `-` and `_` ignored)
//! - a JSON object with keys `ko`, `tax`, `suicide`, `hasButton`, `friendlyPassOk`, `komi`
//! - the compact legacy form produced by `Display`, e.g. `koPOSITIONALtaxNONEsui1komi7.5`
//!
//! Fields missing from JSON or legacy text take their Tromp-Taylor values,
//! except that tax falls back to `NONE` and komi to `7.0`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{MAX_USER_KOMI, MIN_USER_KOMI};
use crate::error::{Error, Result};
use crate::hash::{Hash128, zobrist};

/// Which repetitions are forbidden.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KoRule {
    /// Only the immediate single-stone recapture.
    Simple,
    /// No whole-board position may repeat.
    Positional,
    /// No position may repeat with the same player to move.
    Situational,
}

/// Which points are withheld from a player's area when scoring.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRule {
    None,
    /// Empty points in seki score for no one.
    Seki,
    /// Every independent living group is taxed two points.
    All,
}

impl KoRule {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KoRule::Simple => "SIMPLE",
            KoRule::Positional => "POSITIONAL",
            KoRule::Situational => "SITUATIONAL",
        }
    }

    pub fn parse(s: &str) -> Result<KoRule> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(KoRule::Simple),
            "POSITIONAL" => Ok(KoRule::Positional),
            "SITUATIONAL" => Ok(KoRule::Situational),
            _ => Err(Error::Rules(format!("invalid ko rule: {s}"))),
        }
    }
}

impl TaxRule {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaxRule::None => "NONE",
            TaxRule::Seki => "SEKI",
            TaxRule::All => "ALL",
        }
    }

    pub fn parse(s: &str) -> Result<TaxRule> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(TaxRule::None),
            "SEKI" => Ok(TaxRule::Seki),
            "ALL" => Ok(TaxRule::All),
            _ => Err(Error::Rules(format!("invalid tax rule: {s}"))),
        }
    }
}

/// A complete rule set. Plain value, freely copied.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rules {
    pub ko_rule: KoRule,
    pub tax_rule: TaxRule,
    pub multi_stone_suicide_legal: bool,
    /// The first player to pass takes a half-point button.
    pub has_button: bool,
    /// Passing never ends the game early; only consecutive passes do.
    pub friendly_pass_ok: bool,
    pub komi: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self::tromp_taylor()
    }
}

impl Rules {
    pub fn tromp_taylor() -> Self {
        Rules {
            ko_rule: KoRule::Positional,
            tax_rule: TaxRule::None,
            multi_stone_suicide_legal: true,
            has_button: false,
            friendly_pass_ok: false,
            komi: 7.5,
        }
    }

    pub fn chinese() -> Self {
        Rules {
            multi_stone_suicide_legal: false,
            friendly_pass_ok: true,
            ..Self::tromp_taylor()
        }
    }

    pub fn new_zealand() -> Self {
        Rules {
            ko_rule: KoRule::Situational,
            ..Self::tromp_taylor()
        }
    }

    pub fn aga() -> Self {
        Rules {
            ko_rule: KoRule::Situational,
            multi_stone_suicide_legal: false,
            has_button: true,
            ..Self::tromp_taylor()
        }
    }

    pub fn stone_scoring() -> Self {
        Rules {
            tax_rule: TaxRule::All,
            multi_stone_suicide_legal: false,
            ..Self::tromp_taylor()
        }
    }

    /// Preset names in the order used when picking a display name.
    fn presets() -> [(&'static str, Rules); 5] {
        [
            ("TrompTaylor", Self::tromp_taylor()),
            ("Chinese", Self::chinese()),
            ("AGA", Self::aga()),
            ("StoneScoring", Self::stone_scoring()),
            ("NewZealand", Self::new_zealand()),
        ]
    }

    fn preset(name: &str) -> Option<Rules> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::presets()
            .into_iter()
            .find(|(n, _)| n.to_ascii_lowercase() == key)
            .map(|(_, r)| r)
    }

    pub fn equals_ignoring_komi(&self, other: &Rules) -> bool {
        self.ko_rule == other.ko_rule
            && self.tax_rule == other.tax_rule
            && self.multi_stone_suicide_legal == other.multi_stone_suicide_legal
            && self.has_button == other.has_button
            && self.friendly_pass_ok == other.friendly_pass_ok
    }

    /// Whether the final score can never be a half-integer.
    pub fn game_result_will_be_integer(&self) -> bool {
        let komi_is_integer = self.komi.fract() == 0.0;
        komi_is_integer != self.has_button
    }

    pub fn komi_is_int_or_half_int(komi: f32) -> bool {
        komi.is_finite() && (komi * 2.0).fract() == 0.0
    }

    /// Zobrist lanes identifying everything but komi.
    pub fn hash(&self) -> Hash128 {
        let z = zobrist();
        let mut h = z.ko_rule[self.ko_rule.index()] ^ z.tax_rule[self.tax_rule.index()];
        if self.multi_stone_suicide_legal {
            h ^= z.multi_stone_suicide;
        }
        if self.has_button {
            h ^= z.button;
        }
        h
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    pub fn parse(s: &str) -> Result<Rules> {
        parse_helper(s, true)
    }

    /// Parse rules that must not mention komi, then set komi to `komi`.
    pub fn parse_without_komi(s: &str, komi: f32) -> Result<Rules> {
        let mut rules = parse_helper(s, false)?;
        rules.komi = komi;
        Ok(rules)
    }

    pub fn try_parse(s: &str) -> Option<Rules> {
        Self::parse(s).ok()
    }

    pub fn try_parse_without_komi(s: &str, komi: f32) -> Option<Rules> {
        Self::parse_without_komi(s, komi).ok()
    }

    /// Apply a single `key = value` override, as accepted in JSON.
    pub fn update_rules(key: &str, value: &str, old: Rules) -> Result<Rules> {
        let mut rules = old;
        let value = value.trim();
        match key.trim() {
            "ko" => rules.ko_rule = KoRule::parse(value)?,
            "tax" => rules.tax_rule = TaxRule::parse(value)?,
            "suicide" => rules.multi_stone_suicide_legal = parse_bool(value)?,
            "hasButton" => rules.has_button = parse_bool(value)?,
            "friendlyPassOk" => rules.friendly_pass_ok = parse_bool(value)?,
            other => return Err(Error::UnknownRuleKey(other.to_string())),
        }
        Ok(rules)
    }

    // =========================================================================
    // Printing
    // =========================================================================

    pub fn to_string_no_komi(&self) -> String {
        let mut s = format!(
            "ko{}tax{}sui{}",
            self.ko_rule.as_str(),
            self.tax_rule.as_str(),
            self.multi_stone_suicide_legal as u8
        );
        if self.has_button {
            s.push_str("button1");
        }
        if self.friendly_pass_ok {
            s.push_str("fpok1");
        }
        s
    }

    /// Preset name if these rules match one, otherwise [`Rules::to_string_no_komi`].
    pub fn to_string_no_komi_maybe_nice(&self) -> String {
        Self::presets()
            .into_iter()
            .find(|(_, r)| self.equals_ignoring_komi(r))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| self.to_string_no_komi())
    }

    fn to_json_helper(&self, omit_komi: bool, omit_defaults: bool) -> RulesJson {
        RulesJson {
            ko: Some(self.ko_rule),
            tax: Some(self.tax_rule),
            suicide: Some(self.multi_stone_suicide_legal),
            has_button: (!omit_defaults || self.has_button).then_some(self.has_button),
            friendly_pass_ok: (!omit_defaults || self.friendly_pass_ok)
                .then_some(self.friendly_pass_ok),
            komi: (!omit_komi).then_some(self.komi),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json_value(&self.to_json_helper(false, false))
    }

    pub fn to_json_no_komi(&self) -> serde_json::Value {
        json_value(&self.to_json_helper(true, false))
    }

    /// No komi, and `hasButton` / `friendlyPassOk` only when set.
    pub fn to_json_no_komi_maybe_omit_stuff(&self) -> serde_json::Value {
        json_value(&self.to_json_helper(true, true))
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    pub fn to_json_string_no_komi(&self) -> String {
        self.to_json_no_komi().to_string()
    }

    pub fn to_json_string_no_komi_maybe_omit_stuff(&self) -> String {
        self.to_json_no_komi_maybe_omit_stuff().to_string()
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}komi{}", self.to_string_no_komi(), self.komi)
    }
}

impl std::str::FromStr for Rules {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rules> {
        Rules::parse(s)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RulesJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    ko: Option<KoRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax: Option<TaxRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suicide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    friendly_pass_ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    komi: Option<f32>,
}

fn json_value(json: &RulesJson) -> serde_json::Value {
    // Only bools, strings and finite floats: serialization cannot fail
    serde_json::to_value(json).unwrap_or(serde_json::Value::Null)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::Rules(format!("could not parse bool: {s}"))),
    }
}

fn check_komi(komi: f32) -> Result<f32> {
    if !(MIN_USER_KOMI..=MAX_USER_KOMI).contains(&komi) || !Rules::komi_is_int_or_half_int(komi) {
        return Err(Error::Komi(komi.to_string()));
    }
    Ok(komi)
}

fn parse_helper(s: &str, allow_komi: bool) -> Result<Rules> {
    let trimmed = s.trim();
    let result = if let Some(rules) = Rules::preset(trimmed) {
        Ok(rules)
    } else if trimmed.starts_with('{') {
        parse_json(trimmed, allow_komi)
    } else {
        parse_legacy(trimmed, allow_komi)
    };
    if let Err(err) = &result {
        debug!(target: "hexgo::rules", "rejected rules {s:?}: {err}");
    }
    result
}

fn parse_json(s: &str, allow_komi: bool) -> Result<Rules> {
    let parse_err = || Error::Rules(s.to_string());
    let input: serde_json::Value = serde_json::from_str(s).map_err(|_| parse_err())?;
    let obj = input.as_object().ok_or_else(parse_err)?;

    let mut rules = Rules::tromp_taylor();
    let mut tax_specified = false;
    let mut komi_specified = false;
    for (key, value) in obj {
        match key.as_str() {
            "ko" => rules.ko_rule = KoRule::parse(value.as_str().ok_or_else(parse_err)?)?,
            "tax" => {
                rules.tax_rule = TaxRule::parse(value.as_str().ok_or_else(parse_err)?)?;
                tax_specified = true;
            }
            "suicide" => rules.multi_stone_suicide_legal = value.as_bool().ok_or_else(parse_err)?,
            "hasButton" => rules.has_button = value.as_bool().ok_or_else(parse_err)?,
            "friendlyPassOk" => rules.friendly_pass_ok = value.as_bool().ok_or_else(parse_err)?,
            "komi" if allow_komi => {
                let komi = value.as_f64().ok_or_else(parse_err)? as f32;
                rules.komi = check_komi(komi)?;
                komi_specified = true;
            }
            other => return Err(Error::UnknownRuleKey(other.to_string())),
        }
    }
    if !tax_specified {
        rules.tax_rule = TaxRule::None;
    }
    if !komi_specified {
        rules.komi = 7.0;
    }
    Ok(rules)
}

/// Strip `prefix` from the front of `s`, then trim.
fn strip(s: &mut &str, prefix: &str) -> bool {
    let cur: &str = s;
    match cur.strip_prefix(prefix) {
        Some(rest) => {
            *s = rest.trim();
            true
        }
        None => false,
    }
}

fn parse_legacy(orig: &str, allow_komi: bool) -> Result<Rules> {
    let parse_err = || Error::Rules(orig.to_string());
    let mut s = orig.trim();
    if s.is_empty() {
        return Err(parse_err());
    }

    let mut rules = Rules::tromp_taylor();
    let mut tax_specified = false;
    let mut komi_specified = false;
    while !s.is_empty() {
        if strip(&mut s, "komi") {
            if !allow_komi {
                return Err(parse_err());
            }
            let end = s
                .find(|c: char| c.is_ascii_alphabetic() || c.is_whitespace())
                .unwrap_or(s.len());
            let komi: f32 = s[..end].parse().map_err(|_| parse_err())?;
            rules.komi = check_komi(komi)?;
            komi_specified = true;
            s = s[end..].trim();
        } else if strip(&mut s, "ko") {
            rules.ko_rule = if strip(&mut s, "SIMPLE") {
                KoRule::Simple
            } else if strip(&mut s, "POSITIONAL") {
                KoRule::Positional
            } else if strip(&mut s, "SITUATIONAL") {
                KoRule::Situational
            } else {
                return Err(parse_err());
            };
        } else if strip(&mut s, "tax") {
            rules.tax_rule = if strip(&mut s, "NONE") {
                TaxRule::None
            } else if strip(&mut s, "SEKI") {
                TaxRule::Seki
            } else if strip(&mut s, "ALL") {
                TaxRule::All
            } else {
                return Err(parse_err());
            };
            tax_specified = true;
        } else if strip(&mut s, "sui") {
            rules.multi_stone_suicide_legal = parse_flag(&mut s).ok_or_else(parse_err)?;
        } else if strip(&mut s, "button") {
            rules.has_button = parse_flag(&mut s).ok_or_else(parse_err)?;
        } else if strip(&mut s, "fpok") {
            rules.friendly_pass_ok = parse_flag(&mut s).ok_or_else(parse_err)?;
        } else {
            return Err(parse_err());
        }
    }
    if !tax_specified {
        rules.tax_rule = TaxRule::None;
    }
    if !komi_specified {
        rules.komi = 7.0;
    }
    Ok(rules)
}

fn parse_flag(s: &mut &str) -> Option<bool> {
    if strip(s, "1") {
        Some(true)
    } else if strip(s, "0") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = Rules::default();
        assert_eq!(rules.ko_rule, KoRule::Positional);
        assert_eq!(rules.tax_rule, TaxRule::None);
        assert!(rules.multi_stone_suicide_legal);
        assert!(!rules.has_button);
        assert_eq!(rules.komi, 7.5);
        assert_eq!(rules.to_string(), "koPOSITIONALtaxNONEsui1komi7.5");
    }

    #[test]
    fn test_presets() {
        assert_eq!(Rules::parse("chinese").unwrap(), Rules::chinese());
        assert_eq!(Rules::parse(" Tromp-Taylor ").unwrap(), Rules::tromp_taylor());
        assert_eq!(Rules::parse("new_zealand").unwrap().ko_rule, KoRule::Situational);
        let aga = Rules::parse("AGA").unwrap();
        assert!(aga.has_button);
        assert_eq!(aga.to_string_no_komi_maybe_nice(), "AGA");
        assert_eq!(Rules::parse("StoneScoring").unwrap().tax_rule, TaxRule::All);
    }

    #[test]
    fn test_legacy_roundtrip() {
        for rules in [Rules::chinese(), Rules::aga(), Rules::stone_scoring()] {
            let s = rules.to_string();
            assert_eq!(Rules::parse(&s).unwrap(), rules, "{s}");
        }
        let odd = Rules {
            ko_rule: KoRule::Simple,
            tax_rule: TaxRule::Seki,
            komi: -3.5,
            ..Rules::default()
        };
        assert_eq!(Rules::parse(&odd.to_string()).unwrap(), odd);
    }

    #[test]
    fn test_legacy_defaults() {
        let rules = Rules::parse("koSITUATIONAL").unwrap();
        assert_eq!(rules.ko_rule, KoRule::Situational);
        assert_eq!(rules.tax_rule, TaxRule::None);
        assert_eq!(rules.komi, 7.0);
        assert!(Rules::parse("").is_err());
        assert!(Rules::parse("koFOO").is_err());
        assert!(Rules::parse("sui2").is_err());
        assert!(Rules::parse_without_komi("komi6.5", 0.0).is_err());
    }

    #[test]
    fn test_json() {
        let rules = Rules::parse(r#"{"ko":"SIMPLE","suicide":false,"komi":6}"#).unwrap();
        assert_eq!(rules.ko_rule, KoRule::Simple);
        assert!(!rules.multi_stone_suicide_legal);
        assert_eq!(rules.komi, 6.0);
        assert_eq!(rules.tax_rule, TaxRule::None);

        let rules = Rules::parse(r#"{"tax":"SEKI"}"#).unwrap();
        assert_eq!(rules.komi, 7.0);

        let json = Rules::aga().to_json_string();
        assert_eq!(Rules::parse(&json).unwrap(), Rules::aga());
    }

    #[test]
    fn test_json_errors() {
        assert_eq!(
            Rules::parse(r#"{"scoring":"AREA"}"#),
            Err(Error::UnknownRuleKey("scoring".to_string()))
        );
        assert!(matches!(Rules::parse(r#"{"komi":7.25}"#), Err(Error::Komi(_))));
        assert!(matches!(Rules::parse(r#"{"komi":500}"#), Err(Error::Komi(_))));
        assert!(matches!(Rules::parse(r#"{"ko":"SPIGHT"}"#), Err(Error::Rules(_))));
        assert!(matches!(Rules::parse("{not json"), Err(Error::Rules(_))));
        assert_eq!(
            Rules::parse_without_komi(r#"{"komi":7}"#, 0.5),
            Err(Error::UnknownRuleKey("komi".to_string()))
        );
    }

    #[test]
    fn test_json_writers() {
        let rules = Rules::chinese();
        let full = rules.to_json();
        assert_eq!(full["ko"], "POSITIONAL");
        assert_eq!(full["friendlyPassOk"], true);
        assert_eq!(full["komi"], 7.5);
        assert!(rules.to_json_no_komi().get("komi").is_none());

        let short = Rules::tromp_taylor().to_json_no_komi_maybe_omit_stuff();
        assert!(short.get("hasButton").is_none());
        assert!(short.get("friendlyPassOk").is_none());
        assert_eq!(short["suicide"], true);
    }

    #[test]
    fn test_update_rules() {
        let rules = Rules::update_rules("ko", "situational", Rules::default()).unwrap();
        assert_eq!(rules.ko_rule, KoRule::Situational);
        let rules = Rules::update_rules("hasButton", "true", rules).unwrap();
        assert!(rules.has_button);
        assert_eq!(
            Rules::update_rules("komi", "7", rules),
            Err(Error::UnknownRuleKey("komi".to_string()))
        );
    }

    #[test]
    fn test_integer_results() {
        let mut rules = Rules::default();
        assert!(!rules.game_result_will_be_integer());
        rules.komi = 7.0;
        assert!(rules.game_result_will_be_integer());
        rules.has_button = true;
        assert!(!rules.game_result_will_be_integer());
        assert!(Rules::komi_is_int_or_half_int(-0.5));
        assert!(!Rules::komi_is_int_or_half_int(f32::NAN));
    }

    #[test]
    fn test_hash_ignores_komi() {
        let a = Rules::default();
        let b = Rules { komi: 0.5, ..a };
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), Rules::chinese().hash());
        assert!(a.equals_ignoring_komi(&b));
        assert_ne!(a, b);
    }
}
