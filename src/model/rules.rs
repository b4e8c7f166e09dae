//! Window match predicates and the ordered float-rule list.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::window::{ManagedWindow, WindowInfo};

/// Anything a [`WindowMatch`] can be evaluated against.
pub trait WindowProps {
    fn class(&self) -> Option<&str>;
    fn title(&self) -> Option<&str>;
    fn role(&self) -> Option<&str>;
    fn is_transient(&self) -> bool;
}

impl WindowProps for WindowInfo {
    fn class(&self) -> Option<&str> { self.class.as_deref() }

    fn title(&self) -> Option<&str> { self.title.as_deref() }

    fn role(&self) -> Option<&str> { self.role.as_deref() }

    fn is_transient(&self) -> bool { self.transient_for.is_some() }
}

impl WindowProps for ManagedWindow {
    fn class(&self) -> Option<&str> { self.class.as_deref() }

    fn title(&self) -> Option<&str> { self.title.as_deref() }

    fn role(&self) -> Option<&str> { self.role.as_deref() }

    fn is_transient(&self) -> bool { self.transient_for.is_some() }
}

/// Exact string or regular expression. Written in config as either a bare
/// string or `{ regex = "..." }`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternRepr", into = "PatternRepr")]
pub enum Pattern {
    Exact(String),
    Regex(Regex),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Exact(String),
    Regex { regex: String },
}

impl TryFrom<PatternRepr> for Pattern {
    type Error = regex::Error;

    fn try_from(repr: PatternRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            PatternRepr::Exact(s) => Pattern::Exact(s),
            PatternRepr::Regex { regex } => Pattern::Regex(Regex::new(&regex)?),
        })
    }
}

impl From<Pattern> for PatternRepr {
    fn from(p: Pattern) -> Self {
        match p {
            Pattern::Exact(s) => PatternRepr::Exact(s),
            Pattern::Regex(re) => PatternRepr::Regex { regex: re.as_str().to_string() },
        }
    }
}

impl Pattern {
    pub fn regex(re: &str) -> Result<Self, regex::Error> { Ok(Pattern::Regex(Regex::new(re)?)) }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Exact(s) => s == value,
            Pattern::Regex(re) => re.is_match(value),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{s:?}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Exact(a), Pattern::Exact(b)) => a == b,
            (Pattern::Regex(a), Pattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self { Pattern::Exact(s.to_string()) }
}

/// Every field that is present must match; a missing window property never
/// matches a present pattern.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WindowMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
}

impl WindowMatch {
    pub fn class(p: impl Into<Pattern>) -> Self { Self { class: Some(p.into()), ..Default::default() } }

    pub fn title(p: impl Into<Pattern>) -> Self { Self { title: Some(p.into()), ..Default::default() } }

    pub fn role(p: impl Into<Pattern>) -> Self { Self { role: Some(p.into()), ..Default::default() } }

    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.title.is_none() && self.role.is_none() && self.transient.is_none()
    }

    pub fn matches(&self, window: &impl WindowProps) -> bool {
        fn field(pattern: &Option<Pattern>, value: Option<&str>) -> bool {
            match (pattern, value) {
                (None, _) => true,
                (Some(p), Some(v)) => p.is_match(v),
                (Some(_), None) => false,
            }
        }
        field(&self.class, window.class())
            && field(&self.title, window.title())
            && field(&self.role, window.role())
            && self.transient.is_none_or(|t| t == window.is_transient())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    #[default]
    Float,
    Tile,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FloatRule {
    #[serde(rename = "match")]
    pub matcher: WindowMatch,
    #[serde(default)]
    pub outcome: RuleOutcome,
}

impl FloatRule {
    pub fn float(matcher: WindowMatch) -> Self { Self { matcher, outcome: RuleOutcome::Float } }
}

/// Ordered list of float rules; the first matching rule decides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloatRules {
    rules: Vec<FloatRule>,
}

impl FloatRules {
    pub fn new(include_defaults: bool, user_rules: &[FloatRule]) -> Self {
        let mut rules = if include_defaults { default_float_rules() } else { Vec::new() };
        rules.extend(user_rules.iter().cloned());
        Self { rules }
    }

    pub fn rules(&self) -> &[FloatRule] { &self.rules }

    pub fn evaluate(&self, window: &impl WindowProps) -> Option<RuleOutcome> {
        self.rules.iter().find(|r| r.matcher.matches(window)).map(|r| r.outcome)
    }

    pub fn should_float(&self, window: &impl WindowProps) -> bool {
        self.evaluate(window) == Some(RuleOutcome::Float)
    }
}

/// Dialogs and the window types that never make sense tiled.
pub fn default_float_rules() -> Vec<FloatRule> {
    let mut rules: Vec<FloatRule> = ["utility", "notification", "toolbar", "splash", "dialog"]
        .into_iter()
        .map(|role| FloatRule::float(WindowMatch::role(role)))
        .collect();
    rules.extend(
        [
            "file_progress",
            "confirm",
            "dialog",
            "download",
            "error",
            "notification",
            "splash",
            "toolbar",
        ]
        .into_iter()
        .map(|class| FloatRule::float(WindowMatch::class(class))),
    );
    rules.push(FloatRule::float(WindowMatch {
        transient: Some(true),
        ..Default::default()
    }));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(class: &str, title: &str) -> WindowInfo {
        WindowInfo {
            class: Some(class.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[test]
    fn first_match_wins() {
        let user = vec![
            FloatRule {
                matcher: WindowMatch::class("gimp"),
                outcome: RuleOutcome::Tile,
            },
            FloatRule::float(WindowMatch::class("gimp")),
        ];
        let rules = FloatRules::new(false, &user);
        assert_eq!(rules.evaluate(&window("gimp", "x")), Some(RuleOutcome::Tile));
        assert_eq!(rules.evaluate(&window("firefox", "x")), None);
    }

    #[test]
    fn defaults_only_when_requested() {
        let mut dialog = window("app", "Open File");
        dialog.role = Some("dialog".into());

        assert!(FloatRules::new(true, &[]).should_float(&dialog));
        assert!(!FloatRules::new(false, &[]).should_float(&dialog));
    }

    #[test]
    fn defaults_come_before_user_rules() {
        let user = vec![FloatRule {
            matcher: WindowMatch::class("confirm"),
            outcome: RuleOutcome::Tile,
        }];
        let rules = FloatRules::new(true, &user);
        assert!(rules.should_float(&window("confirm", "")));
    }

    #[test]
    fn regex_and_missing_fields() {
        let m = WindowMatch::title(Pattern::regex("^pinentry").unwrap());
        assert!(m.matches(&window("gcr", "pinentry-gnome")));
        assert!(!m.matches(&WindowInfo::default()));
    }

    #[test]
    fn transient_windows_float_by_default() {
        let info = WindowInfo {
            transient_for: Some(crate::model::WindowId::new(1)),
            ..Default::default()
        };
        assert!(FloatRules::new(true, &[]).should_float(&info));
    }

    #[test]
    fn pattern_deserializes_from_string_or_table() {
        let m: WindowMatch = toml::from_str(
            r#"
            class = "ssh-askpass"
            title = { regex = "branch.*" }
            "#,
        )
        .unwrap();
        assert_eq!(m.class, Some(Pattern::Exact("ssh-askpass".into())));
        assert!(m.title.unwrap().is_match("branchdialog"));

        let bad: Result<WindowMatch, _> = toml::from_str(r#"title = { regex = "(" }"#);
        assert!(bad.is_err());
    }
}
