//! Wear polarity override rules.
//!
//! Rule text is line oriented. Blank lines and lines starting with `#` are
//! skipped.
//!
//! ```text
//! # bare words are case-insensitive substrings checked against model,
//! # serial, wwn and device node
//! CT500MX500
//!
//! # raw wear value is percent consumed: remaining = 100 - raw
//! convert_model        = Samsung SSD 870 EVO 1TB
//! convert_serial       = S5Y1NX0R123456
//! convert_regex_wwn    = /^0x5002538/i
//!
//! # word order only: "consumed X% (remaining Y%)"
//! display_invert_model       = KINGSTON SA400S37240G
//! display_invert_regex_model = /^WDC WDS/i
//! ```
//!
//! There is no directive for the device node: it is only ever compared
//! against the bare substring list.
//!
//! Regex rules use the `regex` crate syntax. Lookaround (`(?!..)`, `(?<=..)`)
//! and backreferences are not supported; such a rule fails to compile, is
//! logged once at load and never matches.

use crate::models::device::DeviceIdentity;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Environment variable holding newline-delimited rule text.
pub const ENV_RULES: &str = "WEAR_INVERT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    /// Raw wear value means percent consumed and must be inverted.
    Convert,
    /// Text shows consumed before remaining.
    DisplayInvert,
}

impl RuleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Convert       => "convert",
            RuleCategory::DisplayInvert => "display_invert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Model,
    Serial,
    Wwn,
}

impl Field {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "model"  => Some(Field::Model),
            "serial" => Some(Field::Serial),
            "wwn"    => Some(Field::Wwn),
            _        => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Model  => "model",
            Field::Serial => "serial",
            Field::Wwn    => "wwn",
        }
    }
}

/// A `/pattern/flags` rule. `compiled` is `None` when the pattern is invalid;
/// such a rule never matches.
#[derive(Debug, Clone)]
pub struct RegexRule {
    pub source:   String,
    pub compiled: Option<Regex>,
}

impl RegexRule {
    pub fn parse(source: &str) -> Self {
        let compiled = compile_delimited(source);
        if compiled.is_none() {
            log::warn!("ignoring invalid regex rule {}", source);
        }
        Self { source: source.to_string(), compiled }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.compiled.as_ref().is_some_and(|re| re.is_match(value))
    }
}

/// Compile `/body/flags`. Flags follow the usual single-letter meanings:
/// i, m, s, x, U (swap greed) and A (anchor at start); the rest are accepted
/// and have no effect.
fn compile_delimited(source: &str) -> Option<Regex> {
    let rest = source.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    let body = body.replace("\\/", "/");
    let body = if flags.contains('A') { format!(r"\A(?:{})", body) } else { body };

    let mut b = RegexBuilder::new(&body);
    for f in flags.chars() {
        match f {
            'i' => { b.case_insensitive(true); }
            'm' => { b.multi_line(true); }
            's' => { b.dot_matches_new_line(true); }
            'x' => { b.ignore_whitespace(true); }
            'U' => { b.swap_greed(true); }
            _   => {}
        }
    }
    b.build().ok()
}

/// Exact and regex rules for one field within one category.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    pub exact: Vec<String>,
    pub regex: Vec<RegexRule>,
}

impl FieldRules {
    fn is_match(&self, value: &str) -> bool {
        self.exact.iter().any(|e| e == value) || self.regex.iter().any(|r| r.is_match(value))
    }

    fn len(&self) -> usize { self.exact.len() + self.regex.len() }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryRules {
    pub model:  FieldRules,
    pub serial: FieldRules,
    pub wwn:    FieldRules,
}

impl CategoryRules {
    fn field_mut(&mut self, field: Field) -> &mut FieldRules {
        match field {
            Field::Model  => &mut self.model,
            Field::Serial => &mut self.serial,
            Field::Wwn    => &mut self.wwn,
        }
    }

    fn fields(&self) -> [(Field, &FieldRules); 3] {
        [(Field::Model, &self.model), (Field::Serial, &self.serial), (Field::Wwn, &self.wwn)]
    }
}

/// Where a [`RuleStore`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleSource {
    Env,
    File(String),
    #[default]
    Empty,
}

/// Immutable set of polarity override rules, loaded once and shared.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    pub source:         RuleSource,
    pub convert:        CategoryRules,
    pub display_invert: CategoryRules,
    /// Case-insensitive substrings applied to every identity field.
    pub simple:         Vec<String>,
}

enum Directive {
    Exact(RuleCategory, Field, String),
    Regex(RuleCategory, Field, String),
}

fn directive_patterns() -> &'static [(Regex, RuleCategory, bool)] {
    static PATTERNS: OnceLock<Vec<(Regex, RuleCategory, bool)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"^convert_(model|serial|wwn)\s*=\s*(.+)$", RuleCategory::Convert, false),
            (r"^convert_regex_(model|serial|wwn)\s*=\s*(/.+/[imsxuADSUXJ]*)\s*$", RuleCategory::Convert, true),
            (r"^display_invert_(model|serial|wwn)\s*=\s*(.+)$", RuleCategory::DisplayInvert, false),
            (r"^display_invert_regex_(model|serial|wwn)\s*=\s*(/.+/[imsxuADSUXJ]*)\s*$", RuleCategory::DisplayInvert, true),
        ]
        .into_iter()
        .filter_map(|(p, cat, is_regex)| {
            RegexBuilder::new(p).case_insensitive(true).build().ok().map(|re| (re, cat, is_regex))
        })
        .collect()
    })
}

fn parse_directive(line: &str) -> Option<Directive> {
    for (re, category, is_regex) in directive_patterns() {
        let Some(caps) = re.captures(line) else { continue };
        let field = Field::parse(&caps[1])?;
        let value = caps[2].trim().to_string();
        return Some(if *is_regex {
            Directive::Regex(*category, field, value)
        } else {
            Directive::Exact(*category, field, value)
        });
    }
    None
}

impl RuleStore {
    /// Parse rule text. Unrecognised lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut store = RuleStore::default();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !line.contains('=') {
                store.simple.push(line.to_string());
                continue;
            }
            match parse_directive(line) {
                Some(Directive::Exact(cat, field, value)) => {
                    store.category_mut(cat).field_mut(field).exact.push(value);
                }
                Some(Directive::Regex(cat, field, value)) => {
                    store.category_mut(cat).field_mut(field).regex.push(RegexRule::parse(&value));
                }
                None => log::debug!("ignoring unrecognised rule line: {}", line),
            }
        }
        store
    }

    /// Load from `env_text` when set and non-empty, else from `path` when it
    /// is a readable file, else an empty store.
    pub fn load(env_text: Option<&str>, path: Option<&Path>) -> Self {
        if let Some(text) = env_text.filter(|t| !t.is_empty()) {
            log::info!("loading wear rules from ${}", ENV_RULES);
            return RuleStore { source: RuleSource::Env, ..Self::parse(text) };
        }
        if let Some(p) = path.filter(|p| p.is_file()) {
            match fs::read_to_string(p) {
                Ok(text) => {
                    log::info!("loading wear rules from {}", p.display());
                    let source = RuleSource::File(p.display().to_string());
                    return RuleStore { source, ..Self::parse(&text) };
                }
                Err(e) => log::warn!("cannot read rule file {}: {}", p.display(), e),
            }
        }
        log::debug!("no wear rules configured");
        RuleStore::default()
    }

    /// [`RuleStore::load`] using the process environment.
    pub fn from_env_or_file(path: Option<&Path>) -> Self {
        let env_text = std::env::var(ENV_RULES).ok();
        Self::load(env_text.as_deref(), path)
    }

    pub fn category(&self, cat: RuleCategory) -> &CategoryRules {
        match cat {
            RuleCategory::Convert       => &self.convert,
            RuleCategory::DisplayInvert => &self.display_invert,
        }
    }

    fn category_mut(&mut self, cat: RuleCategory) -> &mut CategoryRules {
        match cat {
            RuleCategory::Convert       => &mut self.convert,
            RuleCategory::DisplayInvert => &mut self.display_invert,
        }
    }

    fn simple_match(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.simple.iter().any(|s| !s.is_empty() && value.contains(&s.to_lowercase()))
    }

    /// True when any identity field matches a rule of `cat`.
    ///
    /// Model, serial and wwn are checked against their exact and regex lists
    /// and the simple list; the device node only against the simple list.
    pub fn matches(&self, id: &DeviceIdentity<'_>, cat: RuleCategory) -> bool {
        let rules = self.category(cat);
        rules.model.is_match(id.model)
            || rules.serial.is_match(id.serial)
            || rules.wwn.is_match(id.wwn)
            || self.simple_match(id.model)
            || self.simple_match(id.serial)
            || self.simple_match(id.wwn)
            || self.simple_match(id.device_node)
    }

    pub fn is_empty(&self) -> bool {
        self.simple.is_empty()
            && self.convert.fields().iter().all(|(_, r)| r.len() == 0)
            && self.display_invert.fields().iter().all(|(_, r)| r.len() == 0)
    }
}

impl fmt::Display for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let src = match &self.source {
            RuleSource::Env     => format!("${}", ENV_RULES),
            RuleSource::File(p) => p.clone(),
            RuleSource::Empty   => "(none)".to_string(),
        };
        writeln!(f, "Rules: {}", src)?;
        if self.is_empty() {
            writeln!(f, "  (no rules loaded; only \"Percentage Used\" attributes are inverted)")?;
        }
        for cat in [RuleCategory::Convert, RuleCategory::DisplayInvert] {
            writeln!(f)?;
            writeln!(f, "[{}]", cat.label())?;
            for (field, rules) in self.category(cat).fields() {
                for e in &rules.exact {
                    writeln!(f, "  {:<7} exact  {}", field.label(), e)?;
                }
                for r in &rules.regex {
                    let note = if r.compiled.is_some() { "" } else { "  (invalid, never matches)" };
                    writeln!(f, "  {:<7} regex  {}{}", field.label(), r.source, note)?;
                }
            }
        }
        writeln!(f)?;
        writeln!(f, "[simple]")?;
        for s in &self.simple {
            writeln!(f, "  {}", s)?;
        }
        writeln!(f)?;
        writeln!(f, "Note: device node is matched by [simple] substrings only;")?;
        writeln!(f, "      exact and regex rules apply to model, serial and wwn.")?;
        writeln!(f, "Note: regex rules do not support lookaround or backreferences;")?;
        write!(f, "      such patterns are reported invalid and never match.")
    }
}
