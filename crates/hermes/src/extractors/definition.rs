// ABOUTME: Compiled, validated extractor definitions and the host-keyed registry.
// ABOUTME: Resolves selector shapes per field mode once, at load time, so matching never sniffs shapes.

//! Compiled extractor definitions.
//!
//! A [`CustomExtractor`] is what a rule file says; an [`ExtractorDefinition`]
//! is what the engine runs. Compilation fixes each selector's shape for the
//! field's [`SelectMode`], checks every CSS selector parses and rejects
//! configurations that can only be wrong (a multi-selector on a text field,
//! an attribute pair with a third element, an empty selector list).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::dom::NodeHandle;
use crate::error::ExtractError;
use crate::extractors::compiled::compile;
use crate::extractors::custom::{
    CustomExtractor, FieldConfig, FieldExtractor, NodeTransform, SelectorSpec, TransformSpec,
};
use crate::field::{FieldType, SelectMode};

/// Domain of the definition that hands everything to the generic extractor.
pub const WILDCARD_DOMAIN: &str = "*";

/// A selector with its shape fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Exactly one element with non-empty trimmed text.
    Text(String),
    /// Exactly one element whose trimmed attribute is non-empty.
    Attribute { selector: String, attr: String },
    /// Every member matches at least one element. Html mode only.
    Multi(Vec<String>),
}

impl Selector {
    pub fn text(css: impl Into<String>) -> Self {
        Selector::Text(css.into())
    }

    pub fn attribute(css: impl Into<String>, attr: impl Into<String>) -> Self {
        Selector::Attribute {
            selector: css.into(),
            attr: attr.into(),
        }
    }

    pub fn multi<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Multi(members.into_iter().map(Into::into).collect())
    }

    /// CSS selectors this selector queries.
    pub fn css(&self) -> Vec<&str> {
        match self {
            Selector::Text(css) => vec![css.as_str()],
            Selector::Attribute { selector, .. } => vec![selector.as_str()],
            Selector::Multi(members) => members.iter().map(String::as_str).collect(),
        }
    }

    fn from_spec(spec: &SelectorSpec, mode: SelectMode, field: &str) -> Result<Self, ExtractError> {
        match (spec, mode) {
            (SelectorSpec::Css(css), _) => Ok(Selector::Text(css.clone())),
            (SelectorSpec::List(members), SelectMode::Html) => {
                Ok(Selector::Multi(members.clone()))
            }
            (SelectorSpec::List(pair), SelectMode::Text) if pair.len() == 2 => {
                Ok(Selector::attribute(pair[0].clone(), pair[1].clone()))
            }
            (SelectorSpec::List(other), SelectMode::Text) => Err(ExtractError::invalid_rule(
                field,
                "compile_selector",
                Some(anyhow::anyhow!(
                    "expected [selector, attribute] pair, got {} element(s)",
                    other.len()
                )),
            )),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Text(css) => f.write_str(css),
            Selector::Attribute { selector, attr } => write!(f, "{}@{}", selector, attr),
            Selector::Multi(members) => write!(f, "[{}]", members.join(" + ")),
        }
    }
}

/// Callback transform. Returning a tag name converts the element to that tag.
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(&NodeHandle<'_, '_>) -> Option<String> + Send + Sync>);

impl TransformFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&NodeHandle<'_, '_>) -> Option<String> + Send + Sync + 'static,
    {
        TransformFn(Arc::new(f))
    }

    pub fn call(&self, node: &NodeHandle<'_, '_>) -> Option<String> {
        (self.0)(node)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Transform {
    /// Convert matched elements to this tag.
    Rename(String),
    /// A declarative transform from a rule file.
    Apply(NodeTransform),
    /// A programmatic callback.
    Mutate(TransformFn),
}

impl Transform {
    pub fn mutate<F>(f: F) -> Self
    where
        F: Fn(&NodeHandle<'_, '_>) -> Option<String> + Send + Sync + 'static,
    {
        Transform::Mutate(TransformFn::new(f))
    }
}

impl From<&TransformSpec> for Transform {
    fn from(spec: &TransformSpec) -> Self {
        match spec {
            TransformSpec::Rename(tag) => Transform::Rename(tag.clone()),
            TransformSpec::Node(NodeTransform::Tag { value }) => Transform::Rename(value.clone()),
            TransformSpec::Node(node) => Transform::Apply(node.clone()),
        }
    }
}

/// Selection rules for one field.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub selectors: Vec<Selector>,
    pub clean: Vec<String>,
    /// Applied in order.
    pub transforms: Vec<(String, Transform)>,
    pub default_cleaner: bool,
    pub allow_multiple: bool,
    pub format: Option<String>,
    pub timezone: Option<String>,
}

impl FieldRules {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            clean: Vec::new(),
            transforms: Vec::new(),
            default_cleaner: true,
            allow_multiple: false,
            format: None,
            timezone: None,
        }
    }

    pub fn clean<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clean.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn transform(mut self, selector: impl Into<String>, transform: Transform) -> Self {
        self.transforms.push((selector.into(), transform));
        self
    }

    pub fn default_cleaner(mut self, enabled: bool) -> Self {
        self.default_cleaner = enabled;
        self
    }

    pub fn allow_multiple(mut self, enabled: bool) -> Self {
        self.allow_multiple = enabled;
        self
    }

    fn from_extractor(
        fe: &FieldExtractor,
        mode: SelectMode,
        field: &str,
    ) -> Result<Self, ExtractError> {
        let selectors = fe
            .selectors
            .iter()
            .map(|s| Selector::from_spec(s, mode, field))
            .collect::<Result<Vec<_>, _>>()?;
        let rules = FieldRules {
            selectors,
            clean: fe.clean.clone(),
            transforms: fe
                .transforms
                .iter()
                .map(|(sel, spec)| (sel.to_string(), Transform::from(spec)))
                .collect(),
            default_cleaner: fe.default_cleaner,
            allow_multiple: fe.allow_multiple,
            format: fe.format.clone(),
            timezone: fe.timezone.clone(),
        };
        rules.validate(mode, field)
    }

    /// Checks the rules against `mode` and normalizes html-mode pairs into
    /// multi-selectors.
    fn validate(mut self, mode: SelectMode, field: &str) -> Result<Self, ExtractError> {
        if self.selectors.is_empty() {
            return Err(ExtractError::invalid_rule(
                field,
                "validate_rules",
                Some(anyhow::anyhow!("selector list is empty")),
            ));
        }

        for selector in &mut self.selectors {
            let normalized = match (&*selector, mode) {
                (Selector::Multi(_), SelectMode::Text) => {
                    return Err(ExtractError::invalid_rule(
                        field,
                        "validate_rules",
                        Some(anyhow::anyhow!(
                            "multi-selector {} is only valid for html fields",
                            selector
                        )),
                    ));
                }
                (Selector::Multi(members), SelectMode::Html) if members.is_empty() => {
                    return Err(ExtractError::invalid_rule(
                        field,
                        "validate_rules",
                        Some(anyhow::anyhow!("multi-selector has no members")),
                    ));
                }
                (Selector::Attribute { selector: s, attr }, SelectMode::Html) => {
                    Some(Selector::Multi(vec![s.clone(), attr.clone()]))
                }
                _ => None,
            };
            if let Some(normalized) = normalized {
                *selector = normalized;
            }
            for css in selector.css() {
                compile(css)?;
            }
        }

        for css in &self.clean {
            compile(css)?;
        }
        for (css, _) in &self.transforms {
            compile(css)?;
        }
        Ok(self)
    }
}

/// A field's entry: a fixed value for the source, or rules to run.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    Literal(String),
    Rules(FieldRules),
}

impl FieldSpec {
    pub fn rules(&self) -> Option<&FieldRules> {
        match self {
            FieldSpec::Rules(rules) => Some(rules),
            FieldSpec::Literal(_) => None,
        }
    }
}

/// Immutable per-source rule bundle.
#[derive(Debug, Clone, Default)]
pub struct ExtractorDefinition {
    pub domain: String,
    pub supported_domains: Vec<String>,
    fields: BTreeMap<FieldType, FieldSpec>,
    extend: BTreeMap<String, FieldRules>,
}

impl ExtractorDefinition {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// The definition whose extraction is delegated wholesale to the generic extractor.
    pub fn wildcard() -> Self {
        Self::new(WILDCARD_DOMAIN)
    }

    pub fn is_wildcard(&self) -> bool {
        self.domain == WILDCARD_DOMAIN
    }

    pub fn field(&self, field: FieldType) -> Option<&FieldSpec> {
        self.fields.get(&field)
    }

    pub fn extended_fields(&self) -> impl Iterator<Item = (&str, &FieldRules)> {
        self.extend.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds a field after validating it for the field's mode.
    pub fn with_field(mut self, field: FieldType, spec: FieldSpec) -> Result<Self, ExtractError> {
        let spec = match spec {
            FieldSpec::Rules(rules) => {
                FieldSpec::Rules(rules.validate(field.mode(), field.as_str())?)
            }
            literal => literal,
        };
        self.fields.insert(field, spec);
        Ok(self)
    }

    /// Adds a named extended field. Extended fields are text fields.
    pub fn with_extended(
        mut self,
        name: impl Into<String>,
        rules: FieldRules,
    ) -> Result<Self, ExtractError> {
        let name = name.into();
        let rules = rules.validate(SelectMode::Text, &name)?;
        self.extend.insert(name, rules);
        Ok(self)
    }

    pub fn with_supported_domain(mut self, domain: impl Into<String>) -> Self {
        self.supported_domains.push(domain.into());
        self
    }
}

impl TryFrom<&CustomExtractor> for ExtractorDefinition {
    type Error = ExtractError;

    fn try_from(custom: &CustomExtractor) -> Result<Self, Self::Error> {
        if custom.domain.trim().is_empty() {
            return Err(ExtractError::invalid_rule(
                "domain",
                "compile_definition",
                Some(anyhow::anyhow!("extractor has no domain")),
            ));
        }

        let mut def = ExtractorDefinition::new(custom.domain.trim());
        def.supported_domains = custom.supported_domains.clone();

        for field in FieldType::EVALUATION_ORDER {
            let spec = match custom.field(field) {
                None => continue,
                Some(FieldConfig::Literal(value)) => FieldSpec::Literal(value.clone()),
                Some(FieldConfig::Extractor(fe)) => FieldSpec::Rules(
                    FieldRules::from_extractor(fe, field.mode(), field.as_str())
                        .map_err(|e| e.in_definition(&custom.domain))?,
                ),
            };
            def.fields.insert(field, spec);
        }

        for (name, fe) in &custom.extend {
            let rules = FieldRules::from_extractor(fe, SelectMode::Text, name)
                .map_err(|e| e.in_definition(&custom.domain))?;
            def.extend.insert(name.clone(), rules);
        }

        Ok(def)
    }
}

impl TryFrom<CustomExtractor> for ExtractorDefinition {
    type Error = ExtractError;

    fn try_from(custom: CustomExtractor) -> Result<Self, Self::Error> {
        ExtractorDefinition::try_from(&custom)
    }
}

/// Registry of definitions keyed by domain and supported-domain aliases.
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    map: HashMap<String, Arc<ExtractorDefinition>>,
}

impl ExtractorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition for its primary and supported domains.
    pub fn register(&mut self, definition: ExtractorDefinition) {
        let shared = Arc::new(definition);
        for alias in &shared.supported_domains {
            self.map.insert(alias.to_lowercase(), Arc::clone(&shared));
        }
        self.map.insert(shared.domain.to_lowercase(), shared);
    }

    /// Looks up a definition by exact domain.
    pub fn get(&self, domain: &str) -> Option<Arc<ExtractorDefinition>> {
        self.map.get(&domain.to_lowercase()).cloned()
    }

    /// Finds the definition for a page URL: its host first, then the base
    /// domain (last two labels).
    pub fn lookup(&self, url: &Url) -> Option<Arc<ExtractorDefinition>> {
        let host = url.host_str()?.to_lowercase();
        if let Some(def) = self.map.get(&host) {
            return Some(Arc::clone(def));
        }
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() > 2 {
            let base = labels[labels.len() - 2..].join(".");
            return self.map.get(&base).cloned();
        }
        None
    }

    /// Returns the number of registered domain mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no extractors are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
