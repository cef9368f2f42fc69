//! Unit registry - definitions, lookup, dimensional reduction, systems and
//! contexts
//!
//! Units and quantities hold an `Arc<UnitRegistry>`; two of them may only be
//! combined when they share the same registry instance.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use metrum_core::Number;
use tracing::{debug, trace};

use crate::context::{self, ActiveContext, Context, ContextGuard, ContextParams, ContextRef};
use crate::locale::Locale;
use crate::parse::{parse_expression, split_quantity};
use crate::system::{builtin_systems, System};
use crate::units::default_definitions;
use crate::{DefinitionKind, Quantity, RegistryConfig, Unit, UnitDefinition, UnitError, UnitsContainer};

/// A definition reduced to root units
#[derive(Debug, Clone)]
struct Resolved {
    factor: Number,
    root: UnitsContainer,
    dimensionality: UnitsContainer,
}

pub struct UnitRegistry {
    config: RegistryConfig,
    definitions: BTreeMap<String, UnitDefinition>,
    resolved: HashMap<String, Resolved>,
    /// name, symbol and aliases to canonical name
    lookup: HashMap<String, String>,
    systems: RwLock<BTreeMap<String, System>>,
    contexts: RwLock<Vec<Arc<Context>>>,
    active: RwLock<Vec<ActiveContext>>,
    fmt_locale: RwLock<Option<String>>,
    dimensionality_lookups: AtomicUsize,
}

impl UnitRegistry {
    /// Default registry: built-in units, systems and contexts
    pub fn new() -> Arc<Self> {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Arc<Self> {
        let mut registry = Self::empty(config);
        for definition in default_definitions() {
            registry
                .define(definition)
                .expect("built-in unit definitions are consistent");
        }
        for system in builtin_systems() {
            registry.define_system(system);
        }
        registry.define_context(Context::spectroscopy());
        registry.define_context(Context::boltzmann());
        debug!(units = registry.definitions.len(), "unit registry ready");
        registry.into_shared()
    }

    /// Registry without any units, systems or contexts
    pub fn empty(config: RegistryConfig) -> Self {
        let fmt_locale = RwLock::new(config.fmt_locale.clone());
        UnitRegistry {
            config,
            definitions: BTreeMap::new(),
            resolved: HashMap::new(),
            lookup: HashMap::new(),
            systems: RwLock::new(BTreeMap::new()),
            contexts: RwLock::new(Vec::new()),
            active: RwLock::new(Vec::new()),
            fmt_locale,
            dimensionality_lookups: AtomicUsize::new(0),
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Add a unit. References must name units defined earlier.
    pub fn define(&mut self, definition: UnitDefinition) -> Result<(), UnitError> {
        let resolved = match &definition.kind {
            DefinitionKind::Base(dimension) => Resolved {
                factor: Number::one(),
                root: UnitsContainer::single(definition.name.clone()),
                dimensionality: dimension.container(),
            },
            DefinitionKind::Scaled { factor, reference } => {
                let (ref_factor, root) = self.get_root_units(reference)?;
                Resolved {
                    factor: factor.mul(&ref_factor),
                    root,
                    dimensionality: self.reduce_dimensionality(reference)?,
                }
            }
        };

        if self.definitions.contains_key(&definition.name) {
            debug!(unit = %definition.name, "redefining unit");
        }
        let name = definition.name.clone();
        self.lookup.insert(name.clone(), name.clone());
        if let Some(symbol) = &definition.symbol {
            self.lookup.insert(symbol.clone(), name.clone());
        }
        for alias in &definition.aliases {
            self.lookup.insert(alias.clone(), name.clone());
        }
        self.resolved.insert(name.clone(), resolved);
        self.definitions.insert(name, definition);
        Ok(())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn default_format(&self) -> &str {
        &self.config.default_format
    }

    pub fn precision(&self) -> u32 {
        self.config.precision
    }

    pub fn definition(&self, name: &str) -> Option<&UnitDefinition> {
        self.get_name(name).ok().and_then(|n| self.definitions.get(&n))
    }

    /// Canonical names of every defined unit
    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    // ========== Lookup ==========

    /// Canonical name for a name, symbol or alias; plural forms are tried
    /// after an exact match fails
    pub fn get_name(&self, name: &str) -> Result<String, UnitError> {
        if let Some(canonical) = self.lookup.get(name) {
            return Ok(canonical.clone());
        }
        ["s", "es"]
            .iter()
            .filter_map(|suffix| name.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
            .find_map(|stem| self.lookup.get(stem))
            .cloned()
            .ok_or_else(|| UnitError::UndefinedUnit(name.to_string()))
    }

    /// Symbol of a unit, falling back to the name itself
    pub fn get_symbol(&self, name: &str) -> String {
        self.definition(name)
            .map(|d| d.symbol_or_name().to_string())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn parse_units(&self, input: &str) -> Result<UnitsContainer, UnitError> {
        parse_expression(input, |name| self.get_name(name))
    }

    pub fn unit(self: &Arc<Self>, input: &str) -> Result<Unit, UnitError> {
        Ok(Unit::from_container(self, self.parse_units(input)?))
    }

    pub fn quantity(self: &Arc<Self>, magnitude: impl Into<Number>, units: &str) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(magnitude, self.unit(units)?))
    }

    /// Parse "5 km/h" into a quantity
    pub fn parse_quantity(self: &Arc<Self>, input: &str) -> Result<Quantity, UnitError> {
        let (magnitude, units) = split_quantity(input)?;
        self.quantity(magnitude, units)
    }

    /// Restore a unit serialized as its container
    pub fn unit_from_json(self: &Arc<Self>, json: &str) -> Result<Unit, UnitError> {
        let units: UnitsContainer =
            serde_json::from_str(json).map_err(|e| UnitError::Parse(e.to_string()))?;
        self.reduce_dimensionality(&units)?;
        Ok(Unit::from_container(self, units))
    }

    // ========== Dimensional reduction ==========

    /// Dimensionality of a container, e.g. `{[length]: 1, [time]: -1}`
    pub fn get_dimensionality(&self, units: &UnitsContainer) -> Result<UnitsContainer, UnitError> {
        self.dimensionality_lookups.fetch_add(1, Ordering::Relaxed);
        self.reduce_dimensionality(units)
    }

    /// Number of `get_dimensionality` calls so far
    pub fn dimensionality_lookups(&self) -> usize {
        self.dimensionality_lookups.load(Ordering::Relaxed)
    }

    fn reduce_dimensionality(&self, units: &UnitsContainer) -> Result<UnitsContainer, UnitError> {
        let mut result = UnitsContainer::new();
        for (name, exp) in units.iter() {
            let dimensionality = if name.starts_with('[') {
                UnitsContainer::single(name)
            } else {
                self.resolve(name)?.dimensionality.clone()
            };
            result = result.mul(&dimensionality.pow(exp));
        }
        Ok(result)
    }

    /// Factor and root-unit container such that `units = factor * root`
    pub fn get_root_units(&self, units: &UnitsContainer) -> Result<(Number, UnitsContainer), UnitError> {
        let mut factor = Number::one();
        let mut root = UnitsContainer::new();
        for (name, exp) in units.iter() {
            let resolved = self.resolve(name)?;
            factor = factor.mul(&resolved.factor.pow_real(exp, self.config.precision)?);
            root = root.mul(&resolved.root.pow(exp));
        }
        Ok((factor, root))
    }

    fn resolve(&self, name: &str) -> Result<&Resolved, UnitError> {
        let canonical = self.get_name(name)?;
        self.resolved
            .get(&canonical)
            .ok_or(UnitError::UndefinedUnit(canonical))
    }

    /// Convert a magnitude between two containers, through the active
    /// contexts when the dimensionalities differ
    pub(crate) fn convert(
        &self,
        value: &Number,
        src: &UnitsContainer,
        dst: &UnitsContainer,
    ) -> Result<Number, UnitError> {
        if src == dst {
            return Ok(value.clone());
        }
        let src_dim = self.get_dimensionality(src)?;
        let dst_dim = self.get_dimensionality(dst)?;
        let (src_factor, _) = self.get_root_units(src)?;
        let (dst_factor, _) = self.get_root_units(dst)?;

        if src_dim == dst_dim {
            return Ok(value.mul(&src_factor).checked_div(&dst_factor)?);
        }

        let active = self.active_contexts();
        let path = if active.is_empty() {
            None
        } else {
            context::find_path(&active, &src_dim, &dst_dim)
        };
        let Some(path) = path else {
            return Err(UnitError::dimensionality(src, dst, &src_dim, &dst_dim));
        };

        trace!(from = %src, to = %dst, hops = path.len(), "converting through contexts");
        let mut root_value = value.mul(&src_factor);
        for step in &path {
            root_value = step.relation.apply(&root_value, &step.params)?;
        }
        Ok(root_value.checked_div(&dst_factor)?)
    }

    /// Every defined unit whose dimensionality is reachable from `units`,
    /// through `contexts` and the already active ones
    pub fn get_compatible_units(
        &self,
        units: &UnitsContainer,
        contexts: &[ContextRef],
        params: &ContextParams,
    ) -> Result<Vec<UnitsContainer>, UnitError> {
        let _guard = self.enter(contexts, params)?;
        let src_dim = self.get_dimensionality(units)?;
        let targets = context::reachable(&self.active_contexts(), &src_dim);

        Ok(self
            .resolved
            .iter()
            .filter(|(_, r)| targets.contains(&r.dimensionality))
            .map(|(name, _)| name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(UnitsContainer::single)
            .collect())
    }

    // ========== Systems ==========

    pub fn define_system(&self, system: System) {
        let mut systems = self.systems.write().unwrap_or_else(PoisonError::into_inner);
        systems.insert(system.name.clone(), system);
    }

    /// Add members to an existing system, creating it when missing
    pub fn extend_system(&self, name: &str, members: &[&str]) {
        let mut systems = self.systems.write().unwrap_or_else(PoisonError::into_inner);
        let system = systems
            .entry(name.to_string())
            .or_insert_with(|| System::new(name, &[]));
        system.members.extend(members.iter().map(|m| m.to_string()));
    }

    pub fn system_names(&self) -> Vec<String> {
        let systems = self.systems.read().unwrap_or_else(PoisonError::into_inner);
        systems.keys().cloned().collect()
    }

    /// Names of every system that lists at least one unit of the container
    pub fn systems_of(&self, units: &UnitsContainer) -> BTreeSet<String> {
        let systems = self.systems.read().unwrap_or_else(PoisonError::into_inner);
        let mut found = BTreeSet::new();
        for unit in units.names() {
            for system in systems.values().filter(|s| s.contains(unit)) {
                found.insert(system.name.clone());
            }
        }
        found
    }

    // ========== Contexts ==========

    pub fn define_context(&self, context: Context) {
        let mut contexts = self.contexts.write().unwrap_or_else(PoisonError::into_inner);
        contexts.retain(|c| c.name != context.name);
        contexts.push(Arc::new(context));
    }

    pub fn get_context(&self, name: &str) -> Result<Arc<Context>, UnitError> {
        let contexts = self.contexts.read().unwrap_or_else(PoisonError::into_inner);
        contexts
            .iter()
            .find(|c| c.answers_to(name))
            .cloned()
            .ok_or_else(|| UnitError::UndefinedContext(name.to_string()))
    }

    pub fn context_names(&self) -> Vec<String> {
        let contexts = self.contexts.read().unwrap_or_else(PoisonError::into_inner);
        contexts.iter().map(|c| c.name.clone()).collect()
    }

    /// Activate contexts until the guard is dropped. `params` override the
    /// contexts' defaults.
    pub fn enter(&self, contexts: &[ContextRef], params: &ContextParams) -> Result<ContextGuard<'_>, UnitError> {
        let entries = contexts
            .iter()
            .map(|c| {
                let context = match c {
                    ContextRef::Name(name) => self.get_context(name)?,
                    ContextRef::Context(ctx) => Arc::clone(ctx),
                };
                Ok(ActiveContext::new(context, params))
            })
            .collect::<Result<Vec<_>, UnitError>>()?;
        Ok(ContextGuard::push(&self.active, entries))
    }

    pub fn has_active_contexts(&self) -> bool {
        !self.active.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    /// Names of the active contexts, innermost last
    pub fn active_context_names(&self) -> Vec<String> {
        self.active_contexts().iter().map(|a| a.context.name.clone()).collect()
    }

    fn active_contexts(&self) -> Vec<ActiveContext> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // ========== Formatting settings ==========

    pub fn fmt_locale(&self) -> Option<String> {
        self.fmt_locale.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Set or clear the default locale; identifiers are validated
    pub fn set_fmt_locale(&self, locale: Option<&str>) -> Result<(), UnitError> {
        if let Some(id) = locale {
            Locale::parse(id)?;
        }
        *self.fmt_locale.write().unwrap_or_else(PoisonError::into_inner) = locale.map(str::to_string);
        Ok(())
    }

    pub fn is_upcast_type(&self, type_name: &str) -> bool {
        self.config.upcast_types.iter().any(|t| t == type_name)
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("units", &self.definitions.len())
            .field("systems", &self.system_names())
            .field("contexts", &self.context_names())
            .field("config", &self.config)
            .finish()
    }
}
