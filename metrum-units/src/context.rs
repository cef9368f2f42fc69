//! Contexts - scoped permissions to convert between dimensionalities
//!
//! A context holds directed relations between two dimensionalities together
//! with a transformation of the magnitude expressed in root units. Entering
//! contexts pushes them on the registry's active stack; the returned
//! [`ContextGuard`] pops them again when dropped, also on early return or
//! unwinding.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use metrum_core::{Number, NumberError};
use tracing::debug;

use crate::dimension::{dimensions, BaseDimension};
use crate::UnitsContainer;

/// Named numeric parameters of a context (e.g. refractive index `n`)
pub type ContextParams = BTreeMap<String, Number>;

/// Magnitude transformation between root units of two dimensionalities
pub type Transform =
    Arc<dyn Fn(&Number, &ContextParams) -> Result<Number, NumberError> + Send + Sync>;

/// One directed edge of a context
#[derive(Clone)]
pub struct Relation {
    pub src: UnitsContainer,
    pub dst: UnitsContainer,
    transform: Transform,
}

impl Relation {
    pub fn apply(&self, value: &Number, params: &ContextParams) -> Result<Number, NumberError> {
        (self.transform)(value, params)
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relation({} -> {})", self.src, self.dst)
    }
}

/// A named set of relations
#[derive(Debug, Clone)]
pub struct Context {
    pub name: String,
    pub aliases: Vec<String>,
    pub defaults: ContextParams,
    relations: Vec<Relation>,
}

impl Context {
    pub fn new(name: &str) -> Self {
        Context {
            name: name.to_string(),
            aliases: Vec::new(),
            defaults: ContextParams::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn with_default(mut self, param: &str, value: Number) -> Self {
        self.defaults.insert(param.to_string(), value);
        self
    }

    /// Add a one-way relation
    pub fn with_transformation<F>(mut self, src: UnitsContainer, dst: UnitsContainer, f: F) -> Self
    where
        F: Fn(&Number, &ContextParams) -> Result<Number, NumberError> + Send + Sync + 'static,
    {
        self.relations.push(Relation { src, dst, transform: Arc::new(f) });
        self
    }

    /// Add a relation in both directions
    pub fn bidirectional<F, B>(self, src: UnitsContainer, dst: UnitsContainer, forward: F, backward: B) -> Self
    where
        F: Fn(&Number, &ContextParams) -> Result<Number, NumberError> + Send + Sync + 'static,
        B: Fn(&Number, &ContextParams) -> Result<Number, NumberError> + Send + Sync + 'static,
    {
        self.with_transformation(src.clone(), dst.clone(), forward)
            .with_transformation(dst, src, backward)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// `spectroscopy` (`sp`): wavelength, frequency, wavenumber and photon
    /// energy; parameter `n` is the refractive index (default 1)
    pub fn spectroscopy() -> Context {
        use BaseDimension::*;
        let length = Length.container();
        let frequency = Time.power(-1);
        let wavenumber = Length.power(-1);
        let energy = dimensions(&[(Length, 2), (Mass, 1), (Time, -2)]);

        Context::new("spectroscopy")
            .with_aliases(&["sp"])
            .with_default("n", Number::one())
            .bidirectional(
                length.clone(),
                frequency.clone(),
                |v, p| speed_of_light().checked_div(&refractive_index(p).mul(v)),
                |v, p| speed_of_light().checked_div(&refractive_index(p).mul(v)),
            )
            .bidirectional(
                frequency,
                energy,
                |v, _| Ok(planck_constant().mul(v)),
                |v, _| v.checked_div(&planck_constant()),
            )
            .bidirectional(wavenumber, length, |v, _| v.recip(), |v, _| v.recip())
    }

    /// `boltzmann`: thermal energy `k_B * T`
    pub fn boltzmann() -> Context {
        use BaseDimension::*;
        let temperature = Temperature.container();
        let energy = dimensions(&[(Length, 2), (Mass, 1), (Time, -2)]);

        Context::new("boltzmann").bidirectional(
            temperature,
            energy,
            |v, _| Ok(boltzmann_constant().mul(v)),
            |v, _| v.checked_div(&boltzmann_constant()),
        )
    }
}

/// m/s
fn speed_of_light() -> Number {
    Number::from_i64(299_792_458)
}

/// J*s
fn planck_constant() -> Number {
    Number::from_scientific(662_607_015, -42)
}

/// J/K
fn boltzmann_constant() -> Number {
    Number::from_scientific(1_380_649, -29)
}

fn refractive_index(params: &ContextParams) -> Number {
    params.get("n").cloned().unwrap_or_else(Number::one)
}

/// A context by name or by value
#[derive(Debug, Clone)]
pub enum ContextRef {
    Name(String),
    Context(Arc<Context>),
}

impl From<&str> for ContextRef {
    fn from(name: &str) -> Self {
        ContextRef::Name(name.to_string())
    }
}

impl From<String> for ContextRef {
    fn from(name: String) -> Self {
        ContextRef::Name(name)
    }
}

impl From<Context> for ContextRef {
    fn from(ctx: Context) -> Self {
        ContextRef::Context(Arc::new(ctx))
    }
}

impl From<Arc<Context>> for ContextRef {
    fn from(ctx: Arc<Context>) -> Self {
        ContextRef::Context(ctx)
    }
}

/// A context on the active stack with its resolved parameters
#[derive(Debug, Clone)]
pub(crate) struct ActiveContext {
    pub context: Arc<Context>,
    pub params: ContextParams,
    /// Guard that pushed this entry
    scope: u64,
}

impl ActiveContext {
    pub fn new(context: Arc<Context>, overrides: &ContextParams) -> Self {
        let mut params = context.defaults.clone();
        params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        ActiveContext { context, params, scope: 0 }
    }
}

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Removes exactly the contexts it pushed when dropped, wherever they sit on
/// the stack by then
#[must_use = "contexts are popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard<'a> {
    stack: &'a RwLock<Vec<ActiveContext>>,
    scope: u64,
}

impl<'a> ContextGuard<'a> {
    pub(crate) fn push(stack: &'a RwLock<Vec<ActiveContext>>, entries: Vec<ActiveContext>) -> Self {
        let scope = NEXT_SCOPE.fetch_add(1, Ordering::Relaxed);
        let mut active = stack.write().unwrap_or_else(PoisonError::into_inner);
        for mut entry in entries {
            debug!(context = %entry.context.name, depth = active.len(), scope, "entering context");
            entry.scope = scope;
            active.push(entry);
        }
        ContextGuard { stack, scope }
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.stack.write().unwrap_or_else(PoisonError::into_inner);
        active.retain(|entry| {
            let mine = entry.scope == self.scope;
            if mine {
                debug!(context = %entry.context.name, scope = self.scope, "leaving context");
            }
            !mine
        });
    }
}

/// An edge taken while converting, with the parameters of its context
pub(crate) struct Step {
    pub relation: Relation,
    pub params: ContextParams,
}

/// Edges of every active context; the most recently entered context wins
/// when two define the same pair of dimensionalities
fn graph(active: &[ActiveContext]) -> HashMap<UnitsContainer, Vec<Step>> {
    let mut seen = std::collections::HashSet::new();
    let mut edges: HashMap<UnitsContainer, Vec<Step>> = HashMap::new();
    for entry in active.iter().rev() {
        for relation in entry.context.relations() {
            if seen.insert((relation.src.clone(), relation.dst.clone())) {
                edges.entry(relation.src.clone()).or_default().push(Step {
                    relation: relation.clone(),
                    params: entry.params.clone(),
                });
            }
        }
    }
    edges
}

/// Shortest chain of relations from `src` to `dst` dimensionality
pub(crate) fn find_path(
    active: &[ActiveContext],
    src: &UnitsContainer,
    dst: &UnitsContainer,
) -> Option<Vec<Step>> {
    let edges = graph(active);
    let mut previous: HashMap<UnitsContainer, (UnitsContainer, usize)> = HashMap::new();
    let mut queue = VecDeque::from([src.clone()]);

    while let Some(node) = queue.pop_front() {
        if &node == dst {
            break;
        }
        for (idx, step) in edges.get(&node).into_iter().flatten().enumerate() {
            let next = &step.relation.dst;
            if next != src && !previous.contains_key(next) {
                previous.insert(next.clone(), (node.clone(), idx));
                queue.push_back(next.clone());
            }
        }
    }

    if !previous.contains_key(dst) {
        return None;
    }

    let mut hops = Vec::new();
    let mut node = dst.clone();
    while let Some((prev, idx)) = previous.get(&node) {
        hops.push((prev.clone(), *idx));
        node = prev.clone();
    }
    hops.reverse();

    let mut path = Vec::with_capacity(hops.len());
    for (from, idx) in hops {
        let steps = edges.get(&from)?;
        let step = steps.get(idx)?;
        path.push(Step { relation: step.relation.clone(), params: step.params.clone() });
    }
    Some(path)
}

/// Every dimensionality reachable from `src` through active contexts
pub(crate) fn reachable(active: &[ActiveContext], src: &UnitsContainer) -> Vec<UnitsContainer> {
    let edges = graph(active);
    let mut found = vec![src.clone()];
    let mut queue = VecDeque::from([src.clone()]);
    while let Some(node) = queue.pop_front() {
        for step in edges.get(&node).into_iter().flatten() {
            if !found.contains(&step.relation.dst) {
                found.push(step.relation.dst.clone());
                queue.push_back(step.relation.dst.clone());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(ctx: Context) -> Vec<ActiveContext> {
        vec![ActiveContext::new(Arc::new(ctx), &ContextParams::new())]
    }

    #[test]
    fn test_spectroscopy_aliases() {
        let sp = Context::spectroscopy();
        assert!(sp.answers_to("sp"));
        assert!(sp.answers_to("spectroscopy"));
        assert!(!sp.answers_to("boltzmann"));
        assert_eq!(sp.relations().len(), 6);
    }

    #[test]
    fn test_direct_path() {
        let stack = active(Context::spectroscopy());
        let length = BaseDimension::Length.container();
        let frequency = BaseDimension::Time.power(-1);
        let path = find_path(&stack, &length, &frequency).unwrap();
        assert_eq!(path.len(), 1);
        let nu = path[0].relation.apply(&Number::one(), &path[0].params).unwrap();
        assert_eq!(nu, speed_of_light());
    }

    #[test]
    fn test_multi_hop_path() {
        let stack = active(Context::spectroscopy());
        let wavenumber = BaseDimension::Length.power(-1);
        let energy = dimensions(&[(BaseDimension::Length, 2), (BaseDimension::Mass, 1), (BaseDimension::Time, -2)]);
        let path = find_path(&stack, &wavenumber, &energy).unwrap();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_no_path() {
        let stack = active(Context::spectroscopy());
        let length = BaseDimension::Length.container();
        let time = BaseDimension::Time.container();
        assert!(find_path(&stack, &length, &time).is_none());
    }

    #[test]
    fn test_params_override_defaults() {
        let ctx = Arc::new(Context::spectroscopy());
        let mut overrides = ContextParams::new();
        overrides.insert("n".to_string(), Number::from_i64(2));
        let entry = ActiveContext::new(ctx, &overrides);
        assert_eq!(entry.params.get("n"), Some(&Number::from_i64(2)));
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let stack = RwLock::new(Vec::new());
        {
            let _guard = ContextGuard::push(&stack, active(Context::boltzmann()));
            assert_eq!(stack.read().unwrap().len(), 1);
        }
        assert!(stack.read().unwrap().is_empty());
    }

    #[test]
    fn test_guards_dropped_out_of_order() {
        let stack = RwLock::new(Vec::new());
        let outer = ContextGuard::push(&stack, active(Context::boltzmann()));
        let inner = ContextGuard::push(&stack, active(Context::spectroscopy()));
        drop(outer);
        {
            let left = stack.read().unwrap();
            assert_eq!(left.len(), 1);
            assert_eq!(left[0].context.name, "spectroscopy");
        }
        drop(inner);
        assert!(stack.read().unwrap().is_empty());
    }

    #[test]
    fn test_reachable() {
        let stack = active(Context::boltzmann());
        let temperature = BaseDimension::Temperature.container();
        assert_eq!(reachable(&stack, &temperature).len(), 2);
    }
}
