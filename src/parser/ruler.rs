use std::collections::HashMap;

/// Main chain name; every rule belongs to it.
pub const MAIN_CHAIN: &str = "";

struct Rule<R> {
    name: &'static str,
    func: R,
    alt: Vec<&'static str>,
}

/// Ordered, named rule list with alternate (terminator) chains.
///
/// A rule listing `"paragraph"` in its alt chains is tried when a paragraph
/// checks whether the next line ends it.
pub struct Ruler<R> {
    rules: Vec<Rule<R>>,
    chains: HashMap<&'static str, Vec<R>>,
}

impl<R: Copy> Ruler<R> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            chains: HashMap::new(),
        }
    }

    /// Append a rule to the end of the main chain.
    pub fn push(&mut self, name: &'static str, func: R, alt: &[&'static str]) {
        self.rules.push(Rule { name, func, alt: alt.to_vec() });
        self.compile();
    }

    /// Insert a rule right before `before`. Returns false if `before` is unknown.
    pub fn insert_before(&mut self, before: &str, name: &'static str, func: R, alt: &[&'static str]) -> bool {
        let Some(index) = self.rules.iter().position(|r| r.name == before) else {
            return false;
        };
        self.rules.insert(index, Rule { name, func, alt: alt.to_vec() });
        self.compile();
        true
    }

    /// Rules of `chain` in order (`MAIN_CHAIN` for all of them).
    pub fn rules(&self, chain: &str) -> &[R] {
        self.chains.get(chain).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    fn compile(&mut self) {
        let mut chains: HashMap<&'static str, Vec<R>> = HashMap::new();
        chains.insert(MAIN_CHAIN, self.rules.iter().map(|r| r.func).collect());
        for rule in &self.rules {
            for chain in &rule.alt {
                chains.entry(*chain).or_default().push(rule.func);
            }
        }
        self.chains = chains;
    }
}

impl<R: Copy> Default for Ruler<R> {
    fn default() -> Self {
        Self::new()
    }
}
