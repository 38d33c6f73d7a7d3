use super::{Condition, Term};
use log::trace;
use std::{collections::BTreeMap, fmt};
use taxi_core::TaxiError;

/// A condition-effect rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<O> {
    term: Term,
    effect: O,
    positives: Vec<Condition>,
    evidence: usize,
    revision: u64,
}

impl<O> Rule<O> {
    /// Precondition.
    pub fn term(&self) -> Term {
        self.term
    }

    /// Effect.
    pub fn effect(&self) -> &O {
        &self.effect
    }

    /// Observed conditions the rule was built from.
    pub fn positives(&self) -> &[Condition] {
        &self.positives
    }

    /// Number of observations supporting the rule.
    pub fn evidence(&self) -> usize {
        self.evidence
    }

    /// Stamp of the last change of the precondition.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl<O: fmt::Debug> fmt::Display for Rule<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {:?} ({})", self.term, self.effect, self.evidence)
    }
}

/// Learns the effect of one action on one variable as a ranked rule list.
///
/// Rules are kept sorted by specificity, then by revision, most recent
/// first, and the first matching rule makes the prediction. No two rules
/// with different effects match a condition that has been observed.
#[derive(Debug, Clone)]
pub struct EffectLearner<O> {
    known_count: usize,
    generalize: bool,
    exact_effect: Option<O>,
    history: BTreeMap<Condition, (O, usize)>,
    rules: Vec<Rule<O>>,
    revision: u64,
}

impl<O: Copy + PartialEq + fmt::Debug> EffectLearner<O> {
    /// A learner whose rules generalize over conditions.
    pub fn new(known_count: usize) -> Self {
        Self {
            known_count,
            generalize: true,
            exact_effect: None,
            history: BTreeMap::new(),
            rules: vec![],
            revision: 0,
        }
    }

    /// A learner keeping one exact rule per observed condition.
    pub fn exact(known_count: usize) -> Self {
        Self {
            generalize: false,
            ..Self::new(known_count)
        }
    }

    /// Keeps the rules of `effect` exact.
    pub fn with_exact_effect(mut self, effect: O) -> Self {
        self.exact_effect = Some(effect);
        self
    }

    /// Rules in rank order.
    pub fn rules(&self) -> &[Rule<O>] {
        &self.rules
    }

    /// Effect predicted for `c`, `None` if no trusted rule matches.
    pub fn predict(&self, c: Condition) -> Option<O> {
        self.rules
            .iter()
            .find(|r| r.term.matches(c))
            .filter(|r| r.evidence >= self.known_count)
            .map(|r| r.effect)
    }

    /// Learns that `effect` was observed under `c`.
    ///
    /// Returns `true` if predictions may have changed. Fails with
    /// [`TaxiError::ModelInconsistency`] if `c` was seen with another effect.
    pub fn observe(&mut self, c: Condition, effect: O) -> Result<bool, TaxiError> {
        let seen = self.history.entry(c).or_insert((effect, 0));
        if seen.0 != effect {
            return Err(TaxiError::ModelInconsistency(format!(
                "condition {} produced {:?}, then {:?}",
                c, seen.0, effect
            )));
        }
        seen.1 += 1;

        let matching = self
            .rules
            .iter()
            .position(|r| r.effect == effect && r.term.matches(c));
        let mut changed = match matching {
            Some(i) => {
                let rule = &mut self.rules[i];
                rule.evidence += 1;
                if !rule.positives.contains(&c) {
                    rule.positives.push(c);
                }
                rule.evidence == self.known_count
            }
            None => {
                if !(self.can_generalize(&effect) && self.absorb(c, effect)) {
                    let revision = self.next_revision();
                    self.rules.push(Rule {
                        term: Term::exact(c),
                        effect,
                        positives: vec![c],
                        evidence: 1,
                        revision,
                    });
                }
                true
            }
        };
        changed |= self.split(c, effect);

        if changed {
            self.rules.sort_by(|a, b| {
                b.term
                    .specificity()
                    .cmp(&a.term.specificity())
                    .then_with(|| b.revision.cmp(&a.revision))
            });
        }
        Ok(changed)
    }

    fn can_generalize(&self, effect: &O) -> bool {
        self.generalize && self.exact_effect.as_ref() != Some(effect)
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Returns `true` if no condition observed with another effect matches.
    fn consistent(&self, term: Term, effect: O) -> bool {
        self.history
            .iter()
            .all(|(h, (e, _))| *e == effect || !term.matches(*h))
    }

    /// Generalizes the first rule of `effect` that stays consistent with `c`.
    fn absorb(&mut self, c: Condition, effect: O) -> bool {
        for i in 0..self.rules.len() {
            if self.rules[i].effect != effect {
                continue;
            }
            let term = self.rules[i].term.generalize(c);
            if self.consistent(term, effect) {
                let revision = self.next_revision();
                let rule = &mut self.rules[i];
                trace!("{} generalized to {}", rule.term, term);
                rule.term = term;
                rule.positives.push(c);
                rule.evidence += 1;
                rule.revision = revision;
                return true;
            }
        }
        false
    }

    /// Replaces the rules of other effects matching `c`.
    fn split(&mut self, c: Condition, effect: O) -> bool {
        let (conflicting, kept): (Vec<_>, Vec<_>) = self
            .rules
            .drain(..)
            .partition(|r| r.effect != effect && r.term.matches(c));
        self.rules = kept;
        if conflicting.is_empty() {
            return false;
        }
        for rule in conflicting.iter() {
            let groups = self.regroup(rule);
            trace!("{} split into {} rules", rule, groups.len());
            self.rules.extend(groups);
        }
        true
    }

    /// Regroups the positives of a rule into greedy consistent conjunctions.
    fn regroup(&mut self, rule: &Rule<O>) -> Vec<Rule<O>> {
        let generalize = self.can_generalize(&rule.effect);
        let mut groups: Vec<Rule<O>> = vec![];
        for p in rule.positives.iter() {
            let count = self.history.get(p).map_or(0, |(_, n)| *n);
            let slot = if generalize {
                groups
                    .iter()
                    .position(|g| self.consistent(g.term.generalize(*p), rule.effect))
            } else {
                None
            };
            match slot {
                Some(i) => {
                    let g = &mut groups[i];
                    g.term = g.term.generalize(*p);
                    g.positives.push(*p);
                    g.evidence += count;
                }
                None => groups.push(Rule {
                    term: Term::exact(*p),
                    effect: rule.effect,
                    positives: vec![*p],
                    evidence: count,
                    revision: 0,
                }),
            }
        }
        for g in groups.iter_mut() {
            g.revision = self.next_revision();
        }
        groups
    }
}
