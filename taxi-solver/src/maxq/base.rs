use super::MaxQConfig;
use anyhow::Result;
use log::trace;
use rand::{Rng, RngCore};
use std::cell::RefCell;
use taxi_core::{record::Record, Configurable, Env, Policy, Solver, Transition};
use taxi_env::{Action, GridWorld, Passenger, State, StateIndexer, TaxiEnv};

const ROOT: usize = 0;

/// A node of the task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Deliver the passenger.
    Root,
    /// Reach the passenger and pick them up.
    Get,
    /// Reach the destination and drop the passenger off.
    Put,
    /// Drive to the location with this index.
    Navigate(usize),
    /// A single action.
    Primitive(Action),
}

#[derive(Debug, Clone)]
struct Node {
    task: Task,
    children: Vec<usize>,
    // Values of a primitive, completions of a compound task.
    table: Vec<f64>,
}

/// A running compound task.
#[derive(Debug, Clone)]
struct Frame {
    node: usize,
    child: Option<usize>,
    seq: Vec<State>,
}

impl Frame {
    fn new(node: usize) -> Self {
        Self {
            node,
            child: None,
            seq: vec![],
        }
    }
}

/// Task stack of the greedy policy, kept from one call of `act` to the next.
#[derive(Debug, Clone, Default)]
struct Execution {
    stack: Vec<usize>,
    // Where the last greedy action leads; any other state starts over.
    next: Option<State>,
}

/// MAXQ-Q learning.
///
/// The graph is Root over Get and Put, Get over every Navigate and Pickup,
/// Put over Dropoff and every Navigate, each Navigate over the four moves.
/// Primitives learn the expected reward of their action, compound tasks learn
/// the completion value of each child, each under its own abstraction of the
/// state:
///
/// | task      | abstraction                   |
/// |-----------|-------------------------------|
/// | Root      | passenger, destination        |
/// | Get       | taxi cell, passenger          |
/// | Put       | taxi cell, destination        |
/// | Navigate  | taxi cell                     |
/// | primitive | full state                    |
///
/// Learning follows the task stack across calls of
/// [`Solver::select_action`] and [`Solver::observe`]. The greedy policy runs
/// the hierarchy the same way: a subtask it enters keeps control until it ends,
/// so the only choices made are the ones learning makes. A state that does not
/// follow from the previous greedy action starts a fresh execution at the root.
#[derive(Debug, Clone)]
pub struct MaxQ {
    config: MaxQConfig,
    indexer: StateIndexer,
    width: usize,
    num_locations: usize,
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    greedy: RefCell<Execution>,
}

impl MaxQ {
    /// Learned expected reward of an action in a state.
    pub fn primitive_value(&self, state: &State, action: Action) -> f64 {
        let node = self.primitive_node(action);
        self.nodes[node].table[self.indexer.index(state)]
    }

    /// Children of a task, `None` for primitives and unknown locations.
    pub fn children(&self, task: Task) -> Option<Vec<Task>> {
        let node = self.nodes.iter().find(|n| n.task == task)?;
        if node.children.is_empty() {
            return None;
        }
        Some(node.children.iter().map(|c| self.nodes[*c].task).collect())
    }

    /// Compound tasks being executed, root first.
    pub fn active_tasks(&self) -> Vec<Task> {
        self.stack.iter().map(|f| self.nodes[f.node].task).collect()
    }

    /// Compound tasks the greedy policy is executing, root first.
    pub fn greedy_tasks(&self) -> Vec<Task> {
        self.greedy
            .borrow()
            .stack
            .iter()
            .map(|n| self.nodes[*n].task)
            .collect()
    }

    fn primitive_node(&self, action: Action) -> usize {
        self.nodes.len() - Action::COUNT + action.index()
    }

    fn is_terminal(&self, world: &GridWorld, task: Task, s: &State) -> bool {
        match task {
            Task::Root => s.is_delivered(),
            Task::Get => s.in_taxi() || s.is_delivered(),
            Task::Put => !s.in_taxi(),
            Task::Navigate(l) => world.location_position(l) == Some(s.taxi),
            Task::Primitive(_) => false,
        }
    }

    fn abstract_index(&self, task: Task, s: &State) -> usize {
        let cell = s.taxi.y * self.width + s.taxi.x;
        let n = self.num_locations;
        let passenger = match s.passenger {
            Passenger::At(i) => i,
            Passenger::InTaxi => n,
        };
        match task {
            Task::Root => passenger * n + s.destination,
            Task::Get => cell * (n + 1) + passenger,
            Task::Put => cell * n + s.destination,
            Task::Navigate(_) => cell,
            Task::Primitive(_) => self.indexer.index(s),
        }
    }

    /// Value of a node in `s`, `None` for a compound task already ended.
    fn value(&self, world: &GridWorld, node: usize, s: &State) -> Option<f64> {
        let task = self.nodes[node].task;
        match task {
            Task::Primitive(_) => Some(self.nodes[node].table[self.indexer.index(s)]),
            _ if self.is_terminal(world, task, s) => None,
            _ => self.best_child(world, node, s).map(|(_, q)| q),
        }
    }

    /// Child offset with the highest value plus completion, ties broken by
    /// child order.
    fn best_child(&self, world: &GridWorld, node: usize, s: &State) -> Option<(usize, f64)> {
        let n = &self.nodes[node];
        let base = self.abstract_index(n.task, s) * n.children.len();
        let mut best: Option<(usize, f64)> = None;
        for (offset, child) in n.children.iter().enumerate() {
            if let Some(v) = self.value(world, *child, s) {
                let q = v + n.table[base + offset];
                if best.map_or(true, |(_, b)| q > b) {
                    best = Some((offset, q));
                }
            }
        }
        best
    }

    fn choose_child(
        &self,
        world: &GridWorld,
        node: usize,
        s: &State,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if rng.gen::<f64>() < self.config.epsilon {
            let open: Vec<usize> = self.nodes[node]
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| !self.is_terminal(world, self.nodes[**c].task, s))
                .map(|(offset, _)| offset)
                .collect();
            if open.is_empty() {
                None
            } else {
                Some(open[rng.gen_range(0..open.len())])
            }
        } else {
            self.best_child(world, node, s).map(|(offset, _)| offset)
        }
    }

    /// Updates the completion of `offset` under `node` for every state the
    /// child went through, the last one discounted once.
    fn update_completion(
        &mut self,
        world: &GridWorld,
        node: usize,
        offset: usize,
        seq: &[State],
        next: &State,
    ) {
        let task = self.nodes[node].task;
        let target = if self.is_terminal(world, task, next) {
            self.config.pseudo_reward
        } else {
            self.best_child(world, node, next)
                .map_or(self.config.pseudo_reward, |(_, q)| q)
        };
        let (alpha, gamma) = (self.config.alpha, self.config.gamma);
        let n = self.nodes[node].children.len();
        let mut discount = gamma;
        for s in seq.iter().rev() {
            let i = self.abstract_index(task, s) * n + offset;
            let c = &mut self.nodes[node].table[i];
            *c = (1.0 - alpha) * *c + alpha * discount * target;
            discount *= gamma;
        }
    }
}

impl Configurable<TaxiEnv> for MaxQ {
    type Config = MaxQConfig;

    fn build(config: MaxQConfig, env: &TaxiEnv) -> Result<Self> {
        config.validate()?;
        let world = env.world();
        let indexer = env.indexer();
        let n = world.num_locations();
        let cells = world.num_cells();
        let init = if config.gamma < 1.0 {
            env.max_reward() / (1.0 - config.gamma)
        } else {
            env.max_reward()
        };

        let get = 1;
        let put = 2;
        let navigate = 3;
        let primitive = navigate + n;
        let navigates: Vec<usize> = (navigate..primitive).collect();
        let action = |a: Action| primitive + a.index();

        let compound = |task: Task, children: Vec<usize>, states: usize| Node {
            table: vec![init; states * children.len()],
            task,
            children,
        };
        let mut nodes = vec![
            compound(Task::Root, vec![get, put], (n + 1) * n),
            compound(
                Task::Get,
                navigates
                    .iter()
                    .copied()
                    .chain(Some(action(Action::Pickup)))
                    .collect(),
                cells * (n + 1),
            ),
            compound(
                Task::Put,
                Some(action(Action::Dropoff))
                    .into_iter()
                    .chain(navigates.iter().copied())
                    .collect(),
                cells * n,
            ),
        ];
        for l in 0..n {
            nodes.push(compound(
                Task::Navigate(l),
                Action::MOVES.iter().map(|a| action(*a)).collect(),
                cells,
            ));
        }
        for a in Action::ALL.iter() {
            nodes.push(Node {
                task: Task::Primitive(*a),
                children: vec![],
                table: vec![init; indexer.num_states()],
            });
        }

        Ok(Self {
            config,
            indexer,
            width: world.width(),
            num_locations: n,
            nodes,
            stack: vec![],
            greedy: RefCell::new(Execution::default()),
        })
    }
}

impl Policy<TaxiEnv> for MaxQ {
    fn act(&self, env: &TaxiEnv, obs: &State, _rng: &mut dyn RngCore) -> Action {
        let world = env.world();
        let mut greedy = self.greedy.borrow_mut();
        if greedy.next != Some(*obs) {
            greedy.stack.clear();
        }
        let ended = greedy
            .stack
            .iter()
            .position(|n| self.is_terminal(world, self.nodes[*n].task, obs));
        if let Some(depth) = ended {
            greedy.stack.truncate(depth);
        }
        if greedy.stack.is_empty() {
            greedy.stack.push(ROOT);
        }

        let action = loop {
            let node = match greedy.stack.last() {
                Some(node) => *node,
                None => break Action::ALL[0],
            };
            match self.best_child(world, node, obs) {
                Some((offset, _)) => {
                    let child = self.nodes[node].children[offset];
                    match self.nodes[child].task {
                        Task::Primitive(a) => break a,
                        _ => greedy.stack.push(child),
                    }
                }
                None => {
                    greedy.stack.pop();
                }
            }
        };
        greedy.next = Some(env.step(obs, &action).obs);
        action
    }
}

impl Solver<TaxiEnv> for MaxQ {
    fn name(&self) -> &str {
        "maxq"
    }

    fn begin_trial(&mut self, _env: &TaxiEnv, _obs: &State) {
        self.stack.clear();
    }

    fn select_action(&mut self, env: &TaxiEnv, obs: &State, rng: &mut dyn RngCore) -> Action {
        let world = env.world();
        if self.stack.is_empty() {
            self.stack.push(Frame::new(ROOT));
        }
        loop {
            let (node, active) = match self.stack.last() {
                Some(frame) => (frame.node, frame.child),
                None => return Action::ALL[0],
            };
            if let Some(offset) = active {
                if let Task::Primitive(a) = self.nodes[self.nodes[node].children[offset]].task {
                    return a;
                }
            }

            let choice = if self.is_terminal(world, self.nodes[node].task, obs) {
                None
            } else {
                self.choose_child(world, node, obs, rng)
            };
            let offset = match choice {
                Some(offset) => offset,
                None => {
                    // Nothing left to do here, hand control back.
                    self.stack.pop();
                    if let Some(parent) = self.stack.last_mut() {
                        parent.child = None;
                    }
                    continue;
                }
            };
            if let Some(frame) = self.stack.last_mut() {
                frame.child = Some(offset);
            }
            let child = self.nodes[node].children[offset];
            match self.nodes[child].task {
                Task::Primitive(a) => return a,
                task => {
                    trace!("Entering {:?}", task);
                    self.stack.push(Frame::new(child));
                }
            }
        }
    }

    fn observe(&mut self, env: &TaxiEnv, transition: &Transition<TaxiEnv>) -> Result<Record> {
        let world = env.world();
        let (s, next) = (&transition.obs, &transition.next_obs);
        let alpha = self.config.alpha;
        let i = self.indexer.index(s);
        let node = self.primitive_node(transition.act);
        let v = &mut self.nodes[node].table[i];
        *v = (1.0 - alpha) * *v + alpha * transition.reward;

        // Close every task ended by this step, innermost first.
        let mut seq = vec![*s];
        loop {
            let (node, offset) = match self.stack.last_mut() {
                Some(frame) => match frame.child.take() {
                    Some(offset) => (frame.node, offset),
                    None => break,
                },
                None => break,
            };
            self.update_completion(world, node, offset, &seq, next);
            let task = self.nodes[node].task;
            let ended = self.is_terminal(world, task, next);
            if let Some(frame) = self.stack.last_mut() {
                frame.seq.append(&mut seq);
            }
            if !ended {
                break;
            }
            trace!("Leaving {:?}", task);
            seq = match self.stack.pop() {
                Some(frame) => frame.seq,
                None => break,
            };
        }

        // Tasks ended from below their active child are abandoned.
        let ended = self
            .stack
            .iter()
            .position(|f| self.is_terminal(world, self.nodes[f.node].task, next));
        if let Some(depth) = ended {
            self.stack.truncate(depth);
            if let Some(parent) = self.stack.last_mut() {
                parent.child = None;
            }
        }
        Ok(Record::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_env::{TaxiConfig, WorldConfig};

    fn small_env() -> TaxiEnv {
        TaxiEnv::build(&TaxiConfig::default().world(WorldConfig::small())).unwrap()
    }

    fn greedy_config() -> MaxQConfig {
        MaxQConfig::default().epsilon(0.0)
    }

    #[test]
    fn test_task_graph() -> Result<()> {
        let env = TaxiEnv::build(&TaxiConfig::default())?;
        let maxq = MaxQ::build(MaxQConfig::default(), &env)?;
        assert_eq!(maxq.children(Task::Root), Some(vec![Task::Get, Task::Put]));
        assert_eq!(
            maxq.children(Task::Get),
            Some(vec![
                Task::Navigate(0),
                Task::Navigate(1),
                Task::Navigate(2),
                Task::Navigate(3),
                Task::Primitive(Action::Pickup),
            ])
        );
        assert_eq!(
            maxq.children(Task::Put).map(|c| c[0]),
            Some(Task::Primitive(Action::Dropoff))
        );
        assert_eq!(
            maxq.children(Task::Navigate(2)),
            Some(Action::MOVES.iter().map(|a| Task::Primitive(*a)).collect())
        );
        assert_eq!(maxq.children(Task::Primitive(Action::North)), None);
        assert_eq!(maxq.children(Task::Navigate(4)), None);
        Ok(())
    }

    #[test]
    fn test_descends_into_subtasks() -> Result<()> {
        let env = TaxiEnv::build(&TaxiConfig::default())?;
        let mut maxq = MaxQ::build(greedy_config(), &env)?;
        let s = State::build(env.world(), (2, 2), Some("Y"), "R")?;
        let mut rng = rand::thread_rng();
        maxq.begin_trial(&env, &s);

        // Put is over while the passenger waits; ties go to the first child.
        assert_eq!(maxq.select_action(&env, &s, &mut rng), Action::North);
        assert_eq!(
            maxq.active_tasks(),
            vec![Task::Root, Task::Get, Task::Navigate(0)]
        );
        Ok(())
    }

    #[test]
    fn test_stack_follows_delivery() -> Result<()> {
        let env = small_env();
        let mut maxq = MaxQ::build(greedy_config(), &env)?;
        let mut rng = rand::thread_rng();
        let mut s = State::build(env.world(), (0, 1), None, "R")?;
        maxq.begin_trial(&env, &s);

        let mut trace = vec![];
        while !s.is_delivered() && trace.len() < 10 {
            let a = maxq.select_action(&env, &s, &mut rng);
            trace.push((a, maxq.active_tasks()));
            let t = Transition::from_step(s, env.step(&s, &a));
            maxq.observe(&env, &t)?;
            s = t.next_obs;
        }

        let nav_r = vec![Task::Root, Task::Put, Task::Navigate(0)];
        assert_eq!(
            trace,
            vec![
                (Action::Dropoff, vec![Task::Root, Task::Put]),
                (Action::North, nav_r),
                (Action::Dropoff, vec![Task::Root, Task::Put]),
            ]
        );
        assert!(maxq.active_tasks().is_empty());

        // Missed dropoff: 0.9 * 0 + 0.1 * -10.
        let start = State::build(env.world(), (0, 1), None, "R")?;
        assert_eq!(maxq.primitive_value(&start, Action::Dropoff), -1.0);
        Ok(())
    }

    #[test]
    fn test_greedy_ignores_choices_inside_subtask() -> Result<()> {
        let env = small_env();
        let mut maxq = MaxQ::build(greedy_config(), &env)?;
        let mut rng = rand::thread_rng();
        let start = State::build(env.world(), (1, 1), Some("Y"), "R")?;
        let nav_r = vec![Task::Root, Task::Get, Task::Navigate(0)];
        let a = maxq.act(&env, &start, &mut rng);
        assert_eq!(a, Action::North);
        assert_eq!(maxq.greedy_tasks(), nav_r);
        let next = env.step(&start, &a).obs;

        // Get itself would now prefer Navigate(G) here.
        let i = maxq.abstract_index(Task::Get, &next) * maxq.nodes[1].children.len();
        maxq.nodes[1].table[i] = -5.0;

        assert!(Action::MOVES.contains(&maxq.act(&env, &next, &mut rng)));
        assert_eq!(maxq.greedy_tasks(), nav_r);

        // Not where the last action leads: a new execution from the root.
        let other = State::build(env.world(), (0, 1), None, "R")?;
        assert_eq!(maxq.act(&env, &other, &mut rng), Action::Dropoff);
        assert_eq!(maxq.greedy_tasks(), vec![Task::Root, Task::Put]);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let env = small_env();
        assert!(MaxQ::build(MaxQConfig::default().alpha(1.5), &env).is_err());
    }
}
