// ABOUTME: Connection provider that records every call and fails on request.
// ABOUTME: Used to check what a strategy would do without touching any machine.

use async_trait::async_trait;
use data_deploy::remote::{CommandOutput, Connection, ConnectionProvider, TransportError};
use data_deploy::reservation::{Node, Reservation};
use data_deploy::types::RemotePath;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(u32),
    Run { node: u32, command: String, input: String },
    Push { node: u32, source: PathBuf, dest: String },
    Close(u32),
}

struct Rule {
    node: Option<u32>,
    needle: String,
    remaining: Option<usize>,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    refuse_open: Vec<u32>,
    fail_push: Vec<u32>,
    rules: Vec<Rule>,
}

pub struct ScriptedCluster {
    nodes: Vec<Node>,
    state: Arc<Mutex<State>>,
}

impl ScriptedCluster {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn with_nodes(count: u32) -> Self {
        Self::new(super::nodes(count))
    }

    pub fn reservation(&self) -> Reservation {
        Reservation::new(self.nodes.clone()).unwrap()
    }

    /// Opening a session to node `id` fails.
    pub fn refuse_open(self, id: u32) -> Self {
        self.state.lock().refuse_open.push(id);
        self
    }

    /// Pushes to node `id` exit with status 23.
    pub fn fail_push(self, id: u32) -> Self {
        self.state.lock().fail_push.push(id);
        self
    }

    /// Commands on node `id` containing `needle` exit with status 1.
    pub fn fail_command(self, id: u32, needle: &str) -> Self {
        self.add_rule(Some(id), needle, None)
    }

    /// The first `times` commands on any node containing `needle` exit with status 1.
    pub fn fail_command_times(self, needle: &str, times: usize) -> Self {
        self.add_rule(None, needle, Some(times))
    }

    fn add_rule(self, node: Option<u32>, needle: &str, remaining: Option<usize>) -> Self {
        self.state.lock().rules.push(Rule {
            node,
            needle: needle.to_string(),
            remaining,
        });
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    pub fn opened(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Open(id) => Some(id),
                _ => None,
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn closed(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Close(id) => Some(id),
                _ => None,
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn commands(&self, id: u32) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run { node, command, .. } if node == id => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Stdin of each command run on node `id`, in order.
    pub fn inputs(&self, id: u32) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run { node, input, .. } if node == id => Some(input),
                _ => None,
            })
            .collect()
    }

    pub fn pushes(&self) -> Vec<(u32, PathBuf, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Push { node, source, dest } => Some((node, source, dest)),
                _ => None,
            })
            .collect()
    }
}

fn ok() -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: String::new(),
        stderr: String::new(),
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedCluster {
    async fn open(&self, node: &Node) -> Result<Arc<dyn Connection>, TransportError> {
        let id = node.id.get();
        let mut state = self.state.lock();
        if state.refuse_open.contains(&id) {
            return Err(TransportError::Open(format!("node {id} refused the connection")));
        }
        state.events.push(Event::Open(id));
        Ok(Arc::new(ScriptedConnection {
            node: node.clone(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn push(
        &self,
        node: &Node,
        source: &Path,
        dest: &RemotePath,
    ) -> Result<CommandOutput, TransportError> {
        let id = node.id.get();
        let mut state = self.state.lock();
        state.events.push(Event::Push {
            node: id,
            source: source.to_path_buf(),
            dest: dest.as_str().to_string(),
        });
        if state.fail_push.contains(&id) {
            return Ok(CommandOutput {
                exit_code: 23,
                stdout: String::new(),
                stderr: "rsync: partial transfer".to_string(),
            });
        }
        Ok(ok())
    }
}

struct ScriptedConnection {
    node: Node,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn node(&self) -> &Node {
        &self.node
    }

    async fn run(&self, command: &str, input: &[u8]) -> Result<CommandOutput, TransportError> {
        let id = self.node.id.get();
        let mut state = self.state.lock();
        state.events.push(Event::Run {
            node: id,
            command: command.to_string(),
            input: String::from_utf8_lossy(input).into_owned(),
        });

        let failing = state.rules.iter_mut().find(|rule| {
            rule.node.is_none_or(|node| node == id)
                && command.contains(&rule.needle)
                && rule.remaining != Some(0)
        });
        if let Some(rule) = failing {
            if let Some(remaining) = rule.remaining.as_mut() {
                *remaining -= 1;
            }
            return Ok(CommandOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("scripted failure: {}\n", rule.needle),
            });
        }
        Ok(ok())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.lock().events.push(Event::Close(self.node.id.get()));
        Ok(())
    }
}
