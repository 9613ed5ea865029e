// ABOUTME: Typed remote operations and the command table that renders them to POSIX shell.
// ABOUTME: Every remote side effect of a deployment is one of these tasks.

/// Extended attribute carrying the CephFS per-file object size.
const LAYOUT_ATTRIBUTE: &str = "ceph.file.layout.object_size";

/// Shell word naming the current file inside a per-file loop.
const FILE: &str = "\"$f\"";

/// A node the relay admin forwards data to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
}

impl ForwardTarget {
    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// One remote operation.
///
/// Per-file tasks (`Touch`, `SetLayout`, `Copy`, `Link`) run once for every
/// file of the script's file list, which is streamed over stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTask {
    /// Create a directory and its parents.
    MakeDir { path: String },
    /// Remove everything inside a directory, keeping the directory.
    ClearDir { path: String },
    /// Create each file empty, with its parent and `copies` empty `<file>.copy.<i>` siblings.
    Touch { copies: usize },
    /// Install the layout tool (`setfattr`) when it is missing.
    EnsureLayoutTool,
    /// Set the object-size layout on each file and its `copies` copies.
    SetLayout { copies: usize, object_size: u64 },
    /// Write `copies` full copies of each file named `<file>.copy.<i>`.
    Copy { copies: usize },
    /// Hardlink each file and each of its `copies` copies `links` times as `<physical>.link.<j>`.
    Link { copies: usize, links: usize },
    /// From the node running it, push `sources` into `dest` on every target in parallel.
    Push {
        sources: Vec<String>,
        targets: Vec<ForwardTarget>,
        dest: String,
    },
    /// Remove a path recursively. Glob characters are left to the remote shell.
    Remove { path: String },
}

impl RemoteTask {
    /// Whether this task reads the script's file list.
    pub fn per_file(&self) -> bool {
        matches!(
            self,
            RemoteTask::Touch { .. }
                | RemoteTask::SetLayout { .. }
                | RemoteTask::Copy { .. }
                | RemoteTask::Link { .. }
        )
    }

    /// Render this task as a shell fragment that exits non-zero on failure.
    pub fn render(&self, sudo: bool) -> String {
        let sudo = if sudo { "sudo " } else { "" };
        match self {
            RemoteTask::MakeDir { path } => format!("{sudo}mkdir -p -- {}", quote(path)),
            RemoteTask::ClearDir { path } => {
                format!("{sudo}rm -rf -- {}/*", quote(path.trim_end_matches('/')))
            }
            RemoteTask::Touch { copies } => each_file(&format!(
                "{sudo}mkdir -p -- \"$(dirname -- {FILE})\" && {sudo}touch -- {FILE} || exit 1; {}",
                indexed_loop("i", *copies, &format!("{sudo}touch -- {FILE}.copy.\"$i\""))
            )),
            RemoteTask::EnsureLayoutTool => {
                "(command -v setfattr >/dev/null 2>&1 || sudo apt-get install -y attr >/dev/null)"
                    .to_string()
            }
            RemoteTask::SetLayout {
                copies,
                object_size,
            } => {
                let setfattr =
                    format!("sudo setfattr --no-dereference -n {LAYOUT_ATTRIBUTE} -v {object_size} --");
                each_file(&format!(
                    "{setfattr} {FILE} || exit 1; {}",
                    indexed_loop("i", *copies, &format!("{setfattr} {FILE}.copy.\"$i\""))
                ))
            }
            RemoteTask::Copy { copies } => each_file(&indexed_loop(
                "i",
                *copies,
                &format!("{sudo}cp -- {FILE} {FILE}.copy.\"$i\""),
            )),
            RemoteTask::Link { copies, links } => {
                let link_copies = indexed_loop(
                    "i",
                    *copies,
                    &format!("{sudo}ln -f -- {FILE}.copy.\"$i\" {FILE}.copy.\"$i\".link.\"$j\""),
                );
                let body = format!("{sudo}ln -f -- {FILE} {FILE}.link.\"$j\" || exit 1; {link_copies}");
                each_file(&indexed_loop_body("j", *links, &body))
            }
            RemoteTask::Push {
                sources,
                targets,
                dest,
            } => {
                if targets.is_empty() || sources.is_empty() {
                    return "true".to_string();
                }
                let sources = sources.iter().map(|s| quote(s)).collect::<Vec<_>>().join(" ");
                let dest = quote(&format!("{}/", dest.trim_end_matches('/')));
                let pushes: String = targets
                    .iter()
                    .map(|target| {
                        let shell = quote(&format!(
                            "ssh -p {} -o StrictHostKeyChecking=no",
                            target.port
                        ));
                        format!(
                            "rsync -s -q -aHAX --inplace -e {shell} {sources} {}:{dest} & pids=\"$pids $!\"; ",
                            quote(&target.destination())
                        )
                    })
                    .collect();
                format!(
                    "(pids=''; {pushes}rc=0; for p in $pids; do wait \"$p\" || rc=1; done; exit \"$rc\")"
                )
            }
            RemoteTask::Remove { path } => format!("{sudo}rm -rf -- {}", quote_glob(path)),
        }
    }
}

/// Subshell running `body` with `$f` bound to each line of the file list.
fn each_file(body: &str) -> String {
    format!("(while IFS= read -r f; do {body}; done < \"$list\")")
}

/// `while` loop running `command` for `var` in `0..count`, aborting the subshell on failure.
fn indexed_loop(var: &str, count: usize, command: &str) -> String {
    indexed_loop_body(var, count, &format!("{command} || exit 1"))
}

fn indexed_loop_body(var: &str, count: usize, body: &str) -> String {
    format!(
        "{var}=0; while [ \"${var}\" -lt {count} ]; do {body}; {var}=$(({var}+1)); done"
    )
}

/// A batch of tasks sent to a node as a single remote invocation.
///
/// The command line stays the same size whatever the number of files: the
/// file list travels on stdin and is spooled to a temporary file so that
/// several per-file tasks can walk it in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteScript {
    tasks: Vec<RemoteTask>,
    files: Vec<String>,
    sudo: bool,
}

impl RemoteScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn task(mut self, task: RemoteTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Files the per-file tasks operate on.
    pub fn files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, task: RemoteTask) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[RemoteTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn reads_files(&self) -> bool {
        self.tasks.iter().any(RemoteTask::per_file)
    }

    /// What the rendered command expects on stdin: one file per line.
    pub fn input(&self) -> String {
        if !self.reads_files() {
            return String::new();
        }
        self.files.iter().fold(String::new(), |mut input, file| {
            input.push_str(file);
            input.push('\n');
            input
        })
    }

    /// Render all tasks, stopping at the first one that fails.
    pub fn render(&self) -> String {
        if self.tasks.is_empty() {
            return "true".to_string();
        }
        let body = self
            .tasks
            .iter()
            .map(|task| task.render(self.sudo))
            .collect::<Vec<_>>()
            .join(" && ");
        if !self.reads_files() {
            return body;
        }
        format!(
            "list=$(mktemp) || exit 1; cat > \"$list\"; {body}; rc=$?; rm -f -- \"$list\"; exit \"$rc\""
        )
    }
}

impl From<RemoteTask> for RemoteScript {
    fn from(task: RemoteTask) -> Self {
        RemoteScript::new().task(task)
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Quote a word for POSIX sh. Safe words are returned unchanged.
pub fn quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_shell_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}

/// Quote a word but leave `*`, `?`, `[` and `]` for the remote shell to expand.
pub fn quote_glob(word: &str) -> String {
    let mut out = String::new();
    let mut literal = String::new();
    for c in word.chars() {
        if "*?[]".contains(c) {
            if !literal.is_empty() {
                out.push_str(&quote(&literal));
                literal.clear();
            }
            out.push(c);
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() || out.is_empty() {
        out.push_str(&quote(&literal));
    }
    out
}
