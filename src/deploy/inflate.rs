// ABOUTME: Dataset inflation by duplicating and hardlinking transferred files on each node.
// ABOUTME: Copies are named `<file>.copy.<i>`, links `<physical>.link.<j>`, both zero-based.

use super::options::DeployOptions;
use crate::remote::{RemoteScript, RemoteTask};
use crate::types::Multiplier;

/// Extra entries to create for every transferred file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inflation {
    copies: usize,
    links: usize,
}

impl Inflation {
    pub fn new(copy_multiplier: Multiplier, link_multiplier: Multiplier) -> Self {
        Self {
            copies: copy_multiplier.extra(),
            links: link_multiplier.extra(),
        }
    }

    pub fn from_options(options: &DeployOptions) -> Self {
        Self::new(options.copy_multiplier, options.link_multiplier)
    }

    /// Extra full copies per file.
    pub fn copies(&self) -> usize {
        self.copies
    }

    /// Extra hardlinks per physical file.
    pub fn links(&self) -> usize {
        self.links
    }

    pub fn is_noop(&self) -> bool {
        self.copies == 0 && self.links == 0
    }

    /// Directory entries per source file once inflated, the original included.
    pub fn entries_per_file(&self) -> usize {
        (self.copies + 1) * (self.links + 1)
    }

    /// Names of every entry inflation adds next to `file`.
    pub fn entry_names(&self, file: &str) -> Vec<String> {
        let physical: Vec<String> = std::iter::once(file.to_string())
            .chain((0..self.copies).map(|i| format!("{file}.copy.{i}")))
            .collect();

        let mut names: Vec<String> = physical[1..].to_vec();
        for base in &physical {
            names.extend((0..self.links).map(|j| format!("{base}.link.{j}")));
        }
        names
    }

    /// One script inflating every file: all copies first, then all links.
    ///
    /// Existing copies are overwritten in place, so files pre-created with a
    /// storage layout keep it.
    pub fn script<'a>(&self, files: impl IntoIterator<Item = &'a str>, sudo: bool) -> RemoteScript {
        let mut script = RemoteScript::new().sudo(sudo);
        if self.is_noop() {
            return script;
        }

        script = script.files(files);
        if self.copies > 0 {
            script.push(RemoteTask::Copy {
                copies: self.copies,
            });
        }
        if self.links > 0 {
            script.push(RemoteTask::Link {
                copies: self.copies,
                links: self.links,
            });
        }
        script
    }
}
