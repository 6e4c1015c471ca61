//! Ordered Dockerfile fragment builder
//!
//! A [`Fragment`] is a list of [`DirectiveBlock`]s. Every block carries a
//! [`BlockKind`], and kinds must be appended in their declared order, so the
//! layout of a generated Dockerfile (user before SSH, SCT before FSLeyes, ...)
//! is checked when the fragment is built rather than by inspection.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::errors::FragmentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a directive block, in the order blocks appear in a Dockerfile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// `FROM` line
    Base,
    /// Package-manager setup for the base system
    System,
    /// The `sct` user
    User,
    /// SCT download and install
    Install,
    /// `SCT_DIR` environment variable
    SctDir,
    /// Offline data download
    Data,
    /// Compiler toolchain
    Compilers,
    /// Extra command-line tools
    Tools,
    /// Development headers needed by FSLeyes
    FsleyesDeps,
    /// Development headers needed by FSL
    FslDeps,
    /// FSLeyes install
    Fsleyes,
    /// FSL build from source
    Fsl,
    /// User supplied commands
    Commands,
    /// SSH host key for images that do not generate one
    SshHostKey,
    /// SSH server and entrypoint
    Ssh,
    /// Final marker
    Finished,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A group of Dockerfile lines emitted together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveBlock {
    /// Kind of the block
    pub kind: BlockKind,
    /// Dockerfile lines, without trailing newlines
    pub lines: Vec<String>,
}

impl DirectiveBlock {
    /// Creates an empty block
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    /// Appends a raw line
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Appends a `RUN` directive
    pub fn run(self, command: impl AsRef<str>) -> Self {
        self.line(format!("RUN {}", command.as_ref()))
    }

    /// Appends a `# comment`, preceded by a blank line unless the block is empty
    pub fn comment(self, text: impl AsRef<str>) -> Self {
        let spaced = if self.lines.is_empty() {
            self
        } else {
            self.line("")
        };
        spaced.line(format!("# {}", text.as_ref()))
    }

    /// Appends an `ENV` directive
    pub fn env(self, key: &str, value: impl AsRef<str>) -> Self {
        self.line(format!("ENV {key} {}", value.as_ref()))
    }
}

/// An ordered sequence of directive blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    blocks: Vec<DirectiveBlock>,
}

impl Fragment {
    /// Creates an empty fragment
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block
    ///
    /// Empty blocks are dropped. A block may share its kind with the previous
    /// one but may not sort before it.
    pub fn push(&mut self, block: DirectiveBlock) -> Result<(), FragmentError> {
        if block.lines.is_empty() {
            return Ok(());
        }
        if let Some(last) = self.blocks.last()
            && block.kind < last.kind
        {
            return Err(FragmentError::OutOfOrder {
                block: block.kind,
                after: last.kind,
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Blocks in order
    pub fn blocks(&self) -> &[DirectiveBlock] {
        &self.blocks
    }

    /// Kinds of the blocks in order
    pub fn kinds(&self) -> Vec<BlockKind> {
        self.blocks.iter().map(|b| b.kind).collect()
    }

    /// Returns true if a block of this kind is present
    pub fn contains(&self, kind: BlockKind) -> bool {
        self.blocks.iter().any(|b| b.kind == kind)
    }

    /// Returns true if every block of `other` appears in `self`, in the same
    /// order
    pub fn contains_subsequence(&self, other: &Fragment) -> bool {
        let mut ours = self.blocks.iter();
        other
            .blocks
            .iter()
            .all(|wanted| ours.any(|block| block == wanted))
    }

    /// Renders the Dockerfile text, newline terminated
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.blocks.iter().flat_map(|b| b.lines.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(kind: BlockKind, line: &str) -> DirectiveBlock {
        DirectiveBlock::new(kind).line(line)
    }

    #[test]
    fn test_render_joins_lines() {
        let mut fragment = Fragment::new();
        fragment.push(block(BlockKind::Base, "FROM debian:9")).unwrap();
        fragment
            .push(DirectiveBlock::new(BlockKind::System).run("apt-get update"))
            .unwrap();

        assert_eq!(fragment.render(), "FROM debian:9\nRUN apt-get update\n");
    }

    #[test]
    fn test_out_of_order_block_rejected() {
        let mut fragment = Fragment::new();
        fragment.push(block(BlockKind::Ssh, "EXPOSE 8888")).unwrap();

        let err = fragment
            .push(block(BlockKind::User, "USER sct"))
            .unwrap_err();
        assert!(matches!(
            err,
            FragmentError::OutOfOrder {
                block: BlockKind::User,
                after: BlockKind::Ssh
            }
        ));
        assert_eq!(fragment.kinds(), vec![BlockKind::Ssh]);
    }

    #[test]
    fn test_same_kind_may_repeat() {
        let mut fragment = Fragment::new();
        fragment.push(block(BlockKind::Fsl, "a")).unwrap();
        fragment.push(block(BlockKind::Fsl, "b")).unwrap();
        assert_eq!(fragment.blocks().len(), 2);
    }

    #[test]
    fn test_empty_block_dropped() {
        let mut fragment = Fragment::new();
        fragment.push(block(BlockKind::Finished, "RUN echo Finished")).unwrap();
        fragment.push(DirectiveBlock::new(BlockKind::Base)).unwrap();
        assert_eq!(fragment.kinds(), vec![BlockKind::Finished]);
    }

    #[test]
    fn test_comment_spacing() {
        let block = DirectiveBlock::new(BlockKind::System)
            .comment("first")
            .run("true")
            .comment("second");
        assert_eq!(block.lines, vec!["# first", "RUN true", "", "# second"]);
    }

    #[test]
    fn test_contains_subsequence() {
        let mut small = Fragment::new();
        small.push(block(BlockKind::Base, "FROM x")).unwrap();
        small.push(block(BlockKind::Finished, "RUN echo Finished")).unwrap();

        let mut large = Fragment::new();
        large.push(block(BlockKind::Base, "FROM x")).unwrap();
        large.push(block(BlockKind::Tools, "RUN tools")).unwrap();
        large.push(block(BlockKind::Finished, "RUN echo Finished")).unwrap();

        assert!(large.contains_subsequence(&small));
        assert!(!small.contains_subsequence(&large));
    }
}
