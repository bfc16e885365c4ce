//! Indented text rendering of trees, for debugging.

use std::io::{Result, Write};

use appendtree_storage::{Digest, TreeNode};
use itertools::Itertools;

use crate::tree::TreeSnapshot;

const HEX_LEN: usize = 8;
const INDENT_SPACES: usize = 4;

/// Types that can draw themselves through a [`Drawer`].
pub trait Visualize {
    /// Write `self` and hand the drawer back.
    fn visualize<W: Write>(&self, drawer: Drawer<W>) -> Result<Drawer<W>>;
}

/// A `io::Write` proxy that indents every line by the current depth.
pub struct Drawer<W: Write> {
    level: usize,
    write: W,
}

impl<W: Write> Drawer<W> {
    /// Drawer at depth zero.
    pub fn new(write: W) -> Self {
        Drawer { level: 0, write }
    }

    /// Indent following lines one step further.
    pub fn down(&mut self) {
        self.level += 1;
    }

    /// Undo one [`Drawer::down`].
    pub fn up(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Write `buf`, indenting each line after the first.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let lines_iter = buf.split(|c| *c == b'\n');
        let sep = if self.level > 0 {
            let mut result = " ".repeat(INDENT_SPACES * self.level - 1);
            result.insert(0, '\n');
            result
        } else {
            "\n".to_owned()
        };
        for line in Itertools::intersperse(lines_iter, sep.as_bytes()) {
            self.write.write_all(line)?;
        }
        Ok(())
    }

    /// Terminate the last line and flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.write.write_all(b"\n")?;
        self.write.flush()
    }
}

/// Shorten a digest to its first and last eight hex digits.
pub fn short_hex(digest: &Digest) -> String {
    let encoded = digest.to_hex();
    let tail = encoded.len().saturating_sub(HEX_LEN);
    format!("{}..{}", &encoded[..HEX_LEN], &encoded[tail..])
}

impl Visualize for Digest {
    fn visualize<W: Write>(&self, mut drawer: Drawer<W>) -> Result<Drawer<W>> {
        drawer.write(short_hex(self).as_bytes())?;
        Ok(drawer)
    }
}

impl Visualize for TreeNode {
    fn visualize<W: Write>(&self, mut drawer: Drawer<W>) -> Result<Drawer<W>> {
        drawer.write(format!("#{} ", self.index).as_bytes())?;
        drawer = self.digest.visualize(drawer)?;
        if let Some(value) = &self.value {
            drawer.write(format!(" {value}").as_bytes())?;
        }
        Ok(drawer)
    }
}

impl Visualize for TreeSnapshot {
    fn visualize<W: Write>(&self, mut drawer: Drawer<W>) -> Result<Drawer<W>> {
        drawer.write(format!("tree {}", self.tree_id).as_bytes())?;
        if self.levels.is_empty() {
            drawer.write(b" (empty)")?;
            return Ok(drawer);
        }
        drawer.down();
        for (level, nodes) in self.levels.iter().enumerate().rev() {
            drawer.write(format!("\nlevel {level}:").as_bytes())?;
            drawer.down();
            for node in nodes {
                drawer.write(b"\n")?;
                drawer = node.visualize(drawer)?;
            }
            drawer.up();
        }
        drawer.up();
        Ok(drawer)
    }
}

/// Render `value` into `dest`.
pub fn visualize_to_vec<T: Visualize + ?Sized>(dest: &mut Vec<u8>, value: &T) -> Result<()> {
    let mut drawer = Drawer::new(dest);
    drawer = value.visualize(drawer)?;
    drawer.flush()
}

/// Render `value` into a string.
pub fn visualize_to_string<T: Visualize + ?Sized>(value: &T) -> Result<String> {
    let mut dest = Vec::new();
    visualize_to_vec(&mut dest, value)?;
    Ok(String::from_utf8_lossy(&dest).into_owned())
}
