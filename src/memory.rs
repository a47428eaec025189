use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemError {
    #[error("unaligned word address {addr:#010x}")]
    Unaligned { addr: u32 },
    #[error("address {addr:#010x} outside data window {base:#010x}..{end:#010x}")]
    Unmapped { addr: u32, base: u32, end: u32 },
}

pub trait Bus {
    fn read_u32(&mut self, addr: u32) -> Result<u32, MemError>;
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<(), MemError>;
}

/// Word-addressed data window `[base, base + 4 * words)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemory {
    pub words: Vec<u32>,
    pub base: u32,
}

impl DataMemory {
    pub fn new(base: u32, words: usize) -> Self {
        Self {
            words: vec![0; words],
            base,
        }
    }

    fn index(&self, addr: u32) -> Result<usize, MemError> {
        if addr % 4 != 0 {
            return Err(MemError::Unaligned { addr });
        }
        let off = addr.wrapping_sub(self.base) as usize / 4;
        if addr < self.base || off >= self.words.len() {
            return Err(MemError::Unmapped { addr, base: self.base, end: self.end() });
        }
        Ok(off)
    }

    /// One past the last mapped byte.
    pub fn end(&self) -> u32 {
        self.base.wrapping_add((self.words.len() * 4) as u32)
    }

    /// `(address, value)` for every word in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.base.wrapping_add(4 * i as u32), *v))
    }
}

impl Bus for DataMemory {
    fn read_u32(&mut self, addr: u32) -> Result<u32, MemError> {
        let i = self.index(addr)?;
        Ok(self.words[i])
    }
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<(), MemError> {
        let i = self.index(addr)?;
        self.words[i] = val;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("line {line}: expected 32 binary digits, found {text:?}")]
    BadWord { line: usize, text: String },
}

/// Read-only instruction store; word `i` lives at byte address `4 * i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    words: Vec<u32>,
}

impl Program {
    pub fn new(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// Parse the assembler's text output: one 32-digit binary word per line.
    /// Blank lines are skipped.
    pub fn from_text(text: &str) -> Result<Self, LoadError> {
        let mut words = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let t = line.trim();
            if t.is_empty() {
                continue;
            }
            let bad = || LoadError::BadWord {
                line: i + 1,
                text: t.to_string(),
            };
            if t.len() != 32 || !t.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(bad());
            }
            words.push(u32::from_str_radix(t, 2).map_err(|_| bad())?);
        }
        Ok(Self { words })
    }

    pub fn fetch(&self, pc: u32) -> Option<u32> {
        if pc % 4 != 0 {
            return None;
        }
        self.words.get((pc / 4) as usize).copied()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `(address, word)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| ((i as u32) * 4, *w))
    }
}
